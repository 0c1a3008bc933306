//! # Convsoft Library
//!
//! Soft-decision sequential decoding of convolutional codes.
//! * `encoder` is the (n,k,m) shift-register encoder used as the code oracle
//! * `relmat` holds the per-position symbol reliabilities that drive the search
//! * `fano` is the Fano threshold decoder working on the code tree
//! * `stack` is the best-first (Zigangirov-Jelinek) decoder over the same tree
//! * `interleave` is a bit-reversal symbol interleaver
//!
//! The encoder and both decoders are generic over the register type with
//! bounds `PrimInt + Unsigned`.  `u8` covers toy codes, `u64` covers
//! constraint lengths up to 64.
//!
//! ## Example
//!
//! ```
//! use convsoft::encoder::ConvEncoder;
//! use convsoft::fano::FanoDecoder;
//! use convsoft::relmat::ReliabilityMatrix;
//!
//! // (2,1,2) code with generators 7 and 5, message with a zero tail
//! let message = [1u32, 1, 1, 0, 1, 0, 0];
//! let mut encoder: ConvEncoder<u8> = ConvEncoder::new(vec![3], vec![vec![7, 5]]).unwrap();
//! let mut relmat = ReliabilityMatrix::new(2, message.len());
//! for &symbol in &message {
//!     let out = encoder.encode(symbol, true);
//!     let mut column = [0.1f32; 4];
//!     column[out as usize] = 0.7;
//!     relmat.enter_column_auto(&column);
//! }
//! relmat.normalize().unwrap();
//!
//! let mut decoder: FanoDecoder<u8> =
//!     FanoDecoder::new(vec![3], vec![vec![7, 5]], 0.0, 1.0, 0, 0.0).unwrap();
//! let decoded = decoder.decode(&relmat).unwrap().expect("no solution found");
//! assert_eq!(decoded, message);
//! ```

mod tools;
mod seq;
pub mod encoder;
pub mod relmat;
pub mod interleave;
pub mod fano;
pub mod stack;

/// Library errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("code must have at least one input and one output")]
    EmptyCode,
    #[error("number of generator polynomial vectors does not match the number of inputs")]
    GeneratorCountMismatch,
    #[error("register length must be between 1 and the register width")]
    BadConstraint,
    #[error("generator polynomial does not fit in its register")]
    GeneratorTooWide,
    #[error("input or output symbols wider than 16 bits are not supported")]
    SymbolTooWide,
    #[error("reliability matrix should have at least as many columns as the code constraint")]
    MatrixTooShort,
    #[error("reliability matrix is not compatible with the code output symbol size")]
    MatrixSymbolMismatch,
    #[error("reliability column sums to zero")]
    ZeroColumnSum
}
