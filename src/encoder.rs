//! Convolutional encoder.
//!
//! An (n,k,m) code has one shift register per input bit.  The input bits of
//! a symbol are clocked simultaneously into the least significant positions
//! of their registers, so generator polynomials must follow the same
//! convention: polynomial bit p multiplies register bit p, with bit 0
//! holding the most recent input.

use num_traits::{PrimInt,Unsigned};
use crate::Error;

/// Shift-register machine producing one n-bit output symbol per k-bit input
/// symbol.  The full register state can be saved and restored, which lets a
/// tree decoder reposition the encoder at any node of the code tree.
pub struct ConvEncoder<R: PrimInt + Unsigned> {
    /// register length for each input bit, the largest is m
    constraints: Vec<u32>,
    /// one polynomial per output bit, for each input bit
    genpolys: Vec<Vec<R>>,
    /// register masks derived from the constraints
    masks: Vec<R>,
    registers: Vec<R>,
    k: u32,
    n: u32,
    m: u32
}

impl <R: PrimInt + Unsigned> ConvEncoder<R> {
    /// Create an encoder from register lengths and generator polynomials.
    /// There is one constraint per input bit and one polynomial vector per
    /// input bit; the smallest vector length determines the number of
    /// output bits n.
    pub fn new(constraints: Vec<u32>, genpolys: Vec<Vec<R>>) -> Result<Self,Error> {
        let width = R::zero().count_zeros();
        if constraints.is_empty() {
            return Err(Error::EmptyCode);
        }
        if genpolys.len() != constraints.len() {
            return Err(Error::GeneratorCountMismatch);
        }
        let k = constraints.len() as u32;
        let n = genpolys.iter().map(|g| g.len()).min().unwrap_or(0) as u32;
        if n == 0 {
            return Err(Error::EmptyCode);
        }
        if k > 16 || n > 16 {
            return Err(Error::SymbolTooWide);
        }
        let mut masks: Vec<R> = Vec::new();
        for (i,&c) in constraints.iter().enumerate() {
            if c == 0 || c > width {
                return Err(Error::BadConstraint);
            }
            let mask = match c == width {
                true => R::max_value(),
                false => (R::one() << c as usize) - R::one()
            };
            for &g in &genpolys[i] {
                if g & !mask != R::zero() {
                    return Err(Error::GeneratorTooWide);
                }
            }
            masks.push(mask);
        }
        let m = constraints.iter().copied().max().unwrap_or(0);
        let registers = vec![R::zero();constraints.len()];
        Ok(Self {
            constraints,
            genpolys,
            masks,
            registers,
            k,
            n,
            m
        })
    }
    /// Clear all registers, used before encoding a new sequence.
    pub fn clear(&mut self) {
        for reg in self.registers.iter_mut() {
            *reg = R::zero();
        }
    }
    /// Encode one k-bit input symbol into one n-bit output symbol.
    /// With `step` the registers shift left one position and the input bits
    /// enter the vacated least significant positions.  Without `step` the
    /// input bits replace the current least significant bits, so a decoder
    /// can evaluate every candidate symbol at one symbol place with a
    /// single shift.
    pub fn encode(&mut self, in_symbol: u32, step: bool) -> u32 {
        let mut out_symbol: u32 = 0;
        for ki in 0..self.registers.len() {
            let bit = match in_symbol >> ki & 1 {
                0 => R::zero(),
                _ => R::one()
            };
            let reg = self.registers[ki];
            self.registers[ki] = match step {
                true => ((reg << 1) | bit) & self.masks[ki],
                false => (reg & !R::one()) | bit
            };
            for ni in 0..self.n as usize {
                let parity = (self.registers[ki] & self.genpolys[ki][ni]).count_ones() & 1;
                out_symbol ^= parity << ni;
            }
        }
        out_symbol
    }
    /// Saved register state, one word per input bit.
    pub fn registers(&self) -> &[R] {
        &self.registers
    }
    /// Restore a register state previously obtained from `registers`.
    /// Panics if the slice does not have one word per input bit.
    pub fn set_registers(&mut self, registers: &[R]) {
        self.registers.copy_from_slice(registers);
    }
    /// Number of input bits per symbol
    pub fn k(&self) -> u32 {
        self.k
    }
    /// Number of output bits per symbol
    pub fn n(&self) -> u32 {
        self.n
    }
    /// Largest register length
    pub fn m(&self) -> u32 {
        self.m
    }
    /// Register length for each input bit
    pub fn constraints(&self) -> &[u32] {
        &self.constraints
    }
}

// *************** TESTS *****************

#[test]
fn hanchen1_sequence() {
    // Han & Chen fig. 1 example, the (2,1,2) code with generators 7 and 5
    let mut enc: ConvEncoder<u8> = ConvEncoder::new(vec![3],vec![vec![7,5]]).expect("bad code");
    assert_eq!(enc.k(),1);
    assert_eq!(enc.n(),2);
    assert_eq!(enc.m(),3);
    let message = [1u32,1,1,0,1,0,0];
    let out: Vec<u32> = message.iter().map(|&s| enc.encode(s,true)).collect();
    assert_eq!(out,vec![3,2,1,2,0,1,3]);
}

#[test]
fn hanchen2_sequence() {
    // Han & Chen fig. 2 example, the (3,2,2) systematic code
    let mut enc: ConvEncoder<u8> = ConvEncoder::new(vec![3,3],vec![vec![1,0,2],vec![0,1,6]]).expect("bad code");
    assert_eq!(enc.k(),2);
    assert_eq!(enc.n(),3);
    let out: Vec<u32> = [3u32,2,0,0].iter().map(|&s| enc.encode(s,true)).collect();
    assert_eq!(out,vec![3,2,0,4]);
}

#[test]
fn determinism() {
    let message = [1u32,0,1,1,0,0,1,0];
    let mut enc: ConvEncoder<u8> = ConvEncoder::new(vec![3],vec![vec![7,5]]).expect("bad code");
    let first: Vec<u32> = message.iter().map(|&s| enc.encode(s,true)).collect();
    enc.clear();
    let second: Vec<u32> = message.iter().map(|&s| enc.encode(s,true)).collect();
    assert_eq!(first,second);
}

#[test]
fn linearity() {
    // the code is linear: encode(u xor v) = encode(u) xor encode(v)
    let u = [1u32,0,1,1,0,1,0];
    let v = [0u32,1,1,0,1,1,1];
    let mut enc: ConvEncoder<u8> = ConvEncoder::new(vec![3],vec![vec![7,5]]).expect("bad code");
    let eu: Vec<u32> = u.iter().map(|&s| enc.encode(s,true)).collect();
    enc.clear();
    let ev: Vec<u32> = v.iter().map(|&s| enc.encode(s,true)).collect();
    enc.clear();
    let exor: Vec<u32> = u.iter().zip(v.iter()).map(|(&a,&b)| enc.encode(a^b,true)).collect();
    let expected: Vec<u32> = eu.iter().zip(ev.iter()).map(|(&a,&b)| a^b).collect();
    assert_eq!(exor,expected);
}

#[test]
fn save_restore() {
    let mut enc: ConvEncoder<u8> = ConvEncoder::new(vec![3,3],vec![vec![1,0,2],vec![0,1,6]]).expect("bad code");
    enc.encode(3,true);
    enc.encode(1,true);
    let saved = enc.registers().to_vec();
    let out1 = enc.encode(2,true);
    let after = enc.registers().to_vec();
    enc.set_registers(&saved);
    let out2 = enc.encode(2,true);
    assert_eq!(out1,out2);
    assert_eq!(after,enc.registers().to_vec());
}

#[test]
fn step_semantics() {
    // a step-less encode must look exactly like a stepped encode applied to
    // the parent state, for every candidate symbol after the first
    let mut enc: ConvEncoder<u8> = ConvEncoder::new(vec![3,3],vec![vec![1,0,2],vec![0,1,6]]).expect("bad code");
    enc.encode(1,true);
    enc.encode(2,true);
    let parent = enc.registers().to_vec();
    for candidate in 1u32..4 {
        enc.set_registers(&parent);
        enc.encode(0,true);
        let out_substituted = enc.encode(candidate,false);
        let state_substituted = enc.registers().to_vec();
        enc.set_registers(&parent);
        let out_stepped = enc.encode(candidate,true);
        assert_eq!(out_substituted,out_stepped);
        assert_eq!(state_substituted,enc.registers().to_vec());
    }
}

#[test]
fn rejects_bad_descriptions() {
    assert!(matches!(ConvEncoder::<u8>::new(vec![],vec![]),Err(Error::EmptyCode)));
    assert!(matches!(ConvEncoder::<u8>::new(vec![3],vec![]),Err(Error::GeneratorCountMismatch)));
    assert!(matches!(ConvEncoder::<u8>::new(vec![3],vec![vec![]]),Err(Error::EmptyCode)));
    assert!(matches!(ConvEncoder::<u8>::new(vec![0],vec![vec![1]]),Err(Error::BadConstraint)));
    assert!(matches!(ConvEncoder::<u8>::new(vec![9],vec![vec![1]]),Err(Error::BadConstraint)));
    assert!(matches!(ConvEncoder::<u8>::new(vec![3],vec![vec![9,5]]),Err(Error::GeneratorTooWide)));
}

#[test]
fn full_width_register() {
    // a constraint equal to the register width must be accepted
    let mut enc: ConvEncoder<u8> = ConvEncoder::new(vec![8],vec![vec![0xff,0x81]]).expect("bad code");
    for _ in 0..12 {
        enc.encode(1,true);
    }
    assert_eq!(enc.registers()[0],0xff);
}
