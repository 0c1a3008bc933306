//! State shared by the sequential decoders: the encoding instance, the
//! caller-set limits, the running statistics, the edge-metric bias and the
//! tail-zeros option.

use num_traits::{PrimInt,Unsigned};
use crate::encoder::ConvEncoder;
use crate::relmat::ReliabilityMatrix;
use crate::Error;

pub struct SeqCore<R: PrimInt + Unsigned> {
    pub encoder: ConvEncoder<R>,
    /// abort when the threshold falls below this metric
    pub metric_limit: Option<f32>,
    /// abort when more than this many nodes have been created
    pub node_limit: Option<u32>,
    /// path metric of the codeword found, valid after a successful decode
    pub codeword_score: f32,
    /// current encoder depth, -1 before the first expansion
    pub cur_depth: i32,
    /// deepest node reached
    pub max_depth: i32,
    /// nodes created, root included
    pub node_count: u32,
    /// assume the last m-1 message symbols are zero (default)
    pub tail_zeros: bool,
    /// bias subtracted from every edge metric
    pub edge_bias: f32,
    pub verbosity: u32
}

impl <R: PrimInt + Unsigned> SeqCore<R> {
    pub fn new(encoder: ConvEncoder<R>) -> Self {
        Self {
            encoder,
            metric_limit: None,
            node_limit: None,
            codeword_score: 0.0,
            cur_depth: -1,
            max_depth: 0,
            node_count: 0,
            tail_zeros: true,
            edge_bias: 0.0,
            verbosity: 0
        }
    }
    /// Reset the per-decode statistics and the encoder registers.
    pub fn reset(&mut self) {
        self.node_count = 0;
        self.codeword_score = 0.0;
        self.cur_depth = -1;
        self.max_depth = 0;
        self.encoder.clear();
    }
    /// Check a reliability matrix against the code dimensions.
    pub fn check_relmat(&self, relmat: &ReliabilityMatrix) -> Result<(),Error> {
        if relmat.message_length() < self.encoder.m() as usize {
            return Err(Error::MatrixTooShort);
        }
        if relmat.nb_symbols_log2() != self.encoder.n() {
            return Err(Error::MatrixSymbolMismatch);
        }
        Ok(())
    }
    /// Number of candidate input symbols at a symbol place: the full 2^k
    /// alphabet, or only the zero symbol in the tail when tail-zeros is on.
    pub fn end_symbol(&self, forward_depth: i32, message_length: usize) -> u32 {
        if self.tail_zeros && forward_depth > message_length as i32 - self.encoder.m() as i32 {
            1
        } else {
            1 << self.encoder.k()
        }
    }
    /// Codeword score in dB per symbol, valid after a successful decode.
    pub fn score_db_per_symbol(&self) -> f32 {
        if self.cur_depth > 0 {
            (10.0 * std::f32::consts::LN_2 * self.codeword_score) / self.cur_depth as f32
        } else {
            0.0
        }
    }
}

// *************** TESTS *****************

#[cfg(test)]
fn hanchen1_core() -> SeqCore<u8> {
    SeqCore::new(ConvEncoder::new(vec![3],vec![vec![7,5]]).expect("bad code"))
}

#[test]
fn matrix_validation() {
    let core = hanchen1_core();
    // fewer columns than the code constraint
    let short = ReliabilityMatrix::new(2,2);
    assert!(matches!(core.check_relmat(&short),Err(Error::MatrixTooShort)));
    // wrong number of rows for the output symbol size
    let wrong = ReliabilityMatrix::new(3,7);
    assert!(matches!(core.check_relmat(&wrong),Err(Error::MatrixSymbolMismatch)));
    let good = ReliabilityMatrix::new(2,7);
    assert!(core.check_relmat(&good).is_ok());
}

#[test]
fn tail_alphabet_boundary() {
    let mut core = hanchen1_core();
    // L=7, m=3: the last m-1 places expand only the zero symbol
    assert_eq!(core.end_symbol(4,7),2);
    assert_eq!(core.end_symbol(5,7),1);
    assert_eq!(core.end_symbol(6,7),1);
    core.tail_zeros = false;
    assert_eq!(core.end_symbol(6,7),2);
}
