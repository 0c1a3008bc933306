//! Reliability matrix feeding the decoders.
//!
//! Analog reliability data is entered column by column, then `normalize`
//! turns every column into a-posteriori symbol probabilities.  The matrix
//! has one row per output symbol value and one column per message position.

use crate::Error;

/// Dense 2^n x L matrix of non-negative reliabilities, stored column first.
pub struct ReliabilityMatrix {
    nb_symbols_log2: u32,
    nb_symbols: usize,
    message_length: usize,
    /// advanced by each `enter_column_auto`
    col_cursor: usize,
    matrix: Vec<f32>
}

impl ReliabilityMatrix {
    /// Create a zeroed matrix with 2^nb_symbols_log2 rows and one column
    /// per message symbol.
    pub fn new(nb_symbols_log2: u32, message_length: usize) -> Self {
        let nb_symbols = 1usize << nb_symbols_log2;
        Self {
            nb_symbols_log2,
            nb_symbols,
            message_length,
            col_cursor: 0,
            matrix: vec![0.0;nb_symbols*message_length]
        }
    }
    /// Enter reliability data for one message position.
    /// Panics if the position is out of range or the slice does not hold
    /// one value per output symbol.
    pub fn enter_column(&mut self, position: usize, symbol_data: &[f32]) {
        assert!(position < self.message_length,"message position out of range");
        assert_eq!(symbol_data.len(),self.nb_symbols,"expected one value per output symbol");
        let start = self.nb_symbols * position;
        self.matrix[start..start+self.nb_symbols].copy_from_slice(symbol_data);
    }
    /// Enter reliability data at the internal cursor position and advance
    /// the cursor.
    pub fn enter_column_auto(&mut self, symbol_data: &[f32]) {
        self.enter_column(self.col_cursor,symbol_data);
        self.col_cursor += 1;
    }
    /// Rewind the internal column cursor
    pub fn reset_cursor(&mut self) {
        self.col_cursor = 0;
    }
    /// Normalize each column so that its values represent an a-posteriori
    /// probability, i.e. every column sums to 1.  A column summing to zero
    /// is an error.
    pub fn normalize(&mut self) -> Result<(),Error> {
        for position in 0..self.message_length {
            let start = self.nb_symbols * position;
            let column = &mut self.matrix[start..start+self.nb_symbols];
            let sum: f32 = column.iter().sum();
            if sum == 0.0 {
                return Err(Error::ZeroColumnSum);
            }
            for value in column.iter_mut() {
                *value /= sum;
            }
        }
        Ok(())
    }
    /// Reliability of `symbol` at message position `position`
    pub fn get(&self, symbol: u32, position: usize) -> f32 {
        self.matrix[self.nb_symbols*position + symbol as usize]
    }
    /// Log2 of the number of rows
    pub fn nb_symbols_log2(&self) -> u32 {
        self.nb_symbols_log2
    }
    /// Number of rows
    pub fn nb_symbols(&self) -> usize {
        self.nb_symbols
    }
    /// Number of columns
    pub fn message_length(&self) -> usize {
        self.message_length
    }
}

// *************** TESTS *****************

#[test]
fn columns_sum_to_one() {
    let mut relmat = ReliabilityMatrix::new(2,3);
    relmat.enter_column_auto(&[2.0,1.0,1.0,4.0]);
    relmat.enter_column_auto(&[0.1,0.1,0.1,0.1]);
    relmat.enter_column(2,&[1.0,0.0,0.0,0.0]);
    relmat.normalize().expect("normalize failed");
    for position in 0..3 {
        let sum: f32 = (0..4).map(|s| relmat.get(s,position)).sum();
        assert!((sum-1.0).abs() < 1e-6);
    }
    assert!((relmat.get(3,0)-0.5).abs() < 1e-6);
    assert!((relmat.get(0,2)-1.0).abs() < 1e-6);
}

#[test]
fn zero_column_is_rejected() {
    let mut relmat = ReliabilityMatrix::new(1,2);
    relmat.enter_column(0,&[0.3,0.7]);
    assert!(matches!(relmat.normalize(),Err(Error::ZeroColumnSum)));
}

#[test]
fn cursor_advances_and_rewinds() {
    let mut relmat = ReliabilityMatrix::new(1,2);
    relmat.enter_column_auto(&[1.0,0.0]);
    relmat.enter_column_auto(&[0.0,1.0]);
    assert!((relmat.get(0,0)-1.0).abs() < 1e-6);
    assert!((relmat.get(1,1)-1.0).abs() < 1e-6);
    relmat.reset_cursor();
    relmat.enter_column_auto(&[0.0,2.0]);
    assert!((relmat.get(1,0)-2.0).abs() < 1e-6);
}
