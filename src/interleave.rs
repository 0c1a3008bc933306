//! Bit-reversal interleaver over message symbols.
//!
//! The destination of source position i is i with its bits reversed within
//! an index width of floor(log2 L) + 1 bits.  Reversed indices that land
//! outside the sequence are skipped, and source positions advance only on
//! a hit, so the mapping is a permutation for any length.

/// Permute a symbol sequence in place: forward scatters source symbols to
/// their bit-reversed positions, inverse gathers them back.
pub fn interleave<T: Copy>(symbols: &mut [T], forward: bool) {
    if symbols.len() < 2 {
        return;
    }
    let tmp: Vec<T> = symbols.to_vec();
    let index_size = usize::BITS - 1 - symbols.len().leading_zeros() + 1;
    let index_max = 1usize << index_size;
    let mut old_index = 0;
    for i in 0..index_max {
        if old_index >= symbols.len() {
            break;
        }
        let mut new_index = 0;
        let mut s = index_size;
        let mut iv = i;
        while iv != 0 {
            new_index |= iv & 1;
            new_index <<= 1;
            iv >>= 1;
            s -= 1;
        }
        new_index >>= 1; // the last shift went one too far
        new_index <<= s; // account for leading zeroes
        if new_index < symbols.len() {
            if forward {
                symbols[new_index] = tmp[old_index];
            } else {
                symbols[old_index] = tmp[new_index];
            }
            old_index += 1;
        }
    }
}

// *************** TESTS *****************

#[test]
fn power_of_two_permutation() {
    let mut symbols: Vec<u32> = (0..8).collect();
    interleave(&mut symbols,true);
    // position i receives the symbol whose index is bit-reverse(i)
    assert_eq!(symbols,vec![0,4,2,6,1,5,3,7]);
}

#[test]
fn inverse_undoes_forward() {
    for length in [1usize,2,3,7,8,16,33,100] {
        let original: Vec<u32> = (0..length as u32).map(|i| i.wrapping_mul(7)).collect();
        let mut symbols = original.clone();
        interleave(&mut symbols,true);
        interleave(&mut symbols,false);
        assert_eq!(symbols,original,"length {}",length);
    }
}

#[test]
fn forward_moves_symbols() {
    let original: Vec<u32> = (0..16).collect();
    let mut symbols = original.clone();
    interleave(&mut symbols,true);
    assert_ne!(symbols,original);
    // still a permutation
    let mut sorted = symbols.clone();
    sorted.sort();
    assert_eq!(sorted,original);
}