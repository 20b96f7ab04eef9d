use crate::error::LedgerError;
use alloy::primitives::U256;
use std::collections::HashMap;

fn position(tick: i32, tick_spacing: i32) -> Result<(i16, usize), LedgerError> {
    if tick % tick_spacing != 0 {
        return Err(LedgerError::InvalidTickHint(tick));
    }
    let compressed = tick / tick_spacing;
    Ok(((compressed >> 8) as i16, (compressed & 0xff) as usize))
}

pub fn is_set(tick_bitmap: &HashMap<i16, U256>, tick: i32, tick_spacing: i32) -> Result<bool, LedgerError> {
    let (word_pos, bit_pos) = position(tick, tick_spacing)?;
    Ok(tick_bitmap
        .get(&word_pos)
        .map(|word| word.bit(bit_pos))
        .unwrap_or(false))
}

/// Flips the initialized state of `tick`. Empty words are dropped.
pub fn flip_tick(
    tick_bitmap: &mut HashMap<i16, U256>,
    tick: i32,
    tick_spacing: i32,
) -> Result<(), LedgerError> {
    let (word_pos, bit_pos) = position(tick, tick_spacing)?;
    let word = tick_bitmap.entry(word_pos).or_insert(U256::ZERO);
    *word ^= U256::from(1u8) << bit_pos;
    if word.is_zero() {
        tick_bitmap.remove(&word_pos);
    }
    Ok(())
}

/// Returns the next initialized tick within the 256-tick word of `tick`,
/// searching at or below it when `lte`, strictly above otherwise. When the
/// word holds nothing, returns the word boundary and `false`.
pub fn next_initialized_tick_within_one_word(
    tick_bitmap: &HashMap<i16, U256>,
    tick: i32,
    tick_spacing: i32,
    lte: bool,
) -> Result<(i32, bool), LedgerError> {
    let compressed = tick.div_euclid(tick_spacing);
    if lte {
        let word_pos = compressed >> 8;
        let bit_pos = (compressed & 0xff) as usize;
        let one = U256::from(1u8) << bit_pos;
        let mask = (one - U256::from(1u8)) + one;
        let masked = tick_bitmap
            .get(&(word_pos as i16))
            .map(|word| *word & mask)
            .unwrap_or(U256::ZERO);
        if masked.is_zero() {
            Ok((word_pos * 256 * tick_spacing, false))
        } else {
            let msb = (masked.bit_len() - 1) as i32;
            Ok(((word_pos * 256 + msb) * tick_spacing, true))
        }
    } else {
        let compressed = compressed + 1;
        let word_pos = compressed >> 8;
        let bit_pos = (compressed & 0xff) as usize;
        let mask = !((U256::from(1u8) << bit_pos) - U256::from(1u8));
        let masked = tick_bitmap
            .get(&(word_pos as i16))
            .map(|word| *word & mask)
            .unwrap_or(U256::ZERO);
        if masked.is_zero() {
            Ok(((word_pos * 256 + 255) * tick_spacing, false))
        } else {
            let lsb = masked.trailing_zeros() as i32;
            Ok(((word_pos * 256 + lsb) * tick_spacing, true))
        }
    }
}
