//! Payload capacity of a carrier for a given offset seed.

use crate::carrier::sequencer::PositionSequencer;
use crate::config::HEADER_BYTES;
use zeroize::Zeroize;

/// Number of sequenced pixels (one bit each) below `pixel_count`.
pub fn available_bits(pixel_count: usize, seed: u32) -> usize {
    let mut seed = seed;
    let sequencer = PositionSequencer::new(seed);
    seed.zeroize();

    sequencer.take_while(|&pos| pos < pixel_count).count()
}

/// Gross capacity in bytes minus a fixed reserve, clamped at zero.
pub fn net_capacity(available_bits: usize, reserve: usize) -> usize {
    (available_bits / 8).saturating_sub(reserve)
}

/// Payload bytes the carrier can hold after the length header.
///
/// The seed is wiped before returning.
pub fn capacity(pixel_count: usize, seed: u32) -> usize {
    net_capacity(available_bits(pixel_count, seed), HEADER_BYTES)
}
