//! Deterministic pseudorandom selection of payload pixels.
//!
//! Offsets in `[MIN_OFFSET, MAX_OFFSET]` are drawn from a ChaCha20 stream
//! keyed by the 32-bit offset seed. The mapping from raw 32-bit words to
//! offsets is defined here rather than delegated to `Rng::gen_range`, whose
//! sampling method is not part of any stability guarantee.
//!
//! # Cross-platform portability
//!
//! Only `next_u32` words are consumed, so the stream is identical on 32-bit
//! (WASM) and 64-bit targets. Every draw is `word / BUCKET`; the single
//! out-of-range bucket (`word == u32::MAX`) is rejected and redrawn.

use crate::config::{MAX_OFFSET, MIN_OFFSET};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use zeroize::{Zeroize, Zeroizing};

/// Number of distinct offsets.
const SPAN: u32 = MAX_OFFSET - MIN_OFFSET + 1;

/// Width of the raw-word interval mapped onto one offset.
const BUCKET: u32 = u32::MAX / SPAN;

/// Restartable stream of pixel indices.
///
/// The first index is always 0; every later index advances the cursor by
/// one offset draw. The generator state is reset to the all-zero key on
/// drop.
pub struct PositionSequencer {
    rng: ChaCha20Rng,
    cursor: usize,
    started: bool,
}

impl PositionSequencer {
    /// Create a sequencer for the given seed.
    pub fn new(seed: u32) -> Self {
        let mut key = Zeroizing::new([0u8; 32]);
        key[..4].copy_from_slice(&seed.to_le_bytes());
        let rng = ChaCha20Rng::from_seed(*key);

        Self {
            rng,
            cursor: 0,
            started: false,
        }
    }

    /// Draw the next offset.
    pub fn next_offset(&mut self) -> u32 {
        loop {
            let bucket = self.rng.next_u32() / BUCKET;
            if bucket < SPAN {
                return MIN_OFFSET + bucket;
            }
        }
    }

    /// Current cursor position (the last index returned).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn wipe(&mut self) {
        self.rng = ChaCha20Rng::from_seed([0u8; 32]);
        self.cursor.zeroize();
    }
}

impl Drop for PositionSequencer {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl Iterator for PositionSequencer {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if !self.started {
            self.started = true;
            return Some(self.cursor);
        }
        let offset = self.next_offset() as usize;
        self.cursor = self.cursor.saturating_add(offset);
        Some(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let a: Vec<usize> = PositionSequencer::new(0xDEAD_BEEF).take(1000).collect();
        let b: Vec<usize> = PositionSequencer::new(0xDEAD_BEEF).take(1000).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a: Vec<usize> = PositionSequencer::new(1).take(64).collect();
        let b: Vec<usize> = PositionSequencer::new(2).take(64).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_first_position_is_zero() {
        assert_eq!(PositionSequencer::new(42).next(), Some(0));
    }

    #[test]
    fn test_offsets_in_range() {
        let mut sequencer = PositionSequencer::new(7);
        for _ in 0..10_000 {
            let offset = sequencer.next_offset();
            assert!((MIN_OFFSET..=MAX_OFFSET).contains(&offset));
        }
    }

    #[test]
    fn test_positions_strictly_increasing() {
        let positions: Vec<usize> = PositionSequencer::new(99).take(5000).collect();
        for pair in positions.windows(2) {
            let step = pair[1] - pair[0];
            assert!((1..=3).contains(&step));
        }
    }

    #[test]
    fn test_all_offsets_occur() {
        let mut sequencer = PositionSequencer::new(12345);
        let mut counts = [0usize; 3];
        for _ in 0..30_000 {
            counts[(sequencer.next_offset() - MIN_OFFSET) as usize] += 1;
        }
        for count in counts {
            assert!(count > 9_000 && count < 11_000, "skewed distribution: {:?}", counts);
        }
    }

    #[test]
    fn test_offsets_follow_chacha_words() {
        // Pin the word-to-offset mapping against the raw generator output.
        let mut key = [0u8; 32];
        key[..4].copy_from_slice(&0x0102_0304u32.to_le_bytes());
        let mut raw = ChaCha20Rng::from_seed(key);
        let mut sequencer = PositionSequencer::new(0x0102_0304);

        for _ in 0..256 {
            let mut word = raw.next_u32();
            while word == u32::MAX {
                word = raw.next_u32();
            }
            assert_eq!(sequencer.next_offset(), 1 + word / 0x5555_5555);
        }
    }

    #[test]
    fn test_known_positions() {
        let positions: Vec<usize> = PositionSequencer::new(0x0102_0304).take(32).collect();
        assert_eq!(
            positions,
            [
                0, 3, 5, 8, 11, 12, 15, 17, 19, 22, 24, 27, 29, 31, 32, 33, 36, 38, 40, 43, 46,
                47, 50, 51, 54, 57, 59, 62, 65, 68, 71, 73,
            ]
        );
    }

    #[test]
    fn test_known_offsets() {
        let mut sequencer = PositionSequencer::new(0xDEAD_BEEF);
        let offsets: Vec<u32> = (0..32).map(|_| sequencer.next_offset()).collect();
        assert_eq!(
            offsets,
            [
                3, 1, 1, 1, 1, 3, 2, 2, 1, 2, 1, 1, 1, 3, 3, 1, 1, 2, 2, 2, 2, 1, 2, 1, 1, 1, 3,
                2, 1, 3, 2, 2,
            ]
        );
    }

    #[test]
    fn test_zero_seed_uses_chacha20_keystream() {
        // ChaCha20 with an all-zero key and nonce starts 76 b8 e0 ad a0 f1 3d 90 ...
        let mut raw = ChaCha20Rng::from_seed([0u8; 32]);
        let words: Vec<u32> = (0..4).map(|_| raw.next_u32()).collect();
        assert_eq!(words, [0xade0_b876, 0x903d_f1a0, 0xe56a_5d40, 0x28bd_8653]);

        let mut sequencer = PositionSequencer::new(0);
        let offsets: Vec<u32> = (0..4).map(|_| sequencer.next_offset()).collect();
        assert_eq!(offsets, [3, 2, 3, 1]);
    }

    #[test]
    fn test_wipe_resets_generator() {
        let mut sequencer = PositionSequencer::new(0x0102_0304);
        sequencer.nth(10);
        sequencer.wipe();

        let mut zero = PositionSequencer::new(0);
        assert_eq!(sequencer.cursor(), 0);
        for _ in 0..32 {
            assert_eq!(sequencer.next_offset(), zero.next_offset());
        }
    }

    #[test]
    fn test_bucket_constants() {
        assert_eq!(SPAN, 3);
        assert_eq!(BUCKET, 0x5555_5555);
        assert_eq!(u32::MAX / BUCKET, 3);
        assert_eq!((u32::MAX - 1) / BUCKET, 2);
    }
}
