//! Injectable source of fresh IV and salt bytes.

use crate::error::{Error, Result};
use rand::rngs::OsRng;
use rand::RngCore;

/// Cryptographically secure byte source used for IV and salt.
pub trait SecureRandom: Send {
    /// Fill `dest` entirely with random bytes.
    fn fill(&mut self, dest: &mut [u8]) -> Result<()>;
}

/// The operating system's CSPRNG. Default for every container.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSecureRandom;

impl SecureRandom for OsSecureRandom {
    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::Encryption(format!("OS random source failed: {}", e)))
    }
}

/// Fills every byte with the same value. For reproducible tests only.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub u8);

impl SecureRandom for FixedRandom {
    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        dest.fill(self.0);
        Ok(())
    }
}
