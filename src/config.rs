//! Protocol constants and tunable configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest cursor advance between two payload pixels.
pub const MIN_OFFSET: u32 = 1;

/// Largest cursor advance between two payload pixels.
pub const MAX_OFFSET: u32 = 3;

/// Size of the extension-length header field.
pub const EXTENSION_BYTES: usize = 1;

/// Size of the ciphertext-length header field.
pub const SIZE_BYTES: usize = 4;

/// Header reserve subtracted from the gross capacity.
pub const HEADER_BYTES: usize = EXTENSION_BYTES + SIZE_BYTES;

/// AEAD nonce length (96 bits).
pub const IV_BYTES: usize = 12;

/// Key derivation salt length (128 bits).
pub const SALT_BYTES: usize = 16;

/// Authentication tag appended by each cipher (128 bits).
pub const TAG_BYTES: usize = 16;

/// Total tag overhead of the double cipher.
pub const AEAD_OVERHEAD: usize = 2 * TAG_BYTES;

/// Longest extension that fits into the one-byte length field.
pub const MAX_EXTENSION_LEN: usize = u8::MAX as usize;

/// PBKDF2-HMAC-Whirlpool parameters.
pub mod kdf_params {
    /// Iterations for the offset seed, kept low so extraction stays fast.
    pub const SEED_ITERATIONS: u32 = 150_000;

    /// Iterations for the cipher key.
    pub const KEY_ITERATIONS: u32 = 500_000;

    /// Offset seed length in bytes.
    pub const SEED_LENGTH: usize = 4;
}

/// Key sizes of the two ciphers.
pub mod cipher_params {
    /// AES-256 key length.
    pub const AES_KEY_BYTES: usize = 32;

    /// Serpent-256 key length.
    pub const SERPENT_KEY_BYTES: usize = 32;

    /// Combined key material derived per embed.
    pub const KEY_MATERIAL_BYTES: usize = AES_KEY_BYTES + SERPENT_KEY_BYTES;
}

/// Default bzip2 block size level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 9;

/// Tunable operating points.
///
/// Changing the iteration counts produces containers that default-configured
/// readers cannot open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StegoConfig {
    /// PBKDF2 iterations for the offset seed.
    pub seed_iterations: u32,

    /// PBKDF2 iterations for the cipher key.
    pub key_iterations: u32,

    /// bzip2 level (1..=9).
    pub compression_level: u32,
}

impl Default for StegoConfig {
    fn default() -> Self {
        Self {
            seed_iterations: kdf_params::SEED_ITERATIONS,
            key_iterations: kdf_params::KEY_ITERATIONS,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl StegoConfig {
    /// Low iteration counts for tests and demos. Not secure.
    pub fn fast() -> Self {
        Self {
            seed_iterations: 16,
            key_iterations: 32,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_slice(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.seed_iterations == 0 || self.key_iterations == 0 {
            return Err(Error::Config(
                "Iteration counts must be greater than 0".to_string(),
            ));
        }
        if !(1..=9).contains(&self.compression_level) {
            return Err(Error::Config(format!(
                "Compression level must be between 1 and 9, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }
}
