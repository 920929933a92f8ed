//! PBKDF2-HMAC-Whirlpool key derivation for passphrase-based keys.

use crate::config::kdf_params;
use crate::crypto::scrub::SecretBytes;
use crate::error::{Error, Result};
use pbkdf2::pbkdf2_hmac;
use whirlpool::Whirlpool;
use zeroize::Zeroize;

/// Key derivation bound to one salt and iteration count.
#[derive(Debug, Clone, Copy)]
pub struct KeyDerivation<'a> {
    salt: &'a [u8],
    iterations: u32,
}

impl<'a> KeyDerivation<'a> {
    /// Create a KDF for the given salt.
    pub fn new(salt: &'a [u8], iterations: u32) -> Self {
        Self { salt, iterations }
    }

    /// Get the salt.
    pub fn salt(&self) -> &[u8] {
        self.salt
    }

    /// Derive `output_length` bytes of key material from a passphrase.
    pub fn derive(&self, passphrase: &[u8], output_length: usize) -> Result<SecretBytes> {
        if passphrase.is_empty() {
            return Err(Error::InvalidArgument("An empty key was given".to_string()));
        }
        if self.iterations == 0 {
            return Err(Error::KeyDerivation(
                "Iteration count must be greater than 0".to_string(),
            ));
        }

        let mut derived = SecretBytes::zeroed(output_length);
        pbkdf2_hmac::<Whirlpool>(passphrase, self.salt, self.iterations, &mut derived);
        Ok(derived)
    }
}

/// Derive `output_length` bytes from passphrase and salt.
pub fn derive(
    passphrase: &[u8],
    salt: &[u8],
    output_length: usize,
    iterations: u32,
) -> Result<SecretBytes> {
    KeyDerivation::new(salt, iterations).derive(passphrase, output_length)
}

/// Derive the position sequencer seed from passphrase and IV.
///
/// The four derived bytes are read big-endian.
pub fn derive_offset_seed(passphrase: &[u8], iv: &[u8], iterations: u32) -> Result<u32> {
    let derived = derive(passphrase, iv, kdf_params::SEED_LENGTH, iterations)?;
    let mut bytes = [0u8; kdf_params::SEED_LENGTH];
    bytes.copy_from_slice(&derived);
    let seed = u32::from_be_bytes(bytes);
    bytes.zeroize();
    Ok(seed)
}
