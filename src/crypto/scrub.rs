//! Wiping of sensitive buffers.

use std::fmt;
use std::ops::{Deref, DerefMut};
use zeroize::Zeroize;

/// Heap buffer that is zeroed when dropped.
///
/// Holds derived keys, passphrase copies and intermediate plaintext so that
/// every exit path, including `?` returns, scrubs them.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    /// Take ownership of an existing buffer.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Zero-filled buffer of the given length.
    pub fn zeroed(len: usize) -> Self {
        Self(vec![0u8; len])
    }

    /// Copy a slice into a new secret buffer.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Release the buffer without wiping it.
    ///
    /// The caller becomes responsible for the contents.
    pub fn into_inner(mut self) -> Vec<u8> {
        std::mem::take(&mut self.0)
    }

    /// Append bytes, wiping the old allocation if the vector has to grow.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        if self.0.capacity() - self.0.len() < bytes.len() {
            let mut grown = Vec::with_capacity(self.0.len() + bytes.len());
            grown.extend_from_slice(&self.0);
            self.0.zeroize();
            self.0 = grown;
        }
        self.0.extend_from_slice(bytes);
    }
}

impl Deref for SecretBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SecretBytes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<u8>> for SecretBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Zeroize for SecretBytes {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes([REDACTED; {}])", self.0.len())
    }
}

/// Overwrite a buffer with zeros.
pub fn wipe(buf: &mut [u8]) {
    buf.zeroize();
}
