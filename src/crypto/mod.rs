//! Cryptographic operations for PNG steganography.
//!
//! This module provides:
//! - Serpent-GCM + AES-256-GCM double authenticated encryption
//! - PBKDF2-HMAC-Whirlpool passphrase-based key derivation
//! - Wiping of sensitive buffers

mod cipher;
mod kdf;
mod scrub;

pub use cipher::{ciphertext_len, decrypt, encrypt, CipherInput, DoubleCipher};
pub use kdf::{derive, derive_offset_seed, KeyDerivation};
pub use scrub::{wipe, SecretBytes};
