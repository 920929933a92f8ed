//! Serpent-GCM + AES-256-GCM double authenticated encryption.

use crate::config::{cipher_params, AEAD_OVERHEAD, IV_BYTES, TAG_BYTES};
use crate::crypto::kdf::KeyDerivation;
use crate::crypto::scrub::SecretBytes;
use crate::error::{Error, Result};
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, AesGcm, KeyInit, Nonce};
use serpent::Serpent;
use tracing::warn;

/// GCM over the Serpent block cipher with a 96-bit nonce.
type SerpentGcm = AesGcm<Serpent, U12>;

/// Two independently keyed GCM instances applied in series.
pub struct DoubleCipher {
    aes: Aes256Gcm,
    serpent: SerpentGcm,
}

impl DoubleCipher {
    /// Create the cipher pair from 64 bytes of key material.
    ///
    /// Bytes `[0, 32)` key AES, bytes `[32, 64)` key Serpent.
    pub fn new(key_material: &[u8]) -> Result<Self> {
        if key_material.len() != cipher_params::KEY_MATERIAL_BYTES {
            return Err(Error::Encryption(format!(
                "Expected {} bytes of key material, got {}",
                cipher_params::KEY_MATERIAL_BYTES,
                key_material.len()
            )));
        }
        let (aes_key, serpent_key) = key_material.split_at(cipher_params::AES_KEY_BYTES);

        let aes = Aes256Gcm::new_from_slice(aes_key)
            .map_err(|e| Error::Encryption(e.to_string()))?;
        let block = Serpent::new_from_slice(serpent_key)
            .map_err(|e| Error::Encryption(e.to_string()))?;

        Ok(Self {
            aes,
            serpent: SerpentGcm::from(block),
        })
    }

    /// Encrypt with Serpent first, then AES. Both layers authenticate `aad`.
    ///
    /// Returns: ciphertext || serpent tag || aes tag
    pub fn encrypt(&self, plaintext: &[u8], iv: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let nonce = nonce_from(iv)?;

        let inner = SecretBytes::new(
            self.serpent
                .encrypt(nonce, Payload { msg: plaintext, aad })
                .map_err(|e| Error::Encryption(e.to_string()))?,
        );

        self.aes
            .encrypt(nonce, Payload { msg: &inner[..], aad })
            .map_err(|e| Error::Encryption(e.to_string()))
    }

    /// Decrypt data produced by `encrypt`. Fails closed on either tag.
    pub fn decrypt(&self, ciphertext: &[u8], iv: &[u8], aad: &[u8]) -> Result<SecretBytes> {
        let nonce = nonce_from(iv)?;
        if ciphertext.len() < AEAD_OVERHEAD {
            return Err(Error::Authentication);
        }

        let inner = SecretBytes::new(
            self.aes
                .decrypt(nonce, Payload { msg: ciphertext, aad })
                .map_err(|_| {
                    warn!("outer AES-GCM tag mismatch");
                    Error::Authentication
                })?,
        );

        let plaintext = self
            .serpent
            .decrypt(nonce, Payload { msg: &inner[..], aad })
            .map_err(|_| {
                warn!("inner Serpent-GCM tag mismatch");
                Error::Authentication
            })?;

        Ok(SecretBytes::new(plaintext))
    }
}

fn nonce_from(iv: &[u8]) -> Result<&Nonce<U12>> {
    if iv.len() != IV_BYTES {
        return Err(Error::Encryption(format!(
            "IV must be {} bytes, got {}",
            IV_BYTES,
            iv.len()
        )));
    }
    Ok(Nonce::from_slice(iv))
}

/// Inputs shared by `encrypt` and `decrypt` besides the data itself.
#[derive(Clone, Copy)]
pub struct CipherInput<'a> {
    pub passphrase: &'a [u8],
    pub iv: &'a [u8],
    pub salt: &'a [u8],
    /// Associated data authenticated by both layers.
    pub aad: &'a [u8],
    /// PBKDF2 iterations for the key material.
    pub iterations: u32,
}

impl CipherInput<'_> {
    fn cipher(&self) -> Result<DoubleCipher> {
        let key = KeyDerivation::new(self.salt, self.iterations)
            .derive(self.passphrase, cipher_params::KEY_MATERIAL_BYTES)?;
        DoubleCipher::new(&key)
    }
}

/// Derive the key material from passphrase and salt, then encrypt.
pub fn encrypt(data: &[u8], input: &CipherInput<'_>) -> Result<Vec<u8>> {
    input.cipher()?.encrypt(data, input.iv, input.aad)
}

/// Derive the key material from passphrase and salt, then decrypt.
pub fn decrypt(ciphertext: &[u8], input: &CipherInput<'_>) -> Result<SecretBytes> {
    input.cipher()?.decrypt(ciphertext, input.iv, input.aad)
}

/// Ciphertext length for a plaintext of `len` bytes.
pub fn ciphertext_len(len: usize) -> usize {
    len + 2 * TAG_BYTES
}

#[cfg(test)]
mod tests {
    use super::*;

    const IV: [u8; 12] = [0x11; 12];
    const SALT: [u8; 16] = [0x22; 16];
    const AAD: [u8; 5] = [3, 43, 0, 0, 0];

    fn input<'a>(passphrase: &'a [u8]) -> CipherInput<'a> {
        CipherInput {
            passphrase,
            iv: &IV,
            salt: &SALT,
            aad: &AAD,
            iterations: 32,
        }
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let plaintext = b"Hello, World! This is a secret message.";
        let params = input(b"secure_password_123");

        let encrypted = encrypt(plaintext, &params).unwrap();
        let decrypted = decrypt(&encrypted, &params).unwrap();

        assert_eq!(&*decrypted, plaintext);
    }

    #[test]
    fn test_ciphertext_carries_two_tags() {
        let plaintext = b"Secret data";
        let encrypted = encrypt(plaintext, &input(b"password")).unwrap();

        assert_eq!(encrypted.len(), ciphertext_len(plaintext.len()));
        assert_eq!(encrypted.len(), plaintext.len() + 32);
    }

    #[test]
    fn test_wrong_password_fails() {
        let encrypted = encrypt(b"Secret data", &input(b"correct_password")).unwrap();

        let result = decrypt(&encrypted, &input(b"wrong_password"));
        assert!(matches!(result, Err(Error::Authentication)));
    }

    #[test]
    fn test_wrong_salt_fails() {
        let encrypted = encrypt(b"Secret data", &input(b"password")).unwrap();

        let other_salt = [0x23; 16];
        let params = CipherInput {
            salt: &other_salt,
            ..input(b"password")
        };
        assert!(matches!(decrypt(&encrypted, &params), Err(Error::Authentication)));
    }

    #[test]
    fn test_wrong_iv_fails() {
        let encrypted = encrypt(b"Secret data", &input(b"password")).unwrap();

        let other_iv = [0x12; 12];
        let params = CipherInput {
            iv: &other_iv,
            ..input(b"password")
        };
        assert!(matches!(decrypt(&encrypted, &params), Err(Error::Authentication)));
    }

    #[test]
    fn test_associated_data_is_authenticated() {
        let encrypted = encrypt(b"Secret data", &input(b"password")).unwrap();

        let other_aad = [4, 43, 0, 0, 0];
        let params = CipherInput {
            aad: &other_aad,
            ..input(b"password")
        };
        assert!(matches!(decrypt(&encrypted, &params), Err(Error::Authentication)));
    }

    #[test]
    fn test_empty_plaintext() {
        let params = input(b"password");
        let encrypted = encrypt(b"", &params).unwrap();
        let decrypted = decrypt(&encrypted, &params).unwrap();

        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let params = input(b"password");
        let mut encrypted = encrypt(b"Secret data", &params).unwrap();
        encrypted[0] ^= 0x01;

        assert!(matches!(decrypt(&encrypted, &params), Err(Error::Authentication)));
    }

    #[test]
    fn test_inner_layer_is_authenticated() {
        // Re-wrap a tampered Serpent layer with a valid AES tag: the outer
        // check passes, the inner one must still fail.
        let key = KeyDerivation::new(&SALT, 32)
            .derive(b"password", cipher_params::KEY_MATERIAL_BYTES)
            .unwrap();
        let cipher = DoubleCipher::new(&key).unwrap();
        let nonce = Nonce::from_slice(&IV);

        let mut inner = cipher
            .serpent
            .encrypt(nonce, Payload { msg: b"Secret data", aad: &AAD })
            .unwrap();
        inner[0] ^= 0x80;
        let outer = cipher
            .aes
            .encrypt(nonce, Payload { msg: &inner, aad: &AAD })
            .unwrap();

        assert!(matches!(
            cipher.decrypt(&outer, &IV, &AAD),
            Err(Error::Authentication)
        ));
    }

    #[test]
    fn test_layers_use_separate_keys() {
        let key = KeyDerivation::new(&SALT, 32)
            .derive(b"password", cipher_params::KEY_MATERIAL_BYTES)
            .unwrap();
        let cipher = DoubleCipher::new(&key).unwrap();
        let encrypted = cipher.encrypt(b"Secret data", &IV, &AAD).unwrap();

        let mut swapped = key.to_vec();
        swapped.rotate_left(cipher_params::AES_KEY_BYTES);
        let other = DoubleCipher::new(&swapped).unwrap();

        assert!(other.decrypt(&encrypted, &IV, &AAD).is_err());
    }

    #[test]
    fn test_known_ciphertext() {
        let encrypted = encrypt(b"Secret data", &input(b"password")).unwrap();
        assert_eq!(
            hex::encode(&encrypted),
            "f625c0b10c6003cadc8a20a7fa8f6a6ca67c8c44a14054f9343025680a078eae658f8773e1e31ae1acf5fc"
        );

        // The Serpent layer alone, before AES wraps it.
        let key = KeyDerivation::new(&SALT, 32)
            .derive(b"password", cipher_params::KEY_MATERIAL_BYTES)
            .unwrap();
        let cipher = DoubleCipher::new(&key).unwrap();
        let inner = cipher
            .serpent
            .encrypt(Nonce::from_slice(&IV), Payload { msg: b"Secret data", aad: &AAD })
            .unwrap();
        assert_eq!(
            hex::encode(inner),
            "4eabb0ba5af5ffe5d65c45dfc5c3884e487f353a82c7735216896b"
        );
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let result = decrypt(&[0u8; 31], &input(b"password"));
        assert!(matches!(result, Err(Error::Authentication)));
    }

    #[test]
    fn test_bad_key_material_length() {
        assert!(matches!(DoubleCipher::new(&[0u8; 32]), Err(Error::Encryption(_))));
    }
}
