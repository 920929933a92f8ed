//! Embed and extract protocol over a carrier image.
//!
//! ```text
//! embed:   record → bzip2 → Serpent-GCM → AES-GCM → blue LSBs (sequenced)
//!          salt → green LSBs, IV → red LSBs (fixed positions)
//! extract: the same steps in reverse, using the stored salt and IV
//! ```
//!
//! The carrier is only mutated after every fallible step has succeeded, so
//! a failed `encode` leaves the image byte-for-byte unchanged.

mod progress;
mod random;

pub use progress::{ProgressObserver, Stage};
pub use random::{FixedRandom, OsSecureRandom, SecureRandom};

use crate::carrier::{self, side_channel, BitReader, BitWriter, CarrierImage};
use crate::compression;
use crate::config::{StegoConfig, AEAD_OVERHEAD, IV_BYTES, MAX_EXTENSION_LEN, SALT_BYTES};
use crate::crypto::{self, CipherInput, SecretBytes};
use crate::error::{Error, Result};
use progress::notify;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zeroize::{Zeroize, Zeroizing};

/// Data recovered from a container.
#[derive(Debug)]
pub struct Extracted {
    /// The hidden file contents.
    pub data: SecretBytes,
    /// File extension stored alongside, without the leading dot.
    pub extension: String,
}

/// A carrier image together with the capabilities needed to embed into it.
pub struct StegoContainer {
    image: CarrierImage,
    random: Box<dyn SecureRandom>,
    config: StegoConfig,
}

impl StegoContainer {
    /// Wrap a loaded image with the default configuration and OS randomness.
    pub fn new(image: CarrierImage) -> Self {
        Self {
            image,
            random: Box::new(OsSecureRandom),
            config: StegoConfig::default(),
        }
    }

    /// Wrap a loaded image with a custom configuration.
    pub fn with_config(image: CarrierImage, config: StegoConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(image)
        })
    }

    /// Load a PNG container from disk.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(CarrierImage::load(path)?))
    }

    /// Replace the source of fresh IV and salt bytes.
    pub fn with_random(mut self, random: Box<dyn SecureRandom>) -> Self {
        self.random = random;
        self
    }

    /// Replace the source of fresh IV and salt bytes in place.
    pub fn set_random(&mut self, random: Box<dyn SecureRandom>) {
        self.random = random;
    }

    /// The operating configuration.
    pub fn config(&self) -> &StegoConfig {
        &self.config
    }

    /// The carrier, including any embedded payload.
    pub fn image(&self) -> &CarrierImage {
        &self.image
    }

    /// Give up the container and keep the carrier.
    pub fn into_image(self) -> CarrierImage {
        self.image
    }

    /// Save the (possibly modified) carrier as PNG.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.image.save(path)
    }

    /// Payload bytes this carrier can hold for the given offset seed.
    pub fn capacity(&self, seed: u32) -> usize {
        carrier::capacity(self.image.pixel_count(), seed)
    }

    /// Derive the offset seed from passphrase and IV.
    pub fn offset_seed(&self, passphrase: &[u8], iv: &[u8]) -> Result<u32> {
        crypto::derive_offset_seed(passphrase, iv, self.config.seed_iterations)
    }

    /// IV currently stored in the side channel.
    pub fn read_iv(&self) -> Result<[u8; IV_BYTES]> {
        side_channel::read_iv(&self.image)
    }

    /// Salt currently stored in the side channel.
    pub fn read_salt(&self) -> Result<[u8; SALT_BYTES]> {
        side_channel::read_salt(&self.image)
    }

    /// Capacity for a passphrase, using the IV already stored in the image.
    pub fn capacity_for(&self, passphrase: &[u8]) -> Result<usize> {
        self.check_ready(passphrase)?;
        let iv = self.read_iv()?;
        let seed = Zeroizing::new(self.offset_seed(passphrase, &iv[..])?);
        Ok(self.capacity(*seed))
    }

    fn check_ready(&self, passphrase: &[u8]) -> Result<()> {
        if self.image.is_empty() {
            return Err(Error::InvalidArgument("The image has no pixels".to_string()));
        }
        if passphrase.is_empty() {
            return Err(Error::InvalidArgument("An empty key was given".to_string()));
        }
        side_channel::check_fits(&self.image)
    }

    /// Embed `data` and its file `extension` into the carrier.
    pub fn encode(
        &mut self,
        data: &[u8],
        extension: &str,
        passphrase: &[u8],
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<()> {
        self.check_ready(passphrase)?;
        if extension.len() > MAX_EXTENSION_LEN {
            return Err(Error::InvalidArgument(format!(
                "Extension is {} bytes, at most {} allowed",
                extension.len(),
                MAX_EXTENSION_LEN
            )));
        }

        let mut record = SecretBytes::zeroed(0);
        record.extend_from_slice(extension.as_bytes());
        record.extend_from_slice(data);

        let mut iv = Zeroizing::new([0u8; IV_BYTES]);
        self.random.fill(&mut iv[..])?;
        debug!(iv = %hex::encode(*iv), "generated IV");
        let seed = Zeroizing::new(self.offset_seed(passphrase, &iv[..])?);

        notify(observer, Stage::Compressing);
        let compressed = compression::compress(&record, self.config.compression_level)?;
        drop(record);

        let needed = compressed.len() + AEAD_OVERHEAD;
        let available = self.capacity(*seed);
        debug!(needed, available, "capacity check");
        if needed > available {
            warn!(needed, available, "payload does not fit into carrier");
            return Err(Error::CapacityExceeded { needed, available });
        }
        let ciphertext_len = u32::try_from(needed).map_err(|_| Error::CapacityExceeded {
            needed,
            available: u32::MAX as usize,
        })?;

        let mut salt = Zeroizing::new([0u8; SALT_BYTES]);
        self.random.fill(&mut salt[..])?;
        debug!(salt = %hex::encode(*salt), "generated salt");

        notify(observer, Stage::Encrypting);
        let header = header_bytes(extension.len() as u8, ciphertext_len);
        let ciphertext = crypto::encrypt(
            &compressed,
            &CipherInput {
                passphrase,
                iv: &iv[..],
                salt: &salt[..],
                aad: &header,
                iterations: self.config.key_iterations,
            },
        )?;
        drop(compressed);
        debug_assert_eq!(ciphertext.len(), needed);

        // Every fallible step is done; from here on the pixels change.
        notify(observer, Stage::Embedding);
        side_channel::write_salt(&mut self.image, &salt)?;
        side_channel::write_iv(&mut self.image, &iv)?;

        let mut writer = BitWriter::new(&mut self.image, *seed);
        writer.write_byte(extension.len() as u8)?;
        writer.write_u32(ciphertext_len)?;
        writer.write_bytes(&ciphertext)?;
        let touched = writer.bits_written();

        info!(bytes = needed, pixels = touched, available, "embedded payload");
        Ok(())
    }

    /// Read a file and embed it, using its extension.
    ///
    /// The extension is everything after the first dot of the file name
    /// that is not its leading character, so `a.tar.gz` stores `tar.gz`.
    pub fn encode_file(
        &mut self,
        path: &Path,
        passphrase: &[u8],
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(Error::InvalidArgument("An empty filename was given".to_string()));
        }
        let data = SecretBytes::new(std::fs::read(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?);
        let extension = extension_of(path);

        self.encode(&data, &extension, passphrase, observer)
    }

    /// Extract the hidden data and its extension.
    pub fn decode(
        &self,
        passphrase: &[u8],
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<Extracted> {
        self.check_ready(passphrase)?;

        let iv = self.read_iv()?;
        let seed = Zeroizing::new(self.offset_seed(passphrase, &iv[..])?);
        let capacity = self.capacity(*seed);

        let mut reader = BitReader::new(&self.image, *seed);
        drop(seed);
        let extension_len = reader.read_byte()?;
        let ciphertext_len = reader.read_u32()?;

        let announced = ciphertext_len as usize;
        if announced > capacity {
            warn!(announced, capacity, "announced length exceeds capacity");
            return Err(Error::CorruptedHeader {
                announced,
                capacity,
            });
        }

        notify(observer, Stage::Extracting);
        let ciphertext = reader.read_bytes(announced)?;
        debug!(pixels = reader.bits_read(), "read payload bits");
        let salt = self.read_salt()?;
        debug!(iv = %hex::encode(iv), salt = %hex::encode(salt), "read side channel");

        notify(observer, Stage::Decrypting);
        let header = header_bytes(extension_len, ciphertext_len);
        let compressed = crypto::decrypt(
            &ciphertext,
            &CipherInput {
                passphrase,
                iv: &iv,
                salt: &salt,
                aad: &header,
                iterations: self.config.key_iterations,
            },
        )?;

        notify(observer, Stage::Decompressing);
        let record = compression::decompress(&compressed)?;
        drop(compressed);

        let extension_len = extension_len as usize;
        if extension_len > record.len() {
            return Err(Error::CorruptedHeader {
                announced: extension_len,
                capacity: record.len(),
            });
        }
        let (extension, data) = record.split_at(extension_len);
        let extracted = Extracted {
            extension: String::from_utf8_lossy(extension).into_owned(),
            data: SecretBytes::from_slice(data),
        };

        info!(bytes = extracted.data.len(), "extracted payload");
        Ok(extracted)
    }

    /// Extract and write the hidden file.
    ///
    /// The stored extension is appended unless `path` already ends with it.
    /// If writing fails and `backup` is given, it receives the decrypted
    /// bytes so they are not lost. Returns the path written.
    pub fn decode_to_file(
        &self,
        path: &Path,
        passphrase: &[u8],
        backup: Option<&mut Vec<u8>>,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<PathBuf> {
        if path.as_os_str().is_empty() {
            return Err(Error::InvalidArgument("An empty filename was given".to_string()));
        }

        let extracted = self.decode(passphrase, observer)?;
        let target = output_path(path, &extracted.extension);

        notify(observer, Stage::Writing);
        if let Err(source) = std::fs::write(&target, &extracted.data[..]) {
            if let Some(backup) = backup {
                backup.zeroize();
                *backup = extracted.data.into_inner();
            }
            return Err(Error::Write {
                path: target,
                source,
            });
        }

        Ok(target)
    }
}

/// The 5-byte length header, authenticated as associated data.
fn header_bytes(extension_len: u8, ciphertext_len: u32) -> [u8; 5] {
    let len = ciphertext_len.to_le_bytes();
    [extension_len, len[0], len[1], len[2], len[3]]
}

/// Everything after the first non-leading dot of the file name.
fn extension_of(path: &Path) -> String {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return String::new(),
    };
    match name.char_indices().skip(1).find(|&(_, c)| c == '.') {
        Some((dot, _)) => name[dot + 1..].to_string(),
        None => String::new(),
    }
}

/// Append `.extension` to `path` unless it is already there.
fn output_path(path: &Path, extension: &str) -> PathBuf {
    if extension.is_empty() {
        return path.to_path_buf();
    }
    if extension.contains(['/', '\\']) || extension == ".." {
        warn!("stored extension contains path separators, ignoring it");
        return path.to_path_buf();
    }

    let suffix = format!(".{}", extension);
    if path.to_string_lossy().ends_with(&suffix) {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(&suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carrier::Pixel;
    use std::cell::RefCell;

    const PASSPHRASE: &[u8] = b"StrongPasswordNotReally";

    fn container(width: u32, height: u32) -> StegoContainer {
        let image = CarrierImage::filled(width, height, Pixel::new(0, 0, 0, 0xFF));
        StegoContainer::with_config(image, StegoConfig::fast())
            .unwrap()
            .with_random(Box::new(FixedRandom(0x7F)))
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut c = container(64, 64);
        c.encode(b"PNGStego", "txt", PASSPHRASE, None).unwrap();

        let extracted = c.decode(PASSPHRASE, None).unwrap();
        assert_eq!(&*extracted.data, b"PNGStego");
        assert_eq!(extracted.extension, "txt");
    }

    #[test]
    fn test_empty_payload_and_extension() {
        let mut c = container(64, 64);
        c.encode(b"", "", PASSPHRASE, None).unwrap();

        let extracted = c.decode(PASSPHRASE, None).unwrap();
        assert!(extracted.data.is_empty());
        assert!(extracted.extension.is_empty());
    }

    #[test]
    fn test_side_channel_holds_random_bytes() {
        let mut c = container(64, 64);
        c.encode(b"PNGStego", "txt", PASSPHRASE, None).unwrap();

        assert_eq!(c.read_iv().unwrap(), [0x7F; IV_BYTES]);
        assert_eq!(c.read_salt().unwrap(), [0x7F; SALT_BYTES]);
    }

    #[test]
    fn test_deterministic_with_fixed_random() {
        let mut a = container(64, 64);
        let mut b = container(64, 64);
        a.encode(b"PNGStego", "txt", PASSPHRASE, None).unwrap();
        b.encode(b"PNGStego", "txt", PASSPHRASE, None).unwrap();

        assert_eq!(a.image(), b.image());
    }

    #[test]
    fn test_wrong_passphrase_fails() {
        let mut c = container(64, 64);
        c.encode(b"PNGStego", "txt", PASSPHRASE, None).unwrap();

        let err = c.decode(b"NotThePassword", None).unwrap_err();
        assert!(matches!(
            err,
            Error::Authentication | Error::CorruptedHeader { .. }
        ));
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let mut c = container(64, 64);
        let before = c.image().clone();

        assert!(matches!(
            c.encode(b"data", "txt", b"", None),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(c.decode(b"", None), Err(Error::InvalidArgument(_))));
        assert_eq!(c.image(), &before);
    }

    #[test]
    fn test_empty_image_rejected() {
        let mut c = container(0, 0);
        assert!(matches!(
            c.encode(b"data", "txt", PASSPHRASE, None),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_image_too_small_for_side_channel() {
        let mut c = container(10, 10);
        assert!(matches!(
            c.encode(b"x", "", PASSPHRASE, None),
            Err(Error::ImageTooSmall { .. })
        ));
    }

    #[test]
    fn test_oversize_leaves_image_untouched() {
        let mut c = container(32, 32);
        let before = c.image().clone();
        let data: Vec<u8> = (0..5000u32).map(|i| (i.wrapping_mul(2654435761) >> 11) as u8).collect();

        let err = c.encode(&data, "bin", PASSPHRASE, None).unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { .. }));
        assert_eq!(c.image(), &before);
    }

    #[test]
    fn test_extension_too_long() {
        let mut c = container(64, 64);
        let extension = "x".repeat(256);
        assert!(matches!(
            c.encode(b"data", &extension, PASSPHRASE, None),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_stages_reported_in_order() {
        let seen = RefCell::new(Vec::new());
        let observer = |stage: Stage| seen.borrow_mut().push(stage);

        let mut c = container(64, 64);
        c.encode(b"PNGStego", "txt", PASSPHRASE, Some(&observer)).unwrap();
        c.decode(PASSPHRASE, Some(&observer)).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                Stage::Compressing,
                Stage::Encrypting,
                Stage::Embedding,
                Stage::Extracting,
                Stage::Decrypting,
                Stage::Decompressing,
            ]
        );
    }

    #[test]
    fn test_capacity_for_uses_stored_iv() {
        let mut c = container(64, 64);
        c.encode(b"PNGStego", "txt", PASSPHRASE, None).unwrap();

        let seed = c.offset_seed(PASSPHRASE, &[0x7F; IV_BYTES]).unwrap();
        assert_eq!(c.capacity_for(PASSPHRASE).unwrap(), c.capacity(seed));
    }

    /// Hands out 0x7F bytes once, then fails.
    struct FailingRandom {
        calls: usize,
    }

    impl SecureRandom for FailingRandom {
        fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
            self.calls += 1;
            if self.calls > 1 {
                return Err(Error::Encryption("random source exhausted".to_string()));
            }
            dest.fill(0x7F);
            Ok(())
        }
    }

    #[test]
    fn test_salt_failure_leaves_image_untouched() {
        let mut c = container(64, 64);
        let before = c.image().clone();

        c.set_random(Box::new(FailingRandom { calls: 0 }));
        assert!(matches!(
            c.encode(b"PNGStego", "txt", PASSPHRASE, None),
            Err(Error::Encryption(_))
        ));
        assert_eq!(c.image(), &before);

        c.set_random(Box::new(FixedRandom(0x7F)));
        c.encode(b"PNGStego", "txt", PASSPHRASE, None).unwrap();
        assert_eq!(&*c.decode(PASSPHRASE, None).unwrap().data, b"PNGStego");
    }

    #[test]
    fn test_extension_starts_at_first_inner_dot() {
        assert_eq!(extension_of(Path::new("backup.tar.gz")), "tar.gz");
        assert_eq!(extension_of(Path::new("dir/a.tar.gz")), "tar.gz");
        assert_eq!(extension_of(Path::new("notes.txt")), "txt");
        assert_eq!(extension_of(Path::new(".bashrc")), "");
        assert_eq!(extension_of(Path::new(".config.json")), "json");
        assert_eq!(extension_of(Path::new("dir.d/README")), "");
        assert_eq!(extension_of(Path::new("")), "");
    }

    #[test]
    fn test_header_layout() {
        assert_eq!(header_bytes(3, 0x0102_0304), [3, 4, 3, 2, 1]);
    }

    #[test]
    fn test_output_path_appends_extension() {
        assert_eq!(output_path(Path::new("out"), "txt"), PathBuf::from("out.txt"));
        assert_eq!(output_path(Path::new("out.txt"), "txt"), PathBuf::from("out.txt"));
        assert_eq!(output_path(Path::new("out"), ""), PathBuf::from("out"));
        assert_eq!(output_path(Path::new("out"), "../x"), PathBuf::from("out"));
    }
}
