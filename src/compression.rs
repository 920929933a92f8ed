//! bzip2 compression of the payload record.
//!
//! The record is compressed before encryption so that the capacity gate sees
//! the reduced size.

use crate::crypto::SecretBytes;
use crate::error::{Error, Result};
use bzip2::read::{BzDecoder, BzEncoder};
use bzip2::Compression;
use std::io::Read;

/// Compress data with bzip2 at the given level (1..=9).
pub fn compress(data: &[u8], level: u32) -> Result<SecretBytes> {
    let mut encoder = BzEncoder::new(data, Compression::new(level));
    let mut compressed = Vec::with_capacity(data.len() / 2 + 64);

    if let Err(e) = encoder.read_to_end(&mut compressed) {
        drop(SecretBytes::new(compressed));
        return Err(Error::Io(e));
    }

    Ok(SecretBytes::new(compressed))
}

/// Decompress a bzip2 stream produced by `compress`.
pub fn decompress(data: &[u8]) -> Result<SecretBytes> {
    if data.is_empty() {
        return Err(Error::Decompression("empty stream".to_string()));
    }

    let mut decoder = BzDecoder::new(data);
    let mut decompressed = SecretBytes::default();
    let mut chunk = SecretBytes::zeroed(8192);

    loop {
        let n = decoder
            .read(&mut chunk)
            .map_err(|e| Error::Decompression(e.to_string()))?;
        if n == 0 {
            break;
        }
        decompressed.extend_from_slice(&chunk[..n]);
    }

    Ok(decompressed)
}
