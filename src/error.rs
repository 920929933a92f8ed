//! Error types for PNG steganography.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for steganography operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while hiding or extracting data.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller contract violation (empty passphrase, empty filename, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The stream does not start with a PNG signature.
    #[error("Invalid file format: not a PNG image")]
    InvalidFormat,

    /// PNG colour layout that cannot be flattened to RGBA.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// Not enough pixels for the fixed salt/IV placement.
    #[error("Image too small: need {needed} pixels, have {available}")]
    ImageTooSmall { needed: usize, available: usize },

    /// Payload does not fit into the carrier.
    #[error("The image can't contain data that large: need {needed} bytes, have {available} bytes")]
    CapacityExceeded { needed: usize, available: usize },

    /// Announced payload length is larger than the carrier could ever hold.
    #[error("Corrupted header: announced {announced} bytes, capacity is {capacity} bytes")]
    CorruptedHeader { announced: usize, capacity: usize },

    /// One of the AEAD tags failed to verify (wrong passphrase or tampered data).
    #[error("Authentication failed: wrong passphrase or corrupted data")]
    Authentication,

    /// The compressed stream is corrupt.
    #[error("Decompression failed: {0}")]
    Decompression(String),

    /// A file could not be opened or read.
    #[error("Cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written.
    ///
    /// When extraction supplied a backup sink, it already holds the decrypted bytes.
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Key derivation error.
    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(e) => Error::Io(e),
            image::ImageError::Unsupported(u) => Error::UnsupportedFormat(u.to_string()),
            other => Error::UnsupportedFormat(other.to_string()),
        }
    }
}
