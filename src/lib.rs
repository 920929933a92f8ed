//! PNG Steganography
//!
//! Hides an encrypted, compressed file inside the least significant bits of
//! a lossless PNG image.
//!
//! # Features
//!
//! - **Double encryption**: Serpent-GCM wrapped in AES-256-GCM, both keyed by PBKDF2-HMAC-Whirlpool
//! - **Scattered embedding**: payload bits land on pixels chosen by a passphrase-seeded sequencer
//! - **Compression**: bzip2 before encryption
//! - **Fail closed**: any tag mismatch or corrupt header yields no plaintext
//!
//! # Architecture
//!
//! ```text
//! Data → Compress (bzip2) → Encrypt (Serpent-GCM, AES-GCM) → Embed (blue LSBs)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use png_stego::StegoContainer;
//! use std::path::Path;
//!
//! let mut container = StegoContainer::load(Path::new("cover.png")).unwrap();
//! container.encode(b"Hidden data", "txt", b"password", None).unwrap();
//! container.save(Path::new("stego.png")).unwrap();
//!
//! let container = StegoContainer::load(Path::new("stego.png")).unwrap();
//! let extracted = container.decode(b"password", None).unwrap();
//! assert_eq!(&*extracted.data, b"Hidden data");
//! ```

pub mod carrier;
pub mod compression;
pub mod config;
pub mod container;
pub mod crypto;
pub mod error;

pub use carrier::CarrierImage;
pub use config::StegoConfig;
pub use container::{Extracted, ProgressObserver, Stage, StegoContainer};
pub use error::{Error, Result};
