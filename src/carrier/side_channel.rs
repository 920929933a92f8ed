//! Salt and IV at fixed pixel positions.
//!
//! Both must be readable before any key exists, so neither depends on the
//! position sequencer. The salt occupies the green LSB of pixels
//! `[0, 128)`; the IV occupies the red LSB of the 96 pixels centred on
//! `pixel_count / 2`.

use crate::carrier::raster::{CarrierImage, Channel};
use crate::config::{IV_BYTES, SALT_BYTES};
use crate::error::{Error, Result};

/// Channel holding the salt.
pub const SALT_CHANNEL: Channel = Channel::Green;

/// Channel holding the IV.
pub const IV_CHANNEL: Channel = Channel::Red;

const SALT_BITS: usize = SALT_BYTES * 8;
const IV_BITS: usize = IV_BYTES * 8;

/// Smallest pixel count that can hold both salt and IV.
pub const MIN_PIXELS: usize = if SALT_BITS > IV_BITS { SALT_BITS } else { IV_BITS };

/// Fail with a size violation unless both placements fit.
pub fn check_fits(image: &CarrierImage) -> Result<()> {
    salt_start(image)?;
    iv_start(image)?;
    Ok(())
}

fn salt_start(image: &CarrierImage) -> Result<usize> {
    if image.pixel_count() < SALT_BITS {
        return Err(Error::ImageTooSmall {
            needed: SALT_BITS,
            available: image.pixel_count(),
        });
    }
    Ok(0)
}

fn iv_start(image: &CarrierImage) -> Result<usize> {
    let mid = image.pixel_count() / 2;
    if mid < IV_BITS / 2 {
        return Err(Error::ImageTooSmall {
            needed: IV_BITS,
            available: image.pixel_count(),
        });
    }
    Ok(mid - IV_BITS / 2)
}

fn write_bits(image: &mut CarrierImage, start: usize, channel: Channel, bytes: &[u8]) -> Result<()> {
    for i in 0..bytes.len() * 8 {
        let bit = (bytes[i / 8] >> (i % 8)) & 1;
        image.set_lsb(start + i, channel, bit)?;
    }
    Ok(())
}

fn read_bits<const N: usize>(image: &CarrierImage, start: usize, channel: Channel) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    for i in 0..N * 8 {
        let bit = image.lsb(start + i, channel).ok_or(Error::ImageTooSmall {
            needed: start + i + 1,
            available: image.pixel_count(),
        })?;
        out[i / 8] |= bit << (i % 8);
    }
    Ok(out)
}

pub fn write_salt(image: &mut CarrierImage, salt: &[u8; SALT_BYTES]) -> Result<()> {
    let start = salt_start(image)?;
    write_bits(image, start, SALT_CHANNEL, salt)
}

pub fn read_salt(image: &CarrierImage) -> Result<[u8; SALT_BYTES]> {
    let start = salt_start(image)?;
    read_bits(image, start, SALT_CHANNEL)
}

pub fn write_iv(image: &mut CarrierImage, iv: &[u8; IV_BYTES]) -> Result<()> {
    let start = iv_start(image)?;
    write_bits(image, start, IV_CHANNEL, iv)
}

pub fn read_iv(image: &CarrierImage) -> Result<[u8; IV_BYTES]> {
    let start = iv_start(image)?;
    read_bits(image, start, IV_CHANNEL)
}
