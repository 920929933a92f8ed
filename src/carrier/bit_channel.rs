//! Sequenced payload bits in the blue channel LSB.
//!
//! Bits are written LSB-first within each byte, one per pixel, at the
//! positions produced by the [`PositionSequencer`].

use crate::carrier::raster::{CarrierImage, Channel};
use crate::carrier::sequencer::PositionSequencer;
use crate::crypto::SecretBytes;
use crate::error::{Error, Result};

/// Channel that carries the sequenced payload.
pub const PAYLOAD_CHANNEL: Channel = Channel::Blue;

/// Writes bits into the carrier along the pixel sequence.
pub struct BitWriter<'a> {
    image: &'a mut CarrierImage,
    positions: PositionSequencer,
    written: usize,
}

impl<'a> BitWriter<'a> {
    /// Start writing at the first sequenced pixel for `seed`.
    pub fn new(image: &'a mut CarrierImage, seed: u32) -> Self {
        Self {
            image,
            positions: PositionSequencer::new(seed),
            written: 0,
        }
    }

    /// Write one bit into the next sequenced pixel.
    pub fn write_bit(&mut self, bit: u8) -> Result<()> {
        let pos = next_position(&mut self.positions, self.image.pixel_count())?;
        self.image.set_lsb(pos, PAYLOAD_CHANNEL, bit)?;
        self.written += 1;
        Ok(())
    }

    /// Write a byte, least-significant bit first.
    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        for i in 0..8 {
            self.write_bit((byte >> i) & 1)?;
        }
        Ok(())
    }

    /// Write a 32-bit value, least-significant bit first.
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        for i in 0..32 {
            self.write_bit(((value >> i) & 1) as u8)?;
        }
        Ok(())
    }

    /// Write each byte in order.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        bytes.iter().try_for_each(|&b| self.write_byte(b))
    }

    /// Number of pixels touched so far.
    pub fn bits_written(&self) -> usize {
        self.written
    }
}

/// Reads bits from the carrier along the pixel sequence.
pub struct BitReader<'a> {
    image: &'a CarrierImage,
    positions: PositionSequencer,
    read: usize,
}

impl<'a> BitReader<'a> {
    /// Start reading at the first sequenced pixel for `seed`.
    pub fn new(image: &'a CarrierImage, seed: u32) -> Self {
        Self {
            image,
            positions: PositionSequencer::new(seed),
            read: 0,
        }
    }

    /// Read one bit from the next sequenced pixel.
    pub fn read_bit(&mut self) -> Result<u8> {
        let pixel_count = self.image.pixel_count();
        let pos = next_position(&mut self.positions, pixel_count)?;
        let bit = self.image.lsb(pos, PAYLOAD_CHANNEL).ok_or(Error::ImageTooSmall {
            needed: pos + 1,
            available: pixel_count,
        })?;
        self.read += 1;
        Ok(bit)
    }

    /// Read a byte, least-significant bit first.
    pub fn read_byte(&mut self) -> Result<u8> {
        let mut byte = 0u8;
        for i in 0..8 {
            byte |= self.read_bit()? << i;
        }
        Ok(byte)
    }

    /// Read a 32-bit value, least-significant bit first.
    pub fn read_u32(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for i in 0..32 {
            value |= (self.read_bit()? as u32) << i;
        }
        Ok(value)
    }

    /// Read `len` bytes into a buffer that is wiped on drop.
    pub fn read_bytes(&mut self, len: usize) -> Result<SecretBytes> {
        let mut bytes = SecretBytes::zeroed(len);
        for byte in bytes.iter_mut() {
            *byte = self.read_byte()?;
        }
        Ok(bytes)
    }

    /// Number of pixels read so far.
    pub fn bits_read(&self) -> usize {
        self.read
    }
}

fn next_position(positions: &mut PositionSequencer, pixel_count: usize) -> Result<usize> {
    match positions.next() {
        Some(pos) if pos < pixel_count => Ok(pos),
        Some(pos) => Err(Error::ImageTooSmall {
            needed: pos + 1,
            available: pixel_count,
        }),
        None => Err(Error::ImageTooSmall {
            needed: pixel_count + 1,
            available: pixel_count,
        }),
    }
}
