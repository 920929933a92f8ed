//! Carrier image: a row-major RGBA pixel buffer and its PNG codec boundary.

use crate::error::{Error, Result};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageFormat};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// The eight leading bytes of every PNG stream.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A colour channel of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
    Alpha,
}

/// One 32-bit RGBA pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pixel {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Pixel {
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub fn channel(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
            Channel::Alpha => self.alpha,
        }
    }

    fn channel_mut(&mut self, channel: Channel) -> &mut u8 {
        match channel {
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
            Channel::Alpha => &mut self.alpha,
        }
    }

    /// Least-significant bit of a channel.
    pub fn lsb(&self, channel: Channel) -> u8 {
        self.channel(channel) & 1
    }

    /// Replace the least-significant bit of a channel.
    pub fn set_lsb(&mut self, channel: Channel, bit: u8) {
        let value = self.channel_mut(channel);
        *value = (*value & !1) | (bit & 1);
    }
}

/// A decoded raster image held as flat RGBA pixels.
///
/// The pixel count always equals `width * height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierImage {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
    has_alpha: bool,
}

impl CarrierImage {
    /// Wrap a pixel buffer, checking it matches the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<Pixel>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::InvalidArgument("Image dimensions overflow".to_string()))?;
        if pixels.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "Pixel buffer has {} pixels, expected {}x{} = {}",
                pixels.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
            has_alpha: true,
        })
    }

    /// A solid image of one colour.
    pub fn filled(width: u32, height: u32, pixel: Pixel) -> Self {
        Self {
            width,
            height,
            pixels: vec![pixel; width as usize * height as usize],
            has_alpha: true,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Whether the source had an alpha channel. RGB sources are saved as RGB.
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    pub fn set_has_alpha(&mut self, has_alpha: bool) {
        self.has_alpha = has_alpha;
    }

    /// Read the LSB of `channel` at pixel `index`.
    pub fn lsb(&self, index: usize, channel: Channel) -> Option<u8> {
        self.pixels.get(index).map(|p| p.lsb(channel))
    }

    /// Write the LSB of `channel` at pixel `index`.
    pub fn set_lsb(&mut self, index: usize, channel: Channel, bit: u8) -> Result<()> {
        let available = self.pixels.len();
        let pixel = self.pixels.get_mut(index).ok_or(Error::ImageTooSmall {
            needed: index + 1,
            available,
        })?;
        pixel.set_lsb(channel, bit);
        Ok(())
    }

    /// Decode a PNG stream held in memory.
    pub fn from_png_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PNG_SIGNATURE.len() || bytes[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
            return Err(Error::InvalidFormat);
        }

        let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
        let has_alpha = decoded.color().has_alpha();
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();

        let pixels = rgba
            .pixels()
            .map(|p| Pixel::new(p[0], p[1], p[2], p[3]))
            .collect();

        let mut carrier = Self::new(width, height, pixels)?;
        carrier.has_alpha = has_alpha;
        Ok(carrier)
    }

    /// Decode a PNG stream from a reader.
    pub fn from_png_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_png_bytes(&bytes)
    }

    /// Load a PNG file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_png_bytes(&bytes)
    }

    /// Encode the image as PNG into a writer.
    pub fn write_png<W: Write>(&self, writer: W) -> Result<()> {
        if self.pixels.is_empty() {
            return Err(Error::InvalidArgument(
                "Trying to save an empty PNG".to_string(),
            ));
        }

        let (raw, color) = if self.has_alpha {
            (self.to_raw(4), ColorType::Rgba8)
        } else {
            (self.to_raw(3), ColorType::Rgb8)
        };

        PngEncoder::new(writer).write_image(&raw, self.width, self.height, color)?;
        Ok(())
    }

    /// Encode the image as PNG into a byte vector.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_png(&mut out)?;
        Ok(out)
    }

    /// Save the image as a PNG file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        self.write_png(&mut writer)?;
        writer.flush().map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    /// Flatten to interleaved channel bytes, 3 (RGB) or 4 (RGBA) per pixel.
    fn to_raw(&self, channels: usize) -> Vec<u8> {
        let mut raw = Vec::with_capacity(self.pixels.len() * channels);
        for p in &self.pixels {
            raw.extend_from_slice(&[p.red, p.green, p.blue]);
            if channels == 4 {
                raw.push(p.alpha);
            }
        }
        raw
    }
}
