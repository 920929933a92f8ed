//! Pixel-level transport.
//!
//! This module handles:
//! - The carrier image and its PNG codec boundary
//! - Deterministic pixel selection and capacity
//! - The sequenced payload channel and the fixed salt/IV side channel

pub mod bit_channel;
mod capacity;
mod raster;
mod sequencer;
pub mod side_channel;

pub use bit_channel::{BitReader, BitWriter};
pub use capacity::{available_bits, capacity, net_capacity};
pub use raster::{CarrierImage, Channel, Pixel, PNG_SIGNATURE};
pub use sequencer::PositionSequencer;
