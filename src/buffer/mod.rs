//! LED buffers.
//!
//! Two representations of a logical LED string share the [`LedBuffer`]
//! interface:
//! - [`DenseBuffer`] stores one [`Rgb`] per LED
//! - [`SparseBuffer`] stores runs of background LEDs and colored LEDs in a
//!   fixed byte arena, for strings that are mostly dark
//!
//! Animation code and the transmitter are written once against the trait and
//! work with either buffer.

mod dense;
mod sparse;

pub use dense::DenseBuffer;
pub use sparse::{Segment, Segments, SparseBuffer, required_capacity};

use crate::{color::Rgb, error::BufferError};

/// Size information of a buffer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor {
    /// Number of LEDs in the logical string.
    pub count: usize,
    /// Bytes of backing storage.
    pub storage_size: usize,
}

/// Addressable LED string with a fixed number of LEDs.
pub trait LedBuffer {
    /// Number of LEDs in the logical string.
    const COUNT: usize;
    /// Bytes of backing storage.
    const STORAGE_SIZE: usize;

    /// Capability descriptor of this buffer type.
    const DESCRIPTOR: BufferDescriptor = BufferDescriptor {
        count: Self::COUNT,
        storage_size: Self::STORAGE_SIZE,
    };

    /// Get a mutable reference to the color at `position`.
    ///
    /// Writes through the reference are visible to later reads and to the
    /// next transmitted frame.
    fn get(&mut self, position: usize) -> Result<&mut Rgb, BufferError>;

    /// Read the color at `position` without changing the buffer.
    fn color_at(&self, position: usize) -> Result<Rgb, BufferError>;

    /// Reset every LED to the background color.
    fn clear(&mut self);

    /// Write a color at `position`.
    fn set(&mut self, position: usize, color: Rgb) -> Result<(), BufferError> {
        *self.get(position)? = color;
        Ok(())
    }

    /// Number of LEDs in the logical string.
    fn len(&self) -> usize {
        Self::COUNT
    }

    /// Check if the string has no LEDs at all.
    fn is_empty(&self) -> bool {
        Self::COUNT == 0
    }
}

/// Fail with `OutOfRange` unless `position` addresses one of `count` LEDs.
pub(crate) const fn check_position(position: usize, count: usize) -> Result<(), BufferError> {
    if position < count {
        Ok(())
    } else {
        Err(BufferError::OutOfRange { position, count })
    }
}
