use super::{LedBuffer, check_position};
use crate::{
    color::{BLACK, Rgb},
    error::BufferError,
};

/// One color triplet per LED.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenseBuffer<const LEDS: usize> {
    leds: [Rgb; LEDS],
}

impl<const LEDS: usize> DenseBuffer<LEDS> {
    /// Create a buffer with every LED set to the background color.
    pub const fn new() -> Self {
        Self {
            leds: [BLACK; LEDS],
        }
    }

    /// All LEDs in string order.
    pub const fn as_slice(&self) -> &[Rgb] {
        &self.leds
    }

    pub fn as_mut_slice(&mut self) -> &mut [Rgb] {
        &mut self.leds
    }
}

impl<const LEDS: usize> Default for DenseBuffer<LEDS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const LEDS: usize> From<[Rgb; LEDS]> for DenseBuffer<LEDS> {
    fn from(leds: [Rgb; LEDS]) -> Self {
        Self { leds }
    }
}

impl<const LEDS: usize> LedBuffer for DenseBuffer<LEDS> {
    const COUNT: usize = LEDS;
    const STORAGE_SIZE: usize = core::mem::size_of::<[Rgb; LEDS]>();

    fn get(&mut self, position: usize) -> Result<&mut Rgb, BufferError> {
        check_position(position, LEDS)?;
        Ok(&mut self.leds[position])
    }

    fn color_at(&self, position: usize) -> Result<Rgb, BufferError> {
        check_position(position, LEDS)?;
        Ok(self.leds[position])
    }

    fn clear(&mut self) {
        self.leds.fill(BLACK);
    }
}
