//! Frame transmission.
//!
//! A frame is a latch period followed by 24 bits per LED in string order.
//! Dense buffers are sent LED by LED. Sparse buffers stream their background
//! runs as zero bytes without ever decoding them into colors.
//!
//! The whole frame is sent inside a critical section: an interrupt handler
//! that runs in the middle of a bit stretches it and corrupts the rest of
//! the frame.

use embedded_hal::{delay::DelayNs, digital::OutputPin};
use smart_leds::SmartLedsWrite;
use thiserror::Error;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::{
    buffer::{DenseBuffer, SparseBuffer},
    color::{ChannelOrder, Rgb, TRIPLET_SIZE},
    line::{BitBangLine, WireLine},
    timing::{ProtocolTiming, ProtocolTolerance, TickBudget, TimingError},
};

/// Configuration of the transmitter.
#[derive(Debug, Clone, Copy)]
pub struct TransmitterConfig {
    /// Controller clock frequency.
    pub clock_hz: u32,
    /// Channel order expected by the LED string.
    pub order: ChannelOrder,
    /// Nominal phase lengths.
    pub timing: ProtocolTiming,
    /// Accepted phase lengths.
    pub tolerance: ProtocolTolerance,
}

impl TransmitterConfig {
    /// WS2811 string on an 8 MHz controller.
    pub const WS2811_8MHZ: Self = Self::ws2811(8_000_000);
    /// WS2811 string on a 9.6 MHz controller.
    pub const WS2811_9_6MHZ: Self = Self::ws2811(9_600_000);

    /// WS2811 string in GRB order on a controller running at `clock_hz`.
    pub const fn ws2811(clock_hz: u32) -> Self {
        Self {
            clock_hz,
            order: ChannelOrder::Grb,
            timing: ProtocolTiming::WS2811,
            tolerance: ProtocolTolerance::WS2811,
        }
    }

    /// Set the channel order.
    #[must_use]
    pub const fn with_order(mut self, order: ChannelOrder) -> Self {
        self.order = order;
        self
    }

    /// Tick budget for the configured clock.
    pub const fn budget(&self) -> TickBudget {
        TickBudget::from_clock(self.clock_hz, &self.timing)
    }

    /// Tick budget for the configured clock, if it meets the tolerances.
    pub fn validate(&self) -> Result<TickBudget, TimingError> {
        let budget = self.budget();
        if let Err(error) = budget.validate(&self.tolerance) {
            #[cfg(feature = "esp32-log")]
            println!(
                "[TransmitterConfig.validate] {:?} Hz rejected: {:?}",
                self.clock_hz, error
            );
            return Err(error);
        }
        Ok(budget)
    }
}

/// Error creating a bit-banged transmitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SetupError<E> {
    #[error(transparent)]
    Timing(#[from] TimingError),
    #[error("failed to drive the data pin low")]
    Pin(E),
}

/// Writes colors onto a line in wire channel order.
pub struct FrameWriter<'a, L: WireLine> {
    line: &'a mut L,
    order: ChannelOrder,
}

impl<'a, L: WireLine> FrameWriter<'a, L> {
    pub fn new(line: &'a mut L, order: ChannelOrder) -> Self {
        Self { line, order }
    }

    /// Emit the 24 bits of one LED.
    #[inline]
    pub fn write_color(&mut self, color: Rgb) -> Result<(), L::Error> {
        for byte in self.order.wire_bytes(color) {
            self.line.write_byte(byte)?;
        }
        Ok(())
    }

    /// Emit `count` background LEDs.
    ///
    /// Background is black, which is all zero bits in any channel order.
    pub fn write_background(&mut self, count: usize) -> Result<(), L::Error> {
        for _ in 0..count * TRIPLET_SIZE {
            self.line.write_byte(0)?;
        }
        Ok(())
    }
}

/// Buffer that can be streamed as one frame.
pub trait FrameSource {
    /// Write every LED in string order.
    fn write_frame<L: WireLine>(&self, out: &mut FrameWriter<'_, L>) -> Result<(), L::Error>;
}

impl<const LEDS: usize> FrameSource for DenseBuffer<LEDS> {
    fn write_frame<L: WireLine>(&self, out: &mut FrameWriter<'_, L>) -> Result<(), L::Error> {
        for color in self.as_slice() {
            out.write_color(*color)?;
        }
        Ok(())
    }
}

impl<const LEDS: usize, const CAPACITY: usize> FrameSource for SparseBuffer<LEDS, CAPACITY> {
    fn write_frame<L: WireLine>(&self, out: &mut FrameWriter<'_, L>) -> Result<(), L::Error> {
        for segment in self.segments() {
            out.write_background(usize::from(segment.gap))?;
            for color in segment.colors {
                out.write_color(*color)?;
            }
        }
        out.write_background(usize::from(self.trailing_gap()))
    }
}

/// Sends buffers to an LED string.
pub struct Transmitter<L> {
    line: L,
    order: ChannelOrder,
}

impl<L: WireLine> Transmitter<L> {
    pub const fn new(line: L, order: ChannelOrder) -> Self {
        Self { line, order }
    }

    /// Send one frame.
    ///
    /// Blocks until the last bit is out. Interrupts stay disabled for the
    /// whole frame.
    pub fn send<B: FrameSource>(&mut self, buffer: &B) -> Result<(), L::Error> {
        let order = self.order;
        let line = &mut self.line;
        critical_section::with(|_| {
            line.latch()?;
            buffer.write_frame(&mut FrameWriter::new(line, order))
        })
    }

    pub const fn order(&self) -> ChannelOrder {
        self.order
    }

    pub const fn line(&self) -> &L {
        &self.line
    }

    /// Give back the line.
    pub fn release(self) -> L {
        self.line
    }
}

impl<P: OutputPin, D: DelayNs> Transmitter<BitBangLine<P, D>> {
    /// Create a transmitter that bit-bangs `pin`.
    ///
    /// Fails if the configured clock cannot meet the protocol timing.
    pub fn bit_bang(
        pin: P,
        delay: D,
        config: &TransmitterConfig,
    ) -> Result<Self, SetupError<P::Error>> {
        let budget = config.validate()?;
        let line = BitBangLine::new(pin, delay, &budget).map_err(SetupError::Pin)?;
        Ok(Self::new(line, config.order))
    }
}

impl<L: WireLine> SmartLedsWrite for Transmitter<L> {
    type Error = L::Error;
    type Color = Rgb;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        let order = self.order;
        let line = &mut self.line;
        critical_section::with(|_| {
            line.latch()?;
            let mut out = FrameWriter::new(line, order);
            for color in iterator {
                out.write_color(color.into())?;
            }
            Ok(())
        })
    }
}
