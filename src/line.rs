//! Data line access.
//!
//! [`WireLine`] is the narrow seam between the transmitter and the hardware:
//! it knows how to hold the latch period and how to emit a single bit slot.
//! Targets that need cycle-exact output implement it with their own
//! instruction sequence. [`BitBangLine`] is a portable implementation on top
//! of the `embedded-hal` pin and delay traits.

use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::timing::TickBudget;

/// One-wire output that emits protocol bit slots.
pub trait WireLine {
    type Error;

    /// Hold the line low long enough to latch the previous frame.
    fn latch(&mut self) -> Result<(), Self::Error>;

    /// Emit a single bit slot.
    fn write_bit(&mut self, bit: bool) -> Result<(), Self::Error>;

    /// Emit eight bit slots, most significant bit first.
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        for shift in (0..8).rev() {
            self.write_bit(byte & (1 << shift) != 0)?;
        }
        Ok(())
    }
}

impl<L: WireLine + ?Sized> WireLine for &mut L {
    type Error = L::Error;

    fn latch(&mut self) -> Result<(), Self::Error> {
        L::latch(self)
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), Self::Error> {
        L::write_bit(self, bit)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        L::write_byte(self, byte)
    }
}

/// Phase lengths in nanoseconds, precomputed from a tick budget.
#[derive(Debug, Clone, Copy)]
struct PhaseDelays {
    zero_high: u32,
    zero_low: u32,
    one_high: u32,
    one_low: u32,
    latch: u32,
}

impl PhaseDelays {
    const fn new(budget: &TickBudget) -> Self {
        Self {
            zero_high: budget.ticks_to_ns(budget.high_ticks(false)),
            zero_low: budget.ticks_to_ns(budget.low_ticks(false)),
            one_high: budget.ticks_to_ns(budget.high_ticks(true)),
            one_low: budget.ticks_to_ns(budget.low_ticks(true)),
            latch: budget.ticks_to_ns(budget.latch),
        }
    }
}

/// Bit-banged data line driven through a GPIO pin and a delay provider.
///
/// The delay provider must be precise at sub-microsecond resolution for the
/// output to stay within the protocol windows.
pub struct BitBangLine<P, D> {
    pin: P,
    delay: D,
    phases: PhaseDelays,
}

impl<P: OutputPin, D: DelayNs> BitBangLine<P, D> {
    /// Create a new line and pull it low.
    ///
    /// The pin must already be configured as an output.
    pub fn new(mut pin: P, delay: D, budget: &TickBudget) -> Result<Self, P::Error> {
        pin.set_low()?;
        Ok(Self {
            pin,
            delay,
            phases: PhaseDelays::new(budget),
        })
    }

    /// Give back the pin and the delay provider.
    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }
}

impl<P: OutputPin, D: DelayNs> WireLine for BitBangLine<P, D> {
    type Error = P::Error;

    fn latch(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low()?;
        self.delay.delay_ns(self.phases.latch);
        Ok(())
    }

    #[inline]
    fn write_bit(&mut self, bit: bool) -> Result<(), Self::Error> {
        let (high, low) = if bit {
            (self.phases.one_high, self.phases.one_low)
        } else {
            (self.phases.zero_high, self.phases.zero_low)
        };
        self.pin.set_high()?;
        self.delay.delay_ns(high);
        self.pin.set_low()?;
        self.delay.delay_ns(low);
        Ok(())
    }
}
