//! Wire protocol timing contract.
//!
//! Every bit occupies one fixed-length slot that starts with the line high.
//! A zero bit drops the line early, a one bit drops it late. A frame starts
//! after the line has been held low for at least the latch period.
//!
//! Nominal phase lengths live in [`ProtocolTiming`]. For a given controller
//! clock they are quantised into a [`TickBudget`], which must be validated
//! against the accepted windows in [`ProtocolTolerance`] before it is used.
//! There is no way to detect a mistimed frame at runtime: the LEDs simply
//! show wrong colors.

use thiserror::Error;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Nominal phase lengths in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolTiming {
    /// High phase of a zero bit.
    pub zero_high_ns: u32,
    /// High phase of a one bit.
    pub one_high_ns: u32,
    /// Length of a full bit slot.
    pub bit_ns: u32,
    /// Low period that latches the previous frame.
    pub latch_ns: u32,
}

impl ProtocolTiming {
    /// WS2811 (high speed mode) and WS2812 timings.
    pub const WS2811: Self = Self {
        zero_high_ns: 350,
        one_high_ns: 700,
        bit_ns: 1250,
        latch_ns: 50_000,
    };
}

/// Inclusive range of accepted phase lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub min_ns: u32,
    pub max_ns: u32,
}

impl Window {
    pub const fn new(min_ns: u32, max_ns: u32) -> Self {
        Self { min_ns, max_ns }
    }

    pub const fn contains(self, ns: u64) -> bool {
        ns >= self.min_ns as u64 && ns <= self.max_ns as u64
    }
}

/// Phase lengths the receiving controllers accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolTolerance {
    pub zero_high: Window,
    pub one_high: Window,
    pub zero_low: Window,
    pub one_low: Window,
    /// Shortest low period that still latches a frame.
    pub latch_min_ns: u32,
    /// Shortest instruction path between two writes to the output port.
    pub min_phase_ticks: u32,
}

impl ProtocolTolerance {
    pub const WS2811: Self = Self {
        zero_high: Window::new(200, 500),
        one_high: Window::new(550, 1000),
        zero_low: Window::new(450, 5000),
        one_low: Window::new(200, 5000),
        latch_min_ns: 40_000,
        min_phase_ticks: 2,
    };
}

/// Part of the waveform a timing value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ZeroHigh,
    ZeroLow,
    OneHigh,
    OneLow,
    Latch,
}

/// Tick budget that cannot produce a valid waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimingError {
    #[error("controller clock frequency is zero")]
    NoClock,
    #[error("{phase:?} lasts {ns} ns, outside of {min_ns}..={max_ns} ns")]
    OutOfWindow {
        phase: Phase,
        ns: u64,
        min_ns: u32,
        max_ns: u32,
    },
    #[error("{phase:?} lasts {ticks} ticks, the port needs at least {min_ticks}")]
    TooFewTicks {
        phase: Phase,
        ticks: u32,
        min_ticks: u32,
    },
}

/// Phase lengths expressed in controller clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickBudget {
    pub clock_hz: u32,
    pub zero_high: u32,
    pub one_high: u32,
    pub bit: u32,
    pub latch: u32,
}

impl TickBudget {
    /// WS2811 budget for an 8 MHz controller.
    pub const AT_8MHZ: Self = Self::from_clock(8_000_000, &ProtocolTiming::WS2811);
    /// WS2811 budget for a 9.6 MHz controller.
    pub const AT_9_6MHZ: Self = Self::from_clock(9_600_000, &ProtocolTiming::WS2811);

    /// Quantise nominal timings into ticks, rounding to the nearest tick.
    pub const fn from_clock(clock_hz: u32, timing: &ProtocolTiming) -> Self {
        Self {
            clock_hz,
            zero_high: ns_to_ticks(timing.zero_high_ns, clock_hz),
            one_high: ns_to_ticks(timing.one_high_ns, clock_hz),
            bit: ns_to_ticks(timing.bit_ns, clock_hz),
            latch: ns_to_ticks(timing.latch_ns, clock_hz),
        }
    }

    pub const fn zero_low(&self) -> u32 {
        self.bit.saturating_sub(self.zero_high)
    }

    pub const fn one_low(&self) -> u32 {
        self.bit.saturating_sub(self.one_high)
    }

    /// Ticks the line stays high for `bit`.
    pub const fn high_ticks(&self, bit: bool) -> u32 {
        if bit { self.one_high } else { self.zero_high }
    }

    /// Ticks the line stays low for `bit`.
    pub const fn low_ticks(&self, bit: bool) -> u32 {
        if bit { self.one_low() } else { self.zero_low() }
    }

    /// Convert ticks to nanoseconds, rounding down.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn ticks_to_ns(&self, ticks: u32) -> u32 {
        if self.clock_hz == 0 {
            return 0;
        }
        (ticks as u64 * NANOS_PER_SECOND / self.clock_hz as u64) as u32
    }

    /// Check every phase against the accepted windows.
    ///
    /// Run this once per target clock, in a test or at startup.
    pub fn validate(&self, tolerance: &ProtocolTolerance) -> Result<(), TimingError> {
        if self.clock_hz == 0 {
            return Err(TimingError::NoClock);
        }
        let phases = [
            (Phase::ZeroHigh, self.high_ticks(false), tolerance.zero_high),
            (Phase::ZeroLow, self.low_ticks(false), tolerance.zero_low),
            (Phase::OneHigh, self.high_ticks(true), tolerance.one_high),
            (Phase::OneLow, self.low_ticks(true), tolerance.one_low),
        ];
        for (phase, ticks, window) in phases {
            if ticks < tolerance.min_phase_ticks {
                return Err(TimingError::TooFewTicks {
                    phase,
                    ticks,
                    min_ticks: tolerance.min_phase_ticks,
                });
            }
            let ns = u64::from(self.ticks_to_ns(ticks));
            if !window.contains(ns) {
                return Err(TimingError::OutOfWindow {
                    phase,
                    ns,
                    min_ns: window.min_ns,
                    max_ns: window.max_ns,
                });
            }
        }
        let latch_ns = self.ticks_to_ns(self.latch);
        if latch_ns < tolerance.latch_min_ns {
            return Err(TimingError::OutOfWindow {
                phase: Phase::Latch,
                ns: u64::from(latch_ns),
                min_ns: tolerance.latch_min_ns,
                max_ns: u32::MAX,
            });
        }
        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn ns_to_ticks(ns: u32, clock_hz: u32) -> u32 {
    ((ns as u64 * clock_hz as u64 + NANOS_PER_SECOND / 2) / NANOS_PER_SECOND) as u32
}
