//! Host-side simulation of the data line.
//!
//! [`LogicAnalyzer`] hands out a virtual output pin and a virtual clock. The
//! pin records every level change against the clock, which only advances
//! when something delays. Feeding both into a [`BitBangLine`] produces the
//! exact waveform the line would put on the wire, which [`LogicAnalyzer::decode`]
//! then checks against the protocol windows and turns back into bytes.
//!
//! [`BitBangLine`]: crate::line::BitBangLine

use core::{cell::RefCell, convert::Infallible};

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, OutputPin},
};
use heapless::Vec;
use thiserror::Error;

use crate::timing::ProtocolTolerance;

/// Line level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Level change at a point in virtual time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub at_ns: u64,
    pub level: Level,
}

/// Captured waveform that does not decode into a valid frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("capture buffer overflowed")]
    Overflow,
    #[error("line was low for only {low_ns} ns before the first bit")]
    MissingLatch { low_ns: u64 },
    #[error("bit {bit}: {level:?} phase of {ns} ns is outside the protocol windows")]
    Timing { bit: usize, level: Level, ns: u64 },
    #[error("line latched in the middle of the frame after bit {bit}")]
    UnexpectedLatch { bit: usize },
    #[error("line was left high")]
    Unterminated,
    #[error("frame ends with {bits} bits of an incomplete byte")]
    PartialByte { bits: usize },
    #[error("frame is longer than {capacity} bytes")]
    FrameTooLong { capacity: usize },
}

#[derive(Debug)]
struct Capture<const CAPACITY: usize> {
    now_ns: u64,
    level: Level,
    edges: Vec<Edge, CAPACITY>,
    overflowed: bool,
}

/// Records the waveform on a virtual data line.
///
/// `CAPACITY` is the number of level changes that can be stored. A frame of
/// `n` LEDs needs `48 * n` of them.
#[derive(Debug)]
pub struct LogicAnalyzer<const CAPACITY: usize> {
    capture: RefCell<Capture<CAPACITY>>,
}

impl<const CAPACITY: usize> LogicAnalyzer<CAPACITY> {
    /// Create an analyzer at time zero with the line low.
    pub const fn new() -> Self {
        Self {
            capture: RefCell::new(Capture {
                now_ns: 0,
                level: Level::Low,
                edges: Vec::new(),
                overflowed: false,
            }),
        }
    }

    /// Virtual output pin connected to this analyzer.
    pub const fn pin(&self) -> ProbePin<'_, CAPACITY> {
        ProbePin { analyzer: self }
    }

    /// Virtual clock driving this analyzer.
    pub const fn clock(&self) -> ProbeClock<'_, CAPACITY> {
        ProbeClock { analyzer: self }
    }

    /// Recorded level changes.
    pub fn edges(&self) -> Vec<Edge, CAPACITY> {
        self.capture.borrow().edges.clone()
    }

    /// Number of rising edges, which equals the number of bits sent.
    pub fn pulse_count(&self) -> usize {
        self.capture
            .borrow()
            .edges
            .iter()
            .filter(|edge| edge.level == Level::High)
            .count()
    }

    /// Virtual time elapsed since creation or the last reset.
    pub fn elapsed_ns(&self) -> u64 {
        self.capture.borrow().now_ns
    }

    /// Forget the recorded waveform and restart the clock, keeping the level.
    pub fn reset(&self) {
        let mut capture = self.capture.borrow_mut();
        capture.now_ns = 0;
        capture.edges.clear();
        capture.overflowed = false;
    }

    /// Check the waveform against `tolerance` and return the bytes it carries.
    ///
    /// The capture must start with a latch period and contain one frame.
    pub fn decode<const BYTES: usize>(
        &self,
        tolerance: &ProtocolTolerance,
    ) -> Result<Vec<u8, BYTES>, DecodeError> {
        let capture = self.capture.borrow();
        if capture.overflowed {
            return Err(DecodeError::Overflow);
        }

        let mut bytes = Vec::new();
        let edges = &capture.edges;
        let Some(first) = edges.first() else {
            return Ok(bytes);
        };
        if first.at_ns < u64::from(tolerance.latch_min_ns) {
            return Err(DecodeError::MissingLatch {
                low_ns: first.at_ns,
            });
        }

        let mut current = 0u8;
        let mut bits = 0usize;
        for (bit, pair) in edges.chunks(2).enumerate() {
            let [rise, fall] = pair else {
                return Err(DecodeError::Unterminated);
            };
            let high_ns = fall.at_ns - rise.at_ns;
            let value = if tolerance.zero_high.contains(high_ns) {
                false
            } else if tolerance.one_high.contains(high_ns) {
                true
            } else {
                return Err(DecodeError::Timing {
                    bit,
                    level: Level::High,
                    ns: high_ns,
                });
            };

            let window = if value {
                tolerance.one_low
            } else {
                tolerance.zero_low
            };
            match edges.get(2 * bit + 2) {
                Some(next) => {
                    let low_ns = next.at_ns - fall.at_ns;
                    if low_ns >= u64::from(tolerance.latch_min_ns) {
                        return Err(DecodeError::UnexpectedLatch { bit });
                    }
                    if !window.contains(low_ns) {
                        return Err(DecodeError::Timing {
                            bit,
                            level: Level::Low,
                            ns: low_ns,
                        });
                    }
                }
                None => {
                    // The line idles low after the last bit
                    let low_ns = capture.now_ns - fall.at_ns;
                    if low_ns < u64::from(window.min_ns) {
                        return Err(DecodeError::Timing {
                            bit,
                            level: Level::Low,
                            ns: low_ns,
                        });
                    }
                }
            }

            current = (current << 1) | u8::from(value);
            bits += 1;
            if bits % 8 == 0 {
                bytes
                    .push(current)
                    .map_err(|_| DecodeError::FrameTooLong { capacity: BYTES })?;
                current = 0;
            }
        }

        if bits % 8 != 0 {
            return Err(DecodeError::PartialByte { bits: bits % 8 });
        }
        Ok(bytes)
    }

    fn drive(&self, level: Level) {
        let mut capture = self.capture.borrow_mut();
        if capture.level == level {
            return;
        }
        capture.level = level;
        let edge = Edge {
            at_ns: capture.now_ns,
            level,
        };
        if capture.edges.push(edge).is_err() {
            capture.overflowed = true;
        }
    }

    fn advance(&self, ns: u32) {
        self.capture.borrow_mut().now_ns += u64::from(ns);
    }
}

impl<const CAPACITY: usize> Default for LogicAnalyzer<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

/// Output pin that records into a [`LogicAnalyzer`].
pub struct ProbePin<'a, const CAPACITY: usize> {
    analyzer: &'a LogicAnalyzer<CAPACITY>,
}

impl<const CAPACITY: usize> ErrorType for ProbePin<'_, CAPACITY> {
    type Error = Infallible;
}

impl<const CAPACITY: usize> OutputPin for ProbePin<'_, CAPACITY> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.analyzer.drive(Level::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.analyzer.drive(Level::High);
        Ok(())
    }
}

/// Delay provider that advances the clock of a [`LogicAnalyzer`].
pub struct ProbeClock<'a, const CAPACITY: usize> {
    analyzer: &'a LogicAnalyzer<CAPACITY>,
}

impl<const CAPACITY: usize> DelayNs for ProbeClock<'_, CAPACITY> {
    fn delay_ns(&mut self, ns: u32) {
        self.analyzer.advance(ns);
    }
}
