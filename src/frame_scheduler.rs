//! Frame scheduling and timing utilities.
//!
//! One cooperative loop: let the animation mutate the buffer, send the
//! buffer, wait, repeat. Mutation and transmission never overlap, and a
//! frame that has started always runs to completion. The loop can only be
//! stopped between frames.

use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::{
    line::WireLine,
    transmit::{FrameSource, Transmitter},
};

/// Default delay between frames (40 FPS).
pub const DEFAULT_FRAME_DURATION: Duration = Duration::from_millis(25);

/// Result of a frame tick operation.
#[derive(Debug, Clone, Copy)]
pub struct FrameResult {
    /// The deadline for the next frame.
    pub next_deadline: Instant,
    /// How long to wait until the next frame (may be zero if behind schedule).
    pub sleep_duration: Duration,
}

/// Drives a buffer and a transmitter frame by frame.
///
/// # Usage.
///
/// ```ignore
/// let mut scheduler = FrameScheduler::new(transmitter, SparseBuffer::<60, 38>::new());
///
/// loop {
///     let now = Instant::from_millis(get_current_time_ms());
///     let result = scheduler.tick(now, |leds| chasers.step(leds))?;
///
///     // Platform-specific sleep
///     sleep_ms(result.sleep_duration.as_millis());
/// }
/// ```
pub struct FrameScheduler<L: WireLine, B: FrameSource> {
    transmitter: Transmitter<L>,
    buffer: B,
    next_frame: Instant,
    frame_duration: Duration,
}

impl<L: WireLine, B: FrameSource> FrameScheduler<L, B> {
    /// Create a new frame scheduler.
    ///
    /// Uses `DEFAULT_FRAME_DURATION` for frame timing.
    pub fn new(transmitter: Transmitter<L>, buffer: B) -> Self {
        Self::with_frame_duration(transmitter, buffer, DEFAULT_FRAME_DURATION)
    }

    /// Create a new frame scheduler with custom frame duration.
    pub fn with_frame_duration(
        transmitter: Transmitter<L>,
        buffer: B,
        frame_duration: Duration,
    ) -> Self {
        Self {
            transmitter,
            buffer,
            next_frame: Instant::from_millis(0),
            frame_duration,
        }
    }

    /// Render and send one frame, then return timing information.
    ///
    /// If we've fallen more than two frames behind, the schedule restarts
    /// from `now` instead of bursting to catch up. The caller is responsible
    /// for waiting until `next_deadline` before calling `tick` again.
    pub fn tick<F>(&mut self, now: Instant, render: F) -> Result<FrameResult, L::Error>
    where
        F: FnOnce(&mut B),
    {
        let max_drift = Duration::from_millis(self.frame_duration.as_millis() * 2);
        if now.as_millis() > self.next_frame.as_millis() + max_drift.as_millis() {
            #[cfg(feature = "esp32-log")]
            println!(
                "[FrameScheduler.tick] {:?} ms behind, resetting schedule",
                now.as_millis() - self.next_frame.as_millis()
            );
            self.next_frame = now;
        }

        render(&mut self.buffer);
        self.transmitter.send(&self.buffer)?;

        self.next_frame += self.frame_duration;

        let sleep_duration = if self.next_frame.as_millis() > now.as_millis() {
            Duration::from_millis(self.next_frame.as_millis() - now.as_millis())
        } else {
            Duration::from_millis(0)
        };

        Ok(FrameResult {
            next_deadline: self.next_frame,
            sleep_duration,
        })
    }

    /// Run the frame loop with a fixed delay between frames.
    ///
    /// Runs `iterations` frames, or forever if `None`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn run<D, F>(
        &mut self,
        iterations: Option<u32>,
        delay: &mut D,
        mut render: F,
    ) -> Result<(), L::Error>
    where
        D: DelayNs,
        F: FnMut(&mut B),
    {
        let frame_us = self.frame_duration.as_micros().min(u64::from(u32::MAX)) as u32;
        let mut frame = 0u32;
        while iterations.is_none_or(|limit| frame < limit) {
            render(&mut self.buffer);
            self.transmitter.send(&self.buffer)?;
            delay.delay_us(frame_us);
            frame = frame.wrapping_add(1);
        }
        Ok(())
    }

    pub const fn buffer(&self) -> &B {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut B {
        &mut self.buffer
    }

    pub const fn transmitter(&self) -> &Transmitter<L> {
        &self.transmitter
    }

    /// Give back the transmitter and the buffer.
    pub fn release(self) -> (Transmitter<L>, B) {
        (self.transmitter, self.buffer)
    }
}
