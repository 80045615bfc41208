//! Sparse LED buffer.
//!
//! The arena holds a sequence of segments:
//!
//! ```text
//! <gap> <count> R G B R G B ... <gap> <count> R G B ... <gap> 0
//! ```
//!
//! `gap` is the number of background LEDs before the segment, counted from
//! the end of the previous segment, and `count` is the number of colors that
//! follow. A header with a zero `count` is the trailing background run and
//! ends the encoding. Every byte after the encoding is zero, so a trailing
//! run of length zero needs no bytes at all.
//!
//! The sum of all gaps and counts, including the trailing run, always equals
//! the number of LEDs. Only the first segment may have a zero gap: touching
//! runs are merged as soon as they meet.

#[cfg(feature = "esp32-log")]
use esp_println::println;

use super::{LedBuffer, check_position};
use crate::{
    color::{BLACK, Rgb, TRIPLET_SIZE},
    error::BufferError,
};

const HEADER_SIZE: usize = 2;

/// Arena bytes needed for `segments` colored runs holding `lit` LEDs in total,
/// including the trailing background run.
pub const fn required_capacity(segments: usize, lit: usize) -> usize {
    segments * HEADER_SIZE + lit * TRIPLET_SIZE + HEADER_SIZE
}

/// LED string stored as runs of background and colored LEDs.
///
/// `LEDS` is limited to 255 because run lengths are stored as bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseBuffer<const LEDS: usize, const CAPACITY: usize> {
    arena: [u8; CAPACITY],
}

/// A run of colored LEDs preceded by `gap` background LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub gap: u8,
    pub colors: &'a [Rgb],
}

/// Iterator over the colored segments of a [`SparseBuffer`].
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    headers: Headers<'a>,
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let header = self.headers.next()?;
        if header.is_trailing() {
            return None;
        }
        let arena = self.headers.arena;
        Some(Segment {
            gap: header.gap_byte(),
            colors: bytemuck::cast_slice(&arena[header.colors_offset()..header.next_offset()]),
        })
    }
}

/// Decoded segment header.
#[derive(Debug, Clone, Copy)]
struct Header {
    /// Arena offset of the gap byte.
    offset: usize,
    /// String position at which the gap starts.
    start: usize,
    gap: usize,
    /// Zero for the trailing run.
    count: usize,
}

impl Header {
    const EMPTY: Self = Self {
        offset: 0,
        start: 0,
        gap: 0,
        count: 0,
    };

    const fn lit_start(&self) -> usize {
        self.start + self.gap
    }

    const fn end(&self) -> usize {
        self.lit_start() + self.count
    }

    const fn is_trailing(&self) -> bool {
        self.count == 0
    }

    const fn colors_offset(&self) -> usize {
        self.offset + HEADER_SIZE
    }

    const fn next_offset(&self) -> usize {
        self.colors_offset() + self.count * TRIPLET_SIZE
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn gap_byte(&self) -> u8 {
        self.gap as u8
    }

    /// Bytes used by the encoding, if this is the trailing run.
    const fn encoded_end(&self) -> usize {
        if self.gap == 0 {
            self.offset
        } else {
            self.offset + HEADER_SIZE
        }
    }
}

/// Walks the headers of an arena, always ending with the trailing run.
#[derive(Debug, Clone)]
struct Headers<'a> {
    arena: &'a [u8],
    offset: usize,
    position: usize,
    done: bool,
}

impl<'a> Headers<'a> {
    const fn new(arena: &'a [u8]) -> Self {
        Self {
            arena,
            offset: 0,
            position: 0,
            done: false,
        }
    }
}

impl Iterator for Headers<'_> {
    type Item = Header;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let (gap, count) = match self.arena.get(self.offset..self.offset + HEADER_SIZE) {
            Some(&[gap, count]) => (usize::from(gap), usize::from(count)),
            // No room for another header: the string ends with the last segment
            _ => (0, 0),
        };
        let header = Header {
            offset: self.offset,
            start: self.position,
            gap,
            count,
        };
        if header.is_trailing() {
            self.done = true;
        } else {
            self.offset = header.next_offset();
            self.position = header.end();
        }
        Some(header)
    }
}

impl<const LEDS: usize, const CAPACITY: usize> SparseBuffer<LEDS, CAPACITY> {
    const VALID: () = {
        assert!(LEDS <= u8::MAX as usize, "sparse buffers hold at most 255 leds");
        assert!(CAPACITY >= HEADER_SIZE, "sparse arena must fit at least one header");
    };

    /// Create a buffer with every LED set to the background color.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new() -> Self {
        let () = Self::VALID;
        let mut arena = [0; CAPACITY];
        arena[0] = LEDS as u8;
        Self { arena }
    }

    /// Colored segments in string order.
    pub fn segments(&self) -> Segments<'_> {
        Segments {
            headers: self.headers(),
        }
    }

    /// Number of background LEDs after the last segment.
    pub fn trailing_gap(&self) -> u8 {
        self.trailing().gap_byte()
    }

    /// Bytes of the arena currently used by the encoding.
    pub fn encoded_len(&self) -> usize {
        self.trailing().encoded_end()
    }

    /// Raw arena contents.
    pub const fn as_bytes(&self) -> &[u8; CAPACITY] {
        &self.arena
    }

    fn headers(&self) -> Headers<'_> {
        Headers::new(&self.arena)
    }

    fn trailing(&self) -> Header {
        self.headers().last().unwrap_or(Header::EMPTY)
    }

    /// Find the arena offset of the color at `position`, creating it if the
    /// LED is currently part of a background run.
    fn slot_for(&mut self, position: usize) -> Result<usize, BufferError> {
        let mut previous: Option<Header> = None;
        let mut target = None;
        for header in self.headers() {
            if position < header.lit_start() {
                target = Some(header);
                break;
            }
            if position < header.end() {
                return Ok(header.colors_offset() + (position - header.lit_start()) * TRIPLET_SIZE);
            }
            previous = Some(header);
        }
        let Some(run) = target else {
            // Every position below LEDS is covered by some run
            return Err(BufferError::OutOfRange {
                position,
                count: LEDS,
            });
        };

        let touches_previous = previous.is_some() && position == run.start;
        let touches_next = !run.is_trailing() && position + 1 == run.lit_start();
        let used = self.encoded_len();

        match (previous, touches_previous, touches_next) {
            (Some(previous), true, true) => {
                // The gap was a single LED: previous, new and next become one run
                self.reserve(used + TRIPLET_SIZE - HEADER_SIZE)?;
                let merged = previous.count + 1 + run.count;
                self.shift_left(run.offset + HEADER_SIZE, HEADER_SIZE);
                self.shift_right(run.offset, TRIPLET_SIZE);
                self.write_header(previous.offset, previous.gap, merged);
                Ok(run.offset)
            }
            (Some(previous), true, false) => {
                // Extend the previous run by one LED
                let rest = run.gap - 1;
                let elided = run.is_trailing() && rest == 0;
                let required = if elided {
                    used + TRIPLET_SIZE - HEADER_SIZE
                } else {
                    used + TRIPLET_SIZE
                };
                self.reserve(required)?;
                self.shift_right(run.offset, TRIPLET_SIZE);
                self.write_header(previous.offset, previous.gap, previous.count + 1);
                if !elided {
                    self.write_header(run.offset + TRIPLET_SIZE, rest, run.count);
                }
                self.zero_from(required);
                Ok(run.offset)
            }
            (_, _, true) => {
                // Prepend to the next run
                self.reserve(used + TRIPLET_SIZE)?;
                self.shift_right(run.colors_offset(), TRIPLET_SIZE);
                self.write_header(run.offset, run.gap - 1, run.count + 1);
                Ok(run.colors_offset())
            }
            _ => {
                // Split the gap around a new single-LED run
                let before = position - run.start;
                let after = run.lit_start() - position - 1;
                let elided = run.is_trailing() && after == 0;
                let inserted = HEADER_SIZE + TRIPLET_SIZE;
                let required = if elided {
                    used + inserted - HEADER_SIZE
                } else {
                    used + inserted
                };
                self.reserve(required)?;
                self.shift_right(run.offset, inserted);
                self.write_header(run.offset, before, 1);
                if !elided {
                    self.write_header(run.offset + inserted, after, run.count);
                }
                self.zero_from(required);
                Ok(run.offset + HEADER_SIZE)
            }
        }
    }

    /// Fail unless an encoding of `required` bytes fits into the arena.
    fn reserve(&self, required: usize) -> Result<(), BufferError> {
        if required <= CAPACITY {
            return Ok(());
        }
        #[cfg(feature = "esp32-log")]
        println!(
            "[SparseBuffer.reserve] arena exhausted: {:?} of {:?} bytes",
            required, CAPACITY
        );
        Err(BufferError::CapacityExceeded {
            required,
            capacity: CAPACITY,
        })
    }

    /// Move `[start..)` right by `distance` bytes, zero-filling the vacated head.
    ///
    /// Bytes pushed past the end of the arena are dropped.
    fn shift_right(&mut self, start: usize, distance: usize) {
        debug_assert!(start + distance <= CAPACITY);
        self.arena.copy_within(start..CAPACITY - distance, start + distance);
        self.arena[start..start + distance].fill(0);
    }

    /// Move `[start..)` left by `distance` bytes, zero-filling the vacated tail.
    fn shift_left(&mut self, start: usize, distance: usize) {
        debug_assert!(distance <= start && start <= CAPACITY);
        self.arena.copy_within(start..CAPACITY, start - distance);
        self.arena[CAPACITY - distance..].fill(0);
    }

    fn zero_from(&mut self, offset: usize) {
        self.arena[offset..].fill(0);
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_header(&mut self, offset: usize, gap: usize, count: usize) {
        self.arena[offset] = gap as u8;
        self.arena[offset + 1] = count as u8;
    }
}

impl<const LEDS: usize, const CAPACITY: usize> Default for SparseBuffer<LEDS, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const LEDS: usize, const CAPACITY: usize> LedBuffer for SparseBuffer<LEDS, CAPACITY> {
    const COUNT: usize = LEDS;
    const STORAGE_SIZE: usize = CAPACITY;

    /// Get the color at `position`, creating a slot for it if needed.
    ///
    /// A new slot holds the background color. Returns `CapacityExceeded`
    /// without touching the arena if the new slot does not fit.
    fn get(&mut self, position: usize) -> Result<&mut Rgb, BufferError> {
        check_position(position, LEDS)?;
        let slot = self.slot_for(position)?;
        Ok(bytemuck::from_bytes_mut(
            &mut self.arena[slot..slot + TRIPLET_SIZE],
        ))
    }

    fn color_at(&self, position: usize) -> Result<Rgb, BufferError> {
        check_position(position, LEDS)?;
        for header in self.headers() {
            if position < header.lit_start() {
                break;
            }
            if position < header.end() {
                let slot =
                    header.colors_offset() + (position - header.lit_start()) * TRIPLET_SIZE;
                return Ok(*bytemuck::from_bytes(&self.arena[slot..slot + TRIPLET_SIZE]));
            }
        }
        Ok(BLACK)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn clear(&mut self) {
        self.arena.fill(0);
        self.arena[0] = LEDS as u8;
    }
}
