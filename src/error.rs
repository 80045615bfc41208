//! Errors returned by LED buffers.

use thiserror::Error;

/// Error returned when addressing a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Position is not part of the LED string.
    #[error("position {position} is outside of a string of {count} leds")]
    OutOfRange { position: usize, count: usize },
    /// The sparse arena has no room for another colored run.
    #[error("sparse arena needs {required} bytes, but holds only {capacity}")]
    CapacityExceeded { required: usize, capacity: usize },
}
