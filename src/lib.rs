#![no_std]

pub mod buffer;
pub mod color;
pub mod error;
pub mod frame_scheduler;
pub mod line;
#[cfg(feature = "sim")]
pub mod sim;
pub mod timing;
pub mod transmit;

pub use buffer::{BufferDescriptor, DenseBuffer, LedBuffer, SparseBuffer};
pub use color::{ChannelOrder, Rgb};
pub use error::BufferError;
pub use frame_scheduler::{FrameResult, FrameScheduler};
pub use line::{BitBangLine, WireLine};
pub use timing::{ProtocolTiming, ProtocolTolerance, TickBudget, TimingError};
pub use transmit::{FrameSource, FrameWriter, SetupError, Transmitter, TransmitterConfig};
pub use embassy_time::{Duration, Instant};
