mod order;

use smart_leds::RGB8;

pub use order::ChannelOrder;

/// Three independent 8-bit intensities, stored as red, green, blue.
///
/// The order on the wire is chosen separately with [`ChannelOrder`].
pub type Rgb = RGB8;

/// Size of one color triplet in bytes.
pub const TRIPLET_SIZE: usize = core::mem::size_of::<Rgb>();

/// Background color of every LED that was never written.
pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
