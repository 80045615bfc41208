use super::Rgb;

/// Order in which channel bytes are shifted onto the data line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Green, red, blue. Native order of WS2811/WS2812 controllers.
    #[default]
    Grb,
    /// Red, green, blue. Some strings are wired in this order.
    Rgb,
}

impl ChannelOrder {
    /// Arrange the channels of `color` in transmission order.
    #[inline]
    pub const fn wire_bytes(self, color: Rgb) -> [u8; 3] {
        match self {
            Self::Grb => [color.g, color.r, color.b],
            Self::Rgb => [color.r, color.g, color.b],
        }
    }
}
