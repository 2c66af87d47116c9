//! HSV color model for the animation engine
//!
//! All compositing happens in HSV space; conversion to RGB is left to the
//! driver at the very end of a frame. Monochrome matrices (the `mono`
//! feature) keep the same struct and use only the value channel.

use smart_leds::hsv::{Hsv, hsv2rgb};

pub type Rgb = smart_leds::RGB8;

/// One LED's color for a single frame.
///
/// Carries no animation identity; derived fresh each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub hue: u8,
    pub sat: u8,
    pub val: u8,
}

impl Color {
    /// Black / LED off.
    pub const OFF: Self = Self::new(0, 0, 0);

    pub const fn new(hue: u8, sat: u8, val: u8) -> Self {
        Self { hue, sat, val }
    }

    /// Color holding only a brightness level (monochrome matrices).
    pub const fn from_val(val: u8) -> Self {
        Self { hue: 0, sat: 0, val }
    }

    /// A color is "off" when its value channel is zero, regardless of hue
    /// and saturation.
    pub const fn is_off(self) -> bool {
        self.val == 0
    }

    /// Convert to RGB for drivers with per-channel outputs.
    pub fn to_rgb(self) -> Rgb {
        hsv2rgb(Hsv {
            hue: self.hue,
            sat: self.sat,
            val: self.val,
        })
    }
}

/// Build a color from a single derived channel (noise, shimmer, random).
///
/// RGB matrices treat the channel as a fully saturated hue; monochrome
/// matrices treat it as the brightness level.
#[cfg(not(feature = "mono"))]
pub(crate) const fn channel_color(level: u8) -> Color {
    Color::new(level, 0xFF, 0xFF)
}

#[cfg(feature = "mono")]
pub(crate) const fn channel_color(level: u8) -> Color {
    Color::from_val(level)
}
