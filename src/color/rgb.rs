//! Floating-point color used by palettes.

use serde::{Deserialize, Serialize};

use super::{Color32, get_blue, get_green, get_red, to_color32};

/// RGB color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a color from byte channels.
    pub fn from_bytes(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    pub fn from_color32(color: Color32) -> Self {
        Self::from_bytes(get_red(color), get_green(color), get_blue(color))
    }

    #[inline]
    fn channel_byte(v: f32) -> u8 {
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    pub fn r_byte(&self) -> u8 {
        Self::channel_byte(self.r)
    }

    pub fn g_byte(&self) -> u8 {
        Self::channel_byte(self.g)
    }

    pub fn b_byte(&self) -> u8 {
        Self::channel_byte(self.b)
    }

    pub fn to_color32(&self) -> Color32 {
        to_color32(
            self.r_byte() as i32,
            self.g_byte() as i32,
            self.b_byte() as i32,
        )
    }
}
