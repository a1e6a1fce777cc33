//! Bit-packed keyframes.
//!
//! Both keyframe kinds pack into a single `u16`:
//!
//! ```text
//! bit 15                 7 6           0
//!     [ time / 2 (9 bits) ][ value (7) ]
//! ```
//!
//! For [`RgbKeyframe`] the value is a palette index, for [`SimpleKeyframe`] it
//! is half the intensity.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::AnimationBits;
use super::BoundsError;
use crate::codec::read_u16;
use crate::color::Color32;
use crate::die::DieState;

/// Bits the time field is shifted by.
pub const TIME_SHIFT: u16 = 7;
/// Mask of the 7-bit value field.
pub const VALUE_MASK: u16 = 0b111_1111;
/// Mask of the 9-bit time field (after shifting).
pub const TIME_MASK: u16 = 0b1_1111_1111;
/// Milliseconds per time unit.
pub const TIME_UNIT_MS: u16 = 2;
/// Largest representable keyframe time.
pub const MAX_KEYFRAME_TIME_MS: u16 = TIME_MASK * TIME_UNIT_MS;

#[inline]
fn pack(time_ms: u16, value: u8) -> u16 {
    (((time_ms / TIME_UNIT_MS) & TIME_MASK) << TIME_SHIFT) | (value as u16 & VALUE_MASK)
}

#[inline]
fn unpack_time(packed: u16) -> u16 {
    ((packed >> TIME_SHIFT) & TIME_MASK) * TIME_UNIT_MS
}

/// Keyframe of a color curve: a time and a palette index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RgbKeyframeDef", into = "RgbKeyframeDef")]
pub struct RgbKeyframe {
    pub time_and_color: u16,
}

#[derive(Serialize, Deserialize)]
struct RgbKeyframeDef {
    time: u16,
    color_index: u8,
}

impl From<RgbKeyframeDef> for RgbKeyframe {
    fn from(def: RgbKeyframeDef) -> Self {
        Self::new(def.time, def.color_index)
    }
}

impl From<RgbKeyframe> for RgbKeyframeDef {
    fn from(kf: RgbKeyframe) -> Self {
        Self {
            time: kf.time(),
            color_index: kf.color_index(),
        }
    }
}

impl RgbKeyframe {
    pub const SIZE: usize = 2;

    /// Pack a keyframe. Time is truncated to 2 ms resolution.
    pub fn new(time_ms: u16, color_index: u8) -> Self {
        Self {
            time_and_color: pack(time_ms, color_index),
        }
    }

    /// Time in milliseconds.
    pub fn time(&self) -> u16 {
        unpack_time(self.time_and_color)
    }

    pub fn color_index(&self) -> u8 {
        (self.time_and_color & VALUE_MASK) as u8
    }

    /// Resolve the palette index against `bits`.
    pub fn color(&self, bits: &AnimationBits, die: &dyn DieState) -> Result<Color32, BoundsError> {
        bits.get_color(self.color_index() as usize, die)
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.time_and_color.to_le_bytes())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            time_and_color: read_u16(r)?,
        })
    }
}

/// Keyframe of an intensity curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "SimpleKeyframeDef", into = "SimpleKeyframeDef")]
pub struct SimpleKeyframe {
    pub time_and_intensity: u16,
}

#[derive(Serialize, Deserialize)]
struct SimpleKeyframeDef {
    time: u16,
    intensity: u8,
}

impl From<SimpleKeyframeDef> for SimpleKeyframe {
    fn from(def: SimpleKeyframeDef) -> Self {
        Self::new(def.time, def.intensity)
    }
}

impl From<SimpleKeyframe> for SimpleKeyframeDef {
    fn from(kf: SimpleKeyframe) -> Self {
        Self {
            time: kf.time(),
            intensity: kf.intensity(),
        }
    }
}

impl SimpleKeyframe {
    pub const SIZE: usize = 2;

    /// Pack a keyframe. Intensity is stored halved, so odd values lose their
    /// low bit.
    pub fn new(time_ms: u16, intensity: u8) -> Self {
        Self {
            time_and_intensity: pack(time_ms, intensity / 2),
        }
    }

    pub fn time(&self) -> u16 {
        unpack_time(self.time_and_intensity)
    }

    /// Intensity in `[0, 254]`.
    pub fn intensity(&self) -> u8 {
        ((self.time_and_intensity & VALUE_MASK) * 2) as u8
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.time_and_intensity.to_le_bytes())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            time_and_intensity: read_u16(r)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_layout_constants() {
        assert_eq!(TIME_SHIFT, 7);
        assert_eq!(VALUE_MASK, 0b1111111);
        assert_eq!(TIME_UNIT_MS, 2);
        assert_eq!(MAX_KEYFRAME_TIME_MS, 1022);
    }

    #[test]
    fn test_rgb_keyframe_packing() {
        let kf = RgbKeyframe::new(1000, 5);
        assert_eq!(kf.time_and_color, (500 << 7) | 5);
        assert_eq!(kf.time(), 1000);
        assert_eq!(kf.color_index(), 5);
    }

    #[test]
    fn test_rgb_keyframe_truncates() {
        // Odd times lose their low bit, indices keep only 7 bits
        let kf = RgbKeyframe::new(33, 0xFF);
        assert_eq!(kf.time(), 32);
        assert_eq!(kf.color_index(), 127);
    }

    #[test]
    fn test_simple_keyframe_intensity_halved() {
        let kf = SimpleKeyframe::new(200, 255);
        assert_eq!(kf.time_and_intensity, (100 << 7) | 127);
        assert_eq!(kf.intensity(), 254);
        assert_eq!(SimpleKeyframe::new(0, 7).intensity(), 6);
    }

    #[test]
    fn test_keyframe_bytes_little_endian() {
        let kf = RgbKeyframe::new(2, 1);
        let mut buf = Vec::new();
        kf.write_to(&mut buf).unwrap();
        assert_eq!(buf, vec![0x81, 0x00]);
    }

    #[test]
    fn test_keyframe_json_uses_fields() {
        let kf = RgbKeyframe::new(500, 3);
        let json = serde_json::to_string(&kf).unwrap();
        assert_eq!(json, r#"{"time":500,"color_index":3}"#);
        let back: RgbKeyframe = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kf);
    }
}
