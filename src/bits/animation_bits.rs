//! Palette, keyframe and track storage plus its wire encoding.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::{RgbKeyframe, RgbTrack, SimpleKeyframe, Track};
use crate::codec::{align4, read_u8, skip, write_padding};
use crate::color::{BLACK, Color, Color32, rainbow_wheel};
use crate::die::DieState;

/// Palette index resolved to a random color (not implemented, renders black).
pub const PALETTE_COLOR_FROM_RANDOM: usize = 126;
/// Palette index resolved to a hue derived from the current face.
pub const PALETTE_COLOR_FROM_FACE: usize = 127;
/// Largest palette a data set may carry.
pub const MAX_PALETTE_SIZE: usize = 127;

/// Bytes per palette entry on the wire.
const PALETTE_COLOR_SIZE: usize = 3;

/// Out-of-range lookup into one of the shared arrays.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Index {index} out of range for {array} (length {len})")]
pub struct BoundsError {
    pub array: &'static str,
    pub index: usize,
    pub len: usize,
}

fn checked<'a, T>(items: &'a [T], array: &'static str, index: usize) -> Result<&'a T, BoundsError> {
    items.get(index).ok_or(BoundsError {
        array,
        index,
        len: items.len(),
    })
}

/// Number of elements in each array, as announced ahead of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BitsCounts {
    pub palette: u16,
    pub rgb_keyframes: u16,
    pub rgb_tracks: u16,
    pub keyframes: u16,
    pub tracks: u16,
}

/// Shared palette and curve data for a set of animations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationBits {
    #[serde(default)]
    pub palette: Vec<Color>,
    #[serde(default)]
    pub rgb_keyframes: Vec<RgbKeyframe>,
    #[serde(default)]
    pub rgb_tracks: Vec<RgbTrack>,
    #[serde(default)]
    pub keyframes: Vec<SimpleKeyframe>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl AnimationBits {
    /// Resolve a palette index, including the two reserved sentinels.
    pub fn get_color(&self, index: usize, die: &dyn DieState) -> Result<Color32, BoundsError> {
        match index {
            PALETTE_COLOR_FROM_FACE => Ok(face_color(die)),
            PALETTE_COLOR_FROM_RANDOM => Ok(BLACK),
            _ => Ok(checked(&self.palette, "palette", index)?.to_color32()),
        }
    }

    pub fn get_rgb_keyframe(&self, index: usize) -> Result<&RgbKeyframe, BoundsError> {
        checked(&self.rgb_keyframes, "rgb_keyframes", index)
    }

    pub fn get_keyframe(&self, index: usize) -> Result<&SimpleKeyframe, BoundsError> {
        checked(&self.keyframes, "keyframes", index)
    }

    pub fn get_rgb_track(&self, index: usize) -> Result<&RgbTrack, BoundsError> {
        checked(&self.rgb_tracks, "rgb_tracks", index)
    }

    pub fn get_track(&self, index: usize) -> Result<&Track, BoundsError> {
        checked(&self.tracks, "tracks", index)
    }

    /// Append a palette color and return its index.
    pub fn push_color(&mut self, color: Color) -> u8 {
        self.palette.push(color);
        (self.palette.len() - 1) as u8
    }

    /// Append keyframes plus a track over them; returns the track index.
    pub fn push_rgb_track(&mut self, keyframes: &[RgbKeyframe], led_mask: u32) -> u16 {
        let keyframes_offset = self.rgb_keyframes.len() as u16;
        self.rgb_keyframes.extend_from_slice(keyframes);
        self.rgb_tracks.push(RgbTrack {
            keyframes_offset,
            keyframe_count: keyframes.len() as u8,
            led_mask,
        });
        (self.rgb_tracks.len() - 1) as u16
    }

    /// Append intensity keyframes plus a track over them; returns the track index.
    pub fn push_track(&mut self, keyframes: &[SimpleKeyframe], led_mask: u32) -> u16 {
        let keyframes_offset = self.keyframes.len() as u16;
        self.keyframes.extend_from_slice(keyframes);
        self.tracks.push(Track {
            keyframes_offset,
            keyframe_count: keyframes.len() as u8,
            led_mask,
        });
        (self.tracks.len() - 1) as u16
    }

    pub fn counts(&self) -> BitsCounts {
        BitsCounts {
            palette: self.palette.len() as u16,
            rgb_keyframes: self.rgb_keyframes.len() as u16,
            rgb_tracks: self.rgb_tracks.len() as u16,
            keyframes: self.keyframes.len() as u16,
            tracks: self.tracks.len() as u16,
        }
    }

    /// Size of the palette block, padded to 4 bytes.
    pub fn palette_size(&self) -> usize {
        align4(self.palette.len() * PALETTE_COLOR_SIZE)
    }

    /// Serialized size in bytes.
    pub fn compute_data_size(&self) -> usize {
        self.palette_size()
            + self.rgb_keyframes.len() * RgbKeyframe::SIZE
            + self.rgb_tracks.len() * RgbTrack::SIZE
            + self.keyframes.len() * SimpleKeyframe::SIZE
            + self.tracks.len() * Track::SIZE
    }

    /// Write all arrays. Only the palette is followed by padding.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for color in &self.palette {
            w.write_all(&[color.r_byte(), color.g_byte(), color.b_byte()])?;
        }
        write_padding(w, self.palette_size() - self.palette.len() * PALETTE_COLOR_SIZE)?;

        for kf in &self.rgb_keyframes {
            kf.write_to(w)?;
        }
        for track in &self.rgb_tracks {
            track.write_to(w)?;
        }
        for kf in &self.keyframes {
            kf.write_to(w)?;
        }
        for track in &self.tracks {
            track.write_to(w)?;
        }
        Ok(())
    }

    /// Read arrays of the given sizes, the inverse of [`Self::write_to`].
    pub fn read_from<R: Read>(r: &mut R, counts: &BitsCounts) -> io::Result<Self> {
        let palette_len = counts.palette as usize;
        let mut palette = Vec::with_capacity(palette_len);
        for _ in 0..palette_len {
            let red = read_u8(r)?;
            let green = read_u8(r)?;
            let blue = read_u8(r)?;
            palette.push(Color::from_bytes(red, green, blue));
        }
        skip(r, align4(palette_len * PALETTE_COLOR_SIZE) - palette_len * PALETTE_COLOR_SIZE)?;

        let rgb_keyframes = (0..counts.rgb_keyframes)
            .map(|_| RgbKeyframe::read_from(r))
            .collect::<io::Result<Vec<_>>>()?;
        let rgb_tracks = (0..counts.rgb_tracks)
            .map(|_| RgbTrack::read_from(r))
            .collect::<io::Result<Vec<_>>>()?;
        let keyframes = (0..counts.keyframes)
            .map(|_| SimpleKeyframe::read_from(r))
            .collect::<io::Result<Vec<_>>>()?;
        let tracks = (0..counts.tracks)
            .map(|_| Track::read_from(r))
            .collect::<io::Result<Vec<_>>>()?;

        Ok(Self {
            palette,
            rgb_keyframes,
            rgb_tracks,
            keyframes,
            tracks,
        })
    }
}

/// Hue picked from the wheel according to the face pointing up.
fn face_color(die: &dyn DieState) -> Color32 {
    let led_count = die.led_count().max(1);
    let position = (die.current_face() * 256 / led_count) % 256;
    rainbow_wheel(position as u8, 255)
}

/// Convenience for palette entries authored as packed colors.
pub fn palette_from_color32(colors: &[Color32]) -> Vec<Color> {
    colors.iter().map(|&c| Color::from_color32(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::die::{DieType, VirtualDie};

    fn sample_bits() -> AnimationBits {
        let mut bits = AnimationBits {
            palette: palette_from_color32(&[0xFF0000, 0x00FF00]),
            ..Default::default()
        };
        bits.push_rgb_track(&[RgbKeyframe::new(0, 0), RgbKeyframe::new(500, 1)], 0x3);
        bits.push_track(&[SimpleKeyframe::new(0, 0)], 0x4);
        bits
    }

    #[test]
    fn test_get_color_sentinels() {
        let bits = sample_bits();
        let die = VirtualDie::pinned(DieType::D20, 0);
        assert_eq!(bits.get_color(0, &die).unwrap(), 0xFF0000);
        assert_eq!(bits.get_color(PALETTE_COLOR_FROM_RANDOM, &die).unwrap(), BLACK);
        // Face 0 maps to the start of the hue wheel
        assert_eq!(bits.get_color(PALETTE_COLOR_FROM_FACE, &die).unwrap(), 0xFF0000);
    }

    #[test]
    fn test_face_color_follows_face() {
        let bits = sample_bits();
        let die = VirtualDie::pinned(DieType::D6, 3);
        // 3 * 256 / 6 = 128 → second band of the wheel
        assert_eq!(
            bits.get_color(PALETTE_COLOR_FROM_FACE, &die).unwrap(),
            rainbow_wheel(128, 255)
        );
    }

    #[test]
    fn test_bounds_errors() {
        let bits = sample_bits();
        let die = VirtualDie::pinned(DieType::D20, 0);
        let err = bits.get_color(2, &die).unwrap_err();
        assert_eq!(
            err,
            BoundsError {
                array: "palette",
                index: 2,
                len: 2
            }
        );

        for i in 1..10 {
            let err = bits.get_track(i).unwrap_err();
            assert_eq!(err.array, "tracks");
            assert_eq!(err.index, i);
            assert_eq!(err.len, 1);
        }
        assert!(bits.get_rgb_track(1).is_err());
        assert!(bits.get_rgb_keyframe(2).is_err());
        assert!(bits.get_keyframe(1).is_err());
    }

    #[test]
    fn test_bounds_error_message() {
        let err = AnimationBits::default().get_track(0).unwrap_err();
        assert_eq!(err.to_string(), "Index 0 out of range for tracks (length 0)");
    }

    #[test]
    fn test_data_size() {
        let bits = sample_bits();
        // palette 6 → 8, 2 rgb keyframes, 1 rgb track, 1 keyframe, 1 track
        assert_eq!(bits.compute_data_size(), 8 + 4 + 8 + 2 + 8);

        let mut buf = Vec::new();
        bits.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), bits.compute_data_size());
        assert_eq!(&buf[..8], &[0xFF, 0, 0, 0, 0xFF, 0, 0, 0]);
    }

    #[test]
    fn test_read_back() {
        let bits = sample_bits();
        let mut buf = Vec::new();
        bits.write_to(&mut buf).unwrap();
        let decoded = AnimationBits::read_from(&mut &buf[..], &bits.counts()).unwrap();
        assert_eq!(decoded, bits);
    }
}
