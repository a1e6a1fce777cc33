//! Animation curves scoped to a subset of LEDs.
//!
//! A track does not own its keyframes: it points at a contiguous run of the
//! shared keyframe arrays in [`AnimationBits`].

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::{AnimationBits, BoundsError, RgbKeyframe, SimpleKeyframe};
use crate::codec::{read_u8, read_u16, read_u32, skip};
use crate::color::{BLACK, Color32, interpolate_colors, interpolate_intensity};
use crate::die::{DieState, MAX_LED_COUNT};

/// Indices of the LEDs selected by `mask`, limited to the first `led_count`.
pub fn mask_leds(mask: u32, led_count: usize) -> impl Iterator<Item = usize> {
    (0..led_count.min(MAX_LED_COUNT)).filter(move |&i| mask & (1 << i) != 0)
}

fn out_slot<'o, T>(
    out: &'o mut [T],
    array: &'static str,
    index: usize,
) -> Result<&'o mut T, BoundsError> {
    let len = out.len();
    out.get_mut(index).ok_or(BoundsError { array, index, len })
}

/// Write `leds` into `out_indices` from position `start`.
///
/// Returns the position after the last LED written, or an error once the
/// buffer is full.
pub fn write_led_indices(
    leds: impl IntoIterator<Item = usize>,
    start: usize,
    out_indices: &mut [usize],
) -> Result<usize, BoundsError> {
    let mut count = start;
    for led in leds {
        *out_slot(out_indices, "out_indices", count)? = led;
        count += 1;
    }
    Ok(count)
}

/// Write `leds` and `color_of(led)` into the output buffers from position
/// `start`. Same contract as [`write_led_indices`].
pub fn write_leds<F>(
    leds: impl IntoIterator<Item = usize>,
    start: usize,
    out_indices: &mut [usize],
    out_colors: &mut [Color32],
    mut color_of: F,
) -> Result<usize, BoundsError>
where
    F: FnMut(usize) -> Result<Color32, BoundsError>,
{
    let mut count = start;
    for led in leds {
        *out_slot(out_indices, "out_indices", count)? = led;
        *out_slot(out_colors, "out_colors", count)? = color_of(led)?;
        count += 1;
    }
    Ok(count)
}

/// Locate the keyframes surrounding `time`.
///
/// Returns the index of the first keyframe whose time is not before `time`
/// (or `count` when every keyframe is earlier).
fn next_keyframe_index<F>(count: usize, time: i32, time_of: F) -> Result<usize, BoundsError>
where
    F: Fn(usize) -> Result<u16, BoundsError>,
{
    let mut next = 0;
    while next < count && (time_of(next)? as i32) < time {
        next += 1;
    }
    Ok(next)
}

/// Color curve over a set of LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RgbTrack {
    /// Index of the first keyframe in [`AnimationBits::rgb_keyframes`].
    pub keyframes_offset: u16,
    pub keyframe_count: u8,
    /// LEDs driven by this track.
    pub led_mask: u32,
}

impl RgbTrack {
    /// keyframes_offset(2) + keyframe_count(1) + pad(1) + led_mask(4)
    pub const SIZE: usize = 8;

    pub fn keyframe<'b>(
        &self,
        bits: &'b AnimationBits,
        index: usize,
    ) -> Result<&'b RgbKeyframe, BoundsError> {
        bits.get_rgb_keyframe(self.keyframes_offset as usize + index)
    }

    /// Time of the last keyframe, 0 for an empty track.
    pub fn duration(&self, bits: &AnimationBits) -> Result<u16, BoundsError> {
        match self.keyframe_count {
            0 => Ok(0),
            n => Ok(self.keyframe(bits, n as usize - 1)?.time()),
        }
    }

    /// Color of the curve at `time` (ms, or the 0–1000 normalized scale used
    /// by animations). Times outside the keyframes clamp to the edge values.
    pub fn evaluate_color(
        &self,
        bits: &AnimationBits,
        die: &dyn DieState,
        time: i32,
    ) -> Result<Color32, BoundsError> {
        let count = self.keyframe_count as usize;
        if count == 0 {
            return Ok(BLACK);
        }

        let next = next_keyframe_index(count, time, |i| Ok(self.keyframe(bits, i)?.time()))?;
        if next == 0 {
            self.keyframe(bits, 0)?.color(bits, die)
        } else if next == count {
            self.keyframe(bits, count - 1)?.color(bits, die)
        } else {
            let prev = self.keyframe(bits, next - 1)?;
            let next = self.keyframe(bits, next)?;
            Ok(interpolate_colors(
                prev.color(bits, die)?,
                prev.time() as i32,
                next.color(bits, die)?,
                next.time() as i32,
                time,
            ))
        }
    }

    /// Write the curve color at `time` for every LED in the mask, from
    /// position `start`. Returns the position after the last LED written.
    pub fn evaluate(
        &self,
        bits: &AnimationBits,
        die: &dyn DieState,
        time: i32,
        start: usize,
        out_indices: &mut [usize],
        out_colors: &mut [Color32],
    ) -> Result<usize, BoundsError> {
        if self.keyframe_count == 0 {
            return Ok(start);
        }
        let color = self.evaluate_color(bits, die, time)?;
        write_leds(
            mask_leds(self.led_mask, die.led_count()),
            start,
            out_indices,
            out_colors,
            |_| Ok(color),
        )
    }

    /// Write the LED indices this track drives, from position `start`.
    pub fn extract_led_indices(
        &self,
        led_count: usize,
        start: usize,
        out_indices: &mut [usize],
    ) -> Result<usize, BoundsError> {
        write_led_indices(mask_leds(self.led_mask, led_count), start, out_indices)
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.keyframes_offset.to_le_bytes())?;
        w.write_all(&[self.keyframe_count, 0])?;
        w.write_all(&self.led_mask.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let keyframes_offset = read_u16(r)?;
        let keyframe_count = read_u8(r)?;
        skip(r, 1)?;
        let led_mask = read_u32(r)?;
        Ok(Self {
            keyframes_offset,
            keyframe_count,
            led_mask,
        })
    }
}

/// Intensity curve over a set of LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Track {
    /// Index of the first keyframe in [`AnimationBits::keyframes`].
    pub keyframes_offset: u16,
    pub keyframe_count: u8,
    pub led_mask: u32,
}

impl Track {
    pub const SIZE: usize = 8;

    pub fn keyframe<'b>(
        &self,
        bits: &'b AnimationBits,
        index: usize,
    ) -> Result<&'b SimpleKeyframe, BoundsError> {
        bits.get_keyframe(self.keyframes_offset as usize + index)
    }

    pub fn duration(&self, bits: &AnimationBits) -> Result<u16, BoundsError> {
        match self.keyframe_count {
            0 => Ok(0),
            n => Ok(self.keyframe(bits, n as usize - 1)?.time()),
        }
    }

    /// Intensity of the curve at `time`, clamped at both ends.
    pub fn evaluate_intensity(&self, bits: &AnimationBits, time: i32) -> Result<u8, BoundsError> {
        let count = self.keyframe_count as usize;
        if count == 0 {
            return Ok(0);
        }

        let next = next_keyframe_index(count, time, |i| Ok(self.keyframe(bits, i)?.time()))?;
        if next == 0 {
            Ok(self.keyframe(bits, 0)?.intensity())
        } else if next == count {
            Ok(self.keyframe(bits, count - 1)?.intensity())
        } else {
            let prev = self.keyframe(bits, next - 1)?;
            let next = self.keyframe(bits, next)?;
            Ok(interpolate_intensity(
                prev.intensity(),
                prev.time() as i32,
                next.intensity(),
                next.time() as i32,
                time,
            ))
        }
    }

    pub fn extract_led_indices(
        &self,
        led_count: usize,
        start: usize,
        out_indices: &mut [usize],
    ) -> Result<usize, BoundsError> {
        write_led_indices(mask_leds(self.led_mask, led_count), start, out_indices)
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.keyframes_offset.to_le_bytes())?;
        w.write_all(&[self.keyframe_count, 0])?;
        w.write_all(&self.led_mask.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let keyframes_offset = read_u16(r)?;
        let keyframe_count = read_u8(r)?;
        skip(r, 1)?;
        let led_mask = read_u32(r)?;
        Ok(Self {
            keyframes_offset,
            keyframe_count,
            led_mask,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{Color, get_blue, get_green, get_red};
    use crate::die::{DieType, VirtualDie};

    fn black_to_white() -> (AnimationBits, RgbTrack) {
        let mut bits = AnimationBits::default();
        bits.palette = vec![Color::BLACK, Color::WHITE];
        let track = bits.push_rgb_track(
            &[RgbKeyframe::new(0, 0), RgbKeyframe::new(1000, 1)],
            0b1111,
        );
        let track = *bits.get_rgb_track(track as usize).unwrap();
        (bits, track)
    }

    #[test]
    fn test_interpolation_midpoint() {
        let (bits, track) = black_to_white();
        let die = VirtualDie::pinned(DieType::D6, 0);
        let c = track.evaluate_color(&bits, &die, 500).unwrap();
        for channel in [get_red(c), get_green(c), get_blue(c)] {
            assert!((127..=128).contains(&channel), "channel = {}", channel);
        }
    }

    #[test]
    fn test_interpolation_clamps_to_edges() {
        let (bits, track) = black_to_white();
        let die = VirtualDie::pinned(DieType::D6, 0);
        assert_eq!(track.evaluate_color(&bits, &die, -100).unwrap(), BLACK);
        assert_eq!(track.evaluate_color(&bits, &die, 1500).unwrap(), 0xFFFFFF);
    }

    #[test]
    fn test_evaluate_writes_masked_leds() {
        let (bits, track) = black_to_white();
        let die = VirtualDie::pinned(DieType::D6, 0);
        let mut indices = [0usize; MAX_LED_COUNT];
        let mut colors = [0u32; MAX_LED_COUNT];
        let n = track
            .evaluate(&bits, &die, 1000, 0, &mut indices, &mut colors)
            .unwrap();
        assert_eq!(n, 4);
        assert_eq!(&indices[..4], &[0, 1, 2, 3]);
        assert!(colors[..4].iter().all(|&c| c == 0xFFFFFF));

        // Appends after earlier output
        let end = track
            .evaluate(&bits, &die, 1000, n, &mut indices, &mut colors)
            .unwrap();
        assert_eq!(end, 8);
        assert_eq!(&indices[4..8], &[0, 1, 2, 3]);
    }

    #[test]
    fn test_write_leds() {
        let mut indices = [0usize; 8];
        let mut colors = [0u32; 8];
        let n = write_leds(mask_leds(0b1010, 4), 0, &mut indices, &mut colors, |_| {
            Ok(0x123456)
        })
        .unwrap();
        assert_eq!(n, 2);
        assert_eq!(&indices[..2], &[1, 3]);
        assert_eq!(&colors[..2], &[0x123456, 0x123456]);
        assert_eq!(write_led_indices(mask_leds(0b1010, 2), 5, &mut indices), Ok(6));
    }

    #[test]
    fn test_full_output_is_an_error() {
        let mut indices = [0usize; 3];
        let mut colors = [0u32; 3];
        let err = write_leds(0..5, 0, &mut indices, &mut colors, |_| Ok(BLACK)).unwrap_err();
        assert_eq!(
            err,
            BoundsError {
                array: "out_indices",
                index: 3,
                len: 3,
            }
        );

        // A shorter color buffer is caught as well
        let mut short_colors = [0u32; 1];
        let err = write_leds(0..2, 0, &mut indices, &mut short_colors, |_| Ok(BLACK)).unwrap_err();
        assert_eq!(err.array, "out_colors");

        let err = write_led_indices(0..4, 1, &mut indices).unwrap_err();
        assert_eq!((err.index, err.len), (3, 3));
    }

    #[test]
    fn test_mask_ignores_missing_leds() {
        let leds: Vec<usize> = mask_leds(0xFFFF_FFFF, 6).collect();
        assert_eq!(leds, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_intensity_track() {
        let mut bits = AnimationBits::default();
        let index = bits.push_track(
            &[SimpleKeyframe::new(0, 0), SimpleKeyframe::new(100, 200)],
            0b1,
        );
        let track = *bits.get_track(index as usize).unwrap();
        assert_eq!(track.evaluate_intensity(&bits, 50).unwrap(), 100);
        assert_eq!(track.evaluate_intensity(&bits, 1000).unwrap(), 200);
        assert_eq!(track.duration(&bits).unwrap(), 100);
    }

    #[test]
    fn test_dangling_keyframes_error() {
        let bits = AnimationBits::default();
        let die = VirtualDie::pinned(DieType::D6, 0);
        let track = RgbTrack {
            keyframes_offset: 3,
            keyframe_count: 2,
            led_mask: 1,
        };
        let err = track.evaluate_color(&bits, &die, 0).unwrap_err();
        assert_eq!(err.array, "rgb_keyframes");
        assert_eq!(err.index, 3);
    }

    #[test]
    fn test_track_layout() {
        let track = RgbTrack {
            keyframes_offset: 0x0102,
            keyframe_count: 3,
            led_mask: 0x0A0B0C0D,
        };
        let mut buf = Vec::new();
        track.write_to(&mut buf).unwrap();
        assert_eq!(buf, vec![0x02, 0x01, 3, 0, 0x0D, 0x0C, 0x0B, 0x0A]);
        assert_eq!(RgbTrack::read_from(&mut &buf[..]).unwrap(), track);
    }
}
