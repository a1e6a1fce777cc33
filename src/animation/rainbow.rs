//! Rainbow and Cycle animations: a hue that advances with time.
//!
//! Both compute a wheel position from elapsed time and `count` cycles over the
//! duration. Rainbow maps it through the hue wheel, Cycle through a gradient
//! track. With the traveling flag each LED gets its own phase offset.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::timing::{elapsed_ms, fade_envelope};
use super::{AnimationPreset, PlaybackContext};
use crate::bits::{BoundsError, mask_leds, write_led_indices, write_leds};
use crate::codec::{read_u8, read_u16, read_u32, skip};
use crate::color::{Color32, modulate_color, rainbow_wheel};

/// Wheel position and intensity shared by both variants.
fn wheel_state(preset: &AnimationPreset, count: u8, fade: u8, peak: u8, elapsed: i64) -> (u8, u8) {
    let duration = preset.duration_ms.max(1) as i64;
    let intensity = fade_envelope(elapsed, duration, fade, peak);
    let position = (elapsed * count as i64 * 255 / duration) % 256;
    (position as u8, intensity)
}

/// Phase of LED `led` when traveling.
#[inline]
fn led_position(position: u8, led: usize, led_count: usize) -> u8 {
    ((position as usize + led * 256 / led_count.max(1)) % 256) as u8
}

/// Evaluate `color_at(position)` for every masked LED.
fn write_wheel<F>(
    preset: &AnimationPreset,
    face_mask: u32,
    led_count: usize,
    position: u8,
    out_indices: &mut [usize],
    out_colors: &mut [Color32],
    mut color_at: F,
) -> Result<usize, BoundsError>
where
    F: FnMut(u8) -> Result<Color32, BoundsError>,
{
    let shared = if preset.flags.traveling {
        None
    } else {
        Some(color_at(position)?)
    };
    write_leds(
        mask_leds(face_mask, led_count),
        0,
        out_indices,
        out_colors,
        |led| match shared {
            Some(color) => Ok(color),
            None => color_at(led_position(position, led, led_count)),
        },
    )
}

/// Parameters of a [`RainbowInstance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationRainbow {
    pub face_mask: u32,
    /// Full hue cycles over the duration.
    pub count: u8,
    /// Fraction (0–255) of half the duration spent fading in and out.
    pub fade: u8,
    /// Peak brightness.
    pub intensity: u8,
}

impl AnimationRainbow {
    /// face_mask(4) + count(1) + fade(1) + intensity(1) + pad(1)
    pub const SIZE: usize = 8;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.face_mask.to_le_bytes())?;
        w.write_all(&[self.count, self.fade, self.intensity, 0])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let face_mask = read_u32(r)?;
        let count = read_u8(r)?;
        let fade = read_u8(r)?;
        let intensity = read_u8(r)?;
        skip(r, 1)?;
        Ok(Self {
            face_mask,
            count,
            fade,
            intensity,
        })
    }
}

#[derive(Debug)]
pub struct RainbowInstance<'a> {
    pub(crate) preset: &'a AnimationPreset,
    params: &'a AnimationRainbow,
    ctx: PlaybackContext<'a>,
    pub(crate) start_ms: u32,
}

impl<'a> RainbowInstance<'a> {
    pub(crate) fn new(
        preset: &'a AnimationPreset,
        params: &'a AnimationRainbow,
        ctx: PlaybackContext<'a>,
    ) -> Self {
        Self {
            preset,
            params,
            ctx,
            start_ms: 0,
        }
    }

    pub fn start(&mut self, start_ms: u32) {
        self.start_ms = start_ms;
    }

    pub fn update_leds(
        &mut self,
        time_ms: u32,
        out_indices: &mut [usize],
        out_colors: &mut [Color32],
    ) -> Result<usize, BoundsError> {
        let p = self.params;
        let elapsed = elapsed_ms(time_ms, self.start_ms);
        let (position, intensity) = wheel_state(self.preset, p.count, p.fade, p.intensity, elapsed);
        write_wheel(
            self.preset,
            p.face_mask,
            self.ctx.led_count(),
            position,
            out_indices,
            out_colors,
            |pos| Ok(rainbow_wheel(pos, intensity)),
        )
    }

    pub fn stop(&self, out_indices: &mut [usize]) -> Result<usize, BoundsError> {
        write_led_indices(
            mask_leds(self.params.face_mask, self.ctx.led_count()),
            0,
            out_indices,
        )
    }
}

/// Parameters of a [`CycleInstance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationCycle {
    pub face_mask: u32,
    pub count: u8,
    pub fade: u8,
    pub intensity: u8,
    /// Index into [`AnimationBits::rgb_tracks`](crate::bits::AnimationBits) of
    /// the colors cycled through.
    pub gradient_track_offset: u16,
}

impl AnimationCycle {
    /// face_mask(4) + count(1) + fade(1) + intensity(1) + pad(1) + gradient(2) + pad(2)
    pub const SIZE: usize = 12;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.face_mask.to_le_bytes())?;
        w.write_all(&[self.count, self.fade, self.intensity, 0])?;
        w.write_all(&self.gradient_track_offset.to_le_bytes())?;
        w.write_all(&[0, 0])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let face_mask = read_u32(r)?;
        let count = read_u8(r)?;
        let fade = read_u8(r)?;
        let intensity = read_u8(r)?;
        skip(r, 1)?;
        let gradient_track_offset = read_u16(r)?;
        skip(r, 2)?;
        Ok(Self {
            face_mask,
            count,
            fade,
            intensity,
            gradient_track_offset,
        })
    }
}

#[derive(Debug)]
pub struct CycleInstance<'a> {
    pub(crate) preset: &'a AnimationPreset,
    params: &'a AnimationCycle,
    ctx: PlaybackContext<'a>,
    pub(crate) start_ms: u32,
}

impl<'a> CycleInstance<'a> {
    pub(crate) fn new(
        preset: &'a AnimationPreset,
        params: &'a AnimationCycle,
        ctx: PlaybackContext<'a>,
    ) -> Self {
        Self {
            preset,
            params,
            ctx,
            start_ms: 0,
        }
    }

    pub fn start(&mut self, start_ms: u32) {
        self.start_ms = start_ms;
    }

    pub fn update_leds(
        &mut self,
        time_ms: u32,
        out_indices: &mut [usize],
        out_colors: &mut [Color32],
    ) -> Result<usize, BoundsError> {
        let p = self.params;
        let ctx = self.ctx;
        let gradient = ctx.bits.get_rgb_track(p.gradient_track_offset as usize)?;
        let elapsed = elapsed_ms(time_ms, self.start_ms);
        let (position, intensity) = wheel_state(self.preset, p.count, p.fade, p.intensity, elapsed);
        write_wheel(
            self.preset,
            p.face_mask,
            ctx.led_count(),
            position,
            out_indices,
            out_colors,
            |pos| {
                let color = gradient.evaluate_color(ctx.bits, ctx.die, pos as i32 * 1000 / 255)?;
                Ok(modulate_color(color, intensity))
            },
        )
    }

    pub fn stop(&self, out_indices: &mut [usize]) -> Result<usize, BoundsError> {
        write_led_indices(
            mask_leds(self.params.face_mask, self.ctx.led_count()),
            0,
            out_indices,
        )
    }
}
