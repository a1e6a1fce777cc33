//! Simple animation: one color flashed a number of times.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::timing::{elapsed_ms, fade_time};
use super::{AnimationPreset, PlaybackContext};
use crate::bits::{BoundsError, mask_leds, write_led_indices, write_leds};
use crate::codec::{read_u8, read_u16, read_u32};
use crate::color::{Color32, modulate_color};

/// Parameters of a [`SimpleInstance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationSimple {
    /// LEDs lit by the flashes.
    pub face_mask: u32,
    /// Palette index of the color (126/127 are the reserved sentinels).
    pub color_index: u16,
    /// Number of flashes over the duration.
    pub count: u8,
    /// Fraction (0–255) of each half-period spent ramping.
    pub fade: u8,
}

impl AnimationSimple {
    /// face_mask(4) + color_index(2) + count(1) + fade(1)
    pub const SIZE: usize = 8;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.face_mask.to_le_bytes())?;
        w.write_all(&self.color_index.to_le_bytes())?;
        w.write_all(&[self.count, self.fade])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            face_mask: read_u32(r)?,
            color_index: read_u16(r)?,
            count: read_u8(r)?,
            fade: read_u8(r)?,
        })
    }

    /// Flash intensity at `time` ms into one period.
    ///
    /// Each period ramps up, holds, ramps down, then stays off.
    pub fn intensity_at(&self, duration_ms: u16, elapsed: i64) -> u8 {
        let period = (duration_ms as i64 / self.count.max(1) as i64).max(1);
        let fade_time = fade_time(period, self.fade);
        let on_time = (period - fade_time * 2) / 2;
        let time = elapsed % period;

        let intensity = if time <= fade_time {
            if fade_time == 0 {
                0
            } else {
                time * 255 / fade_time
            }
        } else if time <= fade_time + on_time {
            255
        } else if time <= fade_time * 2 + on_time {
            (fade_time * 2 + on_time - time) * 255 / fade_time
        } else {
            0
        };
        intensity.clamp(0, 255) as u8
    }
}

/// Playback state of an [`AnimationSimple`].
#[derive(Debug)]
pub struct SimpleInstance<'a> {
    pub(crate) preset: &'a AnimationPreset,
    params: &'a AnimationSimple,
    ctx: PlaybackContext<'a>,
    pub(crate) start_ms: u32,
}

impl<'a> SimpleInstance<'a> {
    pub(crate) fn new(
        preset: &'a AnimationPreset,
        params: &'a AnimationSimple,
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
        let elapsed = elapsed_ms(time_ms, self.start_ms);
        let intensity = self.params.intensity_at(self.preset.duration_ms, elapsed);
        let base = self
            .ctx
            .bits
            .get_color(self.params.color_index as usize, self.ctx.die)?;
        let color = modulate_color(base, intensity);
        write_leds(
            mask_leds(self.params.face_mask, self.ctx.led_count()),
            0,
            out_indices,
            out_colors,
            |_| Ok(color),
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
