//! Noise animation: random LEDs blink on and off.

use std::io::{self, Read, Write};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::timing::{elapsed_ms, fade_envelope, normalized_time};
use super::{AnimationPreset, PlaybackContext};
use crate::bits::{BoundsError, write_led_indices};
use crate::codec::{read_u8, read_u16, skip, unknown_type};
use crate::color::{BLACK, Color32, modulate_color, mul_colors, rainbow_wheel};
use crate::die::MAX_LED_COUNT;

/// Attempts at finding an LED that is not already blinking.
const MAX_PICK_TRIES: usize = 5;

/// How a blink picks its starting color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum NoiseColorType {
    /// Gradient sampled at the animation's current time.
    #[default]
    TimeGradient = 0,
    /// Gradient sampled at a random time.
    RandomGradient = 1,
    /// Gradient sampled at the current face, jittered by the variance.
    FaceToGradient = 2,
    /// Hue wheel at the current face, jittered by the variance.
    FaceToRainbowWheel = 3,
}

impl NoiseColorType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(NoiseColorType::TimeGradient),
            1 => Some(NoiseColorType::RandomGradient),
            2 => Some(NoiseColorType::FaceToGradient),
            3 => Some(NoiseColorType::FaceToRainbowWheel),
            _ => None,
        }
    }
}

/// Parameters of a [`NoiseInstance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationNoise {
    /// RGB track giving the starting colors.
    pub gradient_track_offset: u16,
    /// RGB track applied over the lifetime of each blink.
    pub blink_gradient_track_offset: u16,
    pub blink_interval_min_ms: u16,
    pub blink_interval_delta_ms: u16,
    pub blink_duration_ms: u16,
    pub fade: u8,
    #[serde(default)]
    pub color_type: NoiseColorType,
    #[serde(default)]
    pub color_variance: u8,
}

impl AnimationNoise {
    /// five u16 fields + fade(1) + color_type(1) + variance(1) + pad(1)
    pub const SIZE: usize = 14;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for field in [
            self.gradient_track_offset,
            self.blink_gradient_track_offset,
            self.blink_interval_min_ms,
            self.blink_interval_delta_ms,
            self.blink_duration_ms,
        ] {
            w.write_all(&field.to_le_bytes())?;
        }
        w.write_all(&[self.fade, self.color_type as u8, self.color_variance, 0])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let gradient_track_offset = read_u16(r)?;
        let blink_gradient_track_offset = read_u16(r)?;
        let blink_interval_min_ms = read_u16(r)?;
        let blink_interval_delta_ms = read_u16(r)?;
        let blink_duration_ms = read_u16(r)?;
        let fade = read_u8(r)?;
        let color_byte = read_u8(r)?;
        let color_type = NoiseColorType::from_u8(color_byte)
            .ok_or_else(|| unknown_type("noise color", color_byte))?;
        let color_variance = read_u8(r)?;
        skip(r, 1)?;
        Ok(Self {
            gradient_track_offset,
            blink_gradient_track_offset,
            blink_interval_min_ms,
            blink_interval_delta_ms,
            blink_duration_ms,
            fade,
            color_type,
            color_variance,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Blink {
    start_ms: u32,
    color: Color32,
}

#[derive(Debug)]
pub struct NoiseInstance<'a> {
    pub(crate) preset: &'a AnimationPreset,
    params: &'a AnimationNoise,
    ctx: PlaybackContext<'a>,
    pub(crate) start_ms: u32,
    rng: StdRng,
    next_blink_ms: u32,
    blinks: [Option<Blink>; MAX_LED_COUNT],
}

impl<'a> NoiseInstance<'a> {
    pub(crate) fn new(
        preset: &'a AnimationPreset,
        params: &'a AnimationNoise,
        ctx: PlaybackContext<'a>,
    ) -> Self {
        Self {
            preset,
            params,
            ctx,
            start_ms: 0,
            rng: StdRng::seed_from_u64(ctx.seed),
            next_blink_ms: 0,
            blinks: [None; MAX_LED_COUNT],
        }
    }

    /// Restarts with an empty set of blinks and the RNG rewound to the seed.
    pub fn start(&mut self, start_ms: u32) {
        self.start_ms = start_ms;
        self.rng = StdRng::seed_from_u64(self.ctx.seed);
        self.next_blink_ms = start_ms;
        self.blinks = [None; MAX_LED_COUNT];
    }

    /// Starting color of a new blink.
    fn initial_color(&mut self, elapsed: i64) -> Result<Color32, BoundsError> {
        let ctx = self.ctx;
        let p = self.params;
        let gradient = || ctx.bits.get_rgb_track(p.gradient_track_offset as usize);
        let face = ctx.die.current_face();
        let face_count = ctx.die.face_count().max(1);

        match p.color_type {
            NoiseColorType::TimeGradient => {
                let time = normalized_time(elapsed, self.preset.duration_ms);
                gradient()?.evaluate_color(ctx.bits, ctx.die, time)
            }
            NoiseColorType::RandomGradient => {
                let time = self.rng.gen_range(0..=1000);
                gradient()?.evaluate_color(ctx.bits, ctx.die, time)
            }
            NoiseColorType::FaceToGradient => {
                let center = (face * 1000 / (face_count - 1).max(1)) as i32;
                let spread = p.color_variance as i32 * 1000 / 255;
                let time = (center + self.rng.gen_range(-spread..=spread)).clamp(0, 1000);
                gradient()?.evaluate_color(ctx.bits, ctx.die, time)
            }
            NoiseColorType::FaceToRainbowWheel => {
                let center = (face * 256 / face_count) as i32;
                let spread = p.color_variance as i32;
                let position = (center + self.rng.gen_range(-spread..=spread)).rem_euclid(256);
                Ok(rainbow_wheel(position as u8, 255))
            }
        }
    }

    /// Light up a free LED, if one turns up within a few picks.
    fn spawn_blink(&mut self, time_ms: u32, elapsed: i64) -> Result<(), BoundsError> {
        let led_count = self.ctx.led_count().min(MAX_LED_COUNT);
        if led_count == 0 {
            return Ok(());
        }
        for _ in 0..MAX_PICK_TRIES {
            let led = self.rng.gen_range(0..led_count);
            if self.blinks[led].is_none() {
                let color = self.initial_color(elapsed)?;
                self.blinks[led] = Some(Blink {
                    start_ms: time_ms,
                    color,
                });
                log::trace!("noise blink on led {led}");
                break;
            }
        }
        Ok(())
    }

    pub fn update_leds(
        &mut self,
        time_ms: u32,
        out_indices: &mut [usize],
        out_colors: &mut [Color32],
    ) -> Result<usize, BoundsError> {
        let ctx = self.ctx;
        let p = self.params;
        let duration = self.preset.duration_ms as i64;
        let elapsed = elapsed_ms(time_ms, self.start_ms);

        if time_ms >= self.next_blink_ms && elapsed < duration {
            self.spawn_blink(time_ms, elapsed)?;
            let delay = p.blink_interval_min_ms as u32
                + self.rng.gen_range(0..=p.blink_interval_delta_ms as u32);
            self.next_blink_ms = time_ms.saturating_add(delay);
        }

        let envelope = fade_envelope(elapsed, duration, p.fade, 255);
        let blink_gradient = ctx
            .bits
            .get_rgb_track(p.blink_gradient_track_offset as usize)?;
        let blink_duration = p.blink_duration_ms.max(1) as i64;

        let mut count = 0;
        for (led, slot) in self.blinks.iter_mut().enumerate() {
            let Some(blink) = *slot else {
                continue;
            };
            let age = elapsed_ms(time_ms, blink.start_ms);
            out_indices[count] = led;
            out_colors[count] = if age >= blink_duration {
                *slot = None;
                BLACK
            } else {
                let t = (age * 1000 / blink_duration) as i32;
                let shade = blink_gradient.evaluate_color(ctx.bits, ctx.die, t)?;
                modulate_color(mul_colors(blink.color, shade), envelope)
            };
            count += 1;
        }
        Ok(count)
    }

    /// Any LED may have blinked, so all of them need turning off.
    pub fn stop(&self, out_indices: &mut [usize]) -> Result<usize, BoundsError> {
        let leds = 0..self.ctx.led_count().min(MAX_LED_COUNT);
        write_led_indices(leds, 0, out_indices)
    }
}
