//! Normals animation: color falls off with distance from the face pointing up.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::timing::{elapsed_ms, fade_envelope, normalized_time};
use super::{AnimationPreset, PlaybackContext};
use crate::bits::{BoundsError, write_led_indices, write_leds};
use crate::codec::{read_u8, read_u16, skip, unknown_type};
use crate::color::{Color32, modulate_color, mul_colors, rainbow_wheel};
use crate::die::MAX_LED_COUNT;

/// Source of the base color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum NormalsColorType {
    #[default]
    Track = 0,
    FaceToGradient = 1,
    FaceToRainbowWheel = 2,
}

impl NormalsColorType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(NormalsColorType::Track),
            1 => Some(NormalsColorType::FaceToGradient),
            2 => Some(NormalsColorType::FaceToRainbowWheel),
            _ => None,
        }
    }
}

/// Parameters of a [`NormalsInstance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationNormals {
    pub gradient_track_offset: u16,
    /// RGB track sampled by distance: 0 at the up face, 1000 opposite it.
    pub axis_gradient_track_offset: u16,
    pub fade: u8,
    #[serde(default)]
    pub color_type: NormalsColorType,
}

impl AnimationNormals {
    /// gradient(2) + axis(2) + fade(1) + color_type(1) + pad(2)
    pub const SIZE: usize = 8;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.gradient_track_offset.to_le_bytes())?;
        w.write_all(&self.axis_gradient_track_offset.to_le_bytes())?;
        w.write_all(&[self.fade, self.color_type as u8, 0, 0])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let gradient_track_offset = read_u16(r)?;
        let axis_gradient_track_offset = read_u16(r)?;
        let fade = read_u8(r)?;
        let color_byte = read_u8(r)?;
        let color_type = NormalsColorType::from_u8(color_byte)
            .ok_or_else(|| unknown_type("normals color", color_byte))?;
        skip(r, 2)?;
        Ok(Self {
            gradient_track_offset,
            axis_gradient_track_offset,
            fade,
            color_type,
        })
    }
}

/// Position of LED `led` along the axis through `face_led`: 0 on it, 1000 on
/// the far side of the ring.
fn axis_position(led: usize, face_led: usize, led_count: usize) -> i32 {
    let half = (led_count / 2).max(1);
    let diff = led.abs_diff(face_led);
    let distance = diff.min(led_count - diff);
    (distance * 1000 / half).min(1000) as i32
}

#[derive(Debug)]
pub struct NormalsInstance<'a> {
    pub(crate) preset: &'a AnimationPreset,
    params: &'a AnimationNormals,
    ctx: PlaybackContext<'a>,
    pub(crate) start_ms: u32,
}

impl<'a> NormalsInstance<'a> {
    pub(crate) fn new(
        preset: &'a AnimationPreset,
        params: &'a AnimationNormals,
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

    fn base_color(&self, time: i32) -> Result<Color32, BoundsError> {
        let ctx = self.ctx;
        let face = ctx.die.current_face();
        let face_count = ctx.die.face_count().max(1);
        let gradient = || {
            ctx.bits
                .get_rgb_track(self.params.gradient_track_offset as usize)
        };
        match self.params.color_type {
            NormalsColorType::Track => gradient()?.evaluate_color(ctx.bits, ctx.die, time),
            NormalsColorType::FaceToGradient => {
                let t = (face * 1000 / (face_count - 1).max(1)) as i32;
                gradient()?.evaluate_color(ctx.bits, ctx.die, t)
            }
            NormalsColorType::FaceToRainbowWheel => {
                Ok(rainbow_wheel((face * 256 / face_count) as u8, 255))
            }
        }
    }

    pub fn update_leds(
        &mut self,
        time_ms: u32,
        out_indices: &mut [usize],
        out_colors: &mut [Color32],
    ) -> Result<usize, BoundsError> {
        let ctx = self.ctx;
        let p = self.params;
        let elapsed = elapsed_ms(time_ms, self.start_ms);
        let time = normalized_time(elapsed, self.preset.duration_ms);
        let intensity = fade_envelope(elapsed, self.preset.duration_ms as i64, p.fade, 255);

        let base = self.base_color(time)?;
        let axis = ctx
            .bits
            .get_rgb_track(p.axis_gradient_track_offset as usize)?;

        let led_count = ctx.led_count();
        let face_count = ctx.die.face_count().max(1);
        let face_led = ctx.die.current_face() * led_count / face_count;
        let leds = 0..led_count.min(MAX_LED_COUNT);
        write_leds(leds, 0, out_indices, out_colors, |led| {
            let shade = axis.evaluate_color(
                ctx.bits,
                ctx.die,
                axis_position(led, face_led, led_count),
            )?;
            Ok(modulate_color(mul_colors(base, shade), intensity))
        })
    }

    pub fn stop(&self, out_indices: &mut [usize]) -> Result<usize, BoundsError> {
        let leds = 0..self.ctx.led_count().min(MAX_LED_COUNT);
        write_led_indices(leds, 0, out_indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationKind;
    use crate::animation::testing::{frame, led, stopped};
    use crate::bits::{AnimationBits, RgbKeyframe, palette_from_color32};
    use crate::die::{DieState, DieType, VirtualDie};

    /// Palette: white, black, red, blue. Track 0 red→blue, track 1 white→black.
    fn bits() -> AnimationBits {
        let mut bits = AnimationBits {
            palette: palette_from_color32(&[0xFFFFFF, 0x000000, 0xFF0000, 0x0000FF]),
            ..Default::default()
        };
        bits.push_rgb_track(&[RgbKeyframe::new(0, 2), RgbKeyframe::new(1000, 3)], 0);
        bits.push_rgb_track(&[RgbKeyframe::new(0, 0), RgbKeyframe::new(1000, 1)], 0);
        bits
    }

    fn normals(color_type: NormalsColorType) -> AnimationPreset {
        AnimationPreset::new(
            1000,
            AnimationKind::Normals(AnimationNormals {
                gradient_track_offset: 0,
                axis_gradient_track_offset: 1,
                fade: 0,
                color_type,
            }),
        )
    }

    #[test]
    fn test_axis_position_is_circular() {
        assert_eq!(axis_position(0, 0, 20), 0);
        assert_eq!(axis_position(10, 0, 20), 1000);
        assert_eq!(axis_position(19, 0, 20), 100);
        assert_eq!(axis_position(5, 15, 20), 1000);
    }

    #[test]
    fn test_face_led_brightest() {
        let bits = bits();
        let die = VirtualDie::pinned(DieType::D20, 0);
        let preset = normals(NormalsColorType::Track);
        let mut instance = preset
            .create_instance(PlaybackContext::new(&bits, &die, &[]))
            .unwrap();
        instance.start(0);
        let f = frame(&mut instance, 0);
        assert_eq!(f.len(), 20);
        assert_eq!(led(&f, 0), Some(0xFF0000));
        assert_eq!(led(&f, 10), Some(0));
    }

    #[test]
    fn test_face_to_gradient_uses_face() {
        let bits = bits();
        let die = VirtualDie::pinned(DieType::D6, 5);
        let preset = normals(NormalsColorType::FaceToGradient);
        let mut instance = preset
            .create_instance(PlaybackContext::new(&bits, &die, &[]))
            .unwrap();
        instance.start(0);
        // Top face maps to the end of the gradient whatever the time
        assert_eq!(led(&frame(&mut instance, 0), 5), Some(0x0000FF));
        assert_eq!(stopped(&instance), (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn test_face_to_wheel() {
        let bits = bits();
        let die = VirtualDie::pinned(DieType::D6, 3);
        let preset = normals(NormalsColorType::FaceToRainbowWheel);
        let mut instance = preset
            .create_instance(PlaybackContext::new(&bits, &die, &[]))
            .unwrap();
        instance.start(0);
        assert_eq!(led(&frame(&mut instance, 0), 3), Some(rainbow_wheel(128, 255)));
    }

    /// Die reporting more LEDs than a mask can address.
    struct WideDie;

    impl DieState for WideDie {
        fn led_count(&self) -> usize {
            40
        }
        fn face_count(&self) -> usize {
            20
        }
        fn current_face(&self) -> usize {
            0
        }
    }

    #[test]
    fn test_output_capped_at_max_leds() {
        let bits = bits();
        let die = WideDie;
        let preset = normals(NormalsColorType::Track);
        let mut instance = preset
            .create_instance(PlaybackContext::new(&bits, &die, &[]))
            .unwrap();
        instance.start(0);
        let f = frame(&mut instance, 0);
        assert_eq!(f.len(), MAX_LED_COUNT);
        assert_eq!(stopped(&instance), (0..MAX_LED_COUNT).collect::<Vec<_>>());
    }
}
