//! Gradient animations: colors sampled from a shared RGB track over time.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::timing::{elapsed_ms, normalized_time};
use super::{AnimationPreset, PlaybackContext};
use crate::bits::{
    BoundsError, PALETTE_COLOR_FROM_FACE, mask_leds, write_led_indices, write_leds,
};
use crate::codec::{read_u8, read_u16, read_u32, skip};
use crate::color::{Color32, modulate_color};

/// Parameters of a [`GradientInstance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationGradient {
    pub face_mask: u32,
    /// Index of the RGB track sampled over the duration.
    pub gradient_track_offset: u16,
}

impl AnimationGradient {
    /// face_mask(4) + gradient(2) + pad(2)
    pub const SIZE: usize = 8;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.face_mask.to_le_bytes())?;
        w.write_all(&self.gradient_track_offset.to_le_bytes())?;
        w.write_all(&[0, 0])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let face_mask = read_u32(r)?;
        let gradient_track_offset = read_u16(r)?;
        skip(r, 2)?;
        Ok(Self {
            face_mask,
            gradient_track_offset,
        })
    }
}

#[derive(Debug)]
pub struct GradientInstance<'a> {
    pub(crate) preset: &'a AnimationPreset,
    params: &'a AnimationGradient,
    ctx: PlaybackContext<'a>,
    pub(crate) start_ms: u32,
}

impl<'a> GradientInstance<'a> {
    pub(crate) fn new(
        preset: &'a AnimationPreset,
        params: &'a AnimationGradient,
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
        let ctx = self.ctx;
        let time = normalized_time(
            elapsed_ms(time_ms, self.start_ms),
            self.preset.duration_ms,
        );
        let gradient = ctx
            .bits
            .get_rgb_track(self.params.gradient_track_offset as usize)?;
        let color = gradient.evaluate_color(ctx.bits, ctx.die, time)?;
        write_leds(
            mask_leds(self.params.face_mask, ctx.led_count()),
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

/// Parameters of a [`GradientPatternInstance`].
///
/// Intensity tracks shape *where* and *how bright*; the gradient (or the face
/// color) decides the hue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationGradientPattern {
    /// Index of the first intensity track in
    /// [`AnimationBits::tracks`](crate::bits::AnimationBits).
    pub tracks_offset: u16,
    pub track_count: u16,
    /// Index of the RGB track giving the color over time.
    pub gradient_track_offset: u16,
    /// Use the face-derived color instead of the gradient.
    #[serde(default)]
    pub override_with_face: bool,
}

impl AnimationGradientPattern {
    /// tracks_offset(2) + track_count(2) + gradient(2) + override(1) + pad(1)
    pub const SIZE: usize = 8;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.tracks_offset.to_le_bytes())?;
        w.write_all(&self.track_count.to_le_bytes())?;
        w.write_all(&self.gradient_track_offset.to_le_bytes())?;
        w.write_all(&[self.override_with_face as u8, 0])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let tracks_offset = read_u16(r)?;
        let track_count = read_u16(r)?;
        let gradient_track_offset = read_u16(r)?;
        let override_with_face = read_u8(r)? != 0;
        skip(r, 1)?;
        Ok(Self {
            tracks_offset,
            track_count,
            gradient_track_offset,
            override_with_face,
        })
    }
}

#[derive(Debug)]
pub struct GradientPatternInstance<'a> {
    pub(crate) preset: &'a AnimationPreset,
    params: &'a AnimationGradientPattern,
    ctx: PlaybackContext<'a>,
    pub(crate) start_ms: u32,
}

impl<'a> GradientPatternInstance<'a> {
    pub(crate) fn new(
        preset: &'a AnimationPreset,
        params: &'a AnimationGradientPattern,
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
        let ctx = self.ctx;
        let p = self.params;
        let time = normalized_time(
            elapsed_ms(time_ms, self.start_ms),
            self.preset.duration_ms,
        );

        let base = if p.override_with_face {
            ctx.bits.get_color(PALETTE_COLOR_FROM_FACE, ctx.die)?
        } else {
            ctx.bits
                .get_rgb_track(p.gradient_track_offset as usize)?
                .evaluate_color(ctx.bits, ctx.die, time)?
        };

        let mut count = 0;
        for i in 0..p.track_count as usize {
            let track = ctx.bits.get_track(p.tracks_offset as usize + i)?;
            if track.keyframe_count == 0 {
                continue;
            }
            let color = modulate_color(base, track.evaluate_intensity(ctx.bits, time)?);
            count = write_leds(
                mask_leds(track.led_mask, ctx.led_count()),
                count,
                out_indices,
                out_colors,
                |_| Ok(color),
            )?;
        }
        Ok(count)
    }

    pub fn stop(&self, out_indices: &mut [usize]) -> Result<usize, BoundsError> {
        let p = self.params;
        let mut count = 0;
        for i in 0..p.track_count as usize {
            let track = self.ctx.bits.get_track(p.tracks_offset as usize + i)?;
            count = track.extract_led_indices(self.ctx.led_count(), count, out_indices)?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::testing::{frame, led, stopped};
    use crate::animation::{AnimationInstance, AnimationKind};
    use crate::bits::{AnimationBits, RgbKeyframe, SimpleKeyframe, palette_from_color32};
    use crate::color::rainbow_wheel;
    use crate::die::{DieType, VirtualDie};

    fn red_to_blue() -> (AnimationBits, u16) {
        let mut bits = AnimationBits {
            palette: palette_from_color32(&[0xFF0000, 0x0000FF]),
            ..Default::default()
        };
        let gradient =
            bits.push_rgb_track(&[RgbKeyframe::new(0, 0), RgbKeyframe::new(1000, 1)], 0);
        (bits, gradient)
    }

    #[test]
    fn test_gradient_spans_duration() {
        let (bits, gradient) = red_to_blue();
        let die = VirtualDie::pinned(DieType::D6, 0);
        let preset = AnimationPreset::new(
            2000,
            AnimationKind::Gradient(AnimationGradient {
                face_mask: 0b11,
                gradient_track_offset: gradient,
            }),
        );
        let mut instance = preset
            .create_instance(PlaybackContext::new(&bits, &die, &[]))
            .unwrap();
        instance.start(0);
        assert_eq!(led(&frame(&mut instance, 0), 1), Some(0xFF0000));
        assert_eq!(led(&frame(&mut instance, 1000), 1), Some(0x7F007F));
        assert_eq!(led(&frame(&mut instance, 2000), 0), Some(0x0000FF));
        // Past the end the last keyframe holds
        assert_eq!(led(&frame(&mut instance, 5000), 0), Some(0x0000FF));
    }

    fn pattern(bits: &mut AnimationBits, gradient: u16, override_with_face: bool) -> AnimationPreset {
        let first = bits.push_track(
            &[SimpleKeyframe::new(0, 0), SimpleKeyframe::new(1000, 255)],
            0b0011,
        );
        bits.push_track(&[SimpleKeyframe::new(0, 255)], 0b1100);
        AnimationPreset::new(
            1000,
            AnimationKind::GradientPattern(AnimationGradientPattern {
                tracks_offset: first,
                track_count: 2,
                gradient_track_offset: gradient,
                override_with_face,
            }),
        )
    }

    #[test]
    fn test_pattern_concatenates_tracks() {
        let (mut bits, gradient) = red_to_blue();
        let preset = pattern(&mut bits, gradient, false);
        let die = VirtualDie::pinned(DieType::D6, 0);
        let mut instance = preset
            .create_instance(PlaybackContext::new(&bits, &die, &[]))
            .unwrap();
        instance.start(0);

        let f = frame(&mut instance, 0);
        let indices: Vec<usize> = f.iter().map(|&(i, _)| i).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        // First track starts dark, second is at 254/255 of red
        assert_eq!(led(&f, 0), Some(0));
        assert_eq!(led(&f, 2), Some(modulate_color(0xFF0000, 254)));

        assert_eq!(stopped(&instance), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_pattern_face_override() {
        let (mut bits, gradient) = red_to_blue();
        let preset = pattern(&mut bits, gradient, true);
        let die = VirtualDie::pinned(DieType::D6, 3);
        let mut instance = preset
            .create_instance(PlaybackContext::new(&bits, &die, &[]))
            .unwrap();
        instance.start(0);
        let f = frame(&mut instance, 0);
        assert_eq!(led(&f, 3), Some(modulate_color(rainbow_wheel(128, 255), 254)));
    }

    #[test]
    fn test_pattern_missing_track_errors() {
        let (bits, gradient) = red_to_blue();
        let preset = AnimationPreset::new(
            1000,
            AnimationKind::GradientPattern(AnimationGradientPattern {
                tracks_offset: 0,
                track_count: 1,
                gradient_track_offset: gradient,
                override_with_face: false,
            }),
        );
        let die = VirtualDie::pinned(DieType::D6, 0);
        let instance = preset
            .create_instance(PlaybackContext::new(&bits, &die, &[]))
            .unwrap();
        let mut indices = [0usize; 32];
        let AnimationInstance::GradientPattern(inner) = &instance else {
            panic!("wrong instance kind");
        };
        assert_eq!(inner.stop(&mut indices).unwrap_err().array, "tracks");
    }

    #[test]
    fn test_pattern_overlap_fills_output() {
        let (mut bits, gradient) = red_to_blue();
        let first = bits.push_track(&[SimpleKeyframe::new(0, 255)], 0xFFFFF);
        bits.push_track(&[SimpleKeyframe::new(0, 255)], 0xFFFFF);
        let preset = AnimationPreset::new(
            1000,
            AnimationKind::GradientPattern(AnimationGradientPattern {
                tracks_offset: first,
                track_count: 2,
                gradient_track_offset: gradient,
                override_with_face: false,
            }),
        );
        let die = VirtualDie::pinned(DieType::D20, 0);
        let mut instance = preset
            .create_instance(PlaybackContext::new(&bits, &die, &[]))
            .unwrap();
        instance.start(0);
        let mut indices = [0usize; 32];
        let mut colors = [0u32; 32];
        let err = instance
            .update_leds(0, &mut indices, &mut colors)
            .unwrap_err();
        assert_eq!((err.array, err.index), ("out_indices", 32));
    }
}
