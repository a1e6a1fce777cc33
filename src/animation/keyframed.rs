//! Keyframed animation: several RGB tracks, each driving its own LEDs.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::timing::{elapsed_ms, normalized_time};
use super::{AnimationPreset, PlaybackContext};
use crate::bits::{BoundsError, RgbTrack};
use crate::codec::read_u16;
use crate::color::Color32;

/// Parameters of a [`KeyframedInstance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationKeyframed {
    /// Index of the first track in
    /// [`AnimationBits::rgb_tracks`](crate::bits::AnimationBits).
    pub tracks_offset: u16,
    pub track_count: u16,
}

impl AnimationKeyframed {
    /// tracks_offset(2) + track_count(2)
    pub const SIZE: usize = 4;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.tracks_offset.to_le_bytes())?;
        w.write_all(&self.track_count.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            tracks_offset: read_u16(r)?,
            track_count: read_u16(r)?,
        })
    }
}

#[derive(Debug)]
pub struct KeyframedInstance<'a> {
    pub(crate) preset: &'a AnimationPreset,
    params: &'a AnimationKeyframed,
    ctx: PlaybackContext<'a>,
    pub(crate) start_ms: u32,
}

impl<'a> KeyframedInstance<'a> {
    pub(crate) fn new(
        preset: &'a AnimationPreset,
        params: &'a AnimationKeyframed,
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

    fn track(&self, i: usize) -> Result<&'a RgbTrack, BoundsError> {
        self.ctx
            .bits
            .get_rgb_track(self.params.tracks_offset as usize + i)
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
        let mut count = 0;
        for i in 0..self.params.track_count as usize {
            count = self.track(i)?.evaluate(
                ctx.bits,
                ctx.die,
                time,
                count,
                out_indices,
                out_colors,
            )?;
        }
        Ok(count)
    }

    pub fn stop(&self, out_indices: &mut [usize]) -> Result<usize, BoundsError> {
        let mut count = 0;
        for i in 0..self.params.track_count as usize {
            count = self
                .track(i)?
                .extract_led_indices(self.ctx.led_count(), count, out_indices)?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationKind;
    use crate::animation::testing::{frame, led, stopped};
    use crate::bits::{AnimationBits, RgbKeyframe, palette_from_color32};
    use crate::color::{get_blue, get_green, get_red};
    use crate::die::{DieType, VirtualDie};

    fn two_tracks() -> (AnimationBits, AnimationPreset) {
        let mut bits = AnimationBits {
            palette: palette_from_color32(&[0x000000, 0xFFFFFF, 0xFF0000]),
            ..Default::default()
        };
        let first = bits.push_rgb_track(
            &[RgbKeyframe::new(0, 0), RgbKeyframe::new(1000, 1)],
            0b0001,
        );
        bits.push_rgb_track(&[RgbKeyframe::new(0, 2)], 0b0110);
        let preset = AnimationPreset::new(
            1000,
            AnimationKind::Keyframed(AnimationKeyframed {
                tracks_offset: first,
                track_count: 2,
            }),
        );
        (bits, preset)
    }

    #[test]
    fn test_tracks_concatenate() {
        let (bits, preset) = two_tracks();
        let die = VirtualDie::pinned(DieType::D6, 0);
        let mut instance = preset
            .create_instance(PlaybackContext::new(&bits, &die, &[]))
            .unwrap();
        instance.start(0);

        let f = frame(&mut instance, 500);
        assert_eq!(f.len(), 3);
        let mid = led(&f, 0).unwrap();
        for channel in [get_red(mid), get_green(mid), get_blue(mid)] {
            assert!((127..=128).contains(&channel));
        }
        assert_eq!(led(&f, 1), Some(0xFF0000));
        assert_eq!(led(&f, 2), Some(0xFF0000));

        assert_eq!(led(&frame(&mut instance, 1000), 0), Some(0xFFFFFF));
        assert_eq!(stopped(&instance), vec![0, 1, 2]);
    }

    #[test]
    fn test_time_scales_with_duration() {
        let (bits, mut preset) = two_tracks();
        preset.duration_ms = 4000;
        let die = VirtualDie::pinned(DieType::D6, 0);
        let mut instance = preset
            .create_instance(PlaybackContext::new(&bits, &die, &[]))
            .unwrap();
        instance.start(1000);
        // 2000 ms into a 4000 ms animation is the track midpoint
        let mid = led(&frame(&mut instance, 3000), 0).unwrap();
        assert!((127..=128).contains(&get_red(mid)));
        // Before the start the first keyframe holds
        assert_eq!(led(&frame(&mut instance, 0), 0), Some(0));
    }

    #[test]
    fn test_track_range_checked() {
        let (bits, mut preset) = two_tracks();
        if let AnimationKind::Keyframed(k) = &mut preset.kind {
            k.track_count = 3;
        }
        let die = VirtualDie::pinned(DieType::D6, 0);
        let mut instance = preset
            .create_instance(PlaybackContext::new(&bits, &die, &[]))
            .unwrap();
        instance.start(0);
        let mut indices = [0usize; 32];
        let mut colors = [0u32; 32];
        let err = instance
            .update_leds(0, &mut indices, &mut colors)
            .unwrap_err();
        assert_eq!((err.array, err.index, err.len), ("rgb_tracks", 2, 2));
    }

    #[test]
    fn test_overlapping_tracks_fill_output() {
        let mut bits = AnimationBits {
            palette: palette_from_color32(&[0xFF0000]),
            ..Default::default()
        };
        let first = bits.push_rgb_track(&[RgbKeyframe::new(0, 0)], 0xFFFFF);
        bits.push_rgb_track(&[RgbKeyframe::new(0, 0)], 0xFFFFF);
        let preset = AnimationPreset::new(
            1000,
            AnimationKind::Keyframed(AnimationKeyframed {
                tracks_offset: first,
                track_count: 2,
            }),
        );
        let die = VirtualDie::pinned(DieType::D20, 0);
        let mut instance = preset
            .create_instance(PlaybackContext::new(&bits, &die, &[]))
            .unwrap();
        instance.start(0);

        // 40 LED writes into 32 slots
        let mut indices = [0usize; 32];
        let mut colors = [0u32; 32];
        let err = instance
            .update_leds(10, &mut indices, &mut colors)
            .unwrap_err();
        assert_eq!((err.array, err.index, err.len), ("out_indices", 32, 32));
        let err = instance.stop(&mut indices).unwrap_err();
        assert_eq!((err.array, err.index, err.len), ("out_indices", 32, 32));
    }
}
