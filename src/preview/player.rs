//! Fixed-rate preview of one animation on a simulated die.

use std::fmt;

use crate::animation::{AnimationError, AnimationInstance, AnimationPreset, PlaybackContext};
use crate::bits::BoundsError;
use crate::color::{BLACK, Color32, gamma32};
use crate::die::MAX_LED_COUNT;
use crate::schema::PreviewConfig;

/// State of every LED at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Milliseconds since the animation started.
    pub time_ms: u32,
    /// One color per LED, black when unlit.
    pub leds: Vec<Color32>,
}

impl Frame {
    /// Number of LEDs that are not black.
    pub fn lit_count(&self) -> usize {
        self.leds.iter().filter(|&&c| c != BLACK).count()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}ms", self.time_ms)?;
        for color in &self.leds {
            write!(f, " {color:06X}")?;
        }
        Ok(())
    }
}

/// Steps an [`AnimationInstance`] at a fixed frame rate.
///
/// LEDs keep their last color until an update overwrites them, like the
/// LED buffer of a real die. The last frame is rendered after `stop`, with
/// every LED the animation drove turned off.
///
/// Usage:
/// ```ignore
/// let mut player = PreviewPlayer::new(&preset, ctx, &PreviewConfig::default())?;
/// for frame in player.frames() {
///     println!("{}", frame?);
/// }
/// ```
#[derive(Debug)]
pub struct PreviewPlayer<'a> {
    instance: AnimationInstance<'a>,
    interval_ms: u32,
    end_ms: u32,
    gamma: bool,
    leds: Vec<Color32>,
    indices: [usize; MAX_LED_COUNT],
    colors: [Color32; MAX_LED_COUNT],
}

impl<'a> PreviewPlayer<'a> {
    /// Instantiate `preset` and start it at time 0.
    pub fn new(
        preset: &'a AnimationPreset,
        ctx: PlaybackContext<'a>,
        config: &PreviewConfig,
    ) -> Result<Self, AnimationError> {
        let ctx = match config.seed {
            Some(seed) => ctx.with_seed(seed),
            None => ctx,
        };
        let led_count = ctx.led_count().min(MAX_LED_COUNT);
        let mut instance = preset.create_instance(ctx)?;
        instance.start(0);

        let end_ms = config
            .duration_ms
            .unwrap_or(preset.duration_ms as u32)
            .max(1);
        log::debug!(
            "previewing {:?} animation: {} ms at {} fps on {} LEDs",
            preset.animation_type(),
            end_ms,
            config.fps,
            led_count
        );

        Ok(Self {
            instance,
            interval_ms: config.frame_interval_ms(),
            end_ms,
            gamma: config.gamma,
            leds: vec![BLACK; led_count],
            indices: [0; MAX_LED_COUNT],
            colors: [BLACK; MAX_LED_COUNT],
        })
    }

    /// Total frames, the final stop frame included.
    pub fn frame_count(&self) -> usize {
        self.end_ms.div_ceil(self.interval_ms) as usize + 1
    }

    /// Time of the last frame.
    pub fn end_ms(&self) -> u32 {
        self.end_ms
    }

    pub fn led_count(&self) -> usize {
        self.leds.len()
    }

    /// Apply the update for `time_ms` and return the resulting frame.
    pub fn render(&mut self, time_ms: u32) -> Result<Frame, BoundsError> {
        let n = self
            .instance
            .update_leds(time_ms, &mut self.indices, &mut self.colors)?;
        for (&index, &color) in self.indices[..n].iter().zip(&self.colors[..n]) {
            if let Some(slot) = self.leds.get_mut(index) {
                *slot = if self.gamma { gamma32(color) } else { color };
            }
        }
        Ok(self.snapshot(time_ms))
    }

    /// Stop the animation and return the frame with its LEDs turned off.
    pub fn finish(&mut self) -> Result<Frame, BoundsError> {
        let n = self.instance.stop(&mut self.indices)?;
        for &index in &self.indices[..n] {
            if let Some(slot) = self.leds.get_mut(index) {
                *slot = BLACK;
            }
        }
        Ok(self.snapshot(self.end_ms))
    }

    fn snapshot(&self, time_ms: u32) -> Frame {
        Frame {
            time_ms,
            leds: self.leds.clone(),
        }
    }

    /// Iterate over all frames from time 0.
    pub fn frames(&mut self) -> FrameIterator<'_, 'a> {
        FrameIterator {
            player: self,
            current: 0,
        }
    }
}

/// Iterator over preview frames.
pub struct FrameIterator<'p, 'a> {
    player: &'p mut PreviewPlayer<'a>,
    current: usize,
}

impl Iterator for FrameIterator<'_, '_> {
    type Item = Result<Frame, BoundsError>;

    fn next(&mut self) -> Option<Self::Item> {
        let count = self.player.frame_count();
        if self.current >= count {
            return None;
        }

        let result = if self.current + 1 == count {
            self.player.finish()
        } else {
            let time_ms = self.current as u32 * self.player.interval_ms;
            self.player.render(time_ms)
        };
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.player.frame_count() - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FrameIterator<'_, '_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationKind, AnimationNoise, AnimationSimple, NoiseColorType};
    use crate::bits::{AnimationBits, RgbKeyframe, palette_from_color32};
    use crate::die::{DieType, VirtualDie};

    fn bits() -> AnimationBits {
        AnimationBits {
            palette: palette_from_color32(&[0xFF0000, 0x808080]),
            ..Default::default()
        }
    }

    fn simple(color_index: u16) -> AnimationPreset {
        AnimationPreset::new(
            1000,
            AnimationKind::Simple(AnimationSimple {
                face_mask: 0b1010,
                color_index,
                count: 1,
                fade: 0,
            }),
        )
    }

    #[test]
    fn test_frame_count_and_timing() {
        let bits = bits();
        let die = VirtualDie::pinned(DieType::D6, 0);
        let preset = simple(0);
        let ctx = PlaybackContext::new(&bits, &die, &[]);
        let mut player = PreviewPlayer::new(&preset, ctx, &PreviewConfig::default()).unwrap();

        // 0, 33, ..., 990 then the stop frame
        assert_eq!(player.frame_count(), 32);
        let frames: Vec<Frame> = player.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 32);
        assert_eq!(frames[1].time_ms, 33);
        assert_eq!(frames[30].time_ms, 990);
        assert_eq!(frames[31].time_ms, 1000);

        // Off at t=0, lit during the first half
        assert_eq!(frames[0].lit_count(), 0);
        assert_eq!(frames[1].leds, vec![0, 0xFF0000, 0, 0xFF0000, 0, 0]);

        // Stop frame turns everything off
        assert_eq!(frames[31].lit_count(), 0);
    }

    #[test]
    fn test_size_hint_tracks_progress() {
        let bits = bits();
        let die = VirtualDie::pinned(DieType::D6, 0);
        let preset = simple(0);
        let ctx = PlaybackContext::new(&bits, &die, &[]);
        let config = PreviewConfig {
            fps: 10,
            duration_ms: Some(250),
            ..Default::default()
        };
        let mut player = PreviewPlayer::new(&preset, ctx, &config).unwrap();
        let mut frames = player.frames();
        assert_eq!(frames.len(), 4);
        frames.next();
        assert_eq!(frames.len(), 3);
    }

    #[test]
    fn test_gamma_applied_to_output() {
        let bits = bits();
        let die = VirtualDie::pinned(DieType::D6, 0);
        let preset = simple(1);
        let ctx = PlaybackContext::new(&bits, &die, &[]);
        let config = PreviewConfig {
            gamma: true,
            ..Default::default()
        };
        let mut player = PreviewPlayer::new(&preset, ctx, &config).unwrap();
        let frame = player.render(100).unwrap();
        assert_eq!(frame.leds[1], gamma32(0x808080));
    }

    #[test]
    fn test_seeded_noise_reproducible() {
        let mut bits = bits();
        let track = bits.push_rgb_track(&[RgbKeyframe::new(0, 0), RgbKeyframe::new(1000, 0)], 0);
        let preset = AnimationPreset::new(
            2000,
            AnimationKind::Noise(AnimationNoise {
                gradient_track_offset: track,
                blink_gradient_track_offset: track,
                blink_interval_min_ms: 50,
                blink_interval_delta_ms: 100,
                blink_duration_ms: 300,
                fade: 0,
                color_type: NoiseColorType::TimeGradient,
                color_variance: 0,
            }),
        );
        let die = VirtualDie::pinned(DieType::D20, 0);
        let config = PreviewConfig {
            seed: Some(99),
            ..Default::default()
        };

        let run = || {
            let ctx = PlaybackContext::new(&bits, &die, &[]);
            let mut player = PreviewPlayer::new(&preset, ctx, &config).unwrap();
            player.frames().map(|f| f.unwrap()).collect::<Vec<_>>()
        };
        let first = run();
        assert_eq!(first, run());
        assert!(first.iter().any(|f| f.lit_count() > 0));
    }

    #[test]
    fn test_display() {
        let frame = Frame {
            time_ms: 33,
            leds: vec![0xFF0000, 0],
        };
        assert_eq!(frame.to_string(), "    33ms FF0000 000000");
    }
}
