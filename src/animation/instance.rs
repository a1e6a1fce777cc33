//! Playback: per-instance evaluators driven by absolute time.

use std::fmt;

use rand::random;

use super::{
    AnimationKind, AnimationPreset, CycleInstance, GradientInstance, GradientPatternInstance,
    KeyframedInstance, NoiseInstance, NormalsInstance, RainbowInstance, SequenceInstance,
    SimpleInstance,
};
use crate::bits::{AnimationBits, BoundsError};
use crate::color::Color32;
use crate::die::DieState;

/// Deepest sequence nesting accepted when instantiating.
pub const MAX_SEQUENCE_DEPTH: usize = 4;

/// Errors raised while creating an instance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnimationError {
    #[error(transparent)]
    Bounds(#[from] BoundsError),
    #[error("Sequences nested deeper than {0} levels")]
    SequenceTooDeep(usize),
}

/// Everything an instance reads while playing.
///
/// Cheap to copy; instances keep their own copy for their whole lifetime.
#[derive(Clone, Copy)]
pub struct PlaybackContext<'a> {
    /// Shared palette and curves.
    pub bits: &'a AnimationBits,
    /// Die the animation plays on.
    pub die: &'a dyn DieState,
    /// Animations sequences can refer to by index.
    pub animations: &'a [AnimationPreset],
    /// Seed for stochastic animations.
    pub seed: u64,
}

impl<'a> PlaybackContext<'a> {
    pub fn new(
        bits: &'a AnimationBits,
        die: &'a dyn DieState,
        animations: &'a [AnimationPreset],
    ) -> Self {
        Self {
            bits,
            die,
            animations,
            seed: random(),
        }
    }

    /// Fix the seed so noise playback is reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn led_count(&self) -> usize {
        self.die.led_count()
    }

    /// Context for a sequence child: same data, decorrelated seed.
    pub(crate) fn for_child(&self, index: usize) -> Self {
        let mut child = *self;
        child.seed = self
            .seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(index as u64 + 1);
        child
    }
}

impl fmt::Debug for PlaybackContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackContext")
            .field("bits", &self.bits.counts())
            .field("led_count", &self.die.led_count())
            .field("animations", &self.animations.len())
            .field("seed", &self.seed)
            .finish()
    }
}

/// Stateful evaluator playing one preset.
#[derive(Debug)]
pub enum AnimationInstance<'a> {
    Simple(SimpleInstance<'a>),
    Rainbow(RainbowInstance<'a>),
    Keyframed(KeyframedInstance<'a>),
    GradientPattern(GradientPatternInstance<'a>),
    Gradient(GradientInstance<'a>),
    Noise(NoiseInstance<'a>),
    Cycle(CycleInstance<'a>),
    Normals(NormalsInstance<'a>),
    Sequence(SequenceInstance<'a>),
}

impl AnimationPreset {
    /// Create an instance reading from `ctx`. Call [`AnimationInstance::start`]
    /// before the first update.
    pub fn create_instance<'a>(
        &'a self,
        ctx: PlaybackContext<'a>,
    ) -> Result<AnimationInstance<'a>, AnimationError> {
        self.create_nested(ctx, 0)
    }

    pub(crate) fn create_nested<'a>(
        &'a self,
        ctx: PlaybackContext<'a>,
        depth: usize,
    ) -> Result<AnimationInstance<'a>, AnimationError> {
        if self.duration_ms == 0 {
            log::warn!("{:?} animation has zero duration", self.animation_type());
        }
        let instance = match &self.kind {
            AnimationKind::Simple(a) => AnimationInstance::Simple(SimpleInstance::new(self, a, ctx)),
            AnimationKind::Rainbow(a) => {
                AnimationInstance::Rainbow(RainbowInstance::new(self, a, ctx))
            }
            AnimationKind::Keyframed(a) => {
                AnimationInstance::Keyframed(KeyframedInstance::new(self, a, ctx))
            }
            AnimationKind::GradientPattern(a) => {
                AnimationInstance::GradientPattern(GradientPatternInstance::new(self, a, ctx))
            }
            AnimationKind::Gradient(a) => {
                AnimationInstance::Gradient(GradientInstance::new(self, a, ctx))
            }
            AnimationKind::Noise(a) => AnimationInstance::Noise(NoiseInstance::new(self, a, ctx)),
            AnimationKind::Cycle(a) => AnimationInstance::Cycle(CycleInstance::new(self, a, ctx)),
            AnimationKind::Normals(a) => {
                AnimationInstance::Normals(NormalsInstance::new(self, a, ctx))
            }
            AnimationKind::Sequence(a) => {
                AnimationInstance::Sequence(SequenceInstance::new(self, a, ctx, depth)?)
            }
        };
        log::trace!("created {:?} instance", self.animation_type());
        Ok(instance)
    }
}

impl AnimationInstance<'_> {
    /// The preset being played.
    pub fn preset(&self) -> &AnimationPreset {
        match self {
            AnimationInstance::Simple(i) => i.preset,
            AnimationInstance::Rainbow(i) => i.preset,
            AnimationInstance::Keyframed(i) => i.preset,
            AnimationInstance::GradientPattern(i) => i.preset,
            AnimationInstance::Gradient(i) => i.preset,
            AnimationInstance::Noise(i) => i.preset,
            AnimationInstance::Cycle(i) => i.preset,
            AnimationInstance::Normals(i) => i.preset,
            AnimationInstance::Sequence(i) => i.preset,
        }
    }

    pub fn duration_ms(&self) -> u16 {
        self.preset().duration_ms
    }

    /// Reset all playback state and start at `start_ms`.
    pub fn start(&mut self, start_ms: u32) {
        match self {
            AnimationInstance::Simple(i) => i.start(start_ms),
            AnimationInstance::Rainbow(i) => i.start(start_ms),
            AnimationInstance::Keyframed(i) => i.start(start_ms),
            AnimationInstance::GradientPattern(i) => i.start(start_ms),
            AnimationInstance::Gradient(i) => i.start(start_ms),
            AnimationInstance::Noise(i) => i.start(start_ms),
            AnimationInstance::Cycle(i) => i.start(start_ms),
            AnimationInstance::Normals(i) => i.start(start_ms),
            AnimationInstance::Sequence(i) => i.start(start_ms),
        }
    }

    pub fn start_ms(&self) -> u32 {
        match self {
            AnimationInstance::Simple(i) => i.start_ms,
            AnimationInstance::Rainbow(i) => i.start_ms,
            AnimationInstance::Keyframed(i) => i.start_ms,
            AnimationInstance::GradientPattern(i) => i.start_ms,
            AnimationInstance::Gradient(i) => i.start_ms,
            AnimationInstance::Noise(i) => i.start_ms,
            AnimationInstance::Cycle(i) => i.start_ms,
            AnimationInstance::Normals(i) => i.start_ms,
            AnimationInstance::Sequence(i) => i.start_ms,
        }
    }

    /// Whether a full play-through has elapsed at `time_ms`.
    pub fn is_finished(&self, time_ms: u32) -> bool {
        time_ms.saturating_sub(self.start_ms()) >= self.duration_ms() as u32
    }

    /// Compute LED colors at absolute time `time_ms`.
    ///
    /// Writes `(index, color)` pairs into the output slices starting at 0 and
    /// returns how many were written. Both slices need room for
    /// [`MAX_LED_COUNT`](crate::die::MAX_LED_COUNT) entries.
    pub fn update_leds(
        &mut self,
        time_ms: u32,
        out_indices: &mut [usize],
        out_colors: &mut [Color32],
    ) -> Result<usize, BoundsError> {
        match self {
            AnimationInstance::Simple(i) => i.update_leds(time_ms, out_indices, out_colors),
            AnimationInstance::Rainbow(i) => i.update_leds(time_ms, out_indices, out_colors),
            AnimationInstance::Keyframed(i) => i.update_leds(time_ms, out_indices, out_colors),
            AnimationInstance::GradientPattern(i) => {
                i.update_leds(time_ms, out_indices, out_colors)
            }
            AnimationInstance::Gradient(i) => i.update_leds(time_ms, out_indices, out_colors),
            AnimationInstance::Noise(i) => i.update_leds(time_ms, out_indices, out_colors),
            AnimationInstance::Cycle(i) => i.update_leds(time_ms, out_indices, out_colors),
            AnimationInstance::Normals(i) => i.update_leds(time_ms, out_indices, out_colors),
            AnimationInstance::Sequence(i) => i.update_leds(time_ms, out_indices, out_colors),
        }
    }

    /// LED indices the caller must turn off once playback ends.
    pub fn stop(&self, out_indices: &mut [usize]) -> Result<usize, BoundsError> {
        match self {
            AnimationInstance::Simple(i) => i.stop(out_indices),
            AnimationInstance::Rainbow(i) => i.stop(out_indices),
            AnimationInstance::Keyframed(i) => i.stop(out_indices),
            AnimationInstance::GradientPattern(i) => i.stop(out_indices),
            AnimationInstance::Gradient(i) => i.stop(out_indices),
            AnimationInstance::Noise(i) => i.stop(out_indices),
            AnimationInstance::Cycle(i) => i.stop(out_indices),
            AnimationInstance::Normals(i) => i.stop(out_indices),
            AnimationInstance::Sequence(i) => i.stop(out_indices),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::die::MAX_LED_COUNT;

    /// Evaluate one frame into `(index, color)` pairs.
    pub(crate) fn frame(instance: &mut AnimationInstance<'_>, time_ms: u32) -> Vec<(usize, Color32)> {
        let mut indices = [0usize; MAX_LED_COUNT];
        let mut colors = [0u32; MAX_LED_COUNT];
        let n = instance
            .update_leds(time_ms, &mut indices, &mut colors)
            .unwrap();
        indices[..n]
            .iter()
            .copied()
            .zip(colors[..n].iter().copied())
            .collect()
    }

    /// Color of one LED in a frame, if present.
    pub(crate) fn led(frame: &[(usize, Color32)], index: usize) -> Option<Color32> {
        frame.iter().find(|(i, _)| *i == index).map(|(_, c)| *c)
    }

    pub(crate) fn stopped(instance: &AnimationInstance<'_>) -> Vec<usize> {
        let mut indices = [0usize; MAX_LED_COUNT];
        let n = instance.stop(&mut indices).unwrap();
        indices[..n].to_vec()
    }
}
