//! Configuration types for local animation preview.

use serde::{Deserialize, Serialize};

use crate::die::{DieType, VirtualDie};

/// Default preview frame rate.
pub const DEFAULT_FPS: u32 = 30;

fn default_fps() -> u32 {
    DEFAULT_FPS
}

/// How an animation is previewed without a physical die.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Shape of the simulated die.
    #[serde(default)]
    pub die_type: DieType,
    /// Frames per second.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Length of the preview; the animation's own duration when unset.
    #[serde(default)]
    pub duration_ms: Option<u32>,
    /// Seed for noise animations and die rolls; random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Keep this face up instead of rolling the die.
    #[serde(default)]
    pub face: Option<usize>,
    /// Apply the LED gamma curve to output colors.
    #[serde(default)]
    pub gamma: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            die_type: DieType::default(),
            fps: DEFAULT_FPS,
            duration_ms: None,
            seed: None,
            face: None,
            gamma: false,
        }
    }
}

impl PreviewConfig {
    /// Milliseconds between frames.
    #[inline]
    pub fn frame_interval_ms(&self) -> u32 {
        (1000 / self.fps.max(1)).max(1)
    }

    /// Simulated die matching this configuration.
    pub fn make_die(&self) -> VirtualDie {
        match (self.face, self.seed) {
            (Some(face), _) => VirtualDie::pinned(self.die_type, face),
            (None, Some(seed)) => VirtualDie::seeded(self.die_type, seed),
            (None, None) => VirtualDie::new(self.die_type),
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 || self.fps > 1000 {
            return Err(ConfigError::InvalidFrameRate(self.fps));
        }
        if self.duration_ms == Some(0) {
            return Err(ConfigError::InvalidDuration);
        }
        if let Some(face) = self.face {
            let face_count = self.die_type.face_count();
            if face >= face_count {
                return Err(ConfigError::InvalidFace { face, face_count });
            }
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Frame rate must be between 1 and 1000, got {0}")]
    InvalidFrameRate(u32),
    #[error("Preview duration must be non-zero")]
    InvalidDuration,
    #[error("Face {face} does not exist on a die with {face_count} faces")]
    InvalidFace { face: usize, face_count: usize },
}
