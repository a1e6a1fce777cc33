//! The closed family of animation presets and their wire encoding.
//!
//! Every preset starts with the same 4-byte header:
//!
//! ```text
//! type: u8 | flags: u8 | duration_ms: u16
//! ```
//!
//! followed by the variant fields (see each variant's `SIZE`).

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::{
    AnimationCycle, AnimationGradient, AnimationGradientPattern, AnimationKeyframed,
    AnimationNoise, AnimationNormals, AnimationRainbow, AnimationSequence, AnimationSimple,
};
use crate::codec::{read_u8, read_u16, unknown_type};

/// Type byte of each preset variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AnimationType {
    Simple = 1,
    Rainbow = 2,
    Keyframed = 3,
    GradientPattern = 4,
    Gradient = 5,
    Noise = 6,
    Cycle = 7,
    Normals = 8,
    Sequence = 9,
}

impl AnimationType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(AnimationType::Simple),
            2 => Some(AnimationType::Rainbow),
            3 => Some(AnimationType::Keyframed),
            4 => Some(AnimationType::GradientPattern),
            5 => Some(AnimationType::Gradient),
            6 => Some(AnimationType::Noise),
            7 => Some(AnimationType::Cycle),
            8 => Some(AnimationType::Normals),
            9 => Some(AnimationType::Sequence),
            _ => None,
        }
    }
}

/// Per-animation flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnimationFlags {
    /// Offset each LED's phase so the color visibly travels around the die.
    #[serde(default)]
    pub traveling: bool,
    /// Masks address LEDs rather than faces. Carried through verbatim.
    #[serde(default)]
    pub use_led_indices: bool,
}

impl AnimationFlags {
    const TRAVELING: u8 = 1 << 0;
    const USE_LED_INDICES: u8 = 1 << 1;

    pub fn to_u8(self) -> u8 {
        let mut flags = 0;
        if self.traveling {
            flags |= Self::TRAVELING;
        }
        if self.use_led_indices {
            flags |= Self::USE_LED_INDICES;
        }
        flags
    }

    pub fn from_u8(v: u8) -> Self {
        Self {
            traveling: v & Self::TRAVELING != 0,
            use_led_indices: v & Self::USE_LED_INDICES != 0,
        }
    }
}

/// Immutable parameters of one lighting animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationPreset {
    /// Length of one play-through in milliseconds.
    pub duration_ms: u16,
    #[serde(default)]
    pub flags: AnimationFlags,
    #[serde(flatten)]
    pub kind: AnimationKind,
}

/// Variant-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationKind {
    Simple(AnimationSimple),
    Rainbow(AnimationRainbow),
    Keyframed(AnimationKeyframed),
    GradientPattern(AnimationGradientPattern),
    Gradient(AnimationGradient),
    Noise(AnimationNoise),
    Cycle(AnimationCycle),
    Normals(AnimationNormals),
    Sequence(AnimationSequence),
}

impl AnimationPreset {
    /// type(1) + flags(1) + duration(2)
    pub const HEADER_SIZE: usize = 4;

    pub fn new(duration_ms: u16, kind: AnimationKind) -> Self {
        Self {
            duration_ms,
            flags: AnimationFlags::default(),
            kind,
        }
    }

    pub fn with_flags(mut self, flags: AnimationFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn animation_type(&self) -> AnimationType {
        match self.kind {
            AnimationKind::Simple(_) => AnimationType::Simple,
            AnimationKind::Rainbow(_) => AnimationType::Rainbow,
            AnimationKind::Keyframed(_) => AnimationType::Keyframed,
            AnimationKind::GradientPattern(_) => AnimationType::GradientPattern,
            AnimationKind::Gradient(_) => AnimationType::Gradient,
            AnimationKind::Noise(_) => AnimationType::Noise,
            AnimationKind::Cycle(_) => AnimationType::Cycle,
            AnimationKind::Normals(_) => AnimationType::Normals,
            AnimationKind::Sequence(_) => AnimationType::Sequence,
        }
    }

    /// Serialized size in bytes, header included.
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE
            + match self.kind {
                AnimationKind::Simple(_) => AnimationSimple::SIZE,
                AnimationKind::Rainbow(_) => AnimationRainbow::SIZE,
                AnimationKind::Keyframed(_) => AnimationKeyframed::SIZE,
                AnimationKind::GradientPattern(_) => AnimationGradientPattern::SIZE,
                AnimationKind::Gradient(_) => AnimationGradient::SIZE,
                AnimationKind::Noise(_) => AnimationNoise::SIZE,
                AnimationKind::Cycle(_) => AnimationCycle::SIZE,
                AnimationKind::Normals(_) => AnimationNormals::SIZE,
                AnimationKind::Sequence(_) => AnimationSequence::SIZE,
            }
    }

    /// Write the record.
    ///
    /// `animation_offsets` holds the byte offset of every animation in the
    /// enclosing section; sequences store their children as such offsets.
    pub fn write_to<W: Write>(&self, w: &mut W, animation_offsets: &[u16]) -> io::Result<()> {
        w.write_all(&[self.animation_type() as u8, self.flags.to_u8()])?;
        w.write_all(&self.duration_ms.to_le_bytes())?;
        match &self.kind {
            AnimationKind::Simple(a) => a.write_to(w),
            AnimationKind::Rainbow(a) => a.write_to(w),
            AnimationKind::Keyframed(a) => a.write_to(w),
            AnimationKind::GradientPattern(a) => a.write_to(w),
            AnimationKind::Gradient(a) => a.write_to(w),
            AnimationKind::Noise(a) => a.write_to(w),
            AnimationKind::Cycle(a) => a.write_to(w),
            AnimationKind::Normals(a) => a.write_to(w),
            AnimationKind::Sequence(a) => a.write_to(w, animation_offsets),
        }
    }

    /// Read one record, the inverse of [`Self::write_to`].
    pub fn read_from<R: Read>(r: &mut R, animation_offsets: &[u16]) -> io::Result<Self> {
        let type_byte = read_u8(r)?;
        let animation_type =
            AnimationType::from_u8(type_byte).ok_or_else(|| unknown_type("animation", type_byte))?;
        let flags = AnimationFlags::from_u8(read_u8(r)?);
        let duration_ms = read_u16(r)?;

        let kind = match animation_type {
            AnimationType::Simple => AnimationKind::Simple(AnimationSimple::read_from(r)?),
            AnimationType::Rainbow => AnimationKind::Rainbow(AnimationRainbow::read_from(r)?),
            AnimationType::Keyframed => AnimationKind::Keyframed(AnimationKeyframed::read_from(r)?),
            AnimationType::GradientPattern => {
                AnimationKind::GradientPattern(AnimationGradientPattern::read_from(r)?)
            }
            AnimationType::Gradient => AnimationKind::Gradient(AnimationGradient::read_from(r)?),
            AnimationType::Noise => AnimationKind::Noise(AnimationNoise::read_from(r)?),
            AnimationType::Cycle => AnimationKind::Cycle(AnimationCycle::read_from(r)?),
            AnimationType::Normals => AnimationKind::Normals(AnimationNormals::read_from(r)?),
            AnimationType::Sequence => {
                AnimationKind::Sequence(AnimationSequence::read_from(r, animation_offsets)?)
            }
        };

        Ok(Self {
            duration_ms,
            flags,
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{NoiseColorType, NormalsColorType, SequenceStep};

    fn all_variants() -> Vec<AnimationPreset> {
        vec![
            AnimationPreset::new(
                1000,
                AnimationKind::Simple(AnimationSimple {
                    face_mask: 0xFFFFF,
                    color_index: 2,
                    count: 3,
                    fade: 128,
                }),
            ),
            AnimationPreset::new(
                2000,
                AnimationKind::Rainbow(AnimationRainbow {
                    face_mask: 0xFF,
                    count: 2,
                    fade: 10,
                    intensity: 200,
                }),
            )
            .with_flags(AnimationFlags {
                traveling: true,
                use_led_indices: false,
            }),
            AnimationPreset::new(
                500,
                AnimationKind::Keyframed(AnimationKeyframed {
                    tracks_offset: 1,
                    track_count: 2,
                }),
            ),
            AnimationPreset::new(
                700,
                AnimationKind::GradientPattern(AnimationGradientPattern {
                    tracks_offset: 0,
                    track_count: 1,
                    gradient_track_offset: 3,
                    override_with_face: true,
                }),
            ),
            AnimationPreset::new(
                800,
                AnimationKind::Gradient(AnimationGradient {
                    face_mask: 0x1,
                    gradient_track_offset: 4,
                }),
            ),
            AnimationPreset::new(
                3000,
                AnimationKind::Noise(AnimationNoise {
                    gradient_track_offset: 1,
                    blink_gradient_track_offset: 2,
                    blink_interval_min_ms: 50,
                    blink_interval_delta_ms: 100,
                    blink_duration_ms: 300,
                    fade: 20,
                    color_type: NoiseColorType::FaceToRainbowWheel,
                    color_variance: 12,
                }),
            ),
            AnimationPreset::new(
                900,
                AnimationKind::Cycle(AnimationCycle {
                    face_mask: 0xF0,
                    count: 4,
                    fade: 0,
                    intensity: 255,
                    gradient_track_offset: 5,
                }),
            ),
            AnimationPreset::new(
                1200,
                AnimationKind::Normals(AnimationNormals {
                    gradient_track_offset: 0,
                    axis_gradient_track_offset: 1,
                    fade: 30,
                    color_type: NormalsColorType::FaceToGradient,
                }),
            ),
            AnimationPreset::new(
                4000,
                AnimationKind::Sequence(AnimationSequence {
                    steps: vec![
                        SequenceStep {
                            animation: 0,
                            delay_ms: 0,
                        },
                        SequenceStep {
                            animation: 2,
                            delay_ms: 250,
                        },
                    ],
                }),
            ),
        ]
    }

    fn offsets_of(presets: &[AnimationPreset]) -> Vec<u16> {
        let mut offset = 0;
        presets
            .iter()
            .map(|p| {
                let o = offset;
                offset += p.size() as u16;
                o
            })
            .collect()
    }

    #[test]
    fn test_written_size_matches() {
        let presets = all_variants();
        let offsets = offsets_of(&presets);
        for preset in &presets {
            let mut buf = Vec::new();
            preset.write_to(&mut buf, &offsets).unwrap();
            assert_eq!(buf.len(), preset.size(), "{:?}", preset.animation_type());
            assert_eq!(buf[0], preset.animation_type() as u8);
        }
    }

    #[test]
    fn test_read_back_every_variant() {
        let presets = all_variants();
        let offsets = offsets_of(&presets);
        let mut buf = Vec::new();
        for preset in &presets {
            preset.write_to(&mut buf, &offsets).unwrap();
        }

        let mut cursor = &buf[..];
        for preset in &presets {
            let decoded = AnimationPreset::read_from(&mut cursor, &offsets).unwrap();
            assert_eq!(&decoded, preset);
        }
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_header_layout() {
        let preset = &all_variants()[1];
        let mut buf = Vec::new();
        preset.write_to(&mut buf, &[]).unwrap();
        // type, flags (traveling), duration 2000 LE
        assert_eq!(&buf[..4], &[2, 1, 0xD0, 0x07]);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let bytes = [42u8, 0, 0, 0];
        let err = AnimationPreset::read_from(&mut &bytes[..], &[]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_flags_roundtrip() {
        for v in 0..4u8 {
            assert_eq!(AnimationFlags::from_u8(v).to_u8(), v);
        }
    }

    #[test]
    fn test_json_tagging() {
        let preset = &all_variants()[0];
        let json = serde_json::to_value(preset).unwrap();
        assert_eq!(json["type"], "simple");
        assert_eq!(json["duration_ms"], 1000);
        let back: AnimationPreset = serde_json::from_value(json).unwrap();
        assert_eq!(&back, preset);
    }
}
