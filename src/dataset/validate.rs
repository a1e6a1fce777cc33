//! Consistency checks an authoring tool should pass before packing.

use super::{DataSet, DataSetError};
use crate::animation::{AnimationKind, MAX_SEQUENCE_STEPS};
use crate::bits::{MAX_PALETTE_SIZE, PALETTE_COLOR_FROM_FACE, PALETTE_COLOR_FROM_RANDOM};
use crate::profile::Action;

/// `index` must address one of `len` elements.
fn check(owner: &dyn Fn() -> String, array: &'static str, index: usize, len: usize) -> Result<(), DataSetError> {
    if index < len {
        Ok(())
    } else {
        Err(DataSetError::reference(owner(), array, index, len))
    }
}

/// `[start, start + count)` must lie within `len` elements.
fn check_range(
    owner: &dyn Fn() -> String,
    array: &'static str,
    start: usize,
    count: usize,
    len: usize,
) -> Result<(), DataSetError> {
    if count == 0 {
        return Ok(());
    }
    check(owner, array, start + count - 1, len)
}

impl DataSet {
    /// Check every index and range the die would follow.
    ///
    /// Playback and [`DataSet::serialize`] assume these hold; a failure here
    /// is a bug in whatever produced the data set.
    pub fn validate(&self) -> Result<(), DataSetError> {
        self.validate_bits()?;
        for i in 0..self.animations.len() {
            self.validate_animation(i)?;
        }
        self.validate_rules()
    }

    fn validate_bits(&self) -> Result<(), DataSetError> {
        let bits = &self.bits;
        if bits.palette.len() > MAX_PALETTE_SIZE {
            return Err(DataSetError::PaletteTooLarge(bits.palette.len()));
        }
        for (i, keyframe) in bits.rgb_keyframes.iter().enumerate() {
            let color = keyframe.color_index() as usize;
            if color != PALETTE_COLOR_FROM_FACE && color != PALETTE_COLOR_FROM_RANDOM {
                check(&|| format!("rgb keyframe {i}"), "palette", color, bits.palette.len())?;
            }
        }
        for (i, track) in bits.rgb_tracks.iter().enumerate() {
            check_range(
                &|| format!("rgb track {i}"),
                "rgb_keyframes",
                track.keyframes_offset as usize,
                track.keyframe_count as usize,
                bits.rgb_keyframes.len(),
            )?;
        }
        for (i, track) in bits.tracks.iter().enumerate() {
            check_range(
                &|| format!("track {i}"),
                "keyframes",
                track.keyframes_offset as usize,
                track.keyframe_count as usize,
                bits.keyframes.len(),
            )?;
        }
        Ok(())
    }

    fn validate_animation(&self, i: usize) -> Result<(), DataSetError> {
        let bits = &self.bits;
        let owner = || format!("animation {i}");
        let rgb_track = |index: u16| check(&owner, "rgb_tracks", index as usize, bits.rgb_tracks.len());

        match &self.animations[i].kind {
            AnimationKind::Simple(a) => {
                let color = a.color_index as usize;
                if color != PALETTE_COLOR_FROM_FACE && color != PALETTE_COLOR_FROM_RANDOM {
                    check(&owner, "palette", color, bits.palette.len())?;
                }
            }
            AnimationKind::Rainbow(_) => {}
            AnimationKind::Keyframed(a) => {
                let start = a.tracks_offset as usize;
                let count = a.track_count as usize;
                check_range(&owner, "rgb_tracks", start, count, bits.rgb_tracks.len())?;
                let masks: Vec<u32> = bits
                    .rgb_tracks
                    .get(start..start + count)
                    .unwrap_or_default()
                    .iter()
                    .map(|t| t.led_mask)
                    .collect();
                check_disjoint(i, start, &masks)?;
            }
            AnimationKind::GradientPattern(a) => {
                let start = a.tracks_offset as usize;
                let count = a.track_count as usize;
                check_range(&owner, "tracks", start, count, bits.tracks.len())?;
                if !a.override_with_face {
                    rgb_track(a.gradient_track_offset)?;
                }
                let masks: Vec<u32> = bits
                    .tracks
                    .get(start..start + count)
                    .unwrap_or_default()
                    .iter()
                    .map(|t| t.led_mask)
                    .collect();
                check_disjoint(i, start, &masks)?;
            }
            AnimationKind::Gradient(a) => rgb_track(a.gradient_track_offset)?,
            AnimationKind::Noise(a) => {
                rgb_track(a.gradient_track_offset)?;
                rgb_track(a.blink_gradient_track_offset)?;
            }
            AnimationKind::Cycle(a) => rgb_track(a.gradient_track_offset)?,
            AnimationKind::Normals(a) => {
                rgb_track(a.gradient_track_offset)?;
                rgb_track(a.axis_gradient_track_offset)?;
            }
            AnimationKind::Sequence(a) => {
                if a.steps.len() > MAX_SEQUENCE_STEPS {
                    return Err(DataSetError::TooManySequenceChildren {
                        animation: i,
                        count: a.steps.len(),
                    });
                }
                for step in &a.steps {
                    check(&owner, "animations", step.animation as usize, self.animations.len())?;
                }
            }
        }
        Ok(())
    }

    fn validate_rules(&self) -> Result<(), DataSetError> {
        for (i, rule) in self.rules.iter().enumerate() {
            let owner = || format!("rule {i}");
            check(
                &owner,
                "conditions",
                rule.condition_index as usize,
                self.conditions.len(),
            )?;
            let range = rule.action_range();
            check_range(&owner, "actions", range.start, range.len(), self.actions.len())?;
        }
        for (i, action) in self.actions.iter().enumerate() {
            if let Action::PlayAnimation {
                animation_index, ..
            } = action
            {
                check(
                    &|| format!("action {i}"),
                    "animations",
                    *animation_index as usize,
                    self.animations.len(),
                )?;
            }
        }
        let range = self.profile.rule_range();
        check_range(
            &|| "profile".to_string(),
            "rules",
            range.start,
            range.len(),
            self.rules.len(),
        )
    }
}

/// No LED may be driven by two tracks of the same animation.
fn check_disjoint(animation: usize, first_track: usize, masks: &[u32]) -> Result<(), DataSetError> {
    for (a, &mask_a) in masks.iter().enumerate() {
        for (b, &mask_b) in masks.iter().enumerate().skip(a + 1) {
            if mask_a & mask_b != 0 {
                return Err(DataSetError::OverlappingLedMask {
                    animation,
                    first: first_track + a,
                    second: first_track + b,
                });
            }
        }
    }
    Ok(())
}
