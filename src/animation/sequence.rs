//! Sequence animation: other animations started after fixed delays.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use super::timing::elapsed_ms;
use super::{AnimationError, AnimationInstance, AnimationPreset, MAX_SEQUENCE_DEPTH, PlaybackContext};
use crate::bits::BoundsError;
use crate::codec::{read_u8, read_u16, skip};
use crate::color::{Color32, combine_colors};
use crate::die::MAX_LED_COUNT;

/// Children a sequence record has room for.
pub const MAX_SEQUENCE_STEPS: usize = 4;

/// One child of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStep {
    /// Index of the child in the data set's animation list.
    pub animation: u16,
    /// Delay after the sequence starts before the child starts.
    #[serde(default)]
    pub delay_ms: u16,
}

/// Parameters of a [`SequenceInstance`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnimationSequence {
    pub steps: Vec<SequenceStep>,
}

impl AnimationSequence {
    /// child_offset(2)×4 + delay(2)×4 + count(1) + pad(3)
    pub const SIZE: usize = 20;

    /// Children are written as byte offsets taken from `animation_offsets`.
    pub fn write_to<W: Write>(&self, w: &mut W, animation_offsets: &[u16]) -> io::Result<()> {
        if self.steps.len() > MAX_SEQUENCE_STEPS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "sequence has {} steps, at most {MAX_SEQUENCE_STEPS} fit",
                    self.steps.len()
                ),
            ));
        }

        let mut offsets = [0u16; MAX_SEQUENCE_STEPS];
        let mut delays = [0u16; MAX_SEQUENCE_STEPS];
        for (i, step) in self.steps.iter().enumerate() {
            offsets[i] = *animation_offsets
                .get(step.animation as usize)
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("sequence child {} is not in the animation list", step.animation),
                    )
                })?;
            delays[i] = step.delay_ms;
        }

        for offset in offsets {
            w.write_all(&offset.to_le_bytes())?;
        }
        for delay in delays {
            w.write_all(&delay.to_le_bytes())?;
        }
        w.write_all(&[self.steps.len() as u8, 0, 0, 0])?;
        Ok(())
    }

    /// Inverse of [`Self::write_to`]: child offsets are mapped back to indices.
    pub fn read_from<R: Read>(r: &mut R, animation_offsets: &[u16]) -> io::Result<Self> {
        let mut offsets = [0u16; MAX_SEQUENCE_STEPS];
        let mut delays = [0u16; MAX_SEQUENCE_STEPS];
        for offset in &mut offsets {
            *offset = read_u16(r)?;
        }
        for delay in &mut delays {
            *delay = read_u16(r)?;
        }
        let count = read_u8(r)? as usize;
        skip(r, 3)?;

        if count > MAX_SEQUENCE_STEPS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("sequence child count {count} exceeds {MAX_SEQUENCE_STEPS}"),
            ));
        }

        let steps = offsets[..count]
            .iter()
            .zip(&delays[..count])
            .map(|(&offset, &delay_ms)| {
                let index = animation_offsets
                    .iter()
                    .position(|&o| o == offset)
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("sequence child offset {offset} is not an animation"),
                        )
                    })?;
                Ok(SequenceStep {
                    animation: index as u16,
                    delay_ms,
                })
            })
            .collect::<io::Result<Vec<_>>>()?;
        Ok(Self { steps })
    }
}

#[derive(Debug)]
struct Child<'a> {
    instance: AnimationInstance<'a>,
    delay_ms: u16,
    started: bool,
}

#[derive(Debug)]
pub struct SequenceInstance<'a> {
    pub(crate) preset: &'a AnimationPreset,
    pub(crate) start_ms: u32,
    children: Vec<Child<'a>>,
}

impl<'a> SequenceInstance<'a> {
    /// Resolve and instantiate every child up front.
    pub(crate) fn new(
        preset: &'a AnimationPreset,
        params: &'a AnimationSequence,
        ctx: PlaybackContext<'a>,
        depth: usize,
    ) -> Result<Self, AnimationError> {
        if depth >= MAX_SEQUENCE_DEPTH {
            return Err(AnimationError::SequenceTooDeep(MAX_SEQUENCE_DEPTH));
        }
        let children = params
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let index = step.animation as usize;
                let child = ctx.animations.get(index).ok_or(BoundsError {
                    array: "animations",
                    index,
                    len: ctx.animations.len(),
                })?;
                Ok(Child {
                    instance: child.create_nested(ctx.for_child(i), depth + 1)?,
                    delay_ms: step.delay_ms,
                    started: false,
                })
            })
            .collect::<Result<Vec<_>, AnimationError>>()?;
        Ok(Self {
            preset,
            start_ms: 0,
            children,
        })
    }

    pub fn start(&mut self, start_ms: u32) {
        self.start_ms = start_ms;
        for child in &mut self.children {
            child.started = false;
        }
    }

    pub fn update_leds(
        &mut self,
        time_ms: u32,
        out_indices: &mut [usize],
        out_colors: &mut [Color32],
    ) -> Result<usize, BoundsError> {
        let elapsed = elapsed_ms(time_ms, self.start_ms);
        let mut child_indices = [0usize; MAX_LED_COUNT];
        let mut child_colors = [0 as Color32; MAX_LED_COUNT];
        let mut count = 0;

        for child in &mut self.children {
            if !child.started && elapsed >= child.delay_ms as i64 {
                child
                    .instance
                    .start(self.start_ms.saturating_add(child.delay_ms as u32));
                child.started = true;
            }
            if !child.started {
                continue;
            }

            let n = child
                .instance
                .update_leds(time_ms, &mut child_indices, &mut child_colors)?;
            for (&led, &color) in child_indices[..n].iter().zip(&child_colors[..n]) {
                match out_indices[..count].iter().position(|&i| i == led) {
                    Some(existing) => {
                        out_colors[existing] = combine_colors(out_colors[existing], color)
                    }
                    None => {
                        out_indices[count] = led;
                        out_colors[count] = color;
                        count += 1;
                    }
                }
            }
        }
        Ok(count)
    }

    /// Union of every child's LEDs.
    pub fn stop(&self, out_indices: &mut [usize]) -> Result<usize, BoundsError> {
        let mut child_indices = [0usize; MAX_LED_COUNT];
        let mut count = 0;
        for child in &self.children {
            let n = child.instance.stop(&mut child_indices)?;
            for &led in &child_indices[..n] {
                if !out_indices[..count].contains(&led) {
                    out_indices[count] = led;
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}
