//! Packing a profile into the flat buffer a die stores.
//!
//! ```text
//! [bits][anim table + animations][cond table + conditions]
//! [action table + actions][rules][profile]
//! ```
//!
//! Each table holds one `u16` per record: the record's byte offset from the
//! first record of its section. Tables are zero-padded to 4 bytes so the
//! records after them start aligned.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{DataSetError, DataSetSummary};
use crate::animation::{AnimationKind, AnimationPreset, AnimationType, MAX_SEQUENCE_STEPS};
use crate::bits::{AnimationBits, MAX_PALETTE_SIZE};
use crate::codec::{align4, read_u16, write_padding};
use crate::profile::{Action, ActionType, Condition, ConditionType, Profile, Rule};

/// Starting value of the content hash.
pub const HASH_SEED: u32 = 5381;

/// Bernstein hash of a packed buffer. Any single byte change alters it.
pub fn compute_hash(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(HASH_SEED, |h, &b| h.wrapping_mul(33).wrapping_add(b as u32))
}

/// Bytes taken by an offset table of `count` entries, padding included.
#[inline]
fn table_size(count: usize) -> usize {
    align4(count * 2)
}

/// Offset of each record from the first one in its section.
fn section_offsets(
    section: &'static str,
    sizes: impl Iterator<Item = usize>,
) -> Result<Vec<u16>, DataSetError> {
    let mut offset = 0usize;
    sizes
        .map(|size| {
            let current = u16::try_from(offset).map_err(|_| DataSetError::SectionTooLarge {
                section,
                size: offset,
            })?;
            offset += size;
            Ok(current)
        })
        .collect()
}

fn fits_u16(section: &'static str, size: usize) -> Result<u16, DataSetError> {
    u16::try_from(size).map_err(|_| DataSetError::SectionTooLarge { section, size })
}

fn write_table<W: Write>(w: &mut W, offsets: &[u16]) -> io::Result<()> {
    for offset in offsets {
        w.write_all(&offset.to_le_bytes())?;
    }
    write_padding(w, table_size(offsets.len()) - offsets.len() * 2)
}

/// Everything a die needs for one profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataSet {
    #[serde(default)]
    pub bits: AnimationBits,
    #[serde(default)]
    pub animations: Vec<AnimationPreset>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub profile: Profile,
}

impl DataSet {
    /// Data set with a profile covering all of `rules`.
    pub fn new(
        bits: AnimationBits,
        animations: Vec<AnimationPreset>,
        conditions: Vec<Condition>,
        actions: Vec<Action>,
        rules: Vec<Rule>,
    ) -> Self {
        let profile = Profile::covering(rules.len());
        Self {
            bits,
            animations,
            conditions,
            actions,
            rules,
            profile,
        }
    }

    /// Bytes of animation records, table excluded.
    pub fn animations_size(&self) -> usize {
        self.animations.iter().map(AnimationPreset::size).sum()
    }

    /// Bytes of condition records, table excluded.
    pub fn conditions_size(&self) -> usize {
        self.conditions.iter().map(Condition::size).sum()
    }

    pub fn actions_size(&self) -> usize {
        self.actions.len() * Action::SIZE
    }

    /// Exact length of [`Self::serialize`]'s output.
    pub fn compute_data_set_byte_size(&self) -> usize {
        self.bits.compute_data_size()
            + table_size(self.animations.len())
            + self.animations_size()
            + table_size(self.conditions.len())
            + self.conditions_size()
            + table_size(self.actions.len())
            + self.actions_size()
            + self.rules.len() * Rule::SIZE
            + Profile::SIZE
    }

    /// Checks without which the buffer cannot be written at all.
    fn check_encodable(&self) -> Result<(), DataSetError> {
        if self.bits.palette.len() > MAX_PALETTE_SIZE {
            return Err(DataSetError::PaletteTooLarge(self.bits.palette.len()));
        }
        for (i, preset) in self.animations.iter().enumerate() {
            let AnimationKind::Sequence(sequence) = &preset.kind else {
                continue;
            };
            if sequence.steps.len() > MAX_SEQUENCE_STEPS {
                return Err(DataSetError::TooManySequenceChildren {
                    animation: i,
                    count: sequence.steps.len(),
                });
            }
            for step in &sequence.steps {
                if step.animation as usize >= self.animations.len() {
                    return Err(DataSetError::reference(
                        format!("animation {i}"),
                        "animations",
                        step.animation as usize,
                        self.animations.len(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Write the packed buffer to `w`.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), DataSetError> {
        self.check_encodable()?;

        self.bits.write_to(w)?;

        let animation_offsets =
            section_offsets("animations", self.animations.iter().map(AnimationPreset::size))?;
        write_table(w, &animation_offsets)?;
        for preset in &self.animations {
            preset.write_to(w, &animation_offsets)?;
        }

        let condition_offsets =
            section_offsets("conditions", self.conditions.iter().map(Condition::size))?;
        write_table(w, &condition_offsets)?;
        for condition in &self.conditions {
            condition.write_to(w)?;
        }

        let action_offsets =
            section_offsets("actions", self.actions.iter().map(|_| Action::SIZE))?;
        write_table(w, &action_offsets)?;
        for action in &self.actions {
            action.write_to(w)?;
        }

        for rule in &self.rules {
            rule.write_to(w)?;
        }
        self.profile.write_to(w)?;
        Ok(())
    }

    /// Pack into a new buffer of exactly [`Self::compute_data_set_byte_size`] bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, DataSetError> {
        let size = self.compute_data_set_byte_size();
        let mut buf = Vec::with_capacity(size);
        self.write_to(&mut buf)?;
        if buf.len() != size {
            return Err(DataSetError::SizeMismatch {
                expected: size,
                actual: buf.len(),
            });
        }
        log::debug!(
            "packed data set: {} bytes (bits {}, {} animations, {} conditions, {} actions, {} rules)",
            size,
            self.bits.compute_data_size(),
            self.animations.len(),
            self.conditions.len(),
            self.actions.len(),
            self.rules.len()
        );
        Ok(buf)
    }

    /// Hash of the packed buffer.
    pub fn hash(&self) -> Result<u32, DataSetError> {
        let hash = compute_hash(&self.serialize()?);
        log::debug!("data set hash {hash:#010x}");
        Ok(hash)
    }

    /// Summary describing `payload`, which must be this data set packed.
    ///
    /// Fails when a section's size or record count does not fit the summary's
    /// 16-bit fields.
    pub fn summary_for(&self, payload: &[u8]) -> Result<DataSetSummary, DataSetError> {
        Ok(DataSetSummary {
            bits: self.bits.counts(),
            animation_count: fits_u16("animations", self.animations.len())?,
            animations_size: fits_u16("animations", self.animations_size())?,
            condition_count: fits_u16("conditions", self.conditions.len())?,
            conditions_size: fits_u16("conditions", self.conditions_size())?,
            action_count: fits_u16("actions", self.actions.len())?,
            rule_count: fits_u16("rules", self.rules.len())?,
            total_size: payload.len() as u32,
            hash: compute_hash(payload),
        })
    }

    /// Pack and describe in one go.
    pub fn summary(&self) -> Result<DataSetSummary, DataSetError> {
        self.summary_for(&self.serialize()?)
    }

    /// Bits plus one animation, for previewing it on a die in isolation.
    pub fn to_single_animation_byte_array(&self, index: usize) -> Result<Vec<u8>, DataSetError> {
        self.to_animations_byte_array(&[index])
    }

    /// Bits plus the animation table and records of the chosen animations.
    ///
    /// Sequences among them may only refer to other chosen animations.
    pub fn to_animations_byte_array(&self, indices: &[usize]) -> Result<Vec<u8>, DataSetError> {
        self.check_encodable()?;
        let chosen = indices
            .iter()
            .map(|&i| {
                self.animations.get(i).ok_or_else(|| {
                    DataSetError::reference(
                        "animation selection",
                        "animations",
                        i,
                        self.animations.len(),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let offsets = section_offsets("animations", chosen.iter().map(|p| p.size()))?;

        // Sequence children are written as offsets within the selection
        let mut lookup = vec![0u16; self.animations.len()];
        for (&i, &offset) in indices.iter().zip(&offsets) {
            lookup[i] = offset;
        }
        for (&i, preset) in indices.iter().zip(&chosen) {
            if let AnimationKind::Sequence(sequence) = &preset.kind {
                if let Some(step) = sequence
                    .steps
                    .iter()
                    .find(|s| !indices.contains(&(s.animation as usize)))
                {
                    return Err(DataSetError::reference(
                        format!("animation {i}"),
                        "selected animations",
                        step.animation as usize,
                        indices.len(),
                    ));
                }
            }
        }

        let size = self.bits.compute_data_size()
            + table_size(chosen.len())
            + chosen.iter().map(|p| p.size()).sum::<usize>();
        let mut buf = Vec::with_capacity(size);
        self.bits.write_to(&mut buf)?;
        write_table(&mut buf, &offsets)?;
        for preset in &chosen {
            preset.write_to(&mut buf, &lookup)?;
        }
        log::debug!("packed {} animations: {} bytes", chosen.len(), buf.len());
        Ok(buf)
    }

    /// Parse a buffer produced by [`Self::serialize`].
    ///
    /// The summary supplies the counts the buffer itself does not carry; the
    /// length and hash are checked before anything is parsed.
    pub fn decode(summary: &DataSetSummary, bytes: &[u8]) -> Result<Self, DataSetError> {
        let expected = summary.total_size as usize;
        if bytes.len() != expected {
            return Err(DataSetError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        let actual = compute_hash(bytes);
        if actual != summary.hash {
            return Err(DataSetError::HashMismatch {
                expected: summary.hash,
                actual,
            });
        }
        if summary.bits.palette as usize > MAX_PALETTE_SIZE {
            return Err(DataSetError::PaletteTooLarge(summary.bits.palette as usize));
        }

        let mut reader = SectionReader { bytes, pos: 0 };
        let bits = reader.read("bits", |r| AnimationBits::read_from(r, &summary.bits))?;

        let animation_offsets = reader.table("animation table", summary.animation_count)?;
        let start = reader.pos;
        let animations = animation_offsets
            .iter()
            .map(|&offset| {
                let at = start + offset as usize;
                let type_byte = reader.byte_at("animations", at)?;
                if AnimationType::from_u8(type_byte).is_none() {
                    return Err(DataSetError::UnknownAnimationType(type_byte));
                }
                reader.read_at("animations", at, |r| {
                    AnimationPreset::read_from(r, &animation_offsets)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        reader.seek("animations", start + summary.animations_size as usize)?;

        let condition_offsets = reader.table("condition table", summary.condition_count)?;
        let start = reader.pos;
        let conditions = condition_offsets
            .iter()
            .map(|&offset| {
                let at = start + offset as usize;
                let type_byte = reader.byte_at("conditions", at)?;
                if ConditionType::from_u8(type_byte).is_none() {
                    return Err(DataSetError::UnknownConditionType(type_byte));
                }
                reader.read_at("conditions", at, Condition::read_from)
            })
            .collect::<Result<Vec<_>, _>>()?;
        reader.seek("conditions", start + summary.conditions_size as usize)?;

        let action_offsets = reader.table("action table", summary.action_count)?;
        let start = reader.pos;
        let actions = action_offsets
            .iter()
            .map(|&offset| {
                let at = start + offset as usize;
                let type_byte = reader.byte_at("actions", at)?;
                if ActionType::from_u8(type_byte).is_none() {
                    return Err(DataSetError::UnknownActionType(type_byte));
                }
                reader.read_at("actions", at, Action::read_from)
            })
            .collect::<Result<Vec<_>, _>>()?;
        reader.seek("actions", start + action_offsets.len() * Action::SIZE)?;

        let rules = (0..summary.rule_count)
            .map(|_| reader.read("rules", Rule::read_from))
            .collect::<Result<Vec<_>, _>>()?;
        let profile = reader.read("profile", Profile::read_from)?;

        if reader.pos != bytes.len() {
            return Err(DataSetError::SizeMismatch {
                expected: reader.pos,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            bits,
            animations,
            conditions,
            actions,
            rules,
            profile,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, DataSetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, DataSetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a data set from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DataSetError> {
        let path = path.as_ref();
        let data_set = Self::from_json_str(&fs::read_to_string(path)?)?;
        log::debug!(
            "loaded {} animations from {}",
            data_set.animations.len(),
            path.display()
        );
        Ok(data_set)
    }

    /// Save the data set as pretty-printed JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), DataSetError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

/// Cursor over a packed buffer that reports where parsing ran out.
struct SectionReader<'b> {
    bytes: &'b [u8],
    pos: usize,
}

impl<'b> SectionReader<'b> {
    fn end_error(&self, section: &'static str, err: io::Error) -> DataSetError {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            DataSetError::UnexpectedEnd {
                section,
                offset: self.bytes.len(),
            }
        } else {
            DataSetError::Io(err)
        }
    }

    fn tail(&self, section: &'static str, at: usize) -> Result<&'b [u8], DataSetError> {
        self.bytes
            .get(at..)
            .ok_or(DataSetError::UnexpectedEnd {
                section,
                offset: self.bytes.len(),
            })
    }

    fn byte_at(&self, section: &'static str, at: usize) -> Result<u8, DataSetError> {
        self.tail(section, at)?
            .first()
            .copied()
            .ok_or(DataSetError::UnexpectedEnd {
                section,
                offset: self.bytes.len(),
            })
    }

    /// Read a record at `at` without moving the cursor.
    fn read_at<T, F>(&self, section: &'static str, at: usize, f: F) -> Result<T, DataSetError>
    where
        F: FnOnce(&mut &'b [u8]) -> io::Result<T>,
    {
        let mut slice = self.tail(section, at)?;
        f(&mut slice).map_err(|e| self.end_error(section, e))
    }

    /// Read at the cursor and advance past what was consumed.
    fn read<T, F>(&mut self, section: &'static str, f: F) -> Result<T, DataSetError>
    where
        F: FnOnce(&mut &'b [u8]) -> io::Result<T>,
    {
        let mut slice = self.tail(section, self.pos)?;
        let before = slice.len();
        let value = f(&mut slice).map_err(|e| self.end_error(section, e))?;
        self.pos += before - slice.len();
        Ok(value)
    }

    fn seek(&mut self, section: &'static str, pos: usize) -> Result<(), DataSetError> {
        if pos > self.bytes.len() {
            return Err(DataSetError::UnexpectedEnd {
                section,
                offset: self.bytes.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Offset table of `count` entries plus its padding.
    fn table(&mut self, section: &'static str, count: u16) -> Result<Vec<u16>, DataSetError> {
        let count = count as usize;
        let start = self.pos;
        let offsets = self.read(section, |r| {
            (0..count)
                .map(|_| read_u16(r))
                .collect::<io::Result<Vec<_>>>()
        })?;
        self.seek(section, start + table_size(count))?;
        Ok(offsets)
    }
}
