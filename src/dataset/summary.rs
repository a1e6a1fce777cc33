//! Header sent ahead of a packed data set.
//!
//! ```text
//! palette u16 | rgb_keyframes u16 | rgb_tracks u16 | keyframes u16 | tracks u16
//! animation_count u16 | animations_size u16
//! condition_count u16 | conditions_size u16
//! action_count u16 | rule_count u16 | pad u16
//! total_size u32 | hash u32
//! ```

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::bits::BitsCounts;
use crate::codec::{read_u16, read_u32, skip};

/// Array counts and section sizes the receiver needs to parse a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataSetSummary {
    pub bits: BitsCounts,
    pub animation_count: u16,
    /// Bytes of animation records, table excluded.
    pub animations_size: u16,
    pub condition_count: u16,
    /// Bytes of condition records, table excluded.
    pub conditions_size: u16,
    pub action_count: u16,
    pub rule_count: u16,
    /// Payload length in bytes.
    pub total_size: u32,
    pub hash: u32,
}

impl DataSetSummary {
    pub const SIZE: usize = 32;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let b = &self.bits;
        for field in [
            b.palette,
            b.rgb_keyframes,
            b.rgb_tracks,
            b.keyframes,
            b.tracks,
            self.animation_count,
            self.animations_size,
            self.condition_count,
            self.conditions_size,
            self.action_count,
            self.rule_count,
            0,
        ] {
            w.write_all(&field.to_le_bytes())?;
        }
        w.write_all(&self.total_size.to_le_bytes())?;
        w.write_all(&self.hash.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let bits = BitsCounts {
            palette: read_u16(r)?,
            rgb_keyframes: read_u16(r)?,
            rgb_tracks: read_u16(r)?,
            keyframes: read_u16(r)?,
            tracks: read_u16(r)?,
        };
        let animation_count = read_u16(r)?;
        let animations_size = read_u16(r)?;
        let condition_count = read_u16(r)?;
        let conditions_size = read_u16(r)?;
        let action_count = read_u16(r)?;
        let rule_count = read_u16(r)?;
        skip(r, 2)?;
        Ok(Self {
            bits,
            animation_count,
            animations_size,
            condition_count,
            conditions_size,
            action_count,
            rule_count,
            total_size: read_u32(r)?,
            hash: read_u32(r)?,
        })
    }
}
