use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::codec::read_u16;

/// Pairs one condition with a run of consecutive actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rule {
    pub condition_index: u16,
    /// Index of the first action in the data set's action list.
    pub action_offset: u16,
    pub action_count: u16,
}

impl Rule {
    pub const SIZE: usize = 6;

    pub fn action_range(&self) -> std::ops::Range<usize> {
        let start = self.action_offset as usize;
        start..start + self.action_count as usize
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.condition_index.to_le_bytes())?;
        w.write_all(&self.action_offset.to_le_bytes())?;
        w.write_all(&self.action_count.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            condition_index: read_u16(r)?,
            action_offset: read_u16(r)?,
            action_count: read_u16(r)?,
        })
    }
}

/// Header of the rule set: where the rules start and how many there are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub rules_offset: u16,
    pub rules_count: u16,
}

impl Profile {
    pub const SIZE: usize = 4;

    /// Profile covering the first `rules_count` rules.
    pub fn covering(rules_count: usize) -> Self {
        Self {
            rules_offset: 0,
            rules_count: rules_count as u16,
        }
    }

    pub fn rule_range(&self) -> std::ops::Range<usize> {
        let start = self.rules_offset as usize;
        start..start + self.rules_count as usize
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.rules_offset.to_le_bytes())?;
        w.write_all(&self.rules_count.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            rules_offset: read_u16(r)?,
            rules_count: read_u16(r)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_layout() {
        let rule = Rule {
            condition_index: 1,
            action_offset: 2,
            action_count: 0x0103,
        };
        let mut buf = Vec::new();
        rule.write_to(&mut buf).unwrap();
        assert_eq!(buf, vec![1, 0, 2, 0, 3, 1]);
        assert_eq!(Rule::read_from(&mut &buf[..]).unwrap(), rule);
        assert_eq!(rule.action_range(), 2..0x0105);
    }

    #[test]
    fn test_profile_layout() {
        let profile = Profile {
            rules_offset: 4,
            rules_count: 2,
        };
        let mut buf = Vec::new();
        profile.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), Profile::SIZE);
        assert_eq!(Profile::read_from(&mut &buf[..]).unwrap(), profile);
        assert_eq!(Profile::covering(3).rule_range(), 0..3);
    }
}
