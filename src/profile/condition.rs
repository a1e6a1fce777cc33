//! Rule triggers.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::codec::{read_u8, read_u16, read_u32, skip, unknown_type};

/// Type byte of each condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConditionType {
    None = 0,
    HelloGoodbye = 1,
    Handling = 2,
    Rolling = 3,
    FaceCompare = 4,
    Crooked = 5,
    ConnectionState = 6,
    BatteryState = 7,
    Idle = 8,
    Rolled = 9,
}

impl ConditionType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(ConditionType::None),
            1 => Some(ConditionType::HelloGoodbye),
            2 => Some(ConditionType::Handling),
            3 => Some(ConditionType::Rolling),
            4 => Some(ConditionType::FaceCompare),
            5 => Some(ConditionType::Crooked),
            6 => Some(ConditionType::ConnectionState),
            7 => Some(ConditionType::BatteryState),
            8 => Some(ConditionType::Idle),
            9 => Some(ConditionType::Rolled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HelloGoodbyeFlags {
    #[serde(default)]
    pub hello: bool,
    #[serde(default)]
    pub goodbye: bool,
}

impl HelloGoodbyeFlags {
    pub fn to_u8(self) -> u8 {
        self.hello as u8 | (self.goodbye as u8) << 1
    }

    pub fn from_u8(v: u8) -> Self {
        Self {
            hello: v & 1 != 0,
            goodbye: v & 2 != 0,
        }
    }
}

/// Which comparisons against the face index fire the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FaceCompareFlags {
    #[serde(default)]
    pub less: bool,
    #[serde(default)]
    pub equal: bool,
    #[serde(default)]
    pub greater: bool,
}

impl FaceCompareFlags {
    pub fn to_u8(self) -> u8 {
        self.less as u8 | (self.equal as u8) << 1 | (self.greater as u8) << 2
    }

    pub fn from_u8(v: u8) -> Self {
        Self {
            less: v & 1 != 0,
            equal: v & 2 != 0,
            greater: v & 4 != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionStateFlags {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub disconnected: bool,
}

impl ConnectionStateFlags {
    pub fn to_u8(self) -> u8 {
        self.connected as u8 | (self.disconnected as u8) << 1
    }

    pub fn from_u8(v: u8) -> Self {
        Self {
            connected: v & 1 != 0,
            disconnected: v & 2 != 0,
        }
    }
}

/// Battery transitions that fire the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatteryStateFlags {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub low: bool,
    #[serde(default)]
    pub charging: bool,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub bad_charging: bool,
    #[serde(default)]
    pub error: bool,
}

impl BatteryStateFlags {
    pub fn to_u8(self) -> u8 {
        [
            self.ok,
            self.low,
            self.charging,
            self.done,
            self.bad_charging,
            self.error,
        ]
        .iter()
        .enumerate()
        .fold(0, |acc, (bit, &set)| acc | (set as u8) << bit)
    }

    pub fn from_u8(v: u8) -> Self {
        let bit = |n: u8| v & (1 << n) != 0;
        Self {
            ok: bit(0),
            low: bit(1),
            charging: bit(2),
            done: bit(3),
            bad_charging: bit(4),
            error: bit(5),
        }
    }
}

/// Trigger half of a rule. Evaluated on the die, only stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    None,
    HelloGoodbye {
        flags: HelloGoodbyeFlags,
    },
    Handling,
    Rolling {
        repeat_period_ms: u16,
    },
    FaceCompare {
        face_index: u8,
        flags: FaceCompareFlags,
    },
    Crooked,
    ConnectionState {
        flags: ConnectionStateFlags,
    },
    BatteryState {
        flags: BatteryStateFlags,
        #[serde(default)]
        repeat_period_ms: u16,
    },
    Idle {
        repeat_period_ms: u16,
    },
    /// Fires when the die comes to rest on any face in the mask.
    Rolled {
        face_mask: u32,
    },
}

impl Condition {
    /// Size of every condition except [`Condition::Rolled`].
    pub const BASE_SIZE: usize = 4;

    pub fn condition_type(&self) -> ConditionType {
        match self {
            Condition::None => ConditionType::None,
            Condition::HelloGoodbye { .. } => ConditionType::HelloGoodbye,
            Condition::Handling => ConditionType::Handling,
            Condition::Rolling { .. } => ConditionType::Rolling,
            Condition::FaceCompare { .. } => ConditionType::FaceCompare,
            Condition::Crooked => ConditionType::Crooked,
            Condition::ConnectionState { .. } => ConditionType::ConnectionState,
            Condition::BatteryState { .. } => ConditionType::BatteryState,
            Condition::Idle { .. } => ConditionType::Idle,
            Condition::Rolled { .. } => ConditionType::Rolled,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Condition::Rolled { .. } => Self::BASE_SIZE + 4,
            _ => Self::BASE_SIZE,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let t = self.condition_type() as u8;
        match *self {
            Condition::None | Condition::Handling | Condition::Crooked => w.write_all(&[t, 0, 0, 0]),
            Condition::HelloGoodbye { flags } => w.write_all(&[t, flags.to_u8(), 0, 0]),
            Condition::ConnectionState { flags } => w.write_all(&[t, flags.to_u8(), 0, 0]),
            Condition::FaceCompare { face_index, flags } => {
                w.write_all(&[t, face_index, flags.to_u8(), 0])
            }
            Condition::Rolling { repeat_period_ms } | Condition::Idle { repeat_period_ms } => {
                w.write_all(&[t, 0])?;
                w.write_all(&repeat_period_ms.to_le_bytes())
            }
            Condition::BatteryState {
                flags,
                repeat_period_ms,
            } => {
                w.write_all(&[t, flags.to_u8()])?;
                w.write_all(&repeat_period_ms.to_le_bytes())
            }
            Condition::Rolled { face_mask } => {
                w.write_all(&[t, 0, 0, 0])?;
                w.write_all(&face_mask.to_le_bytes())
            }
        }
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let type_byte = read_u8(r)?;
        let condition_type = ConditionType::from_u8(type_byte)
            .ok_or_else(|| unknown_type("condition", type_byte))?;

        let condition = match condition_type {
            ConditionType::None => {
                skip(r, 3)?;
                Condition::None
            }
            ConditionType::Handling => {
                skip(r, 3)?;
                Condition::Handling
            }
            ConditionType::Crooked => {
                skip(r, 3)?;
                Condition::Crooked
            }
            ConditionType::HelloGoodbye => {
                let flags = HelloGoodbyeFlags::from_u8(read_u8(r)?);
                skip(r, 2)?;
                Condition::HelloGoodbye { flags }
            }
            ConditionType::ConnectionState => {
                let flags = ConnectionStateFlags::from_u8(read_u8(r)?);
                skip(r, 2)?;
                Condition::ConnectionState { flags }
            }
            ConditionType::FaceCompare => {
                let face_index = read_u8(r)?;
                let flags = FaceCompareFlags::from_u8(read_u8(r)?);
                skip(r, 1)?;
                Condition::FaceCompare { face_index, flags }
            }
            ConditionType::Rolling => {
                skip(r, 1)?;
                Condition::Rolling {
                    repeat_period_ms: read_u16(r)?,
                }
            }
            ConditionType::Idle => {
                skip(r, 1)?;
                Condition::Idle {
                    repeat_period_ms: read_u16(r)?,
                }
            }
            ConditionType::BatteryState => {
                let flags = BatteryStateFlags::from_u8(read_u8(r)?);
                Condition::BatteryState {
                    flags,
                    repeat_period_ms: read_u16(r)?,
                }
            }
            ConditionType::Rolled => {
                skip(r, 3)?;
                Condition::Rolled {
                    face_mask: read_u32(r)?,
                }
            }
        };
        Ok(condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_condition() -> Vec<Condition> {
        vec![
            Condition::None,
            Condition::HelloGoodbye {
                flags: HelloGoodbyeFlags {
                    hello: true,
                    goodbye: false,
                },
            },
            Condition::Handling,
            Condition::Rolling {
                repeat_period_ms: 500,
            },
            Condition::FaceCompare {
                face_index: 19,
                flags: FaceCompareFlags {
                    less: false,
                    equal: true,
                    greater: true,
                },
            },
            Condition::Crooked,
            Condition::ConnectionState {
                flags: ConnectionStateFlags {
                    connected: true,
                    disconnected: true,
                },
            },
            Condition::BatteryState {
                flags: BatteryStateFlags {
                    low: true,
                    charging: true,
                    ..Default::default()
                },
                repeat_period_ms: 3000,
            },
            Condition::Idle {
                repeat_period_ms: 10000,
            },
            Condition::Rolled {
                face_mask: 0x80001,
            },
        ]
    }

    #[test]
    fn test_sizes_and_read_back() {
        for condition in every_condition() {
            let mut buf = Vec::new();
            condition.write_to(&mut buf).unwrap();
            assert_eq!(buf.len(), condition.size(), "{condition:?}");
            assert_eq!(buf[0], condition.condition_type() as u8);
            assert_eq!(Condition::read_from(&mut &buf[..]).unwrap(), condition);
        }
    }

    #[test]
    fn test_field_positions() {
        let mut buf = Vec::new();
        Condition::FaceCompare {
            face_index: 5,
            flags: FaceCompareFlags {
                less: true,
                equal: false,
                greater: false,
            },
        }
        .write_to(&mut buf)
        .unwrap();
        assert_eq!(buf, vec![4, 5, 1, 0]);

        buf.clear();
        Condition::Idle {
            repeat_period_ms: 0x1234,
        }
        .write_to(&mut buf)
        .unwrap();
        assert_eq!(buf, vec![8, 0, 0x34, 0x12]);

        buf.clear();
        Condition::Rolled { face_mask: 0b101 }.write_to(&mut buf).unwrap();
        assert_eq!(buf, vec![9, 0, 0, 0, 5, 0, 0, 0]);
    }

    #[test]
    fn test_battery_flags_bits() {
        let flags = BatteryStateFlags {
            done: true,
            error: true,
            ..Default::default()
        };
        assert_eq!(flags.to_u8(), 0b10_1000);
        assert_eq!(BatteryStateFlags::from_u8(0b10_1000), flags);
    }

    #[test]
    fn test_unknown_condition() {
        let err = Condition::read_from(&mut &[10u8, 0, 0, 0][..]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&Condition::Rolled { face_mask: 3 }).unwrap();
        assert_eq!(json, r#"{"type":"rolled","face_mask":3}"#);
    }
}
