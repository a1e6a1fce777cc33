//! Rule responses.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::codec::{read_u8, read_u16, skip, unknown_type};

/// Type byte of each action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActionType {
    None = 0,
    PlayAnimation = 1,
    PlayAudioClip = 2,
    MakeWebRequest = 3,
    SpeakText = 4,
}

impl ActionType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(ActionType::None),
            1 => Some(ActionType::PlayAnimation),
            2 => Some(ActionType::PlayAudioClip),
            3 => Some(ActionType::MakeWebRequest),
            4 => Some(ActionType::SpeakText),
            _ => None,
        }
    }
}

/// Response half of a rule. Every action is 4 bytes on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    None,
    PlayAnimation {
        /// Index into the data set's animations.
        animation_index: u8,
        /// Face the animation is oriented to; 0xFF for the current face.
        #[serde(default)]
        face_index: u8,
        #[serde(default = "default_loop_count")]
        loop_count: u8,
    },
    /// Played by the companion app, not the die.
    PlayAudioClip { clip_id: u16 },
    MakeWebRequest { action_id: u16 },
    SpeakText { action_id: u16 },
}

fn default_loop_count() -> u8 {
    1
}

impl Action {
    pub const SIZE: usize = 4;

    pub fn action_type(&self) -> ActionType {
        match self {
            Action::None => ActionType::None,
            Action::PlayAnimation { .. } => ActionType::PlayAnimation,
            Action::PlayAudioClip { .. } => ActionType::PlayAudioClip,
            Action::MakeWebRequest { .. } => ActionType::MakeWebRequest,
            Action::SpeakText { .. } => ActionType::SpeakText,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let t = self.action_type() as u8;
        match *self {
            Action::None => w.write_all(&[t, 0, 0, 0]),
            Action::PlayAnimation {
                animation_index,
                face_index,
                loop_count,
            } => w.write_all(&[t, animation_index, face_index, loop_count]),
            Action::PlayAudioClip { clip_id: id }
            | Action::MakeWebRequest { action_id: id }
            | Action::SpeakText { action_id: id } => {
                w.write_all(&[t, 0])?;
                w.write_all(&id.to_le_bytes())
            }
        }
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let type_byte = read_u8(r)?;
        let action_type =
            ActionType::from_u8(type_byte).ok_or_else(|| unknown_type("action", type_byte))?;

        Ok(match action_type {
            ActionType::None => {
                skip(r, 3)?;
                Action::None
            }
            ActionType::PlayAnimation => Action::PlayAnimation {
                animation_index: read_u8(r)?,
                face_index: read_u8(r)?,
                loop_count: read_u8(r)?,
            },
            ActionType::PlayAudioClip => {
                skip(r, 1)?;
                Action::PlayAudioClip {
                    clip_id: read_u16(r)?,
                }
            }
            ActionType::MakeWebRequest => {
                skip(r, 1)?;
                Action::MakeWebRequest {
                    action_id: read_u16(r)?,
                }
            }
            ActionType::SpeakText => {
                skip(r, 1)?;
                Action::SpeakText {
                    action_id: read_u16(r)?,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts() {
        let cases = [
            (Action::None, [0, 0, 0, 0]),
            (
                Action::PlayAnimation {
                    animation_index: 3,
                    face_index: 0xFF,
                    loop_count: 2,
                },
                [1, 3, 0xFF, 2],
            ),
            (Action::PlayAudioClip { clip_id: 0x0102 }, [2, 0, 2, 1]),
            (Action::MakeWebRequest { action_id: 7 }, [3, 0, 7, 0]),
            (Action::SpeakText { action_id: 300 }, [4, 0, 44, 1]),
        ];
        for (action, bytes) in cases {
            let mut buf = Vec::new();
            action.write_to(&mut buf).unwrap();
            assert_eq!(buf, bytes);
            assert_eq!(Action::read_from(&mut &buf[..]).unwrap(), action);
        }
    }

    #[test]
    fn test_unknown_action() {
        let err = Action::read_from(&mut &[5u8, 0, 0, 0][..]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("action"));
    }

    #[test]
    fn test_json_defaults() {
        let action: Action =
            serde_json::from_str(r#"{"type":"play_animation","animation_index":4}"#).unwrap();
        assert_eq!(
            action,
            Action::PlayAnimation {
                animation_index: 4,
                face_index: 0,
                loop_count: 1,
            }
        );
    }
}
