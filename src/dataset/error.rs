use std::io;

use crate::bits::MAX_PALETTE_SIZE;

/// Errors raised while packing, unpacking or checking a data set.
#[derive(Debug, thiserror::Error)]
pub enum DataSetError {
    #[error("Palette has {0} colors, at most {MAX_PALETTE_SIZE} are allowed")]
    PaletteTooLarge(usize),

    #[error("{owner} references {array}[{index}], but there are only {len}")]
    InvalidReference {
        owner: String,
        array: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Animation {animation}: LED masks of tracks {first} and {second} overlap")]
    OverlappingLedMask {
        animation: usize,
        first: usize,
        second: usize,
    },

    #[error("Sequence animation {animation} has {count} children, at most 4 fit")]
    TooManySequenceChildren { animation: usize, count: usize },

    #[error("Section {section} is {size} bytes, offsets are limited to 16 bits")]
    SectionTooLarge { section: &'static str, size: usize },

    #[error("Buffer ended at byte {offset} while reading {section}")]
    UnexpectedEnd { section: &'static str, offset: usize },

    #[error("Unknown animation type {0}")]
    UnknownAnimationType(u8),

    #[error("Unknown condition type {0}")]
    UnknownConditionType(u8),

    #[error("Unknown action type {0}")]
    UnknownActionType(u8),

    #[error("Expected {expected} bytes, found {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Hash mismatch: expected {expected:#010x}, computed {actual:#010x}")]
    HashMismatch { expected: u32, actual: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DataSetError {
    pub(crate) fn reference(
        owner: impl Into<String>,
        array: &'static str,
        index: usize,
        len: usize,
    ) -> Self {
        DataSetError::InvalidReference {
            owner: owner.into(),
            array,
            index,
            len,
        }
    }
}
