//! Dataset module - Packing, hashing and unpacking whole profiles.
//!
//! A [`DataSet`] owns one [`AnimationBits`](crate::bits::AnimationBits) and
//! the animations, conditions, actions and rules that refer into it. It is a
//! serialization root only; playback works on the presets directly.

mod data_set;
mod error;
mod summary;
mod validate;

pub use data_set::*;
pub use error::*;
pub use summary::*;
