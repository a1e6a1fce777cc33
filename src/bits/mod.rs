//! Bits module - The shared pool of palette colors, keyframes and tracks.
//!
//! Every animation in a data set refers into one [`AnimationBits`] by index.
//! Playback borrows it immutably, so any number of instances can read it at
//! the same time.

mod animation_bits;
mod keyframe;
mod track;

pub use animation_bits::*;
pub use keyframe::*;
pub use track::*;
