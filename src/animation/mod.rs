//! Animation presets and the instances that play them.
//!
//! A preset ([`AnimationPreset`]) is the immutable description stored in a
//! data set: a 4-byte header followed by variant fields. An instance
//! ([`AnimationInstance`]) is the per-playback evaluator created from a preset
//! and a [`PlaybackContext`]:
//!
//! ```text
//! preset ──create_instance(ctx)──▶ instance ──start(t0)──▶ update_leds(t) … stop()
//! ```
//!
//! `update_leds` is a pure function of the instance state and absolute time in
//! milliseconds; there are no timers. Every evaluator writes `(led, color)`
//! pairs from index 0 into caller-provided arrays of at least
//! [`MAX_LED_COUNT`](crate::die::MAX_LED_COUNT) entries.

mod gradient;
mod instance;
mod keyframed;
mod noise;
mod normals;
mod preset;
mod rainbow;
mod sequence;
mod simple;
mod timing;

pub use gradient::*;
pub use instance::*;
pub use keyframed::*;
pub use noise::*;
pub use normals::*;
pub use preset::*;
pub use rainbow::*;
pub use sequence::*;
pub use simple::*;

#[cfg(test)]
pub(crate) use instance::testing;
