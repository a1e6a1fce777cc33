//! Dice animations - LED animation data sets and their playback engine.
//!
//! This crate packs the animations, conditions, actions and rules of a die
//! profile into the flat little-endian buffer a die stores, and plays the
//! animations back deterministically from absolute millisecond timestamps.
//!
//! # Architecture
//!
//! - `color`: Packed 0xRRGGBB colors, blending and the LED gamma curve
//! - `bits`: Shared palette, keyframes and tracks every animation refers into
//! - `animation`: Animation presets and the instances that evaluate them
//! - `profile`: Conditions, actions and rules that trigger animations
//! - `dataset`: Whole data set serialization, hashing and validation
//! - `die`: Die geometry and a simulated die for local playback
//! - `preview`: Fixed-rate frame rendering without hardware
//! - `schema`: Preview configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use dice_anim::{
//!     animation::{AnimationKind, AnimationPreset, AnimationSimple, PlaybackContext},
//!     bits::{AnimationBits, palette_from_color32},
//!     dataset::DataSet,
//!     die::{DieType, VirtualDie},
//!     preview::PreviewPlayer,
//!     schema::PreviewConfig,
//! };
//!
//! // One red flash on the first three LEDs
//! let bits = AnimationBits {
//!     palette: palette_from_color32(&[0xFF0000]),
//!     ..Default::default()
//! };
//! let flash = AnimationPreset::new(
//!     1000,
//!     AnimationKind::Simple(AnimationSimple {
//!         face_mask: 0b111,
//!         color_index: 0,
//!         count: 1,
//!         fade: 64,
//!     }),
//! );
//! let data_set = DataSet::new(bits, vec![flash], vec![], vec![], vec![]);
//!
//! // Pack for upload
//! let payload = data_set.serialize().unwrap();
//! println!("{} bytes, hash {:08x}", payload.len(), data_set.hash().unwrap());
//!
//! // Preview locally
//! let die = VirtualDie::new(DieType::D20);
//! let ctx = PlaybackContext::new(&data_set.bits, &die, &data_set.animations);
//! let mut player =
//!     PreviewPlayer::new(&data_set.animations[0], ctx, &PreviewConfig::default()).unwrap();
//! for frame in player.frames() {
//!     println!("{}", frame.unwrap());
//! }
//! ```

pub mod animation;
pub mod bits;
pub mod codec;
pub mod color;
pub mod dataset;
pub mod die;
pub mod preview;
pub mod profile;
pub mod schema;

// Re-export commonly used types
pub use animation::{AnimationInstance, AnimationPreset, PlaybackContext};
pub use bits::AnimationBits;
pub use dataset::{DataSet, DataSetError, DataSetSummary};
pub use die::{DieState, DieType, VirtualDie};
pub use preview::PreviewPlayer;
pub use schema::PreviewConfig;
