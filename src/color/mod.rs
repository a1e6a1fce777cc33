//! Color module - Packed color math and gamma tables shared by every animation.
//!
//! Colors travel through the engine as packed `0xRRGGBB` integers ([`Color32`]).
//! All arithmetic is integer-scaled so that preview output matches the
//! fixed-point math running on the die.

mod gamma;
mod packed;
mod rgb;

pub use gamma::*;
pub use packed::*;
pub use rgb::*;
