//! Preview module - Rendering animations frame by frame without hardware.

mod player;

pub use player::*;
