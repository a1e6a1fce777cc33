//! Schema module - Configuration types for previewing animations.

mod config;

pub use config::*;
