//! Profile module - Rules pairing die events with responses.
//!
//! The die evaluates these; this crate only stores and encodes them. A
//! [`Profile`] points at a run of [`Rule`]s, each of which pairs one
//! [`Condition`] with a run of [`Action`]s.

mod action;
mod condition;
mod rule;

pub use action::*;
pub use condition::*;
pub use rule::*;
