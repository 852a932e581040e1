//! Plain data types shared across the engine.

pub mod ids;
pub mod relationship;
