//! Stemmix Core - stem playback and mixing library
//!
//! Loads the separated stems of one song, plays them in sample-locked
//! sync with per-stem mute/solo/volume, and renders the current mix
//! down to a single encoded file.

pub mod audio;
pub mod descriptor;
pub mod engine;
pub mod loader;
pub mod render;
pub mod types;

pub use types::*;
