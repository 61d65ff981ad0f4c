//! Message handlers for the mixer application
//!
//! Each file extends `MixerApp` with the handlers for one concern,
//! keeping `update()` a thin dispatcher.

mod export;
mod keyboard;
mod loading;
mod mixer;
mod playback;
