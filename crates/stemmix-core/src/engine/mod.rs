//! Playback engine: transport clock, channel mixer, and the
//! audio-thread mixing core
//!
//! Control flow mirrors the rest of the crate's threading model: the
//! UI owns `TransportClock` and `ChannelMixer` (plain state machines),
//! pushes the resulting `EngineCommand`s over a lock-free queue, and
//! reads live state back through `PlaybackAtomics`.

mod command;
mod mixer;
mod playback;
mod transport;

pub use command::{command_channel, CommandSender, EngineCommand};
pub use mixer::{ChannelMixer, GainChange, GainValue, DEFAULT_VOLUME_PCT};
pub use playback::{PlaybackAtomics, PlaybackEngine, GAIN_FADE_SECONDS};
pub use transport::{PlayAction, TransportClock, TransportState};
