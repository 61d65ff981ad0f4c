//! Mixer UI: application state, messages, handlers, and views

pub mod app;
pub mod export_modal;
pub mod handlers;
pub mod message;
pub mod mixer_view;
pub mod state;
pub mod transport;

pub use app::MixerApp;
pub use message::Message;
