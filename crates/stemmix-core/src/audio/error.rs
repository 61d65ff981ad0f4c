//! Audio backend error types

use thiserror::Error;

/// Errors that can occur while starting or running the audio output
#[derive(Error, Debug)]
pub enum AudioError {
    /// No default output device available
    #[error("No default audio output device found")]
    NoDefaultDevice,

    /// Failed to get device configuration
    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    /// Unsupported sample format
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Failed to build the output stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    /// The audio thread went away before answering
    #[error("Audio thread disconnected during startup")]
    ThreadDisconnected,
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
