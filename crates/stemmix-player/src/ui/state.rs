//! UI-side state for the mixer view

use std::path::PathBuf;

/// Playback state rendered by the transport controls
///
/// `is_ready` flips true exactly once, when every present stem has
/// decoded. Elapsed/duration and the live playing flag are refreshed
/// from the engine atomics on every tick, so engine-driven stops
/// (reaching the end of the mix) are reflected without UI bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    pub is_ready: bool,
    pub is_playing: bool,
    pub duration_seconds: f64,
    pub elapsed_seconds: f64,
}

/// State for the export modal and the render in flight
#[derive(Debug, Clone, Default)]
pub struct ExportState {
    /// Whether the export modal is open (keyboard shortcuts are
    /// disabled while it is)
    pub is_open: bool,
    /// User-edited output name; empty falls back to the default
    pub mix_name: String,
    /// Name used when the field is empty
    pub default_name: String,
    /// Whether a render is running (the export control is disabled)
    pub is_exporting: bool,
    /// Render progress in [0, 1]
    pub progress_ratio: f32,
    /// Error from the last failed render attempt (retained for retry)
    pub error: Option<String>,
    /// Where the last successful render landed
    pub last_output: Option<PathBuf>,
}

impl ExportState {
    /// Reset state when opening the modal
    pub fn open(&mut self, default_name: String) {
        self.is_open = true;
        self.default_name = default_name;
        self.mix_name.clear();
        self.progress_ratio = 0.0;
        self.error = None;
        self.last_output = None;
    }

    /// The name the render will actually use
    pub fn effective_name(&self) -> &str {
        if self.mix_name.trim().is_empty() {
            &self.default_name
        } else {
            &self.mix_name
        }
    }

    /// Whether the export button accepts a click
    pub fn can_export(&self, engine_ready: bool) -> bool {
        engine_ready && !self.is_exporting
    }
}
