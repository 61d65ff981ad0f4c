//! Messages for the mixer application

use iced::keyboard::{Key, Modifiers};
use stemmix_core::Part;

/// All messages the mixer application handles
#[derive(Debug, Clone)]
pub enum Message {
    // ── Transport ────────────────────────────────────────────────
    /// Play/pause toggle (button or Space)
    PlayPause,
    /// The seek slider is being dragged; the tick is suspended and
    /// only the displayed position follows the drag
    Seeking(f64),
    /// The seek slider was released; the position is committed to the
    /// engine and the tick resumes
    SeekCommitted,
    /// Periodic position refresh while playing
    Tick,

    // ── Per-part controls ────────────────────────────────────────
    MuteClicked(Part),
    /// Solo toggle; the bool is "additive" (modifier held)
    SoloClicked(Part, bool),
    VolumeChanged(Part, f32),

    // ── Keyboard ─────────────────────────────────────────────────
    KeyPressed(Key, Modifiers),

    // ── Background results ───────────────────────────────────────
    /// Poll the stem loader and the transcoder probe while loading
    LoadingTick,

    // ── Export ───────────────────────────────────────────────────
    OpenExport,
    CloseExport,
    MixNameChanged(String),
    StartExport,
    /// Poll render progress while a render is running
    ExportTick,
}
