//! Render progress messages
//!
//! Sent from the render worker thread to the UI via mpsc channel.
//! Lifecycle: Started → Staged... → Progress... → Complete/Failed

use std::path::PathBuf;

use crate::types::Part;

/// Progress messages for one offline render
#[derive(Debug, Clone)]
pub enum RenderProgress {
    /// The render started; stems are about to be fetched
    Started {
        /// Number of stems that will be staged
        total_stems: usize,
    },

    /// One stem's bytes were fetched and staged as a named input
    Staged {
        part: Part,
    },

    /// The transcoder reported progress. Ratio is within [0, 1];
    /// out-of-range callback values are dropped before they get here.
    Progress {
        ratio: f32,
    },

    /// The render finished and the output file was written
    Complete {
        path: PathBuf,
    },

    /// The render failed; no output file is offered
    Failed {
        error: String,
    },
}

impl RenderProgress {
    /// Get a human-readable description of this progress message
    pub fn description(&self) -> String {
        match self {
            Self::Started { total_stems } => {
                format!("Starting render of {} stems", total_stems)
            }
            Self::Staged { part } => format!("Staged: {}", part.label()),
            Self::Progress { ratio } => format!("Rendering: {:.0}%", ratio * 100.0),
            Self::Complete { path } => format!("Render complete: {}", path.display()),
            Self::Failed { error } => format!("Render failed: {}", error),
        }
    }

    /// Check if this is a terminal message (Complete or Failed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Failed { .. })
    }

    /// Get the progress fraction (0.0 to 1.0), if this message carries one
    pub fn progress_fraction(&self) -> Option<f32> {
        match self {
            Self::Started { .. } => Some(0.0),
            Self::Progress { ratio } => Some(*ratio),
            Self::Complete { .. } => Some(1.0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_messages() {
        assert!(RenderProgress::Complete { path: PathBuf::from("mix.mp3") }.is_terminal());
        assert!(RenderProgress::Failed { error: "boom".into() }.is_terminal());
        assert!(!RenderProgress::Progress { ratio: 0.5 }.is_terminal());
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(
            RenderProgress::Progress { ratio: 0.25 }.progress_fraction(),
            Some(0.25)
        );
        assert_eq!(
            RenderProgress::Staged { part: Part::Bass }.progress_fraction(),
            None
        );
    }
}
