//! Mix descriptor client
//!
//! The separation backend exposes one JSON document per mix: status,
//! title/artist, output bitrate, and the media URL of each stem. The
//! player reads it exactly once to obtain stem URLs; job polling and
//! scheduling live elsewhere. A descriptor can also be read from a
//! local JSON file so the player works without the backend running.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::types::{MixFormat, Part};

/// Errors raised while obtaining or validating a mix descriptor
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Failed to fetch descriptor from {url}: {message}")]
    FetchFailed { url: String, message: String },

    #[error("Failed to read descriptor file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid descriptor JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Processing status of a mix on the separation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MixStatus {
    Queued,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
    Error,
}

/// One mix as described by the separation backend
///
/// Stem URLs are null until the job completes; only a descriptor with
/// status `Done` is playable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixDescriptor {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub status: MixStatus,
    #[serde(default)]
    pub error: Option<String>,
    /// Output bitrate in kbps (lossy formats only)
    #[serde(default)]
    pub bitrate_kbps: Option<u32>,
    #[serde(default)]
    pub vocals_url: Option<String>,
    /// The accompaniment stem (the backend calls it "other")
    #[serde(default)]
    pub other_url: Option<String>,
    #[serde(default)]
    pub bass_url: Option<String>,
    #[serde(default)]
    pub drums_url: Option<String>,
    #[serde(default)]
    pub piano_url: Option<String>,
    #[serde(default)]
    pub guitar_url: Option<String>,
}

impl MixDescriptor {
    /// Fetch a descriptor from the backend (single GET, no retries)
    pub fn fetch(service_url: &str, mix_id: &str) -> Result<Self, DescriptorError> {
        let url = format!("{}/{}/", service_url.trim_end_matches('/'), mix_id);
        log::info!("Fetching mix descriptor from {}", url);

        let response = ureq::get(&url)
            .call()
            .map_err(|e| DescriptorError::FetchFailed {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let descriptor: MixDescriptor = response
            .into_json()
            .map_err(|e| DescriptorError::FetchFailed {
                url,
                message: e.to_string(),
            })?;

        Ok(descriptor)
    }

    /// Read a descriptor from a local JSON file
    pub fn from_file(path: &Path) -> Result<Self, DescriptorError> {
        log::info!("Reading mix descriptor from {:?}", path);
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// The URL of one part's stem, if the backend produced it
    pub fn stem_url(&self, part: Part) -> Option<&str> {
        match part {
            Part::Vocals => self.vocals_url.as_deref(),
            Part::Accomp => self.other_url.as_deref(),
            Part::Bass => self.bass_url.as_deref(),
            Part::Drums => self.drums_url.as_deref(),
            Part::Piano => self.piano_url.as_deref(),
            Part::Guitar => self.guitar_url.as_deref(),
        }
    }

    /// All parts present in this mix, in vocabulary order
    pub fn present_parts(&self) -> Vec<Part> {
        Part::ALL
            .iter()
            .copied()
            .filter(|p| self.stem_url(*p).is_some())
            .collect()
    }

    /// (part, url) pairs for every present stem, in vocabulary order
    pub fn stem_sources(&self) -> Vec<(Part, String)> {
        Part::ALL
            .iter()
            .filter_map(|&p| self.stem_url(p).map(|u| (p, u.to_string())))
            .collect()
    }

    /// Required parts whose URL is missing
    pub fn missing_required(&self) -> Vec<Part> {
        Part::REQUIRED
            .iter()
            .copied()
            .filter(|p| self.stem_url(*p).is_none())
            .collect()
    }

    /// Container format of the mix, derived from the first present stem
    pub fn format(&self) -> MixFormat {
        self.stem_sources()
            .first()
            .map(|(_, url)| MixFormat::from_url(url))
            .unwrap_or_default()
    }

    /// Whether the separation job finished and the mix is playable
    pub fn is_done(&self) -> bool {
        self.status == MixStatus::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "id": "b0e4c9d2",
            "title": "Night Drive",
            "artist": "Test Artist",
            "status": "Done",
            "bitrate_kbps": 256,
            "vocals_url": "http://localhost:8000/media/b0e4c9d2/vocals.mp3",
            "other_url": "http://localhost:8000/media/b0e4c9d2/other.mp3",
            "bass_url": "http://localhost:8000/media/b0e4c9d2/bass.mp3",
            "drums_url": "http://localhost:8000/media/b0e4c9d2/drums.mp3"
        }"#
    }

    #[test]
    fn test_parse_descriptor() {
        let d: MixDescriptor = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(d.status, MixStatus::Done);
        assert_eq!(d.bitrate_kbps, Some(256));
        assert!(d.stem_url(Part::Vocals).is_some());
        assert!(d.stem_url(Part::Accomp).is_some());
        assert!(d.stem_url(Part::Piano).is_none());
        assert!(d.missing_required().is_empty());
        assert_eq!(d.format(), MixFormat::Mp3);
    }

    #[test]
    fn test_in_progress_status_name() {
        let json = r#"{"id":"x","title":"t","artist":"a","status":"In Progress"}"#;
        let d: MixDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.status, MixStatus::InProgress);
        assert!(!d.is_done());
    }

    #[test]
    fn test_present_parts_order() {
        let json = r#"{
            "id":"x","title":"t","artist":"a","status":"Done",
            "drums_url":"d.flac","vocals_url":"v.flac","piano_url":"p.flac",
            "bass_url":"b.flac","other_url":"o.flac"
        }"#;
        let d: MixDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(
            d.present_parts(),
            vec![Part::Vocals, Part::Accomp, Part::Bass, Part::Drums, Part::Piano]
        );
        assert_eq!(d.format(), MixFormat::Flac);
    }

    #[test]
    fn test_missing_required() {
        let json = r#"{
            "id":"x","title":"t","artist":"a","status":"Done",
            "vocals_url":"v.mp3","other_url":"o.mp3","drums_url":"d.mp3"
        }"#;
        let d: MixDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(d.missing_required(), vec![Part::Bass]);
    }
}
