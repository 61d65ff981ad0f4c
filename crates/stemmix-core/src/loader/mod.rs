//! Background stem loader
//!
//! Resolves a mix's stem URLs into decoded, play-ready buffers on a
//! dedicated thread. One `StemsReady` result is emitted only after ALL
//! present stems have decoded; there is no partial-ready signal. A
//! stem that fails to fetch or decode means the set never becomes
//! ready — the failure is reported on the result channel for logging,
//! but readiness is simply never reached.
//!
//! # Message-driven usage
//!
//! The result receiver is clonable (`Arc<Mutex<Receiver<_>>>`) so a
//! message-driven UI can poll it from a subscription instead of
//! blocking.

mod decode;

pub use decode::{decode_stem, fetch_stem};

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use thiserror::Error;

use crate::types::{Part, StereoBuffer, NUM_PARTS};

/// Errors raised while loading a stem set
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to fetch stem from {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No decodable audio track in stem")]
    NoAudioTrack,

    #[error("Failed to decode stem: {0}")]
    Decode(String),

    #[error("Failed to resample stem: {0}")]
    Resample(String),
}

/// A fully decoded stem set, ready for the playback engine
///
/// All present parts share one duration. Vocals are the duration
/// authority: every other part is padded or truncated to match.
pub struct LoadedStems {
    parts: [Option<StereoBuffer>; NUM_PARTS],
    pub duration_samples: u64,
    pub sample_rate: u32,
}

impl LoadedStems {
    /// Create an empty set at the given engine rate
    pub fn empty(sample_rate: u32) -> Self {
        Self {
            parts: std::array::from_fn(|_| None),
            duration_samples: 0,
            sample_rate,
        }
    }

    /// Insert one decoded part
    pub fn insert(&mut self, part: Part, buffer: StereoBuffer) {
        self.parts[part as usize] = Some(buffer);
    }

    /// Fix the shared duration and align every part to it
    pub fn finalize(&mut self, duration_samples: u64) {
        self.duration_samples = duration_samples;
        for buffer in self.parts.iter_mut().flatten() {
            buffer.resize(duration_samples as usize);
        }
    }

    /// The decoded buffer of one part, if present in this mix
    pub fn part(&self, part: Part) -> Option<&StereoBuffer> {
        self.parts[part as usize].as_ref()
    }

    /// Parts present in this set, in vocabulary order
    pub fn present_parts(&self) -> Vec<Part> {
        Part::ALL
            .iter()
            .copied()
            .filter(|&p| self.parts[p as usize].is_some())
            .collect()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_samples as f64 / self.sample_rate.max(1) as f64
    }
}

/// Result of one load request
pub enum StemLoadResult {
    /// Every present stem decoded; the set is ready to attach to the
    /// engine
    StemsReady(Box<LoadedStems>),
    /// A stem failed; the set will never become ready. Carried for
    /// logging only — no user-visible error state exists for this.
    Failed { part: Part, error: LoadError },
}

/// Clonable receiver wrapper for use in UI subscriptions
pub type StemResultReceiver = Arc<Mutex<Receiver<StemLoadResult>>>;

/// Request to load a full stem set
struct StemLoadRequest {
    sources: Vec<(Part, String)>,
}

/// Handle to the background loader thread
pub struct StemLoader {
    request_tx: Sender<StemLoadRequest>,
    result_rx: StemResultReceiver,
    _handle: JoinHandle<()>,
}

impl StemLoader {
    /// Spawn the loader thread, decoding to the given engine rate
    pub fn spawn(target_sample_rate: u32) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<StemLoadRequest>();
        let (result_tx, result_rx) = mpsc::channel::<StemLoadResult>();

        let handle = thread::Builder::new()
            .name("stem-loader".to_string())
            .spawn(move || {
                loader_thread(request_rx, result_tx, target_sample_rate);
            })
            .expect("Failed to spawn stem loader thread");

        log::info!(
            "StemLoader spawned with target sample rate: {} Hz",
            target_sample_rate
        );

        Self {
            request_tx,
            result_rx: Arc::new(Mutex::new(result_rx)),
            _handle: handle,
        }
    }

    /// Get a clonable reference to the result receiver for subscriptions
    pub fn result_receiver(&self) -> StemResultReceiver {
        self.result_rx.clone()
    }

    /// Queue a stem set for loading (non-blocking)
    pub fn load(&self, sources: Vec<(Part, String)>) -> Result<(), String> {
        self.request_tx
            .send(StemLoadRequest { sources })
            .map_err(|e| format!("Loader thread disconnected: {}", e))
    }

    /// Try to receive a single result (non-blocking)
    pub fn try_recv(&self) -> Option<StemLoadResult> {
        self.result_rx.lock().ok().and_then(|rx| rx.try_recv().ok())
    }
}

fn loader_thread(
    rx: Receiver<StemLoadRequest>,
    tx: Sender<StemLoadResult>,
    sample_rate: u32,
) {
    log::info!("Stem loader thread started");

    while let Ok(request) = rx.recv() {
        handle_load(request, &tx, sample_rate);
    }

    log::info!("Stem loader thread exiting");
}

fn handle_load(request: StemLoadRequest, tx: &Sender<StemLoadResult>, sample_rate: u32) {
    let total_start = std::time::Instant::now();
    let mut stems = LoadedStems::empty(sample_rate);

    for (part, source) in &request.sources {
        let part_start = std::time::Instant::now();

        let decoded = fetch_stem(source).and_then(|bytes| decode_stem(bytes, source, sample_rate));

        match decoded {
            Ok(buffer) => {
                log::info!(
                    "Decoded {} stem: {} samples in {:?}",
                    part.name(),
                    buffer.len(),
                    part_start.elapsed()
                );
                stems.insert(*part, buffer);
            }
            Err(error) => {
                log::error!("Failed to load {} stem from {}: {}", part.name(), source, error);
                let _ = tx.send(StemLoadResult::Failed { part: *part, error });
                return;
            }
        }
    }

    // Vocals are the duration authority; every other part is aligned
    // to their length
    let duration = stems
        .part(Part::Vocals)
        .or_else(|| {
            stems
                .present_parts()
                .first()
                .and_then(|&p| stems.part(p))
        })
        .map(|b| b.len() as u64)
        .unwrap_or(0);
    stems.finalize(duration);

    log::info!(
        "Stem set ready: {} parts, {:.1}s, loaded in {:?}",
        stems.present_parts().len(),
        stems.duration_seconds(),
        total_start.elapsed()
    );

    let _ = tx.send(StemLoadResult::StemsReady(Box::new(stems)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StereoSample, SAMPLE_RATE};
    use std::time::Duration;

    fn write_wav(path: &std::path::Path, frames: usize) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..frames {
            writer.write_sample(8000i16).unwrap();
            writer.write_sample(-8000i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_vocals_are_duration_authority() {
        let mut stems = LoadedStems::empty(SAMPLE_RATE);
        stems.insert(Part::Vocals, StereoBuffer::silence(1000));
        stems.insert(Part::Bass, StereoBuffer::silence(900));
        stems.insert(Part::Drums, StereoBuffer::silence(1100));
        stems.finalize(1000);

        assert_eq!(stems.duration_samples, 1000);
        assert_eq!(stems.part(Part::Bass).unwrap().len(), 1000);
        assert_eq!(stems.part(Part::Drums).unwrap().len(), 1000);
        assert!(stems.part(Part::Piano).is_none());
    }

    #[test]
    fn test_padded_region_is_silent() {
        let mut short = StereoBuffer::silence(10);
        short[9] = StereoSample::mono(0.5);
        let mut stems = LoadedStems::empty(SAMPLE_RATE);
        stems.insert(Part::Vocals, StereoBuffer::silence(20));
        stems.insert(Part::Bass, short);
        stems.finalize(20);

        let bass = stems.part(Part::Bass).unwrap();
        assert_eq!(bass[9].left, 0.5);
        assert_eq!(bass[19], StereoSample::silence());
    }

    #[test]
    fn test_ready_only_after_all_parts_decode() {
        let dir = tempfile::tempdir().unwrap();
        let vocals = dir.path().join("vocals.wav");
        let drums = dir.path().join("drums.wav");
        write_wav(&vocals, 2000);
        write_wav(&drums, 1500);

        let loader = StemLoader::spawn(SAMPLE_RATE);
        loader
            .load(vec![
                (Part::Vocals, vocals.to_string_lossy().to_string()),
                (Part::Drums, drums.to_string_lossy().to_string()),
            ])
            .unwrap();

        let rx = loader.result_receiver();
        let result = rx
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(30))
            .expect("loader produced no result");

        match result {
            StemLoadResult::StemsReady(stems) => {
                assert_eq!(stems.present_parts(), vec![Part::Vocals, Part::Drums]);
                assert_eq!(stems.duration_samples, 2000);
                assert_eq!(stems.part(Part::Drums).unwrap().len(), 2000);
            }
            StemLoadResult::Failed { part, error } => {
                panic!("unexpected failure on {:?}: {}", part, error)
            }
        }
    }

    /// A failing stem prevents readiness: no `StemsReady` is ever
    /// emitted, only the internal failure record. This mirrors the
    /// known gap where the user sees an indefinitely disabled play
    /// control rather than an error.
    #[test]
    fn test_failed_stem_never_reaches_ready() {
        let dir = tempfile::tempdir().unwrap();
        let vocals = dir.path().join("vocals.wav");
        write_wav(&vocals, 500);

        let loader = StemLoader::spawn(SAMPLE_RATE);
        loader
            .load(vec![
                (Part::Vocals, vocals.to_string_lossy().to_string()),
                (Part::Bass, dir.path().join("missing.wav").to_string_lossy().to_string()),
            ])
            .unwrap();

        let rx = loader.result_receiver();
        let result = rx
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_secs(30))
            .expect("loader produced no result");

        match result {
            StemLoadResult::Failed { part, .. } => assert_eq!(part, Part::Bass),
            StemLoadResult::StemsReady(_) => panic!("set must not become ready"),
        }

        // Nothing else arrives afterwards
        assert!(rx
            .lock()
            .unwrap()
            .recv_timeout(Duration::from_millis(200))
            .is_err());
    }
}
