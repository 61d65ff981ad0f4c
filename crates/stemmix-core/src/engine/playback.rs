//! Playback engine - sample-locked stem mixing for the audio callback
//!
//! The engine is owned exclusively by the audio callback thread. It
//! holds the decoded stems, one shared playhead for all of them, and a
//! smoothed gain per part. The UI controls it through the lock-free
//! command queue and observes it through relaxed atomics.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use crate::loader::LoadedStems;
use crate::types::{Part, StereoSample, NUM_PARTS, SAMPLE_RATE};

use super::command::EngineCommand;

/// Duration of the gain fade ramp, in seconds. Gain changes (mute,
/// solo, fader moves) glide over this window instead of stepping, so
/// they never click.
pub const GAIN_FADE_SECONDS: f32 = 0.05;

/// Lock-free playback state for UI access
///
/// The audio callback writes these after every buffer; the UI tick
/// reads them without taking any lock. `Ordering::Relaxed` everywhere:
/// we need visibility, not synchronization.
pub struct PlaybackAtomics {
    /// Current playhead position in samples
    position: AtomicU64,
    /// Whether the shared transport is running
    playing: AtomicBool,
    /// Total mix length in samples (0 until stems are loaded)
    length: AtomicU64,
    /// Engine sample rate in Hz
    sample_rate: AtomicU32,
}

impl PlaybackAtomics {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            position: AtomicU64::new(0),
            playing: AtomicBool::new(false),
            length: AtomicU64::new(0),
            sample_rate: AtomicU32::new(sample_rate),
        }
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn length(&self) -> u64 {
        self.length.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Relaxed)
    }

    /// Record the device's negotiated rate (set once, at stream build)
    pub fn set_sample_rate(&self, rate: u32) {
        self.sample_rate.store(rate, Ordering::Relaxed);
    }

    /// Current playhead position in seconds
    pub fn position_seconds(&self) -> f64 {
        self.position() as f64 / self.sample_rate().max(1) as f64
    }

    /// Total mix duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.length() as f64 / self.sample_rate().max(1) as f64
    }

    /// Convert a seconds position to a sample position
    pub fn seconds_to_samples(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.sample_rate() as f64) as u64
    }
}

impl Default for PlaybackAtomics {
    fn default() -> Self {
        Self::new(SAMPLE_RATE)
    }
}

/// Per-part gain with linear fade smoothing
#[derive(Debug, Clone, Copy)]
struct SmoothedGain {
    current: f32,
    target: f32,
    /// Gain units per sample while ramping
    step: f32,
}

impl SmoothedGain {
    fn new(sample_rate: u32) -> Self {
        Self {
            current: 1.0,
            target: 1.0,
            step: 1.0 / (GAIN_FADE_SECONDS * sample_rate.max(1) as f32),
        }
    }

    #[inline]
    fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Advance one sample toward the target and return the gain to apply
    #[inline]
    fn next(&mut self) -> f32 {
        if self.current < self.target {
            self.current = (self.current + self.step).min(self.target);
        } else if self.current > self.target {
            self.current = (self.current - self.step).max(self.target);
        }
        self.current
    }
}

/// The audio-thread half of the player
///
/// Owns the decoded stems exclusively. One playhead advances all
/// present parts together, which keeps them sample-locked by
/// construction.
pub struct PlaybackEngine {
    stems: Option<Box<LoadedStems>>,
    position: usize,
    length: usize,
    playing: bool,
    gains: [SmoothedGain; NUM_PARTS],
    command_rx: rtrb::Consumer<EngineCommand>,
    atomics: Arc<PlaybackAtomics>,
}

impl PlaybackEngine {
    pub fn new(
        command_rx: rtrb::Consumer<EngineCommand>,
        atomics: Arc<PlaybackAtomics>,
    ) -> Self {
        let sample_rate = atomics.sample_rate();
        Self {
            stems: None,
            position: 0,
            length: 0,
            playing: false,
            gains: [SmoothedGain::new(sample_rate); NUM_PARTS],
            command_rx,
            atomics,
        }
    }

    /// Apply all pending commands (called at buffer start)
    fn process_commands(&mut self) {
        while let Ok(cmd) = self.command_rx.pop() {
            match cmd {
                EngineCommand::LoadStems(stems) => {
                    self.length = stems.duration_samples as usize;
                    self.position = 0;
                    self.playing = false;
                    self.stems = Some(stems);
                    self.atomics.length.store(self.length as u64, Ordering::Relaxed);
                    self.atomics.position.store(0, Ordering::Relaxed);
                    self.atomics.playing.store(false, Ordering::Relaxed);
                }
                EngineCommand::Play => {
                    if self.stems.is_some() && self.position < self.length {
                        self.playing = true;
                        self.atomics.playing.store(true, Ordering::Relaxed);
                    }
                }
                EngineCommand::Pause => {
                    self.playing = false;
                    self.atomics.playing.store(false, Ordering::Relaxed);
                }
                EngineCommand::Seek { position } => {
                    self.position = (position as usize).min(self.length);
                    self.atomics
                        .position
                        .store(self.position as u64, Ordering::Relaxed);
                }
                EngineCommand::SetGain { part, gain } => {
                    self.gains[part as usize].set_target(gain.clamp(0.0, 4.0));
                }
            }
        }
    }

    /// Fill an interleaved output buffer with the summed mix
    ///
    /// `output` holds `channels`-interleaved frames; the mix is written
    /// to the first two channels, any extras are silenced.
    pub fn process(&mut self, output: &mut [f32], channels: usize) {
        self.process_commands();

        let n_frames = output.len() / channels.max(1);

        if !self.playing {
            output.fill(0.0);
            return;
        }
        let Some(stems) = self.stems.as_deref() else {
            output.fill(0.0);
            return;
        };

        let length = self.length;
        let position = self.position;

        for frame in 0..n_frames {
            let idx = position + frame;
            let mut mixed = StereoSample::silence();

            if idx < length {
                for part in Part::ALL {
                    let gain = self.gains[part as usize].next();
                    if let Some(buffer) = stems.part(part) {
                        if gain > 0.0 || self.gains[part as usize].target > 0.0 {
                            mixed += buffer[idx] * gain;
                        }
                    }
                }
            }

            let base = frame * channels;
            output[base] = mixed.left;
            if channels > 1 {
                output[base + 1] = mixed.right;
            }
            for ch in 2..channels {
                output[base + ch] = 0.0;
            }
        }

        // Advance the shared playhead
        let new_pos = (position + n_frames).min(length);

        // Auto-stop at the end of the mix; the transport rewinds so
        // the next play starts from the top
        if new_pos >= length {
            self.position = 0;
            self.playing = false;
            self.atomics.position.store(0, Ordering::Relaxed);
            self.atomics.playing.store(false, Ordering::Relaxed);
        } else {
            self.position = new_pos;
            self.atomics
                .position
                .store(new_pos as u64, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::command::command_channel;
    use crate::types::StereoBuffer;

    fn stems_with_constant(value: f32, len: usize) -> LoadedStems {
        let mut stems = LoadedStems::empty(SAMPLE_RATE);
        let mut buffer = StereoBuffer::silence(len);
        for i in 0..len {
            buffer[i] = StereoSample::mono(value);
        }
        stems.insert(Part::Vocals, buffer);
        stems.finalize(len as u64);
        stems
    }

    #[test]
    fn test_silent_until_play() {
        let (mut tx, rx) = command_channel(16);
        let atomics = Arc::new(PlaybackAtomics::new(SAMPLE_RATE));
        let mut engine = PlaybackEngine::new(rx, atomics.clone());

        tx.push(EngineCommand::LoadStems(Box::new(stems_with_constant(0.5, 1024))))
            .ok()
            .unwrap();

        let mut out = vec![1.0f32; 256];
        engine.process(&mut out, 2);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(!atomics.is_playing());
        assert_eq!(atomics.length(), 1024);
    }

    #[test]
    fn test_play_advances_and_stops_at_end() {
        let (mut tx, rx) = command_channel(16);
        let atomics = Arc::new(PlaybackAtomics::new(SAMPLE_RATE));
        let mut engine = PlaybackEngine::new(rx, atomics.clone());

        tx.push(EngineCommand::LoadStems(Box::new(stems_with_constant(0.5, 512))))
            .ok()
            .unwrap();
        tx.push(EngineCommand::Play).ok().unwrap();

        let mut out = vec![0.0f32; 512 * 2];
        engine.process(&mut out, 2);
        // Reached the end: transport auto-stopped and rewound
        assert!(!atomics.is_playing());
        assert_eq!(atomics.position(), 0);

        // A later play starts again from the top
        tx.push(EngineCommand::Play).ok().unwrap();
        let mut out = vec![0.0f32; 64];
        engine.process(&mut out, 2);
        assert!(atomics.is_playing());
        assert_eq!(atomics.position(), 32);
    }

    #[test]
    fn test_seek_is_clamped_to_length() {
        let (mut tx, rx) = command_channel(16);
        let atomics = Arc::new(PlaybackAtomics::new(SAMPLE_RATE));
        let mut engine = PlaybackEngine::new(rx, atomics.clone());

        tx.push(EngineCommand::LoadStems(Box::new(stems_with_constant(0.5, 100))))
            .ok()
            .unwrap();
        tx.push(EngineCommand::Seek { position: 10_000 }).ok().unwrap();

        let mut out = vec![0.0f32; 64];
        engine.process(&mut out, 2);
        assert_eq!(atomics.position(), 100);
    }

    #[test]
    fn test_gain_ramps_toward_target() {
        let (mut tx, rx) = command_channel(16);
        let atomics = Arc::new(PlaybackAtomics::new(SAMPLE_RATE));
        let mut engine = PlaybackEngine::new(rx, atomics);

        let len = SAMPLE_RATE as usize; // 1 second of audio
        tx.push(EngineCommand::LoadStems(Box::new(stems_with_constant(1.0, len))))
            .ok()
            .unwrap();
        tx.push(EngineCommand::SetGain { part: Part::Vocals, gain: 0.0 })
            .ok()
            .unwrap();
        tx.push(EngineCommand::Play).ok().unwrap();

        // One fade window's worth of frames
        let fade_frames = (GAIN_FADE_SECONDS * SAMPLE_RATE as f32) as usize;
        let mut out = vec![0.0f32; fade_frames * 2];
        engine.process(&mut out, 2);

        // The first frame is still near unity, the ramp ends silent
        assert!(out[0] > 0.9);
        assert_eq!(out[out.len() - 2], 0.0);
    }

    #[test]
    fn test_atomics_seconds_conversion() {
        let atomics = PlaybackAtomics::new(SAMPLE_RATE);
        atomics.length.store(SAMPLE_RATE as u64 * 3, Ordering::Relaxed);
        assert_eq!(atomics.duration_seconds(), 3.0);
        assert_eq!(atomics.seconds_to_samples(1.5), SAMPLE_RATE as u64 * 3 / 2);
    }
}
