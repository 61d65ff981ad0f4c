//! CPAL audio output
//!
//! A dedicated thread owns the output stream (CPAL streams are not
//! `Send`, so the stream never leaves the thread that built it). The
//! stream is built at startup but kept paused; it starts running on
//! the first user play — the one-time "unlock" of the audio device —
//! and keeps running until shutdown. The engine inside the callback is
//! driven entirely through its lock-free command queue.
//!
//! ```text
//! UI thread ──EngineCommand──► rtrb queue ──► CPAL callback (PlaybackEngine)
//!     ▲                                            │
//!     └────────────── PlaybackAtomics ◄────────────┘
//! ```

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};

use super::error::{AudioError, AudioResult};
use crate::engine::{EngineCommand, PlaybackAtomics, PlaybackEngine};

/// Control messages for the audio thread
enum OutputCtrl {
    /// Start the stream (first play; may fail on the device)
    Start,
    /// Tear the stream down and exit the thread
    Shutdown,
}

/// Handle to the running audio output thread
///
/// Dropping the handle shuts the stream down.
pub struct OutputHandle {
    ctrl_tx: Sender<OutputCtrl>,
    handle: Option<JoinHandle<()>>,
}

impl OutputHandle {
    /// Start the output stream. Called once, on the first user play;
    /// later calls are harmless (the stream is already running).
    pub fn start(&self) {
        if self.ctrl_tx.send(OutputCtrl::Start).is_err() {
            log::warn!("Audio thread is gone; cannot start output stream");
        }
    }

    /// Stop the stream and join the audio thread
    pub fn shutdown(&mut self) {
        let _ = self.ctrl_tx.send(OutputCtrl::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Audio output thread panicked during shutdown");
            }
        }
    }
}

impl Drop for OutputHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start the audio system.
///
/// Spawns the audio thread, builds the output stream on it, and
/// returns once the stream exists (or failed to). The returned sample
/// rate is the device's negotiated rate — the loader must decode to
/// it.
pub fn start_output(
    commands: rtrb::Consumer<EngineCommand>,
    atomics: Arc<PlaybackAtomics>,
) -> AudioResult<(OutputHandle, u32)> {
    let (ctrl_tx, ctrl_rx) = mpsc::channel::<OutputCtrl>();
    let (ready_tx, ready_rx) = mpsc::channel::<AudioResult<u32>>();

    let handle = thread::Builder::new()
        .name("audio-output".to_string())
        .spawn(move || {
            let built = build_stream(commands, atomics);

            let (stream, sample_rate) = match built {
                Ok(pair) => pair,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(sample_rate));

            // The stream lives on this thread until shutdown
            let mut started = false;
            while let Ok(ctrl) = ctrl_rx.recv() {
                match ctrl {
                    OutputCtrl::Start => {
                        if !started {
                            match stream.play() {
                                Ok(()) => {
                                    started = true;
                                    log::info!("Audio output stream started");
                                }
                                Err(e) => {
                                    log::error!("Failed to start audio stream: {}", e);
                                }
                            }
                        }
                    }
                    OutputCtrl::Shutdown => break,
                }
            }
            drop(stream);
            log::info!("Audio output thread exiting");
        })
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

    let sample_rate = ready_rx
        .recv()
        .map_err(|_| AudioError::ThreadDisconnected)??;

    Ok((
        OutputHandle {
            ctrl_tx,
            handle: Some(handle),
        },
        sample_rate,
    ))
}

/// Build the CPAL output stream with the engine in its callback
fn build_stream(
    commands: rtrb::Consumer<EngineCommand>,
    atomics: Arc<PlaybackAtomics>,
) -> AudioResult<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(AudioError::NoDefaultDevice)?;

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    log::info!("Using audio device: {}", device_name);

    let supported = device
        .default_output_config()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?;

    if supported.sample_format() != SampleFormat::F32 {
        return Err(AudioError::UnsupportedFormat(format!(
            "{:?}",
            supported.sample_format()
        )));
    }

    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels() as usize;

    let stream_config = StreamConfig {
        channels: supported.channels(),
        sample_rate: supported.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    };

    log::info!(
        "Audio config: {} channels, {} Hz",
        channels,
        sample_rate
    );

    // The engine and the loader both need the negotiated device rate
    atomics.set_sample_rate(sample_rate);

    let mut engine = PlaybackEngine::new(commands, atomics);

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                engine.process(data, channels);
            },
            |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

    // Keep the device quiet until the first user play unlocks it
    if let Err(e) = stream.pause() {
        log::debug!("Stream pause after build failed (harmless on some hosts): {}", e);
    }

    Ok((stream, sample_rate))
}
