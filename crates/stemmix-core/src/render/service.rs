//! Render service - offline mix-down through the system transcoder
//!
//! The service probes `ffmpeg` once at startup (initialization can be
//! slow and may fail; the result gates export availability for the
//! whole session). Each render then runs on its own worker thread:
//! stems are re-fetched from their URLs — playback buffers are never
//! shared — staged into a temp dir, and mixed with a single ffmpeg
//! invocation whose progress feeds the UI.
//!
//! There is no cancellation: a render either completes or fails. On
//! app shutdown the worker is detached and left to finish with the
//! process.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use thiserror::Error;

use super::graph::{build_filter_graph, output_encoding_args, valid_filename, RenderRequest};
use super::message::RenderProgress;
use crate::loader::fetch_stem;
use crate::types::Part;

/// Errors surfaced by the render service
#[derive(Error, Debug)]
pub enum RenderError {
    /// The transcoder never initialized; export is disabled
    #[error("Transcoder is not initialized: {0}")]
    NotInitialized(String),

    /// A required stem has no URL; nothing was fetched
    #[error("Missing required stem: {}", .0.label())]
    MissingStem(Part),

    /// The transcoder run itself failed
    #[error("Transcoder failed: {0}")]
    EngineFailure(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of the one-time transcoder probe
pub type InitResult = Result<String, RenderError>;

/// Offline render service
///
/// Created once per session. `initialize()` must complete successfully
/// (via `mark_initialized`) before `start_render` accepts work.
pub struct RenderService {
    /// ffmpeg version line once the probe succeeded
    version: Option<String>,
    /// Error text if the probe failed (kept for the export tooltip)
    init_error: Option<String>,
}

impl RenderService {
    pub fn new() -> Self {
        Self {
            version: None,
            init_error: None,
        }
    }

    /// Probe the transcoder on a background thread.
    ///
    /// The receiver yields exactly one result; the caller records it
    /// with `mark_initialized`.
    pub fn initialize(&self) -> Receiver<InitResult> {
        let (tx, rx) = channel();

        if let Err(e) = thread::Builder::new()
            .name("render-init".to_string())
            .spawn(move || {
                let _ = tx.send(probe_transcoder());
            })
        {
            log::error!("Failed to spawn render init thread: {}", e);
        }

        rx
    }

    /// Record the probe outcome
    pub fn mark_initialized(&mut self, result: InitResult) {
        match result {
            Ok(version) => {
                log::info!("Transcoder ready: {}", version);
                self.version = Some(version);
                self.init_error = None;
            }
            Err(e) => {
                log::error!("Transcoder initialization failed: {}", e);
                self.init_error = Some(e.to_string());
            }
        }
    }

    /// Whether the transcoder is available this session
    pub fn is_ready(&self) -> bool {
        self.version.is_some()
    }

    /// The initialization error, if the probe failed
    pub fn init_error(&self) -> Option<&str> {
        self.init_error.as_deref()
    }

    /// Start one offline render.
    ///
    /// Preconditions are checked synchronously before any work
    /// happens: the transcoder must be initialized and every required
    /// part must be present in the request. Only then does the worker
    /// thread start fetching stem bytes.
    pub fn start_render(
        &self,
        request: RenderRequest,
    ) -> Result<Receiver<RenderProgress>, RenderError> {
        if !self.is_ready() {
            return Err(RenderError::NotInitialized(
                self.init_error
                    .clone()
                    .unwrap_or_else(|| "initialization has not completed".to_string()),
            ));
        }

        for part in Part::REQUIRED {
            if !request.channels.iter().any(|c| c.part == part) {
                return Err(RenderError::MissingStem(part));
            }
        }

        let (tx, rx) = channel();
        thread::Builder::new()
            .name("render-worker".to_string())
            .spawn(move || {
                if let Err(e) = run_render(&request, &tx) {
                    let _ = tx.send(RenderProgress::Failed {
                        error: e.to_string(),
                    });
                }
            })
            .map_err(|e| RenderError::EngineFailure(e.to_string()))?;

        Ok(rx)
    }
}

impl Default for RenderService {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `ffmpeg -version` and return its first line
fn probe_transcoder() -> InitResult {
    let output = Command::new("ffmpeg")
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| RenderError::NotInitialized(format!("ffmpeg not found: {}", e)))?;

    if !output.status.success() {
        return Err(RenderError::NotInitialized(format!(
            "ffmpeg probe exited with {}",
            output.status
        )));
    }

    let version = String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or("ffmpeg")
        .to_string();
    Ok(version)
}

/// Execute one render: stage stems, run the transcoder, deliver the file
fn run_render(request: &RenderRequest, tx: &Sender<RenderProgress>) -> Result<(), RenderError> {
    let start = std::time::Instant::now();
    let ext = request.format.extension();

    let _ = tx.send(RenderProgress::Started {
        total_stems: request.channels.len(),
    });

    // Stage every stem as a named input in the working dir
    let staging = tempfile::tempdir()?;
    let mut input_paths = Vec::with_capacity(request.channels.len());

    for channel in &request.channels {
        let bytes = fetch_stem(&channel.url).map_err(|e| RenderError::EngineFailure(e.to_string()))?;
        let path = staging.path().join(format!("{}.{}", channel.part.name(), ext));
        std::fs::write(&path, bytes)?;
        input_paths.push(path);
        let _ = tx.send(RenderProgress::Staged { part: channel.part });
    }

    let graph = build_filter_graph(&request.channels);
    let out_path = staging.path().join(format!("out.{}", ext));

    log::info!("Running transcoder with filter graph: {}", graph);

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-hide_banner")
        .arg("-nostdin")
        .arg("-y")
        .args(["-loglevel", "error"])
        .args(["-progress", "pipe:1"]);
    for path in &input_paths {
        cmd.arg("-i").arg(path);
    }
    cmd.arg("-filter_complex")
        .arg(&graph)
        .args(["-map", "[mix]"])
        .args(output_encoding_args(request.format, request.bitrate_kbps))
        .arg(&out_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .map_err(|e| RenderError::EngineFailure(format!("failed to launch ffmpeg: {}", e)))?;

    // Stream progress key=value lines from stdout while it runs
    if let Some(stdout) = child.stdout.take() {
        let reader = BufReader::new(stdout);
        for line in reader.lines() {
            let Ok(line) = line else { break };
            if let Some(us) = line.strip_prefix("out_time_us=") {
                if let Ok(us) = us.trim().parse::<i64>() {
                    if request.duration_seconds > 0.0 {
                        let ratio = (us as f64 / 1_000_000.0 / request.duration_seconds) as f32;
                        // Spurious callback values outside [0, 1] are dropped
                        if (0.0..=1.0).contains(&ratio) {
                            let _ = tx.send(RenderProgress::Progress { ratio });
                        }
                    }
                }
            }
        }
    }

    let mut stderr_text = String::new();
    if let Some(mut stderr) = child.stderr.take() {
        let _ = stderr.read_to_string(&mut stderr_text);
    }

    let status = child
        .wait()
        .map_err(|e| RenderError::EngineFailure(e.to_string()))?;

    if !status.success() {
        let detail = stderr_text
            .lines()
            .last()
            .unwrap_or("unknown transcoder error")
            .to_string();
        return Err(RenderError::EngineFailure(detail));
    }

    // Deliver the finished file into the download directory
    let out_dir = request
        .output_dir
        .clone()
        .or_else(dirs::download_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)?;

    let final_path = out_dir.join(format!("{}.{}", valid_filename(&request.mix_name), ext));
    std::fs::copy(&out_path, &final_path)?;

    log::info!(
        "Render complete: {} in {:?}",
        final_path.display(),
        start.elapsed()
    );

    let _ = tx.send(RenderProgress::Complete { path: final_path });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GainValue;
    use crate::render::graph::ChannelInput;
    use crate::types::MixFormat;

    fn request_with(channels: Vec<ChannelInput>) -> RenderRequest {
        RenderRequest {
            mix_name: "Test Mix".to_string(),
            format: MixFormat::Mp3,
            bitrate_kbps: Some(256),
            duration_seconds: 180.0,
            channels,
            output_dir: None,
        }
    }

    fn all_required_channels() -> Vec<ChannelInput> {
        Part::REQUIRED
            .iter()
            .map(|&part| ChannelInput {
                part,
                url: format!("/nonexistent/{}.mp3", part.name()),
                gain: GainValue::Db(0.0),
            })
            .collect()
    }

    #[test]
    fn test_render_requires_initialization() {
        let service = RenderService::new();
        let result = service.start_render(request_with(all_required_channels()));
        assert!(matches!(result, Err(RenderError::NotInitialized(_))));
    }

    /// A missing bass URL fails fast, before any stem is fetched
    #[test]
    fn test_missing_required_stem_fails_before_fetch() {
        let mut service = RenderService::new();
        service.mark_initialized(Ok("ffmpeg version test".to_string()));

        let channels: Vec<ChannelInput> = all_required_channels()
            .into_iter()
            .filter(|c| c.part != Part::Bass)
            .collect();

        match service.start_render(request_with(channels)) {
            Err(RenderError::MissingStem(part)) => assert_eq!(part, Part::Bass),
            other => panic!("expected MissingStem, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_init_failure_is_retained() {
        let mut service = RenderService::new();
        service.mark_initialized(Err(RenderError::NotInitialized(
            "ffmpeg not found".to_string(),
        )));

        assert!(!service.is_ready());
        assert!(service.init_error().unwrap().contains("ffmpeg not found"));

        let result = service.start_render(request_with(all_required_channels()));
        assert!(matches!(result, Err(RenderError::NotInitialized(_))));
    }

    #[test]
    fn test_probe_marks_ready() {
        let mut service = RenderService::new();
        assert!(!service.is_ready());
        service.mark_initialized(Ok("ffmpeg version 6.0".to_string()));
        assert!(service.is_ready());
        assert!(service.init_error().is_none());
    }
}
