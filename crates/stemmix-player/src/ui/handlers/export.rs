//! Export message handlers
//!
//! Handles: OpenExport, StartExport, ExportTick. The render snapshot
//! is taken at click time from the channel mixer; the render itself
//! runs on a core worker thread and reports progress over a channel
//! polled here.

use iced::Task;

use stemmix_core::render::{ChannelInput, RenderProgress, RenderRequest};

use super::super::app::MixerApp;
use super::super::message::Message;

impl MixerApp {
    /// Open the export modal, resetting any previous run's state
    pub fn handle_open_export(&mut self) -> Task<Message> {
        let default_name = self
            .descriptor
            .as_ref()
            .map(|d| format!("{} - {}", d.artist, d.title))
            .unwrap_or_else(|| "mix".to_string());
        self.export.open(default_name);
        Task::none()
    }

    /// Start one render from the current gain snapshot
    pub fn handle_start_export(&mut self) -> Task<Message> {
        // Export is exclusive with itself; the UI also disables the
        // control while a render runs
        if self.export.is_exporting {
            return Task::none();
        }
        let (Some(descriptor), Some(mixer)) = (&self.descriptor, &self.mixer) else {
            return Task::none();
        };

        // Snapshot: every present part with its effective gain and URL
        let channels: Vec<ChannelInput> = mixer
            .gain_snapshot()
            .into_iter()
            .filter_map(|change| {
                descriptor.stem_url(change.part).map(|url| ChannelInput {
                    part: change.part,
                    url: url.to_string(),
                    gain: change.gain,
                })
            })
            .collect();

        let request = RenderRequest {
            mix_name: self.export.effective_name().to_string(),
            format: descriptor.format(),
            bitrate_kbps: descriptor.bitrate_kbps,
            duration_seconds: self.playback.duration_seconds,
            channels,
            output_dir: self.config.download_dir.clone(),
        };

        match self.render.start_render(request) {
            Ok(rx) => {
                self.render_progress_rx = Some(rx);
                self.export.is_exporting = true;
                self.export.progress_ratio = 0.0;
                self.export.error = None;
                self.export.last_output = None;
            }
            Err(e) => {
                // Precondition failures arrive synchronously: nothing
                // was fetched, nothing is running
                self.export.error = Some(e.to_string());
            }
        }

        Task::none()
    }

    /// Drain render progress; terminal messages end the run
    pub fn handle_export_tick(&mut self) -> Task<Message> {
        let Some(rx) = self.render_progress_rx.take() else {
            return Task::none();
        };

        let mut finished = false;
        while let Ok(progress) = rx.try_recv() {
            log::info!("{}", progress.description());
            if let Some(ratio) = progress.progress_fraction() {
                self.export.progress_ratio = ratio;
            }
            finished = progress.is_terminal();

            match progress {
                RenderProgress::Complete { path } => {
                    self.export.is_exporting = false;
                    self.export.progress_ratio = 0.0;
                    self.export.last_output = Some(path);
                    break;
                }
                RenderProgress::Failed { error } => {
                    self.export.is_exporting = false;
                    self.export.progress_ratio = 0.0;
                    self.export.error = Some(error);
                    break;
                }
                _ => {}
            }
        }

        if !finished {
            self.render_progress_rx = Some(rx);
        }
        Task::none()
    }
}
