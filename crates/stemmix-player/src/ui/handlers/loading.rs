//! Background-result polling while the mix loads
//!
//! Handles: LoadingTick. Drains the stem loader and the transcoder
//! probe result channels.

use iced::Task;

use stemmix_core::engine::{ChannelMixer, EngineCommand};
use stemmix_core::loader::{LoadedStems, StemLoadResult};

use super::super::app::MixerApp;
use super::super::message::Message;

impl MixerApp {
    /// Handle the loading poll tick
    pub fn handle_loading_tick(&mut self) -> Task<Message> {
        // One-time transcoder probe outcome
        if let Some(rx) = &self.render_init_rx {
            if let Ok(result) = rx.try_recv() {
                self.render.mark_initialized(result);
                self.render_init_rx = None;
            }
        }

        // Stem decode completion
        if let Some(loader) = &self.loader {
            match loader.try_recv() {
                Some(StemLoadResult::StemsReady(stems)) => {
                    self.attach_stems(stems);
                    // The loader thread is done; dropping the handle
                    // lets it exit
                    self.loader = None;
                }
                Some(StemLoadResult::Failed { part, error }) => {
                    // A failed stem means the mix never becomes ready.
                    // There is deliberately no user-facing error state
                    // for this: the play control simply stays disabled.
                    log::error!("Stem {} failed to load: {}", part.name(), error);
                }
                None => {}
            }
        }

        Task::none()
    }

    /// Attach the decoded stems: hand them to the engine (once), build
    /// the channel mixer over the present parts, and flip `is_ready`.
    fn attach_stems(&mut self, stems: Box<LoadedStems>) {
        let present = stems.present_parts();
        log::info!(
            "Stems ready: {} parts, {:.1}s",
            present.len(),
            stems.duration_seconds()
        );

        self.playback.duration_seconds = stems.duration_seconds();
        self.mixer = Some(ChannelMixer::new(&present));

        if let Some(commands) = &mut self.commands {
            commands.send(EngineCommand::LoadStems(stems));
        }

        self.playback.is_ready = true;
    }
}
