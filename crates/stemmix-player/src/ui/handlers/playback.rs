//! Transport message handlers
//!
//! Handles: PlayPause, Seeking, SeekCommitted, Tick

use iced::Task;

use stemmix_core::engine::{EngineCommand, PlayAction};

use super::super::app::MixerApp;
use super::super::message::Message;

impl MixerApp {
    /// Handle the play/pause toggle
    pub fn handle_play_pause(&mut self) -> Task<Message> {
        if !self.playback.is_ready {
            return Task::none();
        }

        if self.transport.is_playing() {
            self.transport.pause();
            if let Some(commands) = &mut self.commands {
                commands.send(EngineCommand::Pause);
            }
        } else {
            match self.transport.play() {
                PlayAction::InitAndStart => {
                    // First play ever: unlock the audio device, then
                    // the engine schedules every stem from sample 0
                    if let Some(output) = &self.output {
                        output.start();
                    }
                    if let Some(commands) = &mut self.commands {
                        commands.send(EngineCommand::Play);
                    }
                }
                PlayAction::Resume => {
                    if let Some(commands) = &mut self.commands {
                        commands.send(EngineCommand::Play);
                    }
                }
                PlayAction::None => {}
            }
        }

        self.playback.is_playing = self.transport.is_playing();
        Task::none()
    }

    /// Handle seek slider movement: the tick is suspended on the first
    /// motion and only the displayed position follows the drag
    pub fn handle_seeking(&mut self, seconds: f64) -> Task<Message> {
        if !self.playback.is_ready {
            return Task::none();
        }

        if self.seek_preview.is_none() {
            self.transport.begin_seek();
        }
        self.seek_preview = Some(seconds);
        self.playback.elapsed_seconds = seconds;
        Task::none()
    }

    /// Handle seek slider release: commit the position to the engine,
    /// then resume ticking
    pub fn handle_seek_committed(&mut self) -> Task<Message> {
        if let Some(seconds) = self.seek_preview.take() {
            if let Some(commands) = &mut self.commands {
                commands.send(EngineCommand::Seek {
                    position: self.atomics.seconds_to_samples(seconds),
                });
            }
            self.transport.commit_seek();
        }
        Task::none()
    }

    /// Handle the periodic position tick.
    ///
    /// Position and the playing flag come from the engine atomics, not
    /// local memory, so an engine-driven stop (reaching the end of the
    /// mix) is picked up here and folded into the transport clock.
    pub fn handle_tick(&mut self) -> Task<Message> {
        // A stale tick must not overwrite an in-flight seek drag
        if self.seek_preview.is_some() {
            return Task::none();
        }

        let duration = self.atomics.duration_seconds();
        let elapsed = self.atomics.position_seconds().min(duration);
        self.playback.duration_seconds = duration;
        self.playback.elapsed_seconds = elapsed;

        let engine_playing = self.atomics.is_playing();
        if self.transport.is_playing() && !engine_playing {
            self.transport.reach_end();
        }
        self.playback.is_playing = engine_playing;

        Task::none()
    }
}
