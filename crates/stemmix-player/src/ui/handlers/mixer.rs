//! Per-part control handlers
//!
//! Handles: MuteClicked, SoloClicked, VolumeChanged. The channel
//! mixer decides which gains actually change; the handlers push those
//! changes onto the engine command queue.

use iced::Task;

use stemmix_core::engine::{EngineCommand, GainChange};
use stemmix_core::Part;

use super::super::app::MixerApp;
use super::super::message::Message;

impl MixerApp {
    fn apply_gain_changes(&mut self, changes: &[GainChange]) {
        if let Some(commands) = &mut self.commands {
            for change in changes {
                commands.send(EngineCommand::SetGain {
                    part: change.part,
                    gain: change.gain.linear(),
                });
            }
        }
    }

    pub fn handle_mute_clicked(&mut self, part: Part) -> Task<Message> {
        let Some(mixer) = &mut self.mixer else {
            return Task::none();
        };
        let changes = mixer.toggle_mute(part);
        self.apply_gain_changes(&changes);
        Task::none()
    }

    pub fn handle_solo_clicked(&mut self, part: Part, additive: bool) -> Task<Message> {
        let Some(mixer) = &mut self.mixer else {
            return Task::none();
        };
        let changes = mixer.toggle_solo(part, additive);
        self.apply_gain_changes(&changes);
        Task::none()
    }

    pub fn handle_volume_changed(&mut self, part: Part, pct: f32) -> Task<Message> {
        let Some(mixer) = &mut self.mixer else {
            return Task::none();
        };
        let changes = mixer.set_volume(part, pct);
        self.apply_gain_changes(&changes);
        Task::none()
    }
}
