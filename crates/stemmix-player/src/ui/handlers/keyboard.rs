//! Keyboard input message handler
//!
//! Routes digit keys to mute toggles, Q-T to solo toggles, and Space
//! to play/pause. A held Ctrl/Cmd/Shift turns a solo press additive.
//! The router is fully disabled while the export modal is open.

use iced::keyboard::{Key, Modifiers};
use iced::Task;

use stemmix_core::Part;

use super::super::app::MixerApp;
use super::super::message::Message;
use crate::keybindings;

impl MixerApp {
    /// Handle KeyPressed message
    pub fn handle_key_pressed(&mut self, key: Key, modifiers: Modifiers) -> Task<Message> {
        // No shortcuts while the export modal is open
        if self.export.is_open {
            return Task::none();
        }

        // Shortcuts only act on a ready mix
        if !self.playback.is_ready {
            return Task::none();
        }

        let key_str = keybindings::key_to_string(&key);
        if key_str.is_empty() {
            return Task::none();
        }

        let bindings = self.keybindings.mixer.clone();

        if bindings.match_play_pause(&key_str) {
            return self.update(Message::PlayPause);
        }

        if let Some(index) = bindings.match_mute_part(&key_str) {
            if let Some(part) = self.present_part_at(index) {
                return self.update(Message::MuteClicked(part));
            }
        }

        if let Some(index) = bindings.match_solo_part(&key_str) {
            // Modifier held = additive solo (keep other solos); bare
            // key = exclusive solo
            let additive = modifiers.shift() || modifiers.control() || modifiers.logo();
            if let Some(part) = self.present_part_at(index) {
                return self.update(Message::SoloClicked(part, additive));
            }
        }

        Task::none()
    }

    /// The Nth present part in vocabulary order (shortcut index 0-4)
    fn present_part_at(&self, index: usize) -> Option<Part> {
        self.mixer.as_ref()?.present_parts().nth(index)
    }
}
