//! Mixer application state and top-level update/view/subscription
//!
//! The app owns every piece of state from the core crate: the
//! transport clock and channel mixer (plain state machines), the
//! engine command queue + atomics, the loader and render service
//! handles. Messages raise intents; handlers apply them and push the
//! resulting engine commands.

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use iced::widget::{
    button, center, column, container, mouse_area, opaque, row, stack, text, Space,
};
use iced::{keyboard, time, Alignment, Color, Element, Length, Subscription, Task};

use stemmix_core::audio::OutputHandle;
use stemmix_core::descriptor::{MixDescriptor, MixStatus};
use stemmix_core::engine::{ChannelMixer, CommandSender, PlaybackAtomics, TransportClock};
use stemmix_core::loader::StemLoader;
use stemmix_core::render::{InitResult, RenderProgress, RenderService};

use crate::config::PlayerConfig;
use crate::keybindings::KeybindingsConfig;

use super::message::Message;
use super::state::{ExportState, PlaybackState};
use super::{export_modal, mixer_view, transport};

/// The mixer application
pub struct MixerApp {
    pub config: PlayerConfig,
    pub keybindings: KeybindingsConfig,

    /// The mix being played; None if it could not be obtained
    pub descriptor: Option<MixDescriptor>,
    /// Why the descriptor is unusable (fetch error)
    pub descriptor_error: Option<String>,

    /// Stem loader; dropped once the set is attached to the engine
    pub loader: Option<StemLoader>,

    /// Offline render service and its pending probe / progress channels
    pub render: RenderService,
    pub render_init_rx: Option<Receiver<InitResult>>,
    pub render_progress_rx: Option<Receiver<RenderProgress>>,

    /// Engine control: lock-free command queue in, atomics out
    pub commands: Option<CommandSender>,
    pub atomics: Arc<PlaybackAtomics>,
    /// Audio output thread handle; None in UI-only mode
    pub output: Option<OutputHandle>,

    pub transport: TransportClock,
    /// Per-part mute/solo/volume; created when the stems become ready
    pub mixer: Option<ChannelMixer>,
    pub playback: PlaybackState,
    pub export: ExportState,

    /// Position shown while the seek slider is dragged (tick is
    /// suspended so it cannot overwrite the drag)
    pub seek_preview: Option<f64>,
}

impl MixerApp {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: PlayerConfig,
        keybindings: KeybindingsConfig,
        descriptor: Result<MixDescriptor, String>,
        commands: Option<CommandSender>,
        atomics: Arc<PlaybackAtomics>,
        output: Option<OutputHandle>,
        sample_rate: u32,
    ) -> Self {
        let (descriptor, descriptor_error) = match descriptor {
            Ok(d) => (Some(d), None),
            Err(e) => (None, Some(e)),
        };

        // Kick off stem loading as soon as the mix is known to be done
        let loader = match &descriptor {
            Some(d) if d.is_done() => {
                let loader = StemLoader::spawn(sample_rate);
                if let Err(e) = loader.load(d.stem_sources()) {
                    log::error!("Failed to queue stem load: {}", e);
                }
                Some(loader)
            }
            _ => None,
        };

        // The transcoder probe runs once, at startup; its outcome
        // gates export for the whole session
        let render = RenderService::new();
        let render_init_rx = Some(render.initialize());

        Self {
            config,
            keybindings,
            descriptor,
            descriptor_error,
            loader,
            render,
            render_init_rx,
            render_progress_rx: None,
            commands,
            atomics,
            output,
            transport: TransportClock::new(),
            mixer: None,
            playback: PlaybackState::default(),
            export: ExportState::default(),
            seek_preview: None,
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PlayPause => self.handle_play_pause(),
            Message::Seeking(seconds) => self.handle_seeking(seconds),
            Message::SeekCommitted => self.handle_seek_committed(),
            Message::Tick => self.handle_tick(),

            Message::MuteClicked(part) => self.handle_mute_clicked(part),
            Message::SoloClicked(part, additive) => self.handle_solo_clicked(part, additive),
            Message::VolumeChanged(part, pct) => self.handle_volume_changed(part, pct),

            Message::KeyPressed(key, modifiers) => self.handle_key_pressed(key, modifiers),

            Message::LoadingTick => self.handle_loading_tick(),

            Message::OpenExport => self.handle_open_export(),
            Message::CloseExport => {
                // The modal cannot be dismissed mid-render
                if !self.export.is_exporting {
                    self.export.is_open = false;
                }
                Task::none()
            }
            Message::MixNameChanged(name) => {
                self.export.mix_name = name;
                Task::none()
            }
            Message::StartExport => self.handle_start_export(),
            Message::ExportTick => self.handle_export_tick(),
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subs = Vec::new();

        // The position tick exists only while the transport clock says
        // so; this is the single tick source
        if self.transport.tick_active() {
            subs.push(
                time::every(Duration::from_millis(self.config.tick_interval_ms))
                    .map(|_| Message::Tick),
            );
        }

        // Poll background channels while stems decode or the
        // transcoder probe is pending
        if self.loader.is_some() || self.render_init_rx.is_some() {
            subs.push(time::every(Duration::from_millis(200)).map(|_| Message::LoadingTick));
        }

        // Poll render progress while an export runs
        if self.export.is_exporting {
            subs.push(time::every(Duration::from_millis(100)).map(|_| Message::ExportTick));
        }

        subs.push(iced::event::listen_with(|event, status, _window| {
            match (event, status) {
                (
                    iced::Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }),
                    iced::event::Status::Ignored,
                ) => Some(Message::KeyPressed(key, modifiers)),
                _ => None,
            }
        }));

        Subscription::batch(subs)
    }

    pub fn view(&self) -> Element<'_, Message> {
        let base = self.view_base();

        if self.export.is_open {
            let modal = export_modal::view(
                &self.export,
                self.render.is_ready(),
                self.render.init_error(),
            );
            with_modal_overlay(base, modal, !self.export.is_exporting)
        } else {
            base
        }
    }

    fn view_base(&self) -> Element<'_, Message> {
        let header = self.view_header();

        let mut body = column![header].spacing(16);

        if let Some(alert) = self.view_status_alert() {
            body = body.push(alert);
        }

        if self.is_mix_playable() {
            body = body.push(transport::view(&self.playback));

            if let Some(mixer) = &self.mixer {
                body = body.push(mixer_view::view(mixer, self.playback.is_ready));
            } else {
                body = body.push(text("Loading stems...").size(14));
            }

            body = body.push(self.view_export_row());
            body = body.push(
                text("Mute: 1-4 · Solo: Q/W/E/R (hold Ctrl/Cmd/Shift for multi-solo) · Space: play/pause")
                    .size(12),
            );
        }

        container(body)
            .padding(20)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn view_header(&self) -> Element<'_, Message> {
        let title = match &self.descriptor {
            Some(d) => format!("{} - {}", d.title, d.artist),
            None => "Mixer".to_string(),
        };

        row![
            text("stemmix").size(24),
            Space::new().width(Length::Fill),
            text(title).size(18),
        ]
        .align_y(Alignment::Center)
        .into()
    }

    /// Status banner for mixes that are not playable (yet)
    fn view_status_alert(&self) -> Option<Element<'_, Message>> {
        if let Some(error) = &self.descriptor_error {
            return Some(text(format!("Failed to load mix: {}", error)).size(14).into());
        }

        let descriptor = self.descriptor.as_ref()?;
        let message = match descriptor.status {
            MixStatus::Queued => "In queue...".to_string(),
            MixStatus::InProgress => "Processing mix...".to_string(),
            MixStatus::Error => format!(
                "Mix failed: {}",
                descriptor.error.as_deref().unwrap_or("unknown error")
            ),
            MixStatus::Done => return None,
        };
        Some(text(message).size(14).into())
    }

    fn view_export_row(&self) -> Element<'_, Message> {
        let export_btn = button(text("Export").size(14))
            .on_press_maybe(self.playback.is_ready.then_some(Message::OpenExport));

        let mut export_row = row![export_btn].spacing(12).align_y(Alignment::Center);

        // Initialization failure keeps export disabled for the whole
        // session; show why next to the control
        if let Some(error) = self.render.init_error() {
            export_row = export_row.push(text(format!("Export unavailable: {}", error)).size(12));
        }

        export_row.into()
    }

    fn is_mix_playable(&self) -> bool {
        self.descriptor.as_ref().is_some_and(|d| d.is_done())
    }
}

/// Stack a modal dialog over the base view with a dark backdrop.
/// The backdrop dismisses the modal unless `closable` is false.
fn with_modal_overlay<'a>(
    base: Element<'a, Message>,
    modal: Element<'a, Message>,
    closable: bool,
) -> Element<'a, Message> {
    let backdrop = container(Space::new())
        .width(Length::Fill)
        .height(Length::Fill)
        .style(|_theme| container::Style {
            background: Some(Color::from_rgba(0.0, 0.0, 0.0, 0.6).into()),
            ..Default::default()
        });

    let backdrop: Element<'a, Message> = if closable {
        mouse_area(backdrop).on_press(Message::CloseExport).into()
    } else {
        backdrop.into()
    };

    stack![
        base,
        backdrop,
        center(opaque(modal)).width(Length::Fill).height(Length::Fill)
    ]
    .into()
}
