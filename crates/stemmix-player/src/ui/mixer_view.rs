//! Per-part control rows: mute, solo, and volume for every present part

use iced::widget::{button, column, row, slider, text};
use iced::{Alignment, Element, Length};

use stemmix_core::engine::ChannelMixer;
use stemmix_core::Part;

use super::message::Message;

/// Render one control row per present part, in vocabulary order
pub fn view(mixer: &ChannelMixer, ready: bool) -> Element<'_, Message> {
    let mut rows = column![].spacing(8);

    for part in mixer.present_parts() {
        rows = rows.push(part_row(mixer, part, ready));
    }

    rows.into()
}

fn part_row(mixer: &ChannelMixer, part: Part, ready: bool) -> Element<'_, Message> {
    let audible = mixer.is_audible(part);

    // Dim the label of parts that don't currently sound
    let label = text(part.label())
        .size(14)
        .width(Length::Fixed(130.0))
        .style(move |theme: &iced::Theme| {
            let palette = theme.palette();
            iced::widget::text::Style {
                color: Some(if audible {
                    palette.text
                } else {
                    palette.text.scale_alpha(0.4)
                }),
            }
        });

    let mute_btn = button(text("M").size(14))
        .on_press_maybe(ready.then_some(Message::MuteClicked(part)))
        .style(if mixer.is_muted(part) {
            button::danger
        } else {
            button::secondary
        })
        .width(Length::Fixed(32.0));

    // Buttons always solo exclusively; additive solo lives on the
    // keyboard (modifier + solo key)
    let solo_btn = button(text("S").size(14))
        .on_press_maybe(ready.then_some(Message::SoloClicked(part, false)))
        .style(if mixer.is_soloed(part) {
            button::success
        } else {
            button::secondary
        })
        .width(Length::Fixed(32.0));

    let volume = slider(1.0..=100.0, mixer.volume_pct(part), move |pct| {
        Message::VolumeChanged(part, pct)
    })
    .step(1.0);

    row![label, mute_btn, solo_btn, volume]
        .spacing(10)
        .align_y(Alignment::Center)
        .into()
}
