//! Transport controls: play/pause toggle and the seek slider

use iced::widget::{button, row, slider, text};
use iced::{Alignment, Element, Length};

use super::message::Message;
use super::state::PlaybackState;

/// Render the transport row
pub fn view(playback: &PlaybackState) -> Element<'_, Message> {
    let play_label = if playback.is_playing { "▮▮" } else { "▶" };
    let play_btn = button(text(play_label).size(20))
        .on_press_maybe(playback.is_ready.then_some(Message::PlayPause))
        .width(Length::Fixed(56.0))
        .height(Length::Fixed(44.0));

    let duration = playback.duration_seconds.max(0.001) as f32;
    let position = slider(0.0..=duration, playback.elapsed_seconds as f32, |v| {
        Message::Seeking(v as f64)
    })
    .on_release(Message::SeekCommitted)
    .step(0.1);

    let time_label = text(format!(
        "{} / {}",
        format_time(playback.elapsed_seconds),
        format_time(playback.duration_seconds)
    ))
    .size(14);

    row![play_btn, position, time_label]
        .spacing(12)
        .align_y(Alignment::Center)
        .into()
}

/// Format seconds as m:ss
fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(59.9), "0:59");
        assert_eq!(format_time(61.0), "1:01");
        assert_eq!(format_time(3601.0), "60:01");
        assert_eq!(format_time(-5.0), "0:00");
    }
}
