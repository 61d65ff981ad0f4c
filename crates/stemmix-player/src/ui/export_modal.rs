//! Export modal: mix name input, progress bar, and the export control

use iced::widget::{button, column, container, progress_bar, row, text, text_input, Space};
use iced::{Alignment, Element, Length};

use super::message::Message;
use super::state::ExportState;

/// Render the export modal content
pub fn view<'a>(
    state: &'a ExportState,
    engine_ready: bool,
    init_error: Option<&'a str>,
) -> Element<'a, Message> {
    let title = text("Export mix").size(22);
    let close_btn = button(text("×").size(18))
        .on_press_maybe((!state.is_exporting).then_some(Message::CloseExport))
        .style(button::secondary);

    let header = row![title, Space::new().width(Length::Fill), close_btn]
        .align_y(Alignment::Center)
        .width(Length::Fill);

    let info = text("Exports a custom mix using the current volume levels set for each part.")
        .size(13);

    let name_input = text_input(&state.default_name, &state.mix_name)
        .on_input(Message::MixNameChanged)
        .padding(8);

    let progress = container(progress_bar(0.0..=1.0, state.progress_ratio)).width(Length::Fill);

    let export_label = if state.is_exporting {
        "Exporting..."
    } else {
        "Export mix"
    };
    let export_btn = button(text(export_label).size(14))
        .on_press_maybe(state.can_export(engine_ready).then_some(Message::StartExport));

    let mut body = column![header, info, name_input, progress]
        .spacing(14)
        .width(Length::Fixed(460.0));

    if let Some(error) = &state.error {
        body = body.push(text(format!("Error: {}", error)).size(13));
    }
    if let Some(path) = &state.last_output {
        body = body.push(text(format!("Saved to {}", path.display())).size(13));
    }
    if !engine_ready {
        let reason = init_error.unwrap_or("transcoder is still initializing");
        body = body.push(text(format!("Export unavailable: {}", reason)).size(12));
    }

    body = body.push(
        row![Space::new().width(Length::Fill), export_btn].align_y(Alignment::Center),
    );

    container(body)
        .padding(24)
        .style(container::rounded_box)
        .into()
}
