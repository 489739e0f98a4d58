/// Right panel: saved posters, reorder, remove, export
use iced::widget::{button, column, container, image, row, scrollable, text, Column};
use iced::{Element, Length};
use iced_aw::Wrap;

use super::{placeholder, Preview, PreviewCache, ACCENT, MUTED};
use crate::media::export::{target_dimensions, ExportQuality};
use crate::state::data::GeneratedImage;
use crate::state::{Intent, Session};
use crate::Message;

const CARD_WIDTH: f32 = 160.0;

pub fn view<'a>(session: &'a Session, previews: &'a PreviewCache) -> Element<'a, Message> {
    let heading = text("Final Selections").size(18).color(ACCENT);

    let body: Element<'a, Message> = if session.finals.is_empty() {
        placeholder(
            "Your gallery awaits.",
            "Click \"Save to Finals\" on a generated poster to add it here for export.",
        )
    } else {
        let count = session.finals.len();
        let cards: Vec<Element<'a, Message>> = session
            .finals
            .iter()
            .enumerate()
            .map(|(index, poster)| final_card(session, previews.image(&poster.id), poster, index, count))
            .collect();
        Wrap::with_elements(cards).spacing(10.0).line_spacing(10.0).into()
    };

    scrollable(
        container(column![heading, body].spacing(12))
            .padding(14)
            .width(Length::Fill),
    )
    .height(Length::Fill)
    .into()
}

fn final_card<'a>(
    session: &'a Session,
    preview: Option<&'a Preview>,
    poster: &'a GeneratedImage,
    index: usize,
    count: usize,
) -> Element<'a, Message> {
    let editable = !session.is_loading;

    let picture: Element<'a, Message> = match preview {
        Some(preview) => image(preview.handle.clone())
            .width(Length::Fixed(CARD_WIDTH))
            .into(),
        None => text("Preview unavailable").size(12).color(MUTED).into(),
    };

    let controls = row![
        button(text("<").size(12))
            .padding([2, 8])
            .style(button::secondary)
            .on_press_maybe((editable && index > 0).then_some(Message::Workflow(Intent::ReorderFinals {
                from: index,
                to: index.checked_sub(1),
            }))),
        button(text(">").size(12))
            .padding([2, 8])
            .style(button::secondary)
            .on_press_maybe((editable && index + 1 < count).then_some(Message::Workflow(Intent::ReorderFinals {
                from: index,
                to: Some(index + 1),
            }))),
        button(text("Remove").size(12))
            .padding([2, 8])
            .style(button::danger)
            .on_press_maybe(editable.then(|| Message::Workflow(Intent::RemoveFromFinals(poster.id.clone())))),
    ]
    .spacing(4);

    let exports = ExportQuality::ALL.into_iter().fold(Column::new().spacing(4), |col, quality| {
        col.push(
            button(text(export_label(preview, quality)).size(11))
                .padding(4)
                .width(Length::Fill)
                .on_press(Message::Export {
                    id: poster.id.clone(),
                    quality,
                }),
        )
    });

    container(column![picture, controls, exports].spacing(6).width(Length::Fixed(CARD_WIDTH)))
        .padding(6)
        .style(container::rounded_box)
        .into()
}

/// "High Resolution: 3072 x 2048 px - Good for print"
fn export_label(preview: Option<&Preview>, quality: ExportQuality) -> String {
    let dims = preview.and_then(|p| target_dimensions(p.width, p.height, quality));
    match dims {
        Some(dims) => format!(
            "{}: {} x {} px - {}",
            quality.label(),
            dims.width,
            dims.height,
            quality.hint()
        ),
        None => format!("{} - {}", quality.label(), quality.hint()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iced::widget::image::Handle;

    #[test]
    fn test_export_label_uses_natural_size() {
        let preview = Preview {
            handle: Handle::from_bytes(Vec::<u8>::new()),
            width: 3000,
            height: 2000,
        };
        assert_eq!(
            export_label(Some(&preview), ExportQuality::High),
            "High Resolution: 3072 x 2048 px - Good for print"
        );
        assert_eq!(export_label(None, ExportQuality::Normal), "Normal - Good for web");
    }
}
