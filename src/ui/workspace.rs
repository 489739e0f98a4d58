/// Center panel: the current image and its version history
use iced::widget::{button, column, container, image, scrollable, text, Column};
use iced::{Alignment, Element, Length};
use iced_aw::Wrap;

use super::{placeholder, PreviewCache, ACCENT, DANGER, MUTED};
use crate::state::data::GeneratedImage;
use crate::state::{Intent, Session};
use crate::Message;

const MAIN_HEIGHT: f32 = 480.0;
const HISTORY_WIDTH: f32 = 128.0;

pub fn view<'a>(session: &'a Session, previews: &'a PreviewCache) -> Element<'a, Message> {
    let stage: Element<'a, Message> = if let Some(error) = &session.error {
        container(
            column![
                text("An Error Occurred").size(18).color(DANGER),
                text(error.as_str()).size(14),
            ]
            .spacing(6)
            .align_x(Alignment::Center),
        )
        .padding(20)
        .width(Length::Fill)
        .center_x(Length::Fill)
        .style(container::bordered_box)
        .into()
    } else if let Some(current) = session.current_image() {
        image_card(session, previews, current, true)
    } else {
        placeholder(
            "Your Canvas Awaits",
            "Follow the steps on the left to begin forging your poster.",
        )
    };

    let mut content = Column::new().spacing(16).push(stage);

    if session.image_history.len() > 1 {
        let older: Vec<Element<'a, Message>> = session.image_history[1..]
            .iter()
            .map(|image| image_card(session, previews, image, false))
            .collect();

        content = content
            .push(text("Version History").size(18).color(ACCENT))
            .push(Wrap::with_elements(older).spacing(12.0).line_spacing(12.0));
    }

    scrollable(container(content).padding(14).width(Length::Fill))
        .height(Length::Fill)
        .into()
}

/// One generated image with its prompt and a save button
fn image_card<'a>(
    session: &'a Session,
    previews: &'a PreviewCache,
    generated: &'a GeneratedImage,
    is_main: bool,
) -> Element<'a, Message> {
    let picture: Element<'a, Message> = match previews.image(&generated.id) {
        Some(preview) => {
            let img = image(preview.handle.clone());
            if is_main {
                img.width(Length::Fill).height(Length::Fixed(MAIN_HEIGHT)).into()
            } else {
                img.width(Length::Fixed(HISTORY_WIDTH)).into()
            }
        }
        None => text("Preview unavailable").size(12).color(MUTED).into(),
    };

    let saved = session.finals.contains(&generated.id);
    let save = button(text(if saved { "Saved" } else { "Save to Finals" }).size(if is_main { 14 } else { 12 }))
        .padding(6)
        .style(button::secondary)
        .on_press_maybe(
            (!saved && !session.is_loading).then(|| Message::Workflow(Intent::SaveToFinals(generated.clone()))),
        );

    let caption = text(generated.prompt.as_str())
        .size(12)
        .color(MUTED);

    let card = column![picture, caption, save].spacing(6);
    let card = if is_main {
        card.align_x(Alignment::Center).width(Length::Fill)
    } else {
        card.width(Length::Fixed(HISTORY_WIDTH))
    };

    container(card).padding(6).into()
}
