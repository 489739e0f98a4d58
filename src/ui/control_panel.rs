/// Step-gated controls: upload, concept, refine
use iced::widget::{button, column, image, row, text, text_input, Column};
use iced::{Element, Length};
use iced_aw::Wrap;

use super::{section, PreviewCache, MUTED};
use crate::state::data::{AspectRatio, Step};
use crate::state::{Intent, Session};
use crate::Message;

const THUMB_SIZE: f32 = 64.0;

pub fn view<'a>(session: &'a Session, previews: &'a PreviewCache) -> Element<'a, Message> {
    column![
        upload_section(session, previews),
        concept_section(session),
        refine_section(session),
    ]
    .spacing(16)
    .width(Length::Fill)
    .into()
}

fn upload_section<'a>(session: &'a Session, previews: &'a PreviewCache) -> Element<'a, Message> {
    let active = matches!(session.current_step, Step::Upload | Step::BackgroundRemoved);
    let enabled = active && !session.is_loading;

    let mut content = Column::new().spacing(10).push(
        button(text("Choose Product Images"))
            .padding(10)
            .width(Length::Fill)
            .on_press_maybe((!session.is_loading).then_some(Message::PickFiles)),
    );
    content = content.push(text("PNG, JPG, WEBP (multi-select enabled)").size(12).color(MUTED));

    if !session.product_images.is_empty() {
        let thumbs: Vec<Element<'a, Message>> = session
            .product_images
            .iter()
            .enumerate()
            .map(|(index, product)| {
                let selected = session.primary_image_index == Some(index);
                let face: Element<'a, Message> = match previews.product(index) {
                    Some(handle) => image(handle.clone())
                        .width(Length::Fixed(THUMB_SIZE))
                        .height(Length::Fixed(THUMB_SIZE))
                        .into(),
                    None => text(product.name.as_str()).size(12).into(),
                };
                button(face)
                    .padding(3)
                    .style(if selected { button::primary } else { button::secondary })
                    .on_press_maybe(enabled.then_some(Message::Workflow(Intent::SelectPrimary(index))))
                    .into()
            })
            .collect();

        content = content
            .push(text("Select primary image:").size(14))
            .push(Wrap::with_elements(thumbs).spacing(8.0).line_spacing(8.0))
            .push(
                button(text("Remove Background"))
                    .padding(10)
                    .width(Length::Fill)
                    .on_press_maybe(
                        (active && session.can_remove_background())
                            .then_some(Message::Workflow(Intent::RemoveBackground)),
                    ),
            );
    }

    section("Upload Product Image(s)", 1, active, content)
}

fn concept_section(session: &Session) -> Element<'_, Message> {
    let active = session.current_step == Step::Concept;
    let enabled = active && !session.is_loading;

    let ratios: Vec<Element<'_, Message>> = AspectRatio::ALL
        .into_iter()
        .map(|ratio| {
            button(text(ratio.as_str()).size(12))
                .padding([4, 8])
                .style(if session.aspect_ratio == ratio {
                    button::primary
                } else {
                    button::secondary
                })
                .on_press_maybe(enabled.then_some(Message::Workflow(Intent::SetAspectRatio(ratio))))
                .into()
        })
        .collect();

    let concept = text_input(
        "e.g., A futuristic city skyline at night with neon lights...",
        &session.concept,
    )
    .padding(8)
    .on_input_maybe(enabled.then_some(|value: String| Message::Workflow(Intent::EditConcept(value))));

    let actions = row![
        button(text("Suggest Again"))
            .padding(10)
            .style(button::secondary)
            .on_press_maybe(
                (active && session.can_suggest_concept()).then_some(Message::Workflow(Intent::SuggestConcept)),
            ),
        button(text("Generate Poster"))
            .padding(10)
            .width(Length::Fill)
            .on_press_maybe(
                (active && session.can_create_poster()).then_some(Message::Workflow(Intent::CreatePoster)),
            ),
    ]
    .spacing(8);

    let content = column![
        text("Aspect Ratio").size(14),
        Wrap::with_elements(ratios).spacing(6.0).line_spacing(6.0),
        text("Poster Idea (AI Suggested)").size(14),
        concept,
        actions,
    ]
    .spacing(10);

    section("Define Poster Concept", 2, active, content)
}

fn refine_section(session: &Session) -> Element<'_, Message> {
    let active = session.current_step == Step::Refine;
    let enabled = active && !session.is_loading;

    let refinement = text_input(
        "e.g., Make the background darker, add a glowing aura...",
        &session.refinement,
    )
    .padding(8)
    .on_input_maybe(enabled.then_some(|value: String| Message::Workflow(Intent::EditRefinement(value))));

    let content = column![
        text("Refinement Prompt").size(14),
        refinement,
        button(text("Apply Refinement"))
            .padding(10)
            .width(Length::Fill)
            .on_press_maybe(
                (active && session.can_refine_poster()).then_some(Message::Workflow(Intent::RefinePoster)),
            ),
    ]
    .spacing(10);

    section("Iterate & Refine", 3, active, content)
}
