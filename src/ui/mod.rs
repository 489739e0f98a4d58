/// Presentation layer
///
/// Pure view functions over the session. Nothing here mutates state; every
/// interaction is emitted as a `Message`.
///
/// - `control_panel.rs` - the three step-gated input sections
/// - `workspace.rs` - current image, error box and version history
/// - `finals_panel.rs` - saved posters with reorder, remove and export
pub mod control_panel;
pub mod finals_panel;
pub mod workspace;

use iced::widget::image::Handle;
use iced::widget::{column, container, text, Column};
use iced::{Color, Element, Length};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

use crate::media::codec::{probe_dimensions, CodecError};
use crate::state::data::GeneratedImage;
use crate::state::Session;
use crate::Message;

pub const ACCENT: Color = Color { r: 0.13, g: 0.83, b: 0.93, a: 1.0 };
pub const MUTED: Color = Color { r: 0.55, g: 0.57, b: 0.62, a: 1.0 };
pub const DANGER: Color = Color { r: 0.98, g: 0.45, b: 0.45, a: 1.0 };

/// A decoded generated image ready for display
#[derive(Debug, Clone)]
pub struct Preview {
    pub handle: Handle,
    /// Natural width in pixels
    pub width: u32,
    /// Natural height in pixels
    pub height: u32,
}

impl Preview {
    fn decode(image: &GeneratedImage) -> Result<Self, CodecError> {
        let bytes = image.decode()?;
        let (width, height) = probe_dimensions(&bytes)?;
        Ok(Self {
            handle: Handle::from_bytes(bytes),
            width,
            height,
        })
    }
}

/// Image handles for everything the session currently shows
///
/// Decoding a data URI on every frame would be wasteful, so each image is
/// decoded once and kept until it leaves both history and finals.
#[derive(Debug, Default)]
pub struct PreviewCache {
    images: HashMap<String, Preview>,
    products: Vec<(Arc<[u8]>, Handle)>,
}

impl PreviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the cache in line with the session
    pub fn sync(&mut self, session: &Session) {
        let live: HashSet<&str> = session
            .image_history
            .iter()
            .chain(session.finals.iter())
            .map(|image| image.id.as_str())
            .collect();
        self.images.retain(|id, _| live.contains(id.as_str()));

        for image in session.image_history.iter().chain(session.finals.iter()) {
            if self.images.contains_key(&image.id) {
                continue;
            }
            match Preview::decode(image) {
                Ok(preview) => {
                    self.images.insert(image.id.clone(), preview);
                }
                Err(e) => warn!(id = %image.id, error = %e, "Could not decode generated image"),
            }
        }

        let unchanged = self.products.len() == session.product_images.len()
            && self
                .products
                .iter()
                .zip(&session.product_images)
                .all(|((bytes, _), product)| Arc::ptr_eq(bytes, &product.bytes));
        if !unchanged {
            self.products = session
                .product_images
                .iter()
                .map(|product| (product.bytes.clone(), Handle::from_bytes(product.bytes.to_vec())))
                .collect();
        }
    }

    pub fn image(&self, id: &str) -> Option<&Preview> {
        self.images.get(id)
    }

    pub fn product(&self, index: usize) -> Option<&Handle> {
        self.products.get(index).map(|(_, handle)| handle)
    }
}

/// Numbered panel section; inactive sections are dimmed
pub fn section<'a>(
    title: &'a str,
    step: u8,
    active: bool,
    content: impl Into<Element<'a, Message>>,
) -> Element<'a, Message> {
    let heading = text(format!("{}. {}", step, title))
        .size(18)
        .color(if active { ACCENT } else { MUTED });
    let content: Element<'a, Message> = content.into();

    container(column![heading, content].spacing(12))
        .padding(14)
        .width(Length::Fill)
        .style(if active {
            container::bordered_box
        } else {
            container::rounded_box
        })
        .into()
}

/// Centered hint shown in empty panels
pub fn placeholder<'a>(title: &'a str, body: &'a str) -> Element<'a, Message> {
    container(
        Column::new()
            .push(text(title).size(18))
            .push(text(body).size(14).color(MUTED))
            .spacing(6)
            .align_x(iced::Alignment::Center),
    )
    .width(Length::Fill)
    .padding(30)
    .center_x(Length::Fill)
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayResponse;
    use crate::media::codec::tests::png_bytes;
    use crate::media::codec::{InlineImage, ProductImage};
    use crate::state::Intent;

    fn session_with_cutout() -> Session {
        let mut session = Session::new();
        session.reduce(Intent::SelectFiles(vec![ProductImage::new(
            "can.png",
            "image/png",
            png_bytes(10, 10),
        )]));
        session.reduce(Intent::EditConcept("Can on a beach".to_string()));
        session.reduce(Intent::RemoveBackground).unwrap();
        let cutout = InlineImage::from_bytes("image/png", &png_bytes(40, 30));
        session.reduce(Intent::Resolved(Ok(GatewayResponse::Image(cutout))));
        session
    }

    #[test]
    fn test_sync_decodes_history_and_products() {
        let session = session_with_cutout();
        let mut cache = PreviewCache::new();
        cache.sync(&session);

        let id = &session.image_history[0].id;
        let preview = cache.image(id).unwrap();
        assert_eq!((preview.width, preview.height), (40, 30));
        assert!(cache.product(0).is_some());
        assert!(cache.product(1).is_none());
    }

    #[test]
    fn test_sync_keeps_finals_and_drops_orphans() {
        let mut session = session_with_cutout();
        let cutout = session.image_history[0].clone();
        let mut cache = PreviewCache::new();

        session.reduce(Intent::SaveToFinals(cutout.clone()));
        session.image_history.clear();
        cache.sync(&session);
        assert!(cache.image(&cutout.id).is_some());

        session.reduce(Intent::RemoveFromFinals(cutout.id.clone()));
        cache.sync(&session);
        assert!(cache.image(&cutout.id).is_none());
        assert!(cache.images.is_empty());
    }

    #[test]
    fn test_sync_skips_undecodable_images() {
        let mut session = Session::new();
        session.image_history.push(GeneratedImage {
            id: "broken".to_string(),
            src: "data:image/png;base64,AAAA".to_string(),
            prompt: String::new(),
        });
        let mut cache = PreviewCache::new();
        cache.sync(&session);
        assert!(cache.image("broken").is_none());
    }
}
