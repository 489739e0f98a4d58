/// The workflow session: single source of truth for one app run
///
/// Fields are public for rendering; every mutation goes through
/// `Session::reduce` (see reducer.rs).
use chrono::Utc;

use super::data::{AspectRatio, GeneratedImage, Step};
use super::finals::Finals;
use super::reducer::Intent;
use crate::media::codec::{InlineImage, ProductImage};

/// The AI call currently in flight, with the inputs its result depends on
#[derive(Debug, Clone, PartialEq)]
pub enum PendingCall {
    RemoveBackground,
    /// Remembers the step to stay on once the suggestion arrives
    SuggestConcept { origin: Step },
    CreatePoster { concept: String },
    RefinePoster { refinement: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    /// Uploaded product photos
    pub product_images: Vec<ProductImage>,
    /// Index into `product_images`; None iff there are no uploads
    pub primary_image_index: Option<usize>,
    pub aspect_ratio: AspectRatio,
    /// Creative brief, AI-suggested and user-editable
    pub concept: String,
    /// Pending edit instruction; cleared after it is applied
    pub refinement: String,
    /// Generated images, most recent first
    pub image_history: Vec<GeneratedImage>,
    pub finals: Finals,
    pub is_loading: bool,
    pub loading_message: String,
    pub error: Option<String>,
    pub current_step: Step,

    pub(super) in_flight: Option<PendingCall>,
    /// Set once the automatic suggestion for the current upload was issued
    pub(super) concept_requested: bool,
    /// Upload that arrived while a call was in flight; applied when it resolves
    pub(super) deferred_upload: Option<Vec<ProductImage>>,
    next_sequence: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// The photo selected for background removal
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.primary_image_index
            .and_then(|index| self.product_images.get(index))
    }

    /// Top of the history
    pub fn current_image(&self) -> Option<&GeneratedImage> {
        self.image_history.first()
    }

    /// The cutout every poster is generated from
    ///
    /// History is only ever replaced by background removal and grows by
    /// prepending, so the cutout is always the oldest entry.
    pub fn background_removed_image(&self) -> Option<&GeneratedImage> {
        self.image_history.last()
    }

    /// Look up an image by id in history or finals
    pub fn find_image(&self, id: &str) -> Option<&GeneratedImage> {
        self.image_history
            .iter()
            .find(|image| image.id == id)
            .or_else(|| self.finals.get(id))
    }

    pub fn has_deferred_upload(&self) -> bool {
        self.deferred_upload.is_some()
    }

    /// Intent the session wants dispatched on its own, if any
    ///
    /// A fresh upload asks for one concept suggestion. The latch keeps a
    /// failed or empty suggestion from re-triggering; the user can still ask
    /// again explicitly.
    pub fn automatic_intent(&self) -> Option<Intent> {
        let wants_suggestion = !self.product_images.is_empty()
            && self.current_step == Step::BackgroundRemoved
            && self.concept.is_empty()
            && !self.is_loading
            && !self.concept_requested;

        wants_suggestion.then_some(Intent::SuggestConcept)
    }

    pub fn can_remove_background(&self) -> bool {
        !self.is_loading && self.primary_image().is_some()
    }

    pub fn can_suggest_concept(&self) -> bool {
        !self.is_loading && !self.product_images.is_empty()
    }

    pub fn can_create_poster(&self) -> bool {
        !self.is_loading && !self.image_history.is_empty() && !self.concept.is_empty()
    }

    pub fn can_refine_poster(&self) -> bool {
        !self.is_loading && !self.image_history.is_empty() && !self.refinement.is_empty()
    }

    /// Wrap a service payload as a new history entry with a unique id
    pub(super) fn mint_image(&mut self, kind: &str, image: &InlineImage, prompt: impl Into<String>) -> GeneratedImage {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let id = format!("{}-{}-{}", kind, Utc::now().timestamp_millis(), sequence);
        GeneratedImage::new(id, image, prompt)
    }
}
