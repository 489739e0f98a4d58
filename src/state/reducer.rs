/// Workflow reducer
///
/// Every user action and every image service outcome is an `Intent`.
/// `Session::reduce` applies it and, for AI-backed transitions, returns the
/// request the shell should run. The outcome comes back as
/// `Intent::Resolved`.
///
/// Pipeline: upload → background_removed → concept → refine (refine loops).
use tracing::{debug, info, warn};

use super::data::{AspectRatio, GeneratedImage, Step, BACKGROUND_REMOVED_PROMPT};
use super::session::{PendingCall, Session};
use crate::gateway::{GatewayError, GatewayRequest, GatewayResponse};
use crate::media::codec::ProductImage;

#[derive(Debug, Clone)]
pub enum Intent {
    /// New upload; resets the pipeline to background_removed
    SelectFiles(Vec<ProductImage>),
    SelectPrimary(usize),
    SetAspectRatio(AspectRatio),
    EditConcept(String),
    EditRefinement(String),
    RemoveBackground,
    SuggestConcept,
    CreatePoster,
    RefinePoster,
    SaveToFinals(GeneratedImage),
    RemoveFromFinals(String),
    /// Drag-and-drop move; `to` is None when dropped outside the list
    ReorderFinals { from: usize, to: Option<usize> },
    Reset,
    /// Outcome of the call in flight
    Resolved(Result<GatewayResponse, GatewayError>),
}

impl Session {
    /// Apply one intent
    ///
    /// Intents whose preconditions do not hold are silent no-ops. While a
    /// call is in flight only `Resolved` is accepted, except that a new
    /// upload is held back and applied once the call resolves.
    ///
    /// A stored source image that no longer decodes counts as a failed
    /// precondition: logged, nothing changes.
    pub fn reduce(&mut self, intent: Intent) -> Option<GatewayRequest> {
        if self.is_loading && !matches!(intent, Intent::Resolved(_)) {
            match intent {
                Intent::SelectFiles(files) if !files.is_empty() => {
                    info!(count = files.len(), "Deferring upload until the call in flight finishes");
                    self.deferred_upload = Some(files);
                }
                intent => debug!(?intent, "Ignoring intent while a call is in flight"),
            }
            return None;
        }

        match intent {
            Intent::SelectFiles(files) => {
                if files.is_empty() {
                    return None;
                }
                info!(count = files.len(), "Product images selected");
                self.product_images = files;
                self.primary_image_index = Some(0);
                self.current_step = Step::BackgroundRemoved;
                self.image_history.clear();
                self.concept.clear();
                self.refinement.clear();
                self.error = None;
                self.concept_requested = false;
                None
            }
            Intent::SelectPrimary(index) => {
                if index >= self.product_images.len() {
                    return None;
                }
                self.primary_image_index = Some(index);
                self.error = None;
                None
            }
            Intent::SetAspectRatio(ratio) => {
                self.aspect_ratio = ratio;
                self.error = None;
                None
            }
            Intent::EditConcept(text) => {
                self.concept = text;
                self.error = None;
                None
            }
            Intent::EditRefinement(text) => {
                self.refinement = text;
                self.error = None;
                None
            }
            Intent::RemoveBackground => {
                let image = self.primary_image()?.to_inline();
                Some(self.begin(
                    PendingCall::RemoveBackground,
                    "Removing background...".to_string(),
                    GatewayRequest::RemoveBackground { image },
                ))
            }
            Intent::SuggestConcept => {
                if self.product_images.is_empty() {
                    return None;
                }
                self.concept_requested = true;
                let images = self.product_images.iter().map(ProductImage::to_inline).collect();
                Some(self.begin(
                    PendingCall::SuggestConcept { origin: self.current_step },
                    "Analyzing product for ideas...".to_string(),
                    GatewayRequest::SuggestConcept { images },
                ))
            }
            Intent::CreatePoster => {
                if self.concept.is_empty() {
                    return None;
                }
                let cutout = self.background_removed_image()?;
                let source = match cutout.inline() {
                    Ok(source) => source,
                    Err(e) => {
                        warn!(id = %cutout.id, error = %e, "Stored cutout is unreadable; not generating");
                        return None;
                    }
                };
                let concept = self.concept.clone();
                Some(self.begin(
                    PendingCall::CreatePoster { concept: concept.clone() },
                    "Generating initial poster...".to_string(),
                    GatewayRequest::CreatePoster {
                        source,
                        concept,
                        aspect_ratio: self.aspect_ratio,
                    },
                ))
            }
            Intent::RefinePoster => {
                if self.refinement.is_empty() {
                    return None;
                }
                let current = self.current_image()?;
                let source = match current.inline() {
                    Ok(source) => source,
                    Err(e) => {
                        warn!(id = %current.id, error = %e, "Stored image is unreadable; not refining");
                        return None;
                    }
                };
                let refinement = self.refinement.clone();
                Some(self.begin(
                    PendingCall::RefinePoster { refinement: refinement.clone() },
                    format!("Applying refinement: \"{}\"", refinement),
                    GatewayRequest::RefinePoster {
                        source,
                        refinement,
                        aspect_ratio: self.aspect_ratio,
                    },
                ))
            }
            Intent::SaveToFinals(image) => {
                if self.finals.promote(image) {
                    debug!(count = self.finals.len(), "Saved poster to finals");
                }
                self.error = None;
                None
            }
            Intent::RemoveFromFinals(id) => {
                self.finals.remove(&id);
                self.error = None;
                None
            }
            Intent::ReorderFinals { from, to } => {
                if self.finals.reorder(from, to) {
                    debug!(order = ?self.finals.ids(), "Finals reordered");
                }
                self.error = None;
                None
            }
            Intent::Reset => {
                info!("Session reset");
                *self = Session::default();
                None
            }
            Intent::Resolved(outcome) => {
                self.complete(outcome);
                match self.deferred_upload.take() {
                    Some(files) if !self.is_loading => self.reduce(Intent::SelectFiles(files)),
                    _ => None,
                }
            }
        }
    }

    /// Enter the loading state for a call
    fn begin(&mut self, call: PendingCall, message: String, request: GatewayRequest) -> GatewayRequest {
        debug!(operation = request.operation(), step = %self.current_step, "Starting image service call");
        self.is_loading = true;
        self.loading_message = message;
        self.error = None;
        self.in_flight = Some(call);
        request
    }

    /// Apply the outcome of the call in flight
    fn complete(&mut self, outcome: Result<GatewayResponse, GatewayError>) {
        let Some(call) = self.in_flight.take() else {
            warn!("Ignoring image service outcome with no call in flight");
            return;
        };

        self.is_loading = false;
        self.loading_message.clear();

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, step = %self.current_step, "Image service call failed");
                self.error = Some(e.to_string());
                return;
            }
        };

        match (call, response) {
            (PendingCall::RemoveBackground, GatewayResponse::Image(image)) => {
                let cutout = self.mint_image("bg-removed", &image, BACKGROUND_REMOVED_PROMPT);
                self.image_history = vec![cutout];
                self.advance(Step::Concept);
            }
            (PendingCall::SuggestConcept { origin }, GatewayResponse::Text(text)) => {
                self.concept = text;
                self.advance(origin);
            }
            (PendingCall::CreatePoster { concept }, GatewayResponse::Image(image)) => {
                let poster = self.mint_image("poster", &image, concept);
                self.image_history.insert(0, poster);
                self.advance(Step::Refine);
            }
            (PendingCall::RefinePoster { refinement }, GatewayResponse::Image(image)) => {
                let refined = self.mint_image("refine", &image, refinement);
                self.image_history.insert(0, refined);
                self.refinement.clear();
                self.advance(Step::Refine);
            }
            (call, response) => {
                warn!(?call, ?response, "Response kind does not match the call in flight");
                self.error = Some("The image service returned an unexpected kind of result.".to_string());
            }
        }
    }

    fn advance(&mut self, step: Step) {
        if step != self.current_step {
            info!(from = %self.current_step, to = %step, "Workflow step changed");
        }
        self.current_step = step;
        self.error = None;
    }
}
