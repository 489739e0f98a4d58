/// Generative image service boundary
///
/// The workflow only knows the four operations below. Requests and outcomes
/// are plain values so the reducer can hand a request out and receive the
/// result back as an ordinary intent.
///
/// Architecture:
/// - `mod.rs` - the `PosterService` trait, request/response values, errors
/// - `gemini.rs` - HTTP implementation against the Gemini REST API

pub mod gemini;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use crate::media::codec::{CodecError, InlineImage};
use crate::state::data::AspectRatio;

pub use gemini::GeminiClient;

/// Failures of a single image service call
///
/// Clone so outcomes can travel inside UI messages.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("No API key configured. Set GEMINI_API_KEY and restart.")]
    MissingApiKey,
    #[error("Could not reach the image service: {0}")]
    Transport(String),
    #[error("Image service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Request was blocked by the image service: {0}")]
    Blocked(String),
    #[error("Unexpected response from the image service: {0}")]
    InvalidResponse(String),
    #[error("Image payload error: {0}")]
    Codec(String),
}

impl From<CodecError> for GatewayError {
    fn from(e: CodecError) -> Self {
        GatewayError::Codec(e.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// The four operations the poster workflow depends on
///
/// Implementations must not retry; one failure is one error.
#[async_trait]
pub trait PosterService: Send + Sync {
    /// Isolate the product from its background
    async fn remove_background(&self, image: InlineImage) -> GatewayResult<InlineImage>;

    /// Propose a poster concept from the uploaded photos
    async fn suggest_concept(&self, images: Vec<InlineImage>) -> GatewayResult<String>;

    /// Generate a poster from the cutout and a concept
    async fn create_poster(
        &self,
        source: InlineImage,
        concept: &str,
        aspect_ratio: AspectRatio,
    ) -> GatewayResult<InlineImage>;

    /// Apply an edit instruction to an existing poster
    async fn refine_poster(
        &self,
        source: InlineImage,
        refinement: &str,
        aspect_ratio: AspectRatio,
    ) -> GatewayResult<InlineImage>;
}

/// A call the reducer wants executed
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayRequest {
    RemoveBackground {
        image: InlineImage,
    },
    SuggestConcept {
        images: Vec<InlineImage>,
    },
    CreatePoster {
        source: InlineImage,
        concept: String,
        aspect_ratio: AspectRatio,
    },
    RefinePoster {
        source: InlineImage,
        refinement: String,
        aspect_ratio: AspectRatio,
    },
}

impl GatewayRequest {
    pub fn operation(&self) -> &'static str {
        match self {
            GatewayRequest::RemoveBackground { .. } => "remove_background",
            GatewayRequest::SuggestConcept { .. } => "suggest_concept",
            GatewayRequest::CreatePoster { .. } => "create_poster",
            GatewayRequest::RefinePoster { .. } => "refine_poster",
        }
    }
}

/// Successful result of a call
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayResponse {
    Image(InlineImage),
    Text(String),
}

/// Run one request against the service
pub async fn execute(
    service: Arc<dyn PosterService>,
    request: GatewayRequest,
) -> Result<GatewayResponse, GatewayError> {
    let operation = request.operation();
    let started = Instant::now();
    info!(operation, "Image service call started");

    let outcome = match request {
        GatewayRequest::RemoveBackground { image } => service
            .remove_background(image)
            .await
            .map(GatewayResponse::Image),
        GatewayRequest::SuggestConcept { images } => service
            .suggest_concept(images)
            .await
            .map(GatewayResponse::Text),
        GatewayRequest::CreatePoster {
            source,
            concept,
            aspect_ratio,
        } => service
            .create_poster(source, &concept, aspect_ratio)
            .await
            .map(GatewayResponse::Image),
        GatewayRequest::RefinePoster {
            source,
            refinement,
            aspect_ratio,
        } => service
            .refine_poster(source, &refinement, aspect_ratio)
            .await
            .map(GatewayResponse::Image),
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        Ok(_) => info!(operation, elapsed_ms, "Image service call finished"),
        Err(e) => warn!(operation, elapsed_ms, error = %e, "Image service call failed"),
    }
    outcome
}

/// Service that fails every call with the same error
///
/// Stands in when the real client cannot be constructed, so the app still
/// runs and reports the problem on use.
pub struct UnavailableService {
    error: GatewayError,
}

impl UnavailableService {
    pub fn new(error: GatewayError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl PosterService for UnavailableService {
    async fn remove_background(&self, _image: InlineImage) -> GatewayResult<InlineImage> {
        Err(self.error.clone())
    }

    async fn suggest_concept(&self, _images: Vec<InlineImage>) -> GatewayResult<String> {
        Err(self.error.clone())
    }

    async fn create_poster(&self, _source: InlineImage, _concept: &str, _aspect_ratio: AspectRatio) -> GatewayResult<InlineImage> {
        Err(self.error.clone())
    }

    async fn refine_poster(&self, _source: InlineImage, _refinement: &str, _aspect_ratio: AspectRatio) -> GatewayResult<InlineImage> {
        Err(self.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every call and answers with canned payloads
    #[derive(Default)]
    struct ScriptedService {
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedService {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl PosterService for ScriptedService {
        async fn remove_background(&self, image: InlineImage) -> GatewayResult<InlineImage> {
            self.record(format!("remove_background:{}", image.mime_type));
            Ok(InlineImage::new("image/png", "Y3V0b3V0"))
        }

        async fn suggest_concept(&self, images: Vec<InlineImage>) -> GatewayResult<String> {
            self.record(format!("suggest_concept:{}", images.len()));
            Ok("A bottle on a glacier at dawn".to_string())
        }

        async fn create_poster(&self, _source: InlineImage, concept: &str, aspect_ratio: AspectRatio) -> GatewayResult<InlineImage> {
            self.record(format!("create_poster:{concept}:{aspect_ratio}"));
            Ok(InlineImage::new("image/png", "cG9zdGVy"))
        }

        async fn refine_poster(&self, _source: InlineImage, refinement: &str, aspect_ratio: AspectRatio) -> GatewayResult<InlineImage> {
            self.record(format!("refine_poster:{refinement}:{aspect_ratio}"));
            Err(GatewayError::Blocked("SAFETY".to_string()))
        }
    }

    fn source() -> InlineImage {
        InlineImage::new("image/jpeg", "AAAA")
    }

    #[tokio::test]
    async fn test_execute_dispatches_each_operation() {
        let service = Arc::new(ScriptedService::default());
        let dyn_service: Arc<dyn PosterService> = service.clone();

        let removed = execute(dyn_service.clone(), GatewayRequest::RemoveBackground { image: source() }).await;
        assert_eq!(removed, Ok(GatewayResponse::Image(InlineImage::new("image/png", "Y3V0b3V0"))));

        let concept = execute(
            dyn_service.clone(),
            GatewayRequest::SuggestConcept { images: vec![source(), source()] },
        )
        .await;
        assert_eq!(concept, Ok(GatewayResponse::Text("A bottle on a glacier at dawn".to_string())));

        let poster = execute(
            dyn_service.clone(),
            GatewayRequest::CreatePoster {
                source: source(),
                concept: "glacier".to_string(),
                aspect_ratio: AspectRatio::Portrait9x16,
            },
        )
        .await;
        assert!(matches!(poster, Ok(GatewayResponse::Image(_))));

        let refined = execute(
            dyn_service,
            GatewayRequest::RefinePoster {
                source: source(),
                refinement: "darker".to_string(),
                aspect_ratio: AspectRatio::Square,
            },
        )
        .await;
        assert_eq!(refined, Err(GatewayError::Blocked("SAFETY".to_string())));

        let calls = service.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            [
                "remove_background:image/jpeg",
                "suggest_concept:2",
                "create_poster:glacier:9:16",
                "refine_poster:darker:1:1",
            ]
        );
    }

    #[tokio::test]
    async fn test_unavailable_service_reports_its_error() {
        let service: Arc<dyn PosterService> = Arc::new(UnavailableService::new(GatewayError::Transport("no TLS backend".to_string())));
        let outcome = execute(service, GatewayRequest::SuggestConcept { images: vec![] }).await;
        assert_eq!(outcome, Err(GatewayError::Transport("no TLS backend".to_string())));
    }

    #[test]
    fn test_error_messages_are_readable() {
        let e = GatewayError::Api { status: 429, message: "Quota exceeded".to_string() };
        assert_eq!(e.to_string(), "Image service returned HTTP 429: Quota exceeded");
        assert!(GatewayError::MissingApiKey.to_string().contains("GEMINI_API_KEY"));
    }
}
