/// Shared data structures for the session state
///
/// These types flow between the reducer, the image service and the UI.
use crate::media::codec::{CodecError, InlineImage};

/// Prompt recorded for the first artifact of every upload
pub const BACKGROUND_REMOVED_PROMPT: &str = "Background Removed";

/// Where the user is in the poster pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    /// Nothing uploaded yet
    #[default]
    Upload,
    /// Photos uploaded, background not removed yet
    BackgroundRemoved,
    /// Cutout ready, waiting for a concept
    Concept,
    /// Poster generated; refinements loop here
    Refine,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Upload => "upload",
            Step::BackgroundRemoved => "background_removed",
            Step::Concept => "concept",
            Step::Refine => "refine",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Poster aspect ratios offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Square,
    Portrait9x16,
    Landscape16x9,
    Landscape4x3,
    Portrait3x4,
}

impl AspectRatio {
    /// Display order in the concept panel
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait9x16,
        AspectRatio::Landscape16x9,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait3x4,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait3x4 => "3:4",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One artifact produced by the image service
///
/// Immutable once created. The same image may sit in both the history and
/// the finals; identity is the id.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Unique id, e.g. "poster-1718000000000-3"
    pub id: String,
    /// Image payload as a data URI
    pub src: String,
    /// How the image was produced (concept, refinement or "Background Removed")
    pub prompt: String,
}

impl GeneratedImage {
    pub fn new(id: impl Into<String>, image: &InlineImage, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            src: image.to_data_uri(),
            prompt: prompt.into(),
        }
    }

    /// The payload in the form the image service accepts
    pub fn inline(&self) -> Result<InlineImage, CodecError> {
        InlineImage::from_data_uri(&self.src)
    }

    /// Raw encoded image bytes
    pub fn decode(&self) -> Result<Vec<u8>, CodecError> {
        self.inline()?.decode()
    }
}

impl std::fmt::Debug for GeneratedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedImage")
            .field("id", &self.id)
            .field("src_len", &self.src.len())
            .field("prompt", &self.prompt)
            .finish()
    }
}
