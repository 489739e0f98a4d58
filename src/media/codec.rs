/// Image codec helpers
///
/// Converts local files into the payloads the image service expects:
/// raw bytes plus a MIME type, base64 inline payloads and `data:` URIs.
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::ImageReader;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// File extensions offered by the file picker
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "webp", "gif", "bmp"];

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a supported image")]
    NotAnImage(String),
    #[error("Malformed image data URI")]
    MalformedDataUri,
    #[error("Invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Could not decode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("None of the selected files is an image")]
    NoImages,
}

/// An uploaded product photo
#[derive(Clone, PartialEq)]
pub struct ProductImage {
    /// File name shown in the UI
    pub name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl ProductImage {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Build a product image from bytes; the format comes from the content only
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, CodecError> {
        let name = name.into();
        let mime = sniff_mime(&bytes).ok_or_else(|| CodecError::NotAnImage(name.clone()))?;
        Ok(Self::new(name, mime, bytes))
    }

    /// Read a product image from disk
    pub async fn load(path: PathBuf) -> Result<Self, CodecError> {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| CodecError::Read { path: path.clone(), source })?;

        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let image = Self::from_bytes(name, bytes)?;
        debug!(name = %image.name, mime = %image.mime_type, size = image.bytes.len(), "Loaded product image");
        Ok(image)
    }

    /// Base64 payload for transmission to the image service
    pub fn to_inline(&self) -> InlineImage {
        InlineImage::from_bytes(&self.mime_type, &self.bytes)
    }
}

// Bytes are summarized; product photos are megabytes
impl std::fmt::Debug for ProductImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductImage")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Load every path that holds an image, skipping the rest
///
/// Fails only if nothing usable remains.
pub async fn load_product_images(paths: Vec<PathBuf>) -> Result<Vec<ProductImage>, CodecError> {
    let mut images = Vec::with_capacity(paths.len());

    for path in paths {
        match ProductImage::load(path.clone()).await {
            Ok(image) => images.push(image),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping file"),
        }
    }

    if images.is_empty() {
        return Err(CodecError::NoImages);
    }
    Ok(images)
}

/// Image bytes as a base64 string plus MIME type
#[derive(Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Standard base64, no data URI prefix
    pub data: String,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self::new(mime_type, BASE64.encode(bytes))
    }

    /// Parse a `data:<mime>;base64,<payload>` URI
    pub fn from_data_uri(uri: &str) -> Result<Self, CodecError> {
        let rest = uri.strip_prefix("data:").ok_or(CodecError::MalformedDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(CodecError::MalformedDataUri)?;
        let mime = header.strip_suffix(";base64").ok_or(CodecError::MalformedDataUri)?;
        if mime.is_empty() || payload.is_empty() {
            return Err(CodecError::MalformedDataUri);
        }
        Ok(Self::new(mime, payload))
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decode the base64 payload back to bytes
    pub fn decode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(BASE64.decode(self.data.as_bytes())?)
    }
}

impl std::fmt::Debug for InlineImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineImage")
            .field("mime_type", &self.mime_type)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// MIME type from the file contents
///
/// Only formats the file picker offers are recognized.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    format
        .extensions_str()
        .iter()
        .any(|extension| IMAGE_EXTENSIONS.contains(extension))
        .then(|| format.to_mime_type())
}

/// Natural width and height, read from the image header only
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), CodecError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CodecError::Image(image::ImageError::IoError(e)))?;
    Ok(reader.into_dimensions()?)
}
