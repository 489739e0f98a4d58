/// Image payload handling
///
/// This module handles:
/// - Reading product photos and sniffing their MIME type (codec.rs)
/// - Base64 inline payloads and data URIs for the image service (codec.rs)
/// - Resampling final posters to export tiers and writing PNGs (export.rs)

pub mod codec;
pub mod export;
