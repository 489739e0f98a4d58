/// Runtime configuration
///
/// Everything is read from environment variables at startup. There is no
/// config file and nothing is written back.
use std::path::PathBuf;
use tracing::{info, warn};

/// Default REST endpoint for the image service models
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Model used for background removal, poster creation and refinement
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Model used for concept suggestions
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Generation calls are slow; the timeout only guards against a hung service
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Clone, PartialEq)]
pub struct AppConfig {
    /// API key for the image service (None = every call fails with MissingApiKey)
    pub api_key: Option<String>,
    pub api_base: String,
    pub image_model: String,
    pub text_model: String,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    /// Where exported posters are written
    pub export_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            export_dir: default_export_dir(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from the process environment
    pub fn from_env() -> Self {
        let config = Self::from_lookup(|key| std::env::var(key).ok());
        info!(
            api_base = %config.api_base,
            image_model = %config.image_model,
            text_model = %config.text_model,
            timeout_seconds = config.timeout_seconds,
            export_dir = %config.export_dir.display(),
            has_api_key = config.api_key.is_some(),
            "Configuration loaded"
        );
        config
    }

    /// Build the configuration from an arbitrary key lookup
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        config.api_key = get("GEMINI_API_KEY").or_else(|| get("API_KEY"));

        if let Some(base) = get("POSTER_FORGE_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("POSTER_FORGE_IMAGE_MODEL") {
            config.image_model = model;
        }
        if let Some(model) = get("POSTER_FORGE_TEXT_MODEL") {
            config.text_model = model;
        }
        if let Some(raw) = get("POSTER_FORGE_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout_seconds = secs,
                _ => warn!(value = %raw, "Ignoring invalid POSTER_FORGE_TIMEOUT_SECS"),
            }
        }
        if let Some(dir) = get("POSTER_FORGE_EXPORT_DIR") {
            config.export_dir = PathBuf::from(dir);
        }

        config
    }
}

// Manual Debug so the API key never lands in logs
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("api_base", &self.api_base)
            .field("image_model", &self.image_model)
            .field("text_model", &self.text_model)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("export_dir", &self.export_dir)
            .finish()
    }
}

/// Downloads folder, falling back to ~/Downloads, then ./exports
fn default_export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("exports"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.api_key, None);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("POSTER_FORGE_API_BASE", "http://localhost:8080/models/"),
            ("POSTER_FORGE_IMAGE_MODEL", "image-model"),
            ("POSTER_FORGE_TEXT_MODEL", "text-model"),
            ("POSTER_FORGE_TIMEOUT_SECS", "30"),
            ("POSTER_FORGE_EXPORT_DIR", "/tmp/posters"),
        ]));

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.api_base, "http://localhost:8080/models");
        assert_eq!(config.image_model, "image-model");
        assert_eq!(config.text_model, "text-model");
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.export_dir, PathBuf::from("/tmp/posters"));
    }

    #[test]
    fn test_api_key_fallback_and_blank_values() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "   "),
            ("API_KEY", "fallback"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("fallback"));
    }

    #[test]
    fn test_invalid_timeout_keeps_default() {
        for raw in ["soon", "0", "-5"] {
            let config = AppConfig::from_lookup(lookup_from(&[("POSTER_FORGE_TIMEOUT_SECS", raw)]));
            assert_eq!(config.timeout_seconds, DEFAULT_TIMEOUT_SECS, "value {raw}");
        }
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "top-secret")]));
        let printed = format!("{:?}", config);
        assert!(!printed.contains("top-secret"));
        assert!(printed.contains("***"));
    }
}
