//! Configuration for backends and archival.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Main configuration for the invex pipeline, stored as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvexConfig {
    /// Structured document-analysis backend settings.
    pub structured: StructuredConfig,

    /// Vision language-model backend settings.
    pub vision: VisionConfig,

    /// Archival settings.
    pub archive: ArchiveConfig,
}

/// Structured document-analysis backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredConfig {
    /// Service base URL. Extraction fails with an availability error when
    /// unset.
    pub endpoint: Option<String>,

    /// API key; falls back to `INVEX_STRUCTURED_API_KEY`.
    pub api_key: Option<String>,

    /// Analysis model identifier.
    pub model_id: String,

    /// Delay between status polls.
    pub poll_interval_ms: u64,

    /// Upper bound on the poll-until-done wait.
    pub poll_timeout_secs: u64,
}

impl Default for StructuredConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model_id: "prebuilt-invoice".to_string(),
            poll_interval_ms: 1_000,
            poll_timeout_secs: 120,
        }
    }
}

/// Vision language-model backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Completions API base URL.
    pub endpoint: String,

    /// API key; falls back to `INVEX_VISION_API_KEY`.
    pub api_key: Option<String>,

    /// Model name to request.
    pub model: String,

    /// Overall HTTP request timeout.
    pub request_timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Archival settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory that receives archived originals.
    pub root: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("archive"),
        }
    }
}

impl InvexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Fill unset API keys from the environment.
    pub fn apply_env(&mut self) {
        if self.structured.api_key.is_none() {
            self.structured.api_key = std::env::var("INVEX_STRUCTURED_API_KEY").ok();
        }
        if self.vision.api_key.is_none() {
            self.vision.api_key = std::env::var("INVEX_VISION_API_KEY").ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_round_trip_through_json() {
        let config = InvexConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: InvexConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.structured.model_id, config.structured.model_id);
        assert_eq!(back.vision.endpoint, config.vision.endpoint);
        assert_eq!(back.archive.root, config.archive.root);
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let config: InvexConfig =
            serde_json::from_str(r#"{"structured": {"endpoint": "https://example.test"}}"#)
                .unwrap();
        assert_eq!(
            config.structured.endpoint.as_deref(),
            Some("https://example.test")
        );
        assert_eq!(config.structured.model_id, "prebuilt-invoice");
        assert_eq!(config.vision.model, "gpt-4o");
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = InvexConfig::default();
        config.structured.endpoint = Some("https://example.test".to_string());
        config.save(&path).unwrap();

        let back = InvexConfig::from_file(&path).unwrap();
        assert_eq!(
            back.structured.endpoint.as_deref(),
            Some("https://example.test")
        );
    }
}
