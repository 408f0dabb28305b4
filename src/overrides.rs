//! Layered per-provider configuration overrides.
//!
//! Effective request settings come from an explicit ordered list of layers
//! evaluated low-to-high precedence: hard-coded base, per-provider file,
//! model-family file (deep-research only), then request-level values. Keeping
//! the cascade as a list rather than nested fallbacks makes the precedence
//! auditable and testable on its own.
//!
//! Files are re-read from disk on every resolution; nothing is cached, so a
//! config edit takes effect on the next request.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::provider::openai;
use crate::types::ProviderId;

/// Hard-coded lowest-precedence layer.
pub const BASE_TEMPERATURE: f32 = 0.7;
pub const BASE_MAX_TOKENS: u32 = 1024;
pub const BASE_TIMEOUT_MS: u64 = 5000;

/// One override layer; every field optional so a layer only has to mention
/// the knobs it cares about.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverrideLayer {
    pub system: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_ms: Option<u64>,
}

impl OverrideLayer {
    fn base() -> Self {
        Self {
            system: None,
            temperature: Some(BASE_TEMPERATURE),
            max_tokens: Some(BASE_MAX_TOKENS),
            timeout_ms: Some(BASE_TIMEOUT_MS),
        }
    }

    /// Folds `higher` over `self`; set fields in `higher` win.
    fn apply(&mut self, higher: OverrideLayer) {
        if higher.system.is_some() {
            self.system = higher.system;
        }
        if higher.temperature.is_some() {
            self.temperature = higher.temperature;
        }
        if higher.max_tokens.is_some() {
            self.max_tokens = higher.max_tokens;
        }
        if higher.timeout_ms.is_some() {
            self.timeout_ms = higher.timeout_ms;
        }
    }
}

/// Fully merged settings handed to the request builder.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub system: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

/// Reads override files from a config directory and merges the cascade.
#[derive(Debug, Clone)]
pub struct OverrideStore {
    config_dir: PathBuf,
}

impl OverrideStore {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Merges the full cascade for one provider/model pair.
    ///
    /// With `use_persisted` set, the per-provider file and (for deep-research
    /// models) the model-family file sit between the base and the request
    /// layer; otherwise the request layer merges straight over the base.
    pub fn resolve(
        &self,
        provider: ProviderId,
        model: &str,
        use_persisted: bool,
        request_layer: OverrideLayer,
    ) -> ResolvedSettings {
        let mut merged = OverrideLayer::base();

        if use_persisted {
            if let Some(layer) = self.load_layer(&format!("{provider}.json")) {
                merged.apply(layer);
            }
            if provider == ProviderId::OpenAi && openai::is_deep_research_model(model) {
                if let Some(layer) = self.load_layer("openai-deep-research.json") {
                    merged.apply(layer);
                }
            }
        }
        merged.apply(request_layer);

        ResolvedSettings {
            system: merged.system,
            temperature: merged.temperature,
            max_tokens: merged.max_tokens,
            timeout: Duration::from_millis(merged.timeout_ms.unwrap_or(BASE_TIMEOUT_MS)),
        }
    }

    fn load_layer(&self, file_name: &str) -> Option<OverrideLayer> {
        let path = self.config_dir.join(file_name);
        let raw = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(layer) => Some(layer),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring malformed override file");
                None
            }
        }
    }
}
