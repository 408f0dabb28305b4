//! Credential discovery and runtime assembly from the process environment.

use std::env;
use std::sync::Arc;

use crate::error::ProviderError;
use crate::http::reqwest::default_dyn_transport;
use crate::orchestrator::Orchestrator;
use crate::overrides::OverrideStore;
use crate::provider::ProviderId;
use crate::provider::claude::ClaudeProvider;
use crate::provider::gemini::GeminiProvider;
use crate::provider::openai::OpenAiProvider;
use crate::usage::UsageLog;

/// Default directory holding persisted per-provider override files.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// The environment variables named when a credential is missing.
pub fn env_hint(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::OpenAi => "OPENAI_API_KEY",
        ProviderId::Claude => "ANTHROPIC_API_KEY",
        ProviderId::Gemini => "GEMINI_API_KEY or GOOGLE_API_KEY",
    }
}

/// Reads the credential for `provider` from the environment.
///
/// Gemini accepts either `GEMINI_API_KEY` or, as a fallback, the older
/// `GOOGLE_API_KEY`. Empty values count as unset.
pub fn credential_for(provider: ProviderId) -> Option<String> {
    let keys: &[&str] = match provider {
        ProviderId::OpenAi => &["OPENAI_API_KEY"],
        ProviderId::Claude => &["ANTHROPIC_API_KEY"],
        ProviderId::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
    };
    keys.iter()
        .filter_map(|key| env::var(key).ok())
        .find(|value| !value.trim().is_empty())
}

/// Everything the serving surfaces share: the fan-out dispatcher, the usage
/// log behind `/api/usage`, and the OpenAI adapter kept aside for the
/// streaming and image endpoints.
pub struct Runtime {
    pub orchestrator: Orchestrator,
    pub usage: Arc<UsageLog>,
    pub openai: Option<Arc<OpenAiProvider>>,
}

impl Runtime {
    /// Assembles a runtime from whatever credentials the environment carries.
    ///
    /// Providers without a credential are simply not registered; asking for
    /// them later yields a synthetic missing-credential outcome rather than
    /// an assembly error.
    pub fn from_env(config_dir: &str) -> Result<Self, ProviderError> {
        let transport = default_dyn_transport()?;
        let usage = Arc::new(UsageLog::default());

        let mut builder = Orchestrator::builder()
            .usage(usage.clone())
            .overrides(OverrideStore::new(config_dir));

        let mut openai = None;
        if let Some(key) = credential_for(ProviderId::OpenAi) {
            let provider = Arc::new(OpenAiProvider::new(transport.clone(), key));
            openai = Some(provider.clone());
            builder = builder.register(provider);
        }
        if let Some(key) = credential_for(ProviderId::Claude) {
            builder = builder.register(Arc::new(ClaudeProvider::new(transport.clone(), key)));
        }
        if let Some(key) = credential_for(ProviderId::Gemini) {
            builder = builder.register(Arc::new(GeminiProvider::new(transport.clone(), key)));
        }

        let orchestrator = builder.build();
        for provider in ProviderId::ALL {
            tracing::info!(
                provider = %provider,
                configured = orchestrator.is_configured(provider),
                "provider credential"
            );
        }

        Ok(Self {
            orchestrator,
            usage,
            openai,
        })
    }
}
