//! Fans one logical request out to every requested provider and joins the
//! outcomes into a partial-success-tolerant aggregate.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;

use crate::config::env_hint;
use crate::error::ProviderError;
use crate::history::resolve_history;
use crate::overrides::{OverrideLayer, OverrideStore};
use crate::provider::{DynProvider, ProviderId};
use crate::retry::{DEFAULT_MAX_ATTEMPTS, with_retries};
use crate::types::{
    AggregateResult, AskRequest, Attachment, ProviderOutcome, Turn, inline_attachments,
};
use crate::usage::UsageLog;

/// Appended to the system text when the caller asked to see reasoning.
const SHOW_REASONING_INSTRUCTION: &str =
    "Show your step-by-step reasoning before giving the final answer.";

/// Per-provider fallback models used when the caller names none.
fn default_model(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::OpenAi => "gpt-4o-mini",
        ProviderId::Claude => "claude-3-5-sonnet-latest",
        ProviderId::Gemini => "gemini-2.0-flash",
    }
}

/// One top-level caller request, already validated to carry a prompt.
#[derive(Debug, Clone, Default)]
pub struct DispatchRequest {
    pub prompt: String,
    pub system: Option<String>,
    /// Providers the caller asked for; anything absent stays out of the result.
    pub providers: Vec<ProviderId>,
    /// Per-provider model overrides.
    pub models: HashMap<ProviderId, String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_ms: Option<u64>,
    /// Single shared legacy transcript.
    pub history: Option<Vec<Turn>>,
    /// Keyed transcript bag; see [`crate::history::resolve_history`].
    pub histories: Option<HashMap<String, Vec<Turn>>>,
    pub show_reasoning: bool,
    pub use_model_config: bool,
    pub model_id: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// Dispatches caller requests across the registered adapters.
///
/// Holds one adapter per *credentialed* provider; a requested provider with no
/// registered adapter is answered synthetically with a missing-credential
/// outcome and zero latency, no network involved. Build with
/// [`Orchestrator::builder`].
pub struct Orchestrator {
    providers: BTreeMap<ProviderId, DynProvider>,
    usage: Arc<UsageLog>,
    overrides: OverrideStore,
    max_attempts: u32,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder {
            providers: BTreeMap::new(),
            usage: None,
            overrides: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// True when a credentialed adapter is registered for `provider`.
    pub fn is_configured(&self, provider: ProviderId) -> bool {
        self.providers.contains_key(&provider)
    }

    /// Fans the request out and waits for every submitted provider to settle.
    ///
    /// All sub-requests run concurrently; the join-all barrier never
    /// short-circuits on the first success or failure. Outcomes are keyed by
    /// provider, so cross-provider completion order is irrelevant.
    pub async fn dispatch(&self, request: DispatchRequest) -> AggregateResult {
        let prompt = inline_attachments(&request.prompt, &request.attachments);

        let mut aggregate = AggregateResult::new();
        let mut jobs: JoinSet<(ProviderId, ProviderOutcome)> = JoinSet::new();

        for provider_id in ProviderId::ALL {
            if !request.providers.contains(&provider_id) {
                continue;
            }
            let model = request
                .models
                .get(&provider_id)
                .cloned()
                .unwrap_or_else(|| default_model(provider_id).to_string());

            let Some(provider) = self.providers.get(&provider_id) else {
                let error = ProviderError::MissingCredential {
                    provider: provider_id,
                    env_hint: env_hint(provider_id),
                };
                let outcome = ProviderOutcome::failure(provider_id, model, error.to_string(), 0);
                self.usage.record(&outcome);
                aggregate.insert(provider_id, outcome);
                continue;
            };

            let ask_request = self.build_ask_request(provider_id, &model, &prompt, &request);
            let provider = provider.clone();
            let max_attempts = self.max_attempts;

            jobs.spawn(async move {
                let label = format!("{provider_id} ask");
                let deadline = ask_request.deadline;
                let started = Instant::now();

                let result = with_retries(
                    &label,
                    || {
                        let provider = provider.clone();
                        let ask_request = ask_request.clone();
                        async move { provider.ask(&ask_request).await }
                    },
                    max_attempts,
                    deadline,
                )
                .await;

                let latency_ms = started.elapsed().as_millis() as u64;
                let outcome = match result {
                    Ok(text) => ProviderOutcome::success(provider_id, ask_request.model, text, latency_ms),
                    Err(err) => {
                        ProviderOutcome::failure(provider_id, ask_request.model, err.to_string(), latency_ms)
                    }
                };
                (provider_id, outcome)
            });
        }

        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok((provider_id, outcome)) => {
                    tracing::debug!(
                        provider = %provider_id,
                        ok = outcome.ok,
                        latency_ms = outcome.latency_ms,
                        "provider settled"
                    );
                    self.usage.record(&outcome);
                    aggregate.insert(provider_id, outcome);
                }
                Err(join_err) => {
                    // A panicking stub should not take the whole aggregate down.
                    tracing::error!(error = %join_err, "provider task failed to join");
                }
            }
        }

        aggregate
    }

    fn build_ask_request(
        &self,
        provider_id: ProviderId,
        model: &str,
        prompt: &str,
        request: &DispatchRequest,
    ) -> AskRequest {
        let settings = self.overrides.resolve(
            provider_id,
            model,
            request.use_model_config,
            OverrideLayer {
                system: request.system.clone(),
                temperature: request.temperature,
                max_tokens: request.max_tokens,
                timeout_ms: request.timeout_ms,
            },
        );

        let system = match (settings.system, request.show_reasoning) {
            (Some(system), true) => Some(format!("{system}\n\n{SHOW_REASONING_INSTRUCTION}")),
            (None, true) => Some(SHOW_REASONING_INSTRUCTION.to_string()),
            (system, false) => system,
        };

        let transcript = resolve_history(
            provider_id,
            request.histories.as_ref(),
            request.history.as_deref(),
            request.model_id.as_deref(),
        );

        AskRequest {
            prompt: prompt.to_string(),
            system,
            transcript,
            model: model.to_string(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_tokens,
            deadline: settings.timeout,
        }
    }
}

pub struct OrchestratorBuilder {
    providers: BTreeMap<ProviderId, DynProvider>,
    usage: Option<Arc<UsageLog>>,
    overrides: Option<OverrideStore>,
    max_attempts: u32,
}

impl OrchestratorBuilder {
    /// Registers a credentialed adapter under its own provider id.
    pub fn register(mut self, provider: DynProvider) -> Self {
        self.providers.insert(provider.id(), provider);
        self
    }

    /// Shares a usage log with the HTTP surface.
    pub fn usage(mut self, usage: Arc<UsageLog>) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Points the override cascade at a config directory.
    pub fn overrides(mut self, overrides: OverrideStore) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Overrides the retry ceiling (defaults to [`DEFAULT_MAX_ATTEMPTS`]).
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn build(self) -> Orchestrator {
        Orchestrator {
            providers: self.providers,
            usage: self.usage.unwrap_or_default(),
            overrides: self
                .overrides
                .unwrap_or_else(|| OverrideStore::new("config")),
            max_attempts: self.max_attempts,
        }
    }
}
