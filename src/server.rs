//! HTTP surface: aggregate ask, SSE streaming, image drawing, and two small
//! read-only endpoints for credentials and usage.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, KeepAliveStream, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_stream::wrappers::ReceiverStream;

use crate::config::Runtime;
use crate::history::resolve_history;
use crate::orchestrator::DispatchRequest;
use crate::overrides::{BASE_MAX_TOKENS, BASE_TEMPERATURE, BASE_TIMEOUT_MS};
use crate::provider::ProviderId;
use crate::types::{AskRequest, Attachment, ProviderOutcome, Turn, inline_attachments};

const DEFAULT_STREAM_MODEL: &str = "gpt-4o-mini";

#[derive(Clone)]
pub struct AppState {
    runtime: Arc<Runtime>,
}

/// Per-provider toggle block in the ask body.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ProviderToggles {
    pub openai: Option<bool>,
    pub claude: Option<bool>,
    pub gemini: Option<bool>,
}

impl ProviderToggles {
    fn requested(self) -> Vec<ProviderId> {
        let mut requested = Vec::new();
        if self.openai.unwrap_or(false) {
            requested.push(ProviderId::OpenAi);
        }
        if self.claude.unwrap_or(false) {
            requested.push(ProviderId::Claude);
        }
        if self.gemini.unwrap_or(false) {
            requested.push(ProviderId::Gemini);
        }
        requested
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelChoices {
    pub openai: Option<String>,
    pub claude: Option<String>,
    pub gemini: Option<String>,
}

impl ModelChoices {
    fn into_map(self) -> HashMap<ProviderId, String> {
        let mut map = HashMap::new();
        if let Some(model) = self.openai {
            map.insert(ProviderId::OpenAi, model);
        }
        if let Some(model) = self.claude {
            map.insert(ProviderId::Claude, model);
        }
        if let Some(model) = self.gemini {
            map.insert(ProviderId::Gemini, model);
        }
        map
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AskBody {
    pub prompt: Option<String>,
    pub system: Option<String>,
    /// Absent block means "every provider"; an explicit block enables only
    /// the providers it names.
    pub providers: Option<ProviderToggles>,
    pub models: Option<ModelChoices>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub history: Option<Vec<Turn>>,
    pub histories: Option<HashMap<String, Vec<Turn>>>,
    pub show_reasoning: Option<bool>,
    pub use_model_config: Option<bool>,
    pub model_id: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
}

impl AskBody {
    fn trimmed_prompt(&self) -> Option<String> {
        self.prompt
            .as_deref()
            .map(str::trim)
            .filter(|prompt| !prompt.is_empty())
            .map(str::to_string)
    }

    fn into_dispatch(self, prompt: String) -> DispatchRequest {
        let providers = match self.providers {
            Some(toggles) => toggles.requested(),
            None => ProviderId::ALL.to_vec(),
        };
        DispatchRequest {
            prompt,
            system: self.system,
            providers,
            models: self.models.unwrap_or_default().into_map(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout_ms: self.timeout_ms,
            history: self.history,
            histories: self.histories,
            show_reasoning: self.show_reasoning.unwrap_or(false),
            use_model_config: self.use_model_config.unwrap_or(false),
            model_id: self.model_id,
            attachments: self.attachments.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrawBody {
    pub prompt: Option<String>,
    pub size: Option<String>,
}

pub fn router(runtime: Arc<Runtime>) -> Router {
    Router::new()
        .route("/api/ask", post(ask))
        .route("/api/stream", post(stream))
        .route("/api/draw", post(draw))
        .route("/api/providers", get(providers))
        .route("/api/usage", get(usage))
        .with_state(AppState { runtime })
}

/// Binds and serves until the process is stopped.
pub async fn serve(runtime: Arc<Runtime>, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "listening");
    axum::serve(listener, router(runtime)).await
}

async fn ask(
    State(state): State<AppState>,
    Json(body): Json<AskBody>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Some(prompt) = body.trimmed_prompt() else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "prompt is required"})),
        ));
    };
    let request = body.into_dispatch(prompt);
    let aggregate = state.runtime.orchestrator.dispatch(request).await;
    Ok(Json(json!(aggregate)))
}

async fn stream(
    State(state): State<AppState>,
    Json(body): Json<AskBody>,
) -> Result<Sse<KeepAliveStream<ReceiverStream<Result<Event, Infallible>>>>, (StatusCode, String)> {
    let Some(prompt) = body.trimmed_prompt() else {
        return Err((StatusCode::BAD_REQUEST, "prompt is required".to_string()));
    };

    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Event, Infallible>>(32);
    let runtime = state.runtime.clone();
    let request = build_stream_request(body, prompt);

    tokio::spawn(async move {
        let Some(openai) = runtime.openai.clone() else {
            let payload = json!({"error": "openai is not configured"});
            let _ = tx.send(Ok(Event::default().data(payload.to_string()))).await;
            return;
        };

        let model = request.model.clone();
        let started = Instant::now();
        let mut deltas = match openai.stream_ask(&request).await {
            Ok(deltas) => deltas,
            Err(err) => {
                record_stream_outcome(&runtime, &model, started, Err(err.to_string()));
                let payload = json!({"error": err.to_string()});
                let _ = tx.send(Ok(Event::default().data(payload.to_string()))).await;
                return;
            }
        };

        let mut text = String::new();
        while let Some(delta) = deltas.next().await {
            match delta {
                Ok(delta) => {
                    text.push_str(&delta);
                    let payload = json!({"provider": "openai", "delta": delta});
                    if tx
                        .send(Ok(Event::default().data(payload.to_string())))
                        .await
                        .is_err()
                    {
                        // Client went away; stop reading the upstream feed.
                        return;
                    }
                }
                Err(err) => {
                    record_stream_outcome(&runtime, &model, started, Err(err.to_string()));
                    let payload = json!({"error": err.to_string()});
                    let _ = tx.send(Ok(Event::default().data(payload.to_string()))).await;
                    return;
                }
            }
        }

        let latency_ms = started.elapsed().as_millis() as u64;
        record_stream_outcome(&runtime, &model, started, Ok(text.clone()));
        let payload = json!({
            "provider": "openai",
            "done": true,
            "text": text,
            "latencyMs": latency_ms,
        });
        let _ = tx.send(Ok(Event::default().data(payload.to_string()))).await;
    });

    Ok(Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default()))
}

fn build_stream_request(body: AskBody, prompt: String) -> AskRequest {
    let model = body
        .models
        .as_ref()
        .and_then(|models| models.openai.clone())
        .unwrap_or_else(|| DEFAULT_STREAM_MODEL.to_string());
    let prompt = inline_attachments(&prompt, body.attachments.as_deref().unwrap_or(&[]));
    let transcript = resolve_history(
        ProviderId::OpenAi,
        body.histories.as_ref(),
        body.history.as_deref(),
        body.model_id.as_deref(),
    );
    AskRequest {
        prompt,
        system: body.system,
        transcript,
        model,
        temperature: Some(body.temperature.unwrap_or(BASE_TEMPERATURE)),
        max_output_tokens: Some(body.max_tokens.unwrap_or(BASE_MAX_TOKENS)),
        deadline: Duration::from_millis(body.timeout_ms.unwrap_or(BASE_TIMEOUT_MS)),
    }
}

fn record_stream_outcome(
    runtime: &Runtime,
    model: &str,
    started: Instant,
    result: Result<String, String>,
) {
    let latency_ms = started.elapsed().as_millis() as u64;
    let outcome = match result {
        Ok(text) => ProviderOutcome::success(ProviderId::OpenAi, model.to_string(), text, latency_ms),
        Err(error) => {
            ProviderOutcome::failure(ProviderId::OpenAi, model.to_string(), error, latency_ms)
        }
    };
    runtime.usage.record(&outcome);
}

async fn draw(State(state): State<AppState>, Json(body): Json<DrawBody>) -> Json<Value> {
    let Some(prompt) = body
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty())
    else {
        return Json(json!({"ok": false, "error": "prompt is required"}));
    };
    let Some(openai) = state.runtime.openai.clone() else {
        return Json(json!({"ok": false, "error": "openai is not configured"}));
    };
    match openai.draw(prompt, body.size.as_deref()).await {
        Ok(image) => Json(json!({"ok": true, "image": image})),
        Err(err) => Json(json!({"ok": false, "error": err.to_string()})),
    }
}

async fn providers(State(state): State<AppState>) -> Json<Value> {
    let orchestrator = &state.runtime.orchestrator;
    Json(json!({
        "openai": orchestrator.is_configured(ProviderId::OpenAi),
        "claude": orchestrator.is_configured(ProviderId::Claude),
        "gemini": orchestrator.is_configured(ProviderId::Gemini),
    }))
}

async fn usage(State(state): State<AppState>) -> Json<Value> {
    Json(json!({"entries": state.runtime.usage.snapshot()}))
}
