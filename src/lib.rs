//! chorus: one prompt, several model vendors, one aggregate answer.
//!
//! A single caller request fans out concurrently to every enabled provider
//! (OpenAI chat-completion style, Claude message style, Gemini
//! generative-content style), each behind its own timeout and bounded retry.
//! Outcomes are normalized and joined into a partial-success-tolerant map
//! keyed by provider, so one vendor outage never hides another vendor's
//! answer. The crate is consumed as a library, a CLI, and a small HTTP
//! server with an SSE streaming endpoint.

pub mod config;
pub mod error;
pub mod history;
pub mod http;
pub mod orchestrator;
pub mod overrides;
pub mod provider;
pub mod retry;
pub mod server;
pub mod types;
pub mod usage;

pub use config::Runtime;
pub use error::ProviderError;
pub use orchestrator::{DispatchRequest, Orchestrator};
pub use provider::{DynProvider, Provider, ProviderId};
pub use types::{AggregateResult, AskRequest, Attachment, ProviderOutcome, Turn, TurnRole};
pub use usage::{UsageEntry, UsageLog};
