use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::ProviderError;
use crate::types::AskRequest;

pub mod claude;
pub mod gemini;
pub mod openai;

pub use crate::types::ProviderId;

/// Incremental text fragments produced by the one streaming-capable adapter.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

/// Uniform adapter contract: one normalized request in, plain text out.
///
/// An adapter owns everything vendor-specific: endpoint, credential header,
/// role mapping, parameter quirks, and response-shape extraction. Nothing past
/// this trait ever sees a vendor payload. Constructing an adapter requires its
/// credential, so a registered provider is by definition credentialed; the
/// missing-credential case is decided before registration.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Submits one request and resolves with the normalized response text.
    ///
    /// # Errors
    ///
    /// Settles with a [`ProviderError`] describing the rejection, malformed
    /// body, or transport fault; never panics.
    async fn ask(&self, request: &AskRequest) -> Result<String, ProviderError>;

    /// Which vendor this adapter fronts.
    fn id(&self) -> ProviderId;
}

/// Thread-safe adapter handle shared between concurrent dispatch tasks.
pub type DynProvider = Arc<dyn Provider>;
