#![allow(dead_code)]

use std::time::Duration;

use async_trait::async_trait;

use chorus::error::ProviderError;
use chorus::provider::{Provider, ProviderId};
use chorus::types::AskRequest;

/// What a [`StubProvider`] does when asked.
#[derive(Debug, Clone)]
pub enum StubBehavior {
    /// Resolve with this text.
    Reply(String),
    /// Resolve with the prompt it was given.
    EchoPrompt,
    /// Fail with a rejection carrying this message.
    Reject(String),
    /// Never settle; only the timeout wrapper gets it unstuck.
    Hang,
}

/// In-process adapter standing in for a vendor during tests.
pub struct StubProvider {
    id: ProviderId,
    behavior: StubBehavior,
    delay: Duration,
}

impl StubProvider {
    pub fn new(id: ProviderId, behavior: StubBehavior) -> Self {
        Self {
            id,
            behavior,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Provider for StubProvider {
    async fn ask(&self, request: &AskRequest) -> Result<String, ProviderError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.behavior {
            StubBehavior::Reply(text) => Ok(text.clone()),
            StubBehavior::EchoPrompt => Ok(request.prompt.clone()),
            StubBehavior::Reject(message) => {
                Err(ProviderError::rejected("stub", message.clone()))
            }
            StubBehavior::Hang => {
                futures_util::future::pending::<()>().await;
                unreachable!()
            }
        }
    }

    fn id(&self) -> ProviderId {
        self.id
    }
}
