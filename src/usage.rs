//! Bounded in-memory log of settled provider outcomes.
//!
//! An injected ring buffer rather than a process-wide singleton: the
//! orchestrator owns a handle and appends one entry per settled outcome, the
//! server reads snapshots for `/api/usage`. Nothing here survives a restart.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::types::{ProviderId, ProviderOutcome};

const DEFAULT_CAPACITY: usize = 200;

/// One settled outcome, as exposed by `/api/usage`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEntry {
    /// Unix epoch milliseconds at settlement.
    pub at: u64,
    pub provider: ProviderId,
    pub model: String,
    pub ok: bool,
    pub latency_ms: u64,
}

/// Append-only ring buffer; oldest entries fall off once capacity is reached.
#[derive(Debug)]
pub struct UsageLog {
    entries: Mutex<VecDeque<UsageEntry>>,
    capacity: usize,
}

impl UsageLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Appends one settled outcome.
    pub fn record(&self, outcome: &ProviderOutcome) {
        let entry = UsageEntry {
            at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_millis() as u64)
                .unwrap_or(0),
            provider: outcome.provider,
            model: outcome.model.clone(),
            ok: outcome.ok,
            latency_ms: outcome.latency_ms,
        };

        let mut entries = self.entries.lock().expect("usage log poisoned");
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Snapshot, most recent first.
    pub fn snapshot(&self) -> Vec<UsageEntry> {
        let entries = self.entries.lock().expect("usage log poisoned");
        entries.iter().rev().cloned().collect()
    }
}

impl Default for UsageLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(model: &str, latency_ms: u64) -> ProviderOutcome {
        ProviderOutcome::success(ProviderId::OpenAi, model.to_string(), "ok".to_string(), latency_ms)
    }

    #[test]
    fn snapshot_is_most_recent_first() {
        let log = UsageLog::new(10);
        log.record(&outcome("first", 1));
        log.record(&outcome("second", 2));

        let entries = log.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].model, "second");
        assert_eq!(entries[1].model, "first");
    }

    #[test]
    fn oldest_entries_fall_off_at_capacity() {
        let log = UsageLog::new(3);
        for n in 0..5 {
            log.record(&outcome(&format!("m{n}"), n));
        }

        let entries = log.snapshot();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].model, "m4");
        assert_eq!(entries[2].model, "m2");
    }
}
