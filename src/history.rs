//! Picks which prior-turn transcript each provider carries on the wire.
//!
//! Callers supply transcripts under overlapping naming conventions that have
//! accumulated across UI generations; the precedence below is deliberate and
//! load-bearing, not first-come-first-served.

use std::collections::HashMap;

use crate::types::{ProviderId, Turn};

/// Legacy per-card slot keys from the oldest UI shape, in concatenation order.
const LEGACY_SLOT_KEYS: [&str; 3] = ["model1", "model2", "model3"];

/// Resolves the transcript to attach for one provider.
///
/// First match wins:
/// 1. `histories[provider]`, the provider-keyed transcript, verbatim;
/// 2. `histories[model_id]`, which lets a UI card track its own transcript
///    independently of which vendor currently backs it;
/// 3. any legacy slots `model1`/`model2`/`model3`, concatenated in that fixed
///    order. This merges transcripts of up to three different models into one
///    history; semantically dubious, but older clients depend on it, so the
///    behavior is preserved as-is;
/// 4. the single shared legacy transcript, else empty.
///
/// Always returns an owned sequence, never null. Empty-content turns are left
/// in place; adapters filter them at the wire boundary.
pub fn resolve_history(
    provider: ProviderId,
    histories: Option<&HashMap<String, Vec<Turn>>>,
    legacy_history: Option<&[Turn]>,
    model_id: Option<&str>,
) -> Vec<Turn> {
    if let Some(histories) = histories {
        if let Some(turns) = histories.get(provider.as_str()) {
            return turns.clone();
        }

        if let Some(model_id) = model_id {
            if let Some(turns) = histories.get(model_id) {
                return turns.clone();
            }
        }

        let mut combined = Vec::new();
        let mut any_slot = false;
        for key in LEGACY_SLOT_KEYS {
            if let Some(turns) = histories.get(key) {
                any_slot = true;
                combined.extend(turns.iter().cloned());
            }
        }
        if any_slot {
            return combined;
        }
    }

    legacy_history.map(<[Turn]>::to_vec).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(entries: &[(&str, &[Turn])]) -> HashMap<String, Vec<Turn>> {
        entries
            .iter()
            .map(|(key, turns)| (key.to_string(), turns.to_vec()))
            .collect()
    }

    #[test]
    fn provider_key_wins_over_everything() {
        let a = Turn::user("a");
        let b = Turn::user("b");
        let histories = bag(&[("openai", &[a.clone()][..]), ("model2", &[b][..])]);

        let resolved = resolve_history(
            ProviderId::OpenAi,
            Some(&histories),
            Some(&[Turn::user("legacy")]),
            Some("model2"),
        );
        assert_eq!(resolved, vec![a]);
    }

    #[test]
    fn model_id_key_applies_when_provider_key_absent() {
        let b = Turn::user("b");
        let histories = bag(&[("model2", &[b.clone()][..])]);

        let resolved = resolve_history(ProviderId::OpenAi, Some(&histories), None, Some("model2"));
        assert_eq!(resolved, vec![b]);
    }

    #[test]
    fn model_id_key_ignored_when_caller_supplied_none() {
        let histories = bag(&[("model2", &[Turn::user("b")][..])]);

        let resolved = resolve_history(ProviderId::OpenAi, Some(&histories), None, None);
        assert!(resolved.is_empty());
    }

    #[test]
    fn legacy_slots_concatenate_in_fixed_order() {
        let one = Turn::user("one");
        let three = Turn::user("three");
        let histories = bag(&[("model3", &[three.clone()][..]), ("model1", &[one.clone()][..])]);

        let resolved = resolve_history(ProviderId::Claude, Some(&histories), None, None);
        assert_eq!(resolved, vec![one, three]);
    }

    #[test]
    fn falls_back_to_shared_legacy_history() {
        let legacy = [Turn::user("shared"), Turn::assistant("reply")];
        let resolved = resolve_history(ProviderId::Gemini, None, Some(&legacy), None);
        assert_eq!(resolved, legacy.to_vec());
    }

    #[test]
    fn resolves_empty_when_nothing_supplied() {
        let resolved = resolve_history(ProviderId::Gemini, None, None, None);
        assert!(resolved.is_empty());
    }
}
