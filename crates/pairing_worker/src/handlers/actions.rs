use std::collections::BTreeMap;

use pairing_core::contract::{PairMatch, PairingOutcome, PENDING_PAIR_TAG};

use crate::adapters::object_store::ObjectStore;
use crate::adapters::queue::OutputQueue;
use crate::error::ActionError;

#[derive(Debug)]
pub enum ActionReport {
    Forwarded,
    Tagged,
    Skipped,
    Failed(ActionError),
}

impl ActionReport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forwarded => "forwarded",
            Self::Tagged => "tagged",
            Self::Skipped => "skipped",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Runs the side effect that belongs to `outcome`.
pub async fn apply_outcome(
    outcome: &PairingOutcome,
    object_store: &dyn ObjectStore,
    output_queue: &dyn OutputQueue,
) -> ActionReport {
    let result = match outcome {
        PairingOutcome::Success(pair) => forward_pair_key(pair, output_queue)
            .await
            .map(|()| ActionReport::Forwarded),
        PairingOutcome::Missing(pair) => tag_unpaired_object(pair, object_store)
            .await
            .map(|()| ActionReport::Tagged),
        PairingOutcome::Ignore(_) | PairingOutcome::Error(_) => Ok(ActionReport::Skipped),
    };

    result.unwrap_or_else(ActionReport::Failed)
}

/// Downstream consumers receive the key as a JSON string literal.
pub fn pair_key_message(pair_key: &str) -> String {
    serde_json::Value::from(pair_key).to_string()
}

pub async fn forward_pair_key(
    pair: &PairMatch,
    output_queue: &dyn OutputQueue,
) -> Result<(), ActionError> {
    output_queue.send(&pair_key_message(&pair.pair_key)).await?;
    Ok(())
}

pub fn pending_pair_tags(pair_key: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(PENDING_PAIR_TAG.to_string(), pair_key.to_string())])
}

/// Marks the triggering object so a later sweep can find unpaired objects.
/// The tag set is replaced wholesale, so repeating the call is a no-op.
pub async fn tag_unpaired_object(
    pair: &PairMatch,
    object_store: &dyn ObjectStore,
) -> Result<(), ActionError> {
    object_store
        .set_tags(&pair.object_path, &pending_pair_tags(&pair.pair_key))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pairing_core::contract::FailureStage;

    use super::*;
    use crate::test_helpers::{InMemoryObjectStore, RecordingOutputQueue};

    fn sample_pair() -> PairMatch {
        PairMatch {
            pair_key: "order-1701284315287-a".to_string(),
            object_path: "2023/11/order-1701284315287-a.json".to_string(),
            companion_path: "2023/11/order-1701284315287-b.json".to_string(),
        }
    }

    #[test]
    fn pair_key_is_sent_as_json_string() {
        assert_eq!(
            pair_key_message("order-1701284315287-a"),
            "\"order-1701284315287-a\""
        );
    }

    #[tokio::test]
    async fn success_sends_exactly_one_key() {
        let store = InMemoryObjectStore::new();
        let output = RecordingOutputQueue::new();

        let report =
            apply_outcome(&PairingOutcome::Success(sample_pair()), &store, &output).await;

        assert!(matches!(report, ActionReport::Forwarded));
        assert_eq!(output.sent(), vec!["\"order-1701284315287-a\"".to_string()]);
        assert!(store.tag_calls().is_empty());
    }

    #[tokio::test]
    async fn missing_tags_triggering_object_with_its_own_key() {
        let store = InMemoryObjectStore::with_objects(["2023/11/order-1701284315287-a.json"]);
        let output = RecordingOutputQueue::new();

        let report =
            apply_outcome(&PairingOutcome::Missing(sample_pair()), &store, &output).await;

        assert!(matches!(report, ActionReport::Tagged));
        assert!(output.sent().is_empty());
        assert_eq!(
            store.tags("2023/11/order-1701284315287-a.json"),
            Some(pending_pair_tags("order-1701284315287-a"))
        );
    }

    #[tokio::test]
    async fn tagging_twice_matches_tagging_once() {
        let store = InMemoryObjectStore::with_objects(["2023/11/order-1701284315287-a.json"]);
        let pair = sample_pair();

        tag_unpaired_object(&pair, &store)
            .await
            .expect("first tag should apply");
        let once = store.snapshot();
        tag_unpaired_object(&pair, &store)
            .await
            .expect("second tag should apply");

        assert_eq!(store.snapshot(), once);
    }

    #[tokio::test]
    async fn ignore_and_error_have_no_side_effects() {
        let store = InMemoryObjectStore::new();
        let output = RecordingOutputQueue::new();

        for outcome in [
            PairingOutcome::ignore("invalid suffix"),
            PairingOutcome::error(FailureStage::Decode, "bad payload"),
        ] {
            let report = apply_outcome(&outcome, &store, &output).await;
            assert!(matches!(report, ActionReport::Skipped));
        }
        assert!(output.sent().is_empty());
        assert!(store.tag_calls().is_empty());
        assert!(store.exists_calls().is_empty());
    }

    #[tokio::test]
    async fn send_failure_is_reported_not_raised() {
        let store = InMemoryObjectStore::new();
        let output = RecordingOutputQueue::new();
        output.fail_sends(true);

        let report =
            apply_outcome(&PairingOutcome::Success(sample_pair()), &store, &output).await;

        assert!(matches!(report, ActionReport::Failed(ActionError::Send(_))));
        assert!(report.is_failure());
    }

    #[tokio::test]
    async fn tag_failure_is_reported_not_raised() {
        let store = InMemoryObjectStore::new();
        store.fail_tags(true);
        let output = RecordingOutputQueue::new();

        let report =
            apply_outcome(&PairingOutcome::Missing(sample_pair()), &store, &output).await;

        assert!(matches!(report, ActionReport::Failed(ActionError::Tag(_))));
    }
}
