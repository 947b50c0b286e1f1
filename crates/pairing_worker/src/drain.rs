//! Drain-to-empty batch loop.
//!
//! The loop has two states. While `Draining` it receives one bounded batch,
//! processes every message of the batch concurrently and joins on all of them
//! before asking for the next batch. An empty receive moves it to `Done`,
//! which is terminal: a run never resumes, even if new messages arrive later.

use std::str::FromStr;
use std::time::Instant;

use futures::future::join_all;
use pairing_core::contract::{DeletionStatus, DrainSummary, PairingOutcome, DEFAULT_BATCH_SIZE};
use pairing_core::decode::PayloadEncoding;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::adapters::object_store::ObjectStore;
use crate::adapters::queue::{InputQueue, MessageHandle, OutputQueue, QueueMessage};
use crate::error::{DrainError, QueueError};
use crate::handlers::actions::{apply_outcome, ActionReport};
use crate::handlers::classify::classify_message;

/// When a processed message is acknowledged on the input queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Delete once the action was attempted, whatever its result.
    #[default]
    Always,
    /// Leave messages whose action failed, or whose lookup failed, for
    /// provider redelivery.
    AfterAction,
}

impl DeletePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::AfterAction => "after-action",
        }
    }

    pub fn should_delete(self, outcome: &PairingOutcome, action: &ActionReport) -> bool {
        match self {
            Self::Always => true,
            Self::AfterAction => {
                let transient_failure = matches!(
                    outcome,
                    PairingOutcome::Error(failure) if failure.stage.is_transient()
                );
                !action.is_failure() && !transient_failure
            }
        }
    }
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "after-action" | "after_action" => Ok(Self::AfterAction),
            other => Err(format!(
                "unknown delete policy '{other}', expected 'always' or 'after-action'"
            )),
        }
    }
}

impl std::fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainSettings {
    pub batch_size: usize,
    pub payload_encoding: PayloadEncoding,
    pub delete_policy: DeletePolicy,
    /// Stop after this many non-empty batches even if messages remain.
    pub max_batches: Option<usize>,
}

impl Default for DrainSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            payload_encoding: PayloadEncoding::default(),
            delete_policy: DeletePolicy::default(),
            max_batches: None,
        }
    }
}

/// Shared handles the loop runs against. Built once before draining.
#[derive(Clone, Copy)]
pub struct PairingDependencies<'a> {
    pub object_store: &'a dyn ObjectStore,
    pub input_queue: &'a dyn InputQueue,
    pub output_queue: &'a dyn OutputQueue,
}

#[derive(Debug)]
pub struct ProcessedMessage {
    pub handle: MessageHandle,
    pub outcome: PairingOutcome,
    pub action: ActionReport,
    pub deletion: DeletionStatus,
    pub delete_error: Option<QueueError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    Draining,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    pub started_at: String,
    pub finished_at: String,
    pub duration_ms: u64,
    pub summary: DrainSummary,
}

/// Classifies one message, runs its action and acknowledges it per policy.
/// Failures are captured in the returned value so siblings keep running.
pub async fn process_message(
    message: QueueMessage,
    deps: PairingDependencies<'_>,
    settings: &DrainSettings,
) -> ProcessedMessage {
    let outcome = classify_message(
        &message.body,
        settings.payload_encoding,
        deps.object_store,
    )
    .await;
    let action = apply_outcome(&outcome, deps.object_store, deps.output_queue).await;

    let (deletion, delete_error) = if settings.delete_policy.should_delete(&outcome, &action) {
        match deps.input_queue.delete(&message.handle).await {
            Ok(()) => (DeletionStatus::Deleted, None),
            Err(error) => (DeletionStatus::Failed, Some(error)),
        }
    } else {
        (DeletionStatus::Retained, None)
    };

    let processed = ProcessedMessage {
        handle: message.handle,
        outcome,
        action,
        deletion,
        delete_error,
    };
    log_processed(&processed);
    processed
}

/// Receives and processes one batch, returning the next loop state.
pub async fn drain_batch(
    deps: PairingDependencies<'_>,
    settings: &DrainSettings,
    summary: &mut DrainSummary,
) -> Result<DrainState, DrainError> {
    let messages = deps.input_queue.receive(settings.batch_size).await?;
    if messages.is_empty() {
        info!(
            component = "drain",
            event = "queue_empty",
            batches = summary.batches,
            "no messages left to process"
        );
        return Ok(DrainState::Done);
    }

    let batch_size = messages.len();
    summary.record_batch(batch_size);
    info!(
        component = "drain",
        event = "batch_received",
        batch = summary.batches,
        messages = batch_size,
        "processing batch"
    );

    let processed = join_all(
        messages
            .into_iter()
            .map(|message| process_message(message, deps, settings)),
    )
    .await;

    for message in &processed {
        summary.record_message(
            message.outcome.kind(),
            message.action.is_failure(),
            message.deletion,
        );
    }
    info!(
        component = "drain",
        event = "batch_completed",
        batch = summary.batches,
        messages = batch_size,
        "processed batch"
    );

    if settings
        .max_batches
        .is_some_and(|limit| summary.batches >= limit)
    {
        warn!(
            component = "drain",
            event = "batch_limit_reached",
            batches = summary.batches,
            "stopping before the queue is empty"
        );
        return Ok(DrainState::Done);
    }

    Ok(DrainState::Draining)
}

/// Drains the input queue until a receive comes back empty.
pub async fn drain_until_empty(
    deps: PairingDependencies<'_>,
    settings: &DrainSettings,
) -> Result<DrainSummary, DrainError> {
    let mut summary = DrainSummary::new();
    let mut state = DrainState::Draining;
    while state == DrainState::Draining {
        state = drain_batch(deps, settings, &mut summary).await?;
    }
    Ok(summary)
}

/// `drain_until_empty` with wall-clock bookkeeping and a completion log.
pub async fn run_drain(
    deps: PairingDependencies<'_>,
    settings: &DrainSettings,
) -> Result<DrainReport, DrainError> {
    let started_at = chrono::Utc::now();
    let timer = Instant::now();
    info!(
        component = "drain",
        event = "drain_started",
        batch_size = settings.batch_size,
        payload_encoding = settings.payload_encoding.as_str(),
        delete_policy = settings.delete_policy.as_str(),
        "starting to process queue messages"
    );

    let summary = match drain_until_empty(deps, settings).await {
        Ok(value) => value,
        Err(drain_error) => {
            error!(
                component = "drain",
                event = "drain_failed",
                duration_ms = timer.elapsed().as_millis() as u64,
                error = %drain_error,
                "drain aborted"
            );
            return Err(drain_error);
        }
    };

    let report = DrainReport {
        started_at: started_at.to_rfc3339(),
        finished_at: chrono::Utc::now().to_rfc3339(),
        duration_ms: timer.elapsed().as_millis() as u64,
        summary,
    };
    info!(
        component = "drain",
        event = "drain_completed",
        duration_ms = report.duration_ms,
        batches = report.summary.batches,
        received = report.summary.received,
        succeeded = report.summary.succeeded,
        missing = report.summary.missing,
        ignored = report.summary.ignored,
        errored = report.summary.errored,
        action_failures = report.summary.action_failures,
        retained = report.summary.retained,
        delete_failures = report.summary.delete_failures,
        "drain completed"
    );
    Ok(report)
}

fn log_processed(processed: &ProcessedMessage) {
    let message_id = processed.handle.id.as_str();
    let outcome = processed.outcome.kind().as_str();
    let detail = processed.outcome.detail();
    let pair_key = processed
        .outcome
        .pair()
        .map(|pair| pair.pair_key.as_str())
        .unwrap_or_default();
    let action = processed.action.as_str();

    match (&processed.action, &processed.outcome) {
        (ActionReport::Failed(action_error), _) => error!(
            component = "drain",
            event = "action_failed",
            message_id,
            outcome,
            pair_key,
            error = %action_error,
            "reconciliation action failed"
        ),
        (_, PairingOutcome::Error(_)) => warn!(
            component = "drain",
            event = "message_failed",
            message_id,
            outcome,
            detail = %detail,
            "message could not be classified"
        ),
        _ => info!(
            component = "drain",
            event = "message_processed",
            message_id,
            outcome,
            pair_key,
            action,
            detail = %detail,
            "message processed"
        ),
    }

    if let Some(delete_error) = &processed.delete_error {
        error!(
            component = "drain",
            event = "delete_failed",
            message_id,
            error = %delete_error,
            "message will be redelivered"
        );
    } else if processed.deletion == DeletionStatus::Retained {
        warn!(
            component = "drain",
            event = "message_retained",
            message_id,
            outcome,
            "message left for redelivery"
        );
    }
}

#[cfg(test)]
mod tests {
    use pairing_core::contract::{FailureStage, OutcomeKind};

    use super::*;
    use crate::error::ActionError;
    use crate::test_helpers::{
        blob_created_body, InMemoryInputQueue, InMemoryObjectStore, RecordingOutputQueue,
    };

    fn deps<'a>(
        store: &'a InMemoryObjectStore,
        input: &'a InMemoryInputQueue,
        output: &'a RecordingOutputQueue,
    ) -> PairingDependencies<'a> {
        PairingDependencies {
            object_store: store,
            input_queue: input,
            output_queue: output,
        }
    }

    fn send_failure() -> ActionReport {
        ActionReport::Failed(ActionError::Send(QueueError::Send {
            queue: "out".to_string(),
            message: "boom".to_string(),
        }))
    }

    #[test]
    fn always_policy_deletes_after_failed_actions() {
        let outcome = PairingOutcome::ignore("x");
        assert!(DeletePolicy::Always.should_delete(&outcome, &send_failure()));
    }

    #[test]
    fn after_action_policy_keeps_failed_and_transient_messages() {
        let policy = DeletePolicy::AfterAction;
        assert!(!policy.should_delete(&PairingOutcome::ignore("x"), &send_failure()));
        assert!(!policy.should_delete(
            &PairingOutcome::error(FailureStage::Lookup, "store down"),
            &ActionReport::Skipped
        ));
        assert!(policy.should_delete(
            &PairingOutcome::error(FailureStage::Decode, "bad json"),
            &ActionReport::Skipped
        ));
        assert!(policy.should_delete(&PairingOutcome::ignore("x"), &ActionReport::Skipped));
    }

    #[test]
    fn parses_delete_policy_names() {
        assert_eq!("always".parse::<DeletePolicy>(), Ok(DeletePolicy::Always));
        assert_eq!(
            "After-Action".parse::<DeletePolicy>(),
            Ok(DeletePolicy::AfterAction)
        );
        assert!("never".parse::<DeletePolicy>().is_err());
    }

    #[tokio::test]
    async fn empty_queue_finishes_after_one_receive() {
        let store = InMemoryObjectStore::new();
        let input = InMemoryInputQueue::new();
        let output = RecordingOutputQueue::new();

        let summary = drain_until_empty(deps(&store, &input, &output), &DrainSettings::default())
            .await
            .expect("drain should succeed");

        assert_eq!(summary.batches, 0);
        assert_eq!(input.receive_sizes(), vec![0]);
    }

    #[tokio::test]
    async fn process_message_deletes_exactly_once() {
        let store = InMemoryObjectStore::with_objects([
            "2023/11/order-1-a.json",
            "2023/11/order-1-b.json",
        ]);
        let input = InMemoryInputQueue::with_bodies([blob_created_body("2023/11/order-1-a.json")]);
        let output = RecordingOutputQueue::new();
        let mut batch = input.receive(10).await.expect("receive should succeed");

        let processed = process_message(
            batch.remove(0),
            deps(&store, &input, &output),
            &DrainSettings::default(),
        )
        .await;

        assert_eq!(processed.outcome.kind(), OutcomeKind::Success);
        assert!(matches!(processed.action, ActionReport::Forwarded));
        assert_eq!(processed.deletion, DeletionStatus::Deleted);
        assert_eq!(input.deleted_ids(), vec!["msg-0".to_string()]);
    }

    #[tokio::test]
    async fn batch_limit_stops_before_queue_is_empty() {
        let store = InMemoryObjectStore::new();
        let input = InMemoryInputQueue::with_bodies(
            (0..5).map(|index| blob_created_body(&format!("2023/11/order-{index}-x.json"))),
        );
        let output = RecordingOutputQueue::new();
        let settings = DrainSettings {
            batch_size: 2,
            max_batches: Some(2),
            ..DrainSettings::default()
        };

        let summary = drain_until_empty(deps(&store, &input, &output), &settings)
            .await
            .expect("drain should succeed");

        assert_eq!(summary.batches, 2);
        assert_eq!(summary.ignored, 4);
        assert_eq!(input.visible_len(), 1);
    }

    #[tokio::test]
    async fn receive_failure_aborts_the_drain() {
        let store = InMemoryObjectStore::new();
        let input = InMemoryInputQueue::with_bodies([blob_created_body("2023/11/order-1-a.json")]);
        input.fail_receives(true);
        let output = RecordingOutputQueue::new();

        let error = run_drain(deps(&store, &input, &output), &DrainSettings::default())
            .await
            .expect_err("receive failure should abort");

        assert!(matches!(error, DrainError::Receive(QueueError::Receive { .. })));
        assert!(input.deleted_ids().is_empty());
    }

    #[tokio::test]
    async fn report_carries_summary_and_timestamps() {
        let store = InMemoryObjectStore::with_objects(["2023/11/order-1-a.json"]);
        let input = InMemoryInputQueue::with_bodies([blob_created_body("2023/11/order-1-a.json")]);
        let output = RecordingOutputQueue::new();

        let report = run_drain(deps(&store, &input, &output), &DrainSettings::default())
            .await
            .expect("drain should succeed");

        assert_eq!(report.summary.missing, 1);
        assert_eq!(report.summary.deleted, 1);
        assert!(report.started_at <= report.finished_at);
        let value = serde_json::to_value(&report).expect("report should serialize");
        assert_eq!(value["summary"]["schema_version"], "v1");
    }
}
