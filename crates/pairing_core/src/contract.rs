use serde::{Deserialize, Serialize};

pub const DRAIN_SUMMARY_SCHEMA_VERSION: &str = "v1";
pub const DEFAULT_BATCH_SIZE: usize = 10;
/// Tag written on an object whose companion has not arrived yet.
pub const PENDING_PAIR_TAG: &str = "pending_pair";

/// A decoded blob notification. Only produced for events whose type names a blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub event_type: String,
    pub subject: String,
}

/// Paths and key shared by the `Success` and `Missing` outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairMatch {
    /// File name of the triggering object without its extension. Still carries
    /// the triggering suffix letter.
    pub pair_key: String,
    pub object_path: String,
    pub companion_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Decode,
    Path,
    Lookup,
}

impl FailureStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::Path => "path",
            Self::Lookup => "lookup",
        }
    }

    /// Lookup failures depend on store availability; the others are fixed by
    /// the payload and never change on redelivery.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Lookup)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeFailure {
    pub stage: FailureStage,
    pub reason: String,
}

impl OutcomeFailure {
    pub fn new(stage: FailureStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for OutcomeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failure: {}", self.stage.as_str(), self.reason)
    }
}

/// Terminal classification of one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PairingOutcome {
    Ignore(String),
    Success(PairMatch),
    Missing(PairMatch),
    Error(OutcomeFailure),
}

impl PairingOutcome {
    pub fn ignore(reason: impl Into<String>) -> Self {
        Self::Ignore(reason.into())
    }

    pub fn error(stage: FailureStage, reason: impl Into<String>) -> Self {
        Self::Error(OutcomeFailure::new(stage, reason))
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Ignore(_) => OutcomeKind::Ignore,
            Self::Success(_) => OutcomeKind::Success,
            Self::Missing(_) => OutcomeKind::Missing,
            Self::Error(_) => OutcomeKind::Error,
        }
    }

    pub fn pair(&self) -> Option<&PairMatch> {
        match self {
            Self::Success(pair) | Self::Missing(pair) => Some(pair),
            Self::Ignore(_) | Self::Error(_) => None,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            Self::Ignore(reason) => reason.clone(),
            Self::Success(pair) => format!("found companion {}", pair.companion_path),
            Self::Missing(pair) => format!("did not find companion {}", pair.companion_path),
            Self::Error(failure) => failure.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Ignore,
    Success,
    Missing,
    Error,
}

impl OutcomeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Success => "success",
            Self::Missing => "missing",
            Self::Error => "error",
        }
    }
}

/// What happened to the input message after its action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStatus {
    Deleted,
    Retained,
    Failed,
}

/// Counters accumulated over one drain-to-empty run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainSummary {
    pub schema_version: String,
    pub batches: usize,
    pub received: usize,
    pub succeeded: usize,
    pub missing: usize,
    pub ignored: usize,
    pub errored: usize,
    pub action_failures: usize,
    pub deleted: usize,
    pub retained: usize,
    pub delete_failures: usize,
}

impl DrainSummary {
    pub fn new() -> Self {
        Self {
            schema_version: DRAIN_SUMMARY_SCHEMA_VERSION.to_string(),
            ..Self::default()
        }
    }

    pub fn record_batch(&mut self, size: usize) {
        self.batches += 1;
        self.received += size;
    }

    pub fn record_message(
        &mut self,
        kind: OutcomeKind,
        action_failed: bool,
        deletion: DeletionStatus,
    ) {
        match kind {
            OutcomeKind::Ignore => self.ignored += 1,
            OutcomeKind::Success => self.succeeded += 1,
            OutcomeKind::Missing => self.missing += 1,
            OutcomeKind::Error => self.errored += 1,
        }
        if action_failed {
            self.action_failures += 1;
        }
        match deletion {
            DeletionStatus::Deleted => self.deleted += 1,
            DeletionStatus::Retained => self.retained += 1,
            DeletionStatus::Failed => self.delete_failures += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.succeeded + self.missing + self.ignored + self.errored
    }
}
