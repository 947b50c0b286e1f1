use pairing_core::contract::{FailureStage, NotificationEvent, PairMatch, PairingOutcome};
use pairing_core::identity::{ObjectIdentity, ObjectPath};

use crate::adapters::object_store::ObjectStore;

pub const INVALID_SUFFIX: &str = "invalid suffix";

/// Looks up the companion of the object named by `event` and reports whether
/// the pair is complete. Never fails; every problem becomes an outcome.
pub async fn resolve_pairing(
    event: &NotificationEvent,
    object_store: &dyn ObjectStore,
) -> PairingOutcome {
    let path = match ObjectPath::from_subject(&event.subject) {
        Ok(value) => value,
        Err(error) => return PairingOutcome::error(FailureStage::Path, error.to_string()),
    };

    let Some(identity) = ObjectIdentity::from_path(path) else {
        return PairingOutcome::ignore(INVALID_SUFFIX);
    };

    let companion = identity.companion();
    let pair = PairMatch {
        pair_key: identity.pair_key().to_string(),
        object_path: identity.path.relative_path.clone(),
        companion_path: companion.relative_path,
    };

    match object_store.exists(&pair.companion_path).await {
        Ok(true) => PairingOutcome::Success(pair),
        Ok(false) => PairingOutcome::Missing(pair),
        Err(error) => PairingOutcome::error(FailureStage::Lookup, error.to_string()),
    }
}
