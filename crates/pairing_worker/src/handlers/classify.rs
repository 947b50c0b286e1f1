use pairing_core::contract::{FailureStage, PairingOutcome};
use pairing_core::decode::{decode_notification, DecodedNotification, PayloadEncoding};

use crate::adapters::object_store::ObjectStore;
use crate::handlers::resolve::resolve_pairing;

pub const NOT_A_BLOB_EVENT: &str = "not a blob event";

/// Decodes a raw queue body and, for blob events, resolves its companion.
pub async fn classify_message(
    body: &str,
    encoding: PayloadEncoding,
    object_store: &dyn ObjectStore,
) -> PairingOutcome {
    match decode_notification(body, encoding) {
        Err(error) => PairingOutcome::error(FailureStage::Decode, error.to_string()),
        Ok(DecodedNotification::Other { .. }) => PairingOutcome::ignore(NOT_A_BLOB_EVENT),
        Ok(DecodedNotification::Blob(event)) => resolve_pairing(&event, object_store).await,
    }
}
