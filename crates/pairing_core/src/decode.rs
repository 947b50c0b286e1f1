use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use thiserror::Error;

use crate::contract::NotificationEvent;

/// Marker that identifies storage events worth resolving.
pub const BLOB_EVENT_MARKER: &str = "blob";

/// How the queue body wraps the JSON notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadEncoding {
    /// Body is base64 of the UTF-8 JSON text.
    #[default]
    Base64,
    /// Body is the JSON text itself.
    Plain,
}

impl PayloadEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base64 => "base64",
            Self::Plain => "plain",
        }
    }
}

impl FromStr for PayloadEncoding {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "base64" => Ok(Self::Base64),
            "plain" | "json" => Ok(Self::Plain),
            other => Err(format!(
                "unknown payload encoding '{other}', expected 'base64' or 'plain'"
            )),
        }
    }
}

impl std::fmt::Display for PayloadEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("message body is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("message body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("message body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message body must be a JSON object")]
    NotAnObject,
    #[error("required field '{0}' is missing")]
    MissingField(&'static str),
    #[error("required field '{0}' must be a string")]
    NotAString(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedNotification {
    Blob(NotificationEvent),
    /// A well-formed event that is not about a blob. Carries the reported type.
    Other { event_type: String },
}

/// Decodes a raw queue body into a typed notification.
pub fn decode_notification(
    raw: &str,
    encoding: PayloadEncoding,
) -> Result<DecodedNotification, DecodeError> {
    let text = match encoding {
        PayloadEncoding::Base64 => String::from_utf8(STANDARD.decode(raw.trim())?)?,
        PayloadEncoding::Plain => raw.to_string(),
    };

    let value: Value = serde_json::from_str(&text)?;
    let Some(object) = value.as_object() else {
        return Err(DecodeError::NotAnObject);
    };

    let event_type = required_string(object, "type")?;
    let subject = required_string(object, "subject")?;

    if !is_blob_event_type(&event_type) {
        return Ok(DecodedNotification::Other { event_type });
    }

    Ok(DecodedNotification::Blob(NotificationEvent {
        event_type,
        subject,
    }))
}

pub fn is_blob_event_type(event_type: &str) -> bool {
    event_type.to_lowercase().contains(BLOB_EVENT_MARKER)
}

fn required_string(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<String, DecodeError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(DecodeError::MissingField(field)),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(DecodeError::NotAString(field)),
    }
}

/// Wraps a JSON notification the way storage-queue producers deliver it.
pub fn encode_notification(json: &str, encoding: PayloadEncoding) -> String {
    match encoding {
        PayloadEncoding::Base64 => STANDARD.encode(json.as_bytes()),
        PayloadEncoding::Plain => json.to_string(),
    }
}
