//! Error types for the driver API client.
//!
//! # Design
//! 401 and 404 get dedicated variants because callers react to them
//! differently: a 401 tears the session down, a 404 on a single-driver load
//! is a terminal "not found" page. Every other non-2xx response lands in
//! `Status`, carrying the backend's message and its per-field validation
//! messages when the error envelope supplies them.

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by `ApiClient` parse methods and transports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server returned 401. The session is no longer valid.
    #[error("{message}")]
    Unauthorized { message: String },

    /// The server returned 404.
    #[error("{message}")]
    NotFound { message: String },

    /// The server returned a non-2xx status other than 401/404.
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        fields: Vec<(String, String)>,
    },

    /// No response was received at all.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The session could not be persisted after login.
    #[error("session store failed: {0}")]
    Session(String),
}

/// Coarse classification used by controllers to pick a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    Validation,
    Generic,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ApiError::NotFound { .. } => ErrorKind::NotFound,
            ApiError::Status { fields, .. } if !fields.is_empty() => ErrorKind::Validation,
            _ => ErrorKind::Generic,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Per-field validation messages, in the order the backend sent them.
    pub fn fields(&self) -> &[(String, String)] {
        match self {
            ApiError::Status { fields, .. } => fields,
            _ => &[],
        }
    }

    /// The message the backend's envelope carried, if it carried one.
    pub fn backend_message(&self) -> Option<&str> {
        let (status, message) = match self {
            ApiError::Unauthorized { message } => (401, message),
            ApiError::NotFound { message } => (404, message),
            ApiError::Status { status, message, .. } => (*status, message),
            _ => return None,
        };
        (*message != generic_message(status)).then_some(message.as_str())
    }

    /// Text to show inline next to a form.
    ///
    /// A field map wins and is flattened into one line; otherwise the error's
    /// own message, or `fallback` when that message is empty.
    pub fn display_message(&self, fallback: &str) -> String {
        let fields = self.fields();
        if !fields.is_empty() {
            return fields
                .iter()
                .map(|(_, message)| message.as_str())
                .collect::<Vec<_>>()
                .join(" ");
        }
        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}

/// The backend's error envelope. Keys other than these two are ignored.
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    fields: Option<serde_json::Map<String, serde_json::Value>>,
}

pub fn generic_message(status: u16) -> String {
    format!("Request failed with status {status}")
}

/// Build the typed error for a non-2xx response.
///
/// Falls back to a generic message when the body is empty, is not JSON, or
/// carries no message.
pub fn decode_error(status: u16, body: &str) -> ApiError {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();

    let message = envelope
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| generic_message(status));

    let fields = envelope
        .fields
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (name, text)
        })
        .collect();

    match status {
        401 => ApiError::Unauthorized { message },
        404 => ApiError::NotFound { message },
        _ => ApiError::Status {
            status,
            message,
            fields,
        },
    }
}
