use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// The server answered, but not with a 2xx status.
    #[error("Server responded with status {status}: {text}")]
    Status {
        status: u16,
        /// Response body parsed as JSON, when it was JSON.
        body: Option<Value>,
        /// Raw response body, truncated.
        text: String,
    },

    /// No response was received at all (connect failure, timeout, DNS).
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl TransportError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed = if body.trim().is_empty() {
            None
        } else {
            serde_json::from_str::<Value>(body).ok()
        };
        TransportError::Status {
            status,
            body: parsed,
            text: Self::truncate_body(body),
        }
    }

    /// HTTP status of the response, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}
