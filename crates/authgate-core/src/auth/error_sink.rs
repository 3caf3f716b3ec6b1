use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::warn;

/// UI-facing receiver of authentication failures.
pub trait ErrorSink: Send + Sync {
    /// Replace the displayed error with `payload`.
    fn set(&self, payload: Value);

    /// Remove any displayed error.
    fn clear(&self);
}

/// Latest-error cell that a front end polls to render the current error.
#[derive(Debug, Clone, Default)]
pub struct ErrorSlot {
    latest: Arc<Mutex<Option<Value>>>,
}

impl ErrorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Value> {
        self.latest.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.lock().unwrap_or_else(|e| e.into_inner()).is_none()
    }

    /// Human-readable form of the current error, if any.
    ///
    /// Uses the payload's `message` (or `error`) field when present and falls
    /// back to the raw JSON.
    pub fn message(&self) -> Option<String> {
        self.get().map(|payload| describe(&payload))
    }
}

impl ErrorSink for ErrorSlot {
    fn set(&self, payload: Value) {
        warn!(error = %payload, "Authentication error");
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(payload);
    }

    fn clear(&self) {
        *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

fn describe(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["message", "error"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| payload.to_string()),
        other => other.to_string(),
    }
}
