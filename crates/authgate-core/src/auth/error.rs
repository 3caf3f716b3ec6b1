use serde_json::Value;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The login request failed. `payload` is what was delivered to the error sink.
    #[error("Login failed: {payload}")]
    LoginFailed { payload: Value },

    #[error("Failed to persist session: {0}")]
    Storage(#[from] StoreError),
}

impl AuthError {
    pub fn payload(&self) -> Option<&Value> {
        match self {
            AuthError::LoginFailed { payload } => Some(payload),
            AuthError::Storage(_) => None,
        }
    }
}
