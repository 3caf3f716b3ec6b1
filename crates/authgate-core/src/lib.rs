//! authgate core - client-side session management.
//!
//! Tracks login state, persists the bearer token and identity to a
//! key-value store, and attaches credentials to outgoing HTTP requests.
//!
//! Wiring a session manager:
//!
//! ```no_run
//! use std::sync::Arc;
//! use authgate_core::{Config, CredentialHandle, ErrorSlot, ReqwestTransport, SessionManager};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let credentials = CredentialHandle::new();
//! let transport = ReqwestTransport::new(&config.base_url, config.timeout())?
//!     .with_interceptor(Arc::new(credentials.clone()));
//! let errors = ErrorSlot::new();
//! let manager = SessionManager::new(
//!     Arc::new(transport),
//!     config.open_store()?,
//!     Arc::new(errors.clone()),
//!     credentials,
//! );
//! println!("logged in: {}", manager.is_logged_in());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod store;

pub use api::{HttpTransport, ReqwestTransport, TransportError};
pub use auth::{
    AuthError, CredentialHandle, Credentials, ErrorSink, ErrorSlot, Identity, LoginResponse,
    RequestInterceptor, Session, SessionManager, SessionState,
};
pub use config::{Config, StorageBackend};
pub use store::{FileStore, KeyValueStore, KeyringStore, MemoryStore, StoreError};
