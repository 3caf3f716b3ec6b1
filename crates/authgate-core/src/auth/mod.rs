//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `SessionManager`: login/logout against the auth endpoints, persisting the
//!   result to a `KeyValueStore`
//! - `Session`: the observable logged-in/out state and identity
//! - `CredentialHandle`: per-request header source shared with the transport
//! - `ErrorSink`: where login failures are reported for display

pub mod credentials;
pub mod error;
pub mod error_sink;
pub mod manager;
pub mod session;

pub use credentials::{bearer, CredentialHandle, Credentials, RequestInterceptor};
pub use error::AuthError;
pub use error_sink::{ErrorSink, ErrorSlot};
pub use manager::{SessionManager, LOGIN_PATH, LOGOUT_PATH};
pub use session::{Identity, LoginResponse, Session, SessionState};
