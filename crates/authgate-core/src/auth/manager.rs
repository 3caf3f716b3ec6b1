//! Session manager: the login/logout state machine.
//!
//! `LoggedOut --login ok--> LoggedIn --logout--> LoggedOut`. A failed login
//! leaves the current state untouched; logout always succeeds locally.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{HttpTransport, TransportError};
use crate::store::{KeyValueStore, StoreError, SESSION_KEYS, TOKEN_KEY, USERNAME_KEY, USER_ID_KEY};

use super::credentials::{CredentialHandle, Credentials};
use super::error::AuthError;
use super::error_sink::ErrorSink;
use super::session::{Identity, LoginResponse, Session, SessionState};

/// Login endpoint, form fields `username` and `password`
pub const LOGIN_PATH: &str = "/auth/login";

/// Logout endpoint, POST with no body
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Reported when the login request never produced a response
pub const NETWORK_UNREACHABLE_MESSAGE: &str = "network unreachable";

/// Reported when the server accepted the login but the body was unusable
pub const INVALID_RESPONSE_MESSAGE: &str = "invalid login response";

pub struct SessionManager {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn KeyValueStore>,
    errors: Arc<dyn ErrorSink>,
    credentials: CredentialHandle,
    session: Session,
    changes: watch::Sender<Session>,
}

impl SessionManager {
    /// Restore the session from `store`. Makes no network call.
    ///
    /// `credentials` should be the same handle the transport reads headers
    /// from; it is primed here when a stored token is found.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn KeyValueStore>,
        errors: Arc<dyn ErrorSink>,
        credentials: CredentialHandle,
    ) -> Self {
        let session = match store.get(TOKEN_KEY).filter(|t| !t.is_empty()) {
            Some(token) => {
                let identity = Identity {
                    user_id: store.get(USER_ID_KEY).unwrap_or_default(),
                    username: store.get(USERNAME_KEY).unwrap_or_default(),
                };
                debug!(username = %identity.username, "Restored stored session");
                credentials.set(Credentials {
                    token,
                    user_id: identity.user_id.clone(),
                    username: identity.username.clone(),
                });
                Session::logged_in(identity)
            }
            None => {
                debug!("No stored session");
                credentials.clear();
                Session::default()
            }
        };

        let (changes, _) = watch::channel(session.clone());

        Self {
            transport,
            store,
            errors,
            credentials,
            session,
            changes,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    /// Credentials currently attached to outgoing requests.
    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials.get()
    }

    /// Observe every change to the session.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.changes.subscribe()
    }

    /// Log in with a single attempt.
    ///
    /// On failure the error payload has already been delivered to the error
    /// sink when this returns, and the session, store and request credentials
    /// are exactly as they were before the call.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Session, AuthError> {
        info!(username = username, "Logging in");

        let body = match self
            .transport
            .post_form(LOGIN_PATH, &[("username", username), ("password", password)])
            .await
        {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Login request failed");
                return Err(self.reject(failure_payload(&e)));
            }
        };

        let response: LoginResponse = match serde_json::from_value(body) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Failed to parse login response");
                return Err(self.reject(json!({ "message": INVALID_RESPONSE_MESSAGE })));
            }
        };

        self.errors.clear();

        let credentials =
            Credentials::from_raw_token(&response.token, response.user_id, response.username);

        if let Err(e) = self.persist(&credentials) {
            warn!(error = %e, "Failed to persist session");
            self.errors.set(json!({ "message": e.to_string() }));
            return Err(AuthError::Storage(e));
        }

        let identity = Identity {
            user_id: credentials.user_id.clone(),
            username: credentials.username.clone(),
        };
        self.credentials.set(credentials);
        self.replace(Session::logged_in(identity));

        info!(user_id = ?self.session.user_id(), "Login successful");
        Ok(self.session.clone())
    }

    /// Log out. Always succeeds locally.
    ///
    /// The server is notified on a best-effort basis: a non-200 status or a
    /// failed request is logged and otherwise ignored. Nothing is reported to
    /// the error sink.
    pub async fn logout(&mut self) {
        match self.transport.post_empty(LOGOUT_PATH).await {
            Ok(200) => debug!("Logout acknowledged by server"),
            Ok(status) => warn!(status = status, "Logout response status is not 200"),
            Err(e) => warn!(error = %e, "Logout request failed"),
        }

        for key in SESSION_KEYS {
            if let Err(e) = self.store.remove(key) {
                warn!(key = key, error = %e, "Failed to remove stored session entry");
            }
        }

        self.credentials.clear();
        self.replace(Session::default());
        info!("Logged out");
    }

    fn reject(&self, payload: Value) -> AuthError {
        self.errors.set(payload.clone());
        AuthError::LoginFailed { payload }
    }

    fn replace(&mut self, session: Session) {
        self.session = session.clone();
        self.changes.send_replace(session);
    }

    /// Write all session keys, restoring the previous values if any write fails.
    fn persist(&self, credentials: &Credentials) -> Result<(), StoreError> {
        let values = [
            (TOKEN_KEY, credentials.token.as_str()),
            (USER_ID_KEY, credentials.user_id.as_str()),
            (USERNAME_KEY, credentials.username.as_str()),
        ];
        let previous: Vec<(&str, Option<String>)> =
            values.iter().map(|(k, _)| (*k, self.store.get(k))).collect();

        if let Err(e) = self.store.set_many(&values) {
            self.restore(&previous);
            return Err(e);
        }
        Ok(())
    }

    fn restore(&self, previous: &[(&str, Option<String>)]) {
        for (key, value) in previous {
            let result = match value {
                Some(v) => self.store.set(key, v),
                None => self.store.remove(key),
            };
            if let Err(e) = result {
                warn!(key = *key, error = %e, "Failed to restore stored session entry");
            }
        }
    }
}

/// Error payload delivered to the sink for a failed login request.
fn failure_payload(err: &TransportError) -> Value {
    match err {
        TransportError::Status {
            body: Some(body), ..
        } if !body.is_null() => body.clone(),
        TransportError::Status { status, text, .. } if !text.trim().is_empty() => {
            json!({ "message": text, "status": status })
        }
        TransportError::Status { status, .. } => {
            json!({ "message": "login failed", "status": status })
        }
        TransportError::Network(_) => json!({ "message": NETWORK_UNREACHABLE_MESSAGE }),
        TransportError::Decode(_) => json!({ "message": INVALID_RESPONSE_MESSAGE }),
    }
}
