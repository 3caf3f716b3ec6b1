use std::sync::{Arc, RwLock};

/// Header carrying the bearer credential.
pub const AUTHORIZATION_HEADER: &str = "Authorization";
/// Header carrying the opaque user id.
pub const USER_ID_HEADER: &str = "UserID";
/// Header carrying the display username.
pub const USERNAME_HEADER: &str = "Username";

/// Prefix applied to raw tokens before they are stored or sent.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Credentials attached to every authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Full header value, including the `Bearer ` prefix.
    pub token: String,
    pub user_id: String,
    pub username: String,
}

impl Credentials {
    /// Build credentials from a raw server token.
    pub fn from_raw_token(raw: &str, user_id: String, username: String) -> Self {
        Self {
            token: bearer(raw),
            user_id,
            username,
        }
    }
}

/// Prefix a raw token as a bearer credential.
pub fn bearer(raw: &str) -> String {
    format!("{}{}", BEARER_PREFIX, raw)
}

/// Per-request hook contributing headers to outgoing HTTP requests.
pub trait RequestInterceptor: Send + Sync {
    fn headers(&self) -> Vec<(&'static str, String)>;
}

/// Shared, cheaply clonable cell holding the current session credentials.
///
/// The session manager writes it on login/logout; transports read it on
/// every request through [`RequestInterceptor`].
#[derive(Debug, Clone, Default)]
pub struct CredentialHandle {
    inner: Arc<RwLock<Option<Credentials>>>,
}

impl CredentialHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, credentials: Credentials) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(credentials);
    }

    pub fn clear(&self) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }

    pub fn get(&self) -> Option<Credentials> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl RequestInterceptor for CredentialHandle {
    fn headers(&self) -> Vec<(&'static str, String)> {
        match self.get() {
            Some(c) => vec![
                (AUTHORIZATION_HEADER, c.token),
                (USER_ID_HEADER, c.user_id),
                (USERNAME_HEADER, c.username),
            ],
            None => Vec::new(),
        }
    }
}
