use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use authgate_core::{
    CredentialHandle, ErrorSlot, FileStore, HttpTransport, KeyValueStore, RequestInterceptor,
    ReqwestTransport, SessionManager, SessionState, TransportError,
};

/// Auth server stand-in: accepts one password, records request headers.
struct StubServer {
    credentials: CredentialHandle,
    logout_status: u16,
    requests: Mutex<Vec<(String, Vec<(&'static str, String)>)>>,
}

impl StubServer {
    fn new(credentials: CredentialHandle, logout_status: u16) -> Self {
        Self {
            credentials,
            logout_status,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, path: &str) -> Vec<(&'static str, String)> {
        let headers = self.credentials.headers();
        self.requests
            .lock()
            .unwrap()
            .push((path.to_string(), headers.clone()));
        headers
    }
}

#[async_trait]
impl HttpTransport for StubServer {
    async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Result<Value, TransportError> {
        self.record(path);
        let username = fields.iter().find(|(k, _)| *k == "username").map(|(_, v)| *v);
        let password = fields.iter().find(|(k, _)| *k == "password").map(|(_, v)| *v);
        match (username, password) {
            (Some("alice"), Some("pw")) => {
                Ok(json!({"token": "abc", "userID": "1", "username": "alice"}))
            }
            _ => Err(TransportError::from_status(
                401,
                r#"{"message":"bad credentials"}"#,
            )),
        }
    }

    async fn post_empty(&self, path: &str) -> Result<u16, TransportError> {
        self.record(path);
        Ok(self.logout_status)
    }

    async fn get_json(&self, path: &str) -> Result<Value, TransportError> {
        let headers = self.record(path);
        if headers.iter().any(|(k, v)| *k == "Authorization" && v == "Bearer abc") {
            Ok(json!({"ok": true}))
        } else {
            Err(TransportError::from_status(401, ""))
        }
    }
}

fn open(dir: &std::path::Path, logout_status: u16) -> (SessionManager, Arc<StubServer>, Arc<FileStore>, ErrorSlot) {
    let credentials = CredentialHandle::new();
    let server = Arc::new(StubServer::new(credentials.clone(), logout_status));
    let store = Arc::new(FileStore::new(dir));
    let errors = ErrorSlot::new();
    let manager = SessionManager::new(
        server.clone(),
        store.clone(),
        Arc::new(errors.clone()),
        credentials,
    );
    (manager, server, store, errors)
}

#[tokio::test]
async fn session_survives_restart_and_logout_clears_it() {
    let dir = tempfile::tempdir().unwrap();

    let (mut manager, server, store, errors) = open(dir.path(), 200);
    assert_eq!(manager.state(), SessionState::LoggedOut);
    assert!(server.get_json("/api/me").await.is_err());

    manager.login("alice", "pw").await.unwrap();
    assert!(errors.is_empty());
    assert_eq!(store.get("token").as_deref(), Some("Bearer abc"));
    assert_eq!(server.get_json("/api/me").await.unwrap(), json!({"ok": true}));
    drop(manager);

    // A fresh process restores the session without touching the network
    let (mut restored, server, store, _) = open(dir.path(), 200);
    assert_eq!(restored.state(), SessionState::LoggedIn);
    assert_eq!(restored.session().user_id(), Some("1"));
    assert_eq!(restored.session().username(), Some("alice"));
    assert!(server.requests.lock().unwrap().is_empty());
    assert!(server.get_json("/api/me").await.is_ok());

    restored.logout().await;
    assert_eq!(restored.state(), SessionState::LoggedOut);
    assert!(store.get("token").is_none());
    assert!(!store.path().exists());
    assert!(server.get_json("/api/me").await.is_err());
}

#[tokio::test]
async fn rejected_login_leaves_storage_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let (mut manager, _server, store, errors) = open(dir.path(), 200);

    let result = manager.login("alice", "nope").await;

    assert!(result.is_err());
    assert_eq!(errors.get(), Some(json!({"message": "bad credentials"})));
    assert_eq!(errors.message().as_deref(), Some("bad credentials"));
    assert!(!manager.is_logged_in());
    assert!(!store.path().exists());
}

#[tokio::test]
async fn logout_with_server_error_still_clears_session() {
    let dir = tempfile::tempdir().unwrap();
    let (mut manager, server, store, errors) = open(dir.path(), 500);

    manager.login("alice", "pw").await.unwrap();
    manager.logout().await;
    manager.logout().await;

    assert!(!manager.is_logged_in());
    assert!(store.get("token").is_none());
    assert!(store.get("userID").is_none());
    assert!(store.get("username").is_none());
    assert!(errors.is_empty());

    let paths: Vec<String> = server
        .requests
        .lock()
        .unwrap()
        .iter()
        .map(|(p, _)| p.clone())
        .collect();
    assert_eq!(paths, vec!["/auth/login", "/auth/logout", "/auth/logout"]);
}

#[tokio::test]
async fn login_over_http_authenticates_later_requests() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = mockito::Server::new_async().await;
    let login = server
        .mock("POST", "/auth/login")
        .match_body(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("username".into(), "alice".into()),
            mockito::Matcher::UrlEncoded("password".into(), "pw".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token":"abc","userID":"1","username":"alice"}"#)
        .create_async()
        .await;
    let me = server
        .mock("GET", "/api/me")
        .match_header("authorization", "Bearer abc")
        .match_header("userid", "1")
        .match_header("username", "alice")
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;
    let logout = server
        .mock("POST", "/auth/logout")
        .match_header("authorization", "Bearer abc")
        .with_status(204)
        .create_async()
        .await;

    let credentials = CredentialHandle::new();
    let transport = Arc::new(
        ReqwestTransport::new(&server.url(), Duration::from_secs(5))
            .unwrap()
            .with_interceptor(Arc::new(credentials.clone())),
    );
    let store = Arc::new(FileStore::new(dir.path()));
    let errors = ErrorSlot::new();
    let mut manager = SessionManager::new(
        transport.clone(),
        store.clone(),
        Arc::new(errors.clone()),
        credentials,
    );

    manager.login("alice", "pw").await.unwrap();
    assert_eq!(transport.get_json("/api/me").await.unwrap(), json!({"ok": true}));

    // A 204 logout is only a warning; the session is still cleared
    manager.logout().await;
    assert!(!manager.is_logged_in());
    assert!(store.get("token").is_none());
    assert!(errors.is_empty());

    login.assert_async().await;
    me.assert_async().await;
    logout.assert_async().await;
}
