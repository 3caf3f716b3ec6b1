//! Application root for the authgate CLI.
//!
//! `App` owns the session manager and the collaborators it was built from,
//! and implements each command on top of them.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use authgate_core::{
    Config, CredentialHandle, ErrorSlot, FileStore, HttpTransport, ReqwestTransport,
    SessionManager, StorageBackend,
};

/// Environment variable supplying the login username
const USERNAME_ENV: &str = "AUTHGATE_USERNAME";

/// Environment variable supplying the login password
const PASSWORD_ENV: &str = "AUTHGATE_PASSWORD";

pub struct App {
    config: Config,
    transport: Arc<ReqwestTransport>,
    errors: ErrorSlot,
    session: SessionManager,
}

impl App {
    pub fn new() -> Result<Self> {
        let mut config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        config.apply_env();
        debug!(base_url = %config.base_url, storage = ?config.storage, "Config loaded");

        let credentials = CredentialHandle::new();
        let transport = Arc::new(
            ReqwestTransport::new(&config.base_url, config.timeout())
                .context("Failed to create HTTP client")?
                .with_interceptor(Arc::new(credentials.clone())),
        );
        let store = config.open_store()?;
        let errors = ErrorSlot::new();

        let session = SessionManager::new(
            transport.clone(),
            store,
            Arc::new(errors.clone()),
            credentials,
        );

        Ok(Self {
            config,
            transport,
            errors,
            session,
        })
    }

    pub async fn login(&mut self, username: Option<String>) -> Result<()> {
        let username = match username
            .or_else(|| std::env::var(USERNAME_ENV).ok())
            .filter(|u| !u.is_empty())
        {
            Some(u) => u,
            None => self.prompt_username()?,
        };
        let password = match std::env::var(PASSWORD_ENV) {
            Ok(p) if !p.is_empty() => p,
            _ => rpassword::prompt_password("Password: ")?,
        };

        if username.is_empty() || password.is_empty() {
            anyhow::bail!("Username and password required");
        }

        eprintln!("Authenticating...");
        match self.session.login(&username, &password).await {
            Ok(session) => {
                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                println!(
                    "Logged in as {} (user id {})",
                    session.username().unwrap_or_default(),
                    session.user_id().unwrap_or_default()
                );
                Ok(())
            }
            Err(e) => {
                let message = self.errors.message().unwrap_or_else(|| e.to_string());
                anyhow::bail!("Login failed: {}", message)
            }
        }
    }

    pub async fn logout(&mut self) -> Result<()> {
        let was_logged_in = self.session.is_logged_in();
        self.session.logout().await;
        if was_logged_in {
            println!("Logged out");
        } else {
            println!("Not logged in");
        }
        Ok(())
    }

    pub fn status(&self) -> Result<()> {
        let session = self.session.session();
        match session.identity() {
            Some(identity) => {
                println!("Logged in as {}", identity.username);
                println!("User ID:     {}", identity.user_id);
            }
            None => println!("Not logged in"),
        }
        println!("Server:      {}", self.transport.base_url());

        if self.config.storage == StorageBackend::File {
            let store = FileStore::new(self.config.cache_dir()?);
            match store.age_display() {
                Some(age) => println!("Storage:     {} (saved {})", store.path().display(), age),
                None => println!("Storage:     {}", store.path().display()),
            }
        } else {
            println!("Storage:     OS keychain");
        }
        Ok(())
    }

    /// GET `path` with the current session credentials and print the JSON body.
    pub async fn get(&self, path: &str) -> Result<()> {
        if !self.session.is_logged_in() {
            warn!("Not logged in, sending request without credentials");
        }
        let body = self
            .transport
            .get_json(path)
            .await
            .with_context(|| format!("GET {} failed", path))?;
        println!("{}", serde_json::to_string_pretty(&body)?);
        Ok(())
    }

    fn prompt_username(&self) -> Result<String> {
        match self.config.last_username {
            Some(ref last) => print!("Username [{}]: ", last),
            None => print!("Username: "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        Ok(match (input.is_empty(), &self.config.last_username) {
            (true, Some(last)) => last.clone(),
            _ => input.to_string(),
        })
    }
}
