//! authgate - log in to an auth server and keep the session on disk.
//!
//! Commands operate on the session stored by previous invocations, so a
//! `login` followed by any number of `get` calls reuses the same credential.

mod app;

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

/// Set to any non-empty value to also log to `authgate.log` in the cache directory
const LOG_FILE_ENV: &str = "AUTHGATE_LOG_FILE";

const USAGE: &str = "\
Usage: authgate <command>

Commands:
  login [username]   Log in and store the session
  logout             Log out and clear the stored session
  status             Show the stored session
  get <path>         GET a path on the server with the session credentials
  help               Show this message

Environment:
  AUTHGATE_BASE_URL   Auth server base URL
  AUTHGATE_USERNAME   Username for login
  AUTHGATE_PASSWORD   Password for login (prompted otherwise)
  AUTHGATE_LOG_FILE   Also write logs to the cache directory
  RUST_LOG            Log filter (default: warn)";

/// Initialize the tracing subscriber for logging.
/// The returned guard must live until exit so buffered file logs are flushed.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = std::env::var(LOG_FILE_ENV)
        .ok()
        .filter(|v| !v.is_empty())
        .and_then(|_| authgate_core::Config::default().cache_dir().ok());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, "authgate.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("help");

    if matches!(command, "help" | "--help" | "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut app = App::new()?;
    info!(command = command, "authgate starting");

    match command {
        "login" => app.login(args.get(1).cloned()).await,
        "logout" => app.logout().await,
        "status" => app.status(),
        "get" => match args.get(1) {
            Some(path) => app.get(path).await,
            None => anyhow::bail!("Missing path\n\n{}", USAGE),
        },
        other => anyhow::bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
}
