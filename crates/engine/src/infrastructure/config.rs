//! Engine configuration from the environment.
//!
//! `.env.local` then `.env` at the repo root are loaded first; real environment
//! variables win over both. Malformed values fall back to defaults with a warning.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use kidquest_domain::ChildId;

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default simulation rate.
pub const DEFAULT_TICK_HZ: u32 = 60;

/// Default HTTP request timeout.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Default length of the headless demo run.
pub const DEFAULT_DEMO_TICKS: u64 = 3_600;

/// Which backend the engine talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Seeded in-process backend
    #[default]
    Memory,
    /// Remote progress/content API
    Http,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub backend: BackendKind,
    pub api_url: String,
    pub api_token: Option<String>,
    /// Child to play as. The in-memory backend seeds one when absent.
    pub child_id: Option<ChildId>,
    pub tick_hz: u32,
    pub http_timeout: Duration,
    pub demo_ticks: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            child_id: None,
            tick_hz: DEFAULT_TICK_HZ,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            demo_ticks: DEFAULT_DEMO_TICKS,
        }
    }
}

impl EngineConfig {
    /// Load `.env` files from the repo root, then read the process environment.
    pub fn from_env() -> Self {
        load_dotenv_from_repo_root();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Keeps tests off the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let backend = match get("KIDQUEST_BACKEND").as_deref() {
            None | Some("memory") => BackendKind::Memory,
            Some("http") => BackendKind::Http,
            Some(other) => {
                tracing::warn!(value = %other, "Unknown KIDQUEST_BACKEND, using in-memory backend");
                BackendKind::Memory
            }
        };

        let child_id = get("KIDQUEST_CHILD_ID").and_then(|raw| match raw.parse::<ChildId>() {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed KIDQUEST_CHILD_ID");
                None
            }
        });

        let tick_hz = get("KIDQUEST_TICK_HZ")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|hz| *hz > 0)
            .unwrap_or(defaults.tick_hz);

        let http_timeout = get("KIDQUEST_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        let demo_ticks = get("KIDQUEST_DEMO_TICKS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.demo_ticks);

        Self {
            backend,
            api_url: get("KIDQUEST_API_URL").unwrap_or(defaults.api_url),
            api_token: get("KIDQUEST_API_TOKEN"),
            child_id,
            tick_hz,
            http_timeout,
            demo_ticks,
        }
    }
}

fn load_dotenv_from_repo_root() {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        match load_env_file(&path) {
            Ok(true) => tracing::debug!(path = %path.display(), "Loaded env file"),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable env file")
            }
        }
    }
}

/// Load one env file. Returns false when the file does not exist.
fn load_env_file(path: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(dotenvy::Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
