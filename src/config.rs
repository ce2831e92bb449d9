// ⚙️ Configuration - Environment-driven settings
// .env is loaded first, then RESALE_* variables override the defaults

use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "valuations.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_COMMENTARY: &str = "template";
pub const DEFAULT_LOG_FILTER: &str = "resale_valuation=info,resale_server=info,tower_http=info";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite file holding valuation records
    pub db_path: PathBuf,

    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Commentator name: "template" or "none"
    pub commentary: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            commentary: DEFAULT_COMMENTARY.to_string(),
        }
    }
}

impl Config {
    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> Result<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup (the environment, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup("RESALE_DB_PATH").filter(|v| !v.trim().is_empty()) {
            config.db_path = PathBuf::from(path.trim());
        }

        if let Some(addr) = lookup("RESALE_BIND_ADDR").filter(|v| !v.trim().is_empty()) {
            config.bind_addr = addr.trim().to_string();
        }

        if let Some(name) = lookup("RESALE_COMMENTARY").filter(|v| !v.trim().is_empty()) {
            let name = name.trim().to_ascii_lowercase();
            if crate::commentary::from_name(&name).is_none() {
                bail!("Unknown RESALE_COMMENTARY value: {} (expected 'template' or 'none')", name);
            }
            config.commentary = name;
        }

        Ok(config)
    }
}

/// Initialize tracing with an env filter (RUST_LOG), falling back to info level
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
