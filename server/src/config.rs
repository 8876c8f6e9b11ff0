//! Configuration management for the server.

use std::env;
use std::path::PathBuf;

const DEFAULT_ADMIN_PASSWORD: &str = "admin";
const DEFAULT_VIEWER_PASSWORD: &str = "viewer";
const DEFAULT_INSIGHT_MODEL: &str = "gpt-4o-mini";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL connection URL. Without it the server runs offline.
    pub database_url: Option<String>,
    /// File holding the local copy of the document
    pub local_store_path: PathBuf,
    /// Passwords for the two access levels
    pub credentials: Credentials,
    /// Text-generation service used for insights
    pub insight: InsightConfig,
}

/// The two fixed passwords of the credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub admin_password: String,
    pub viewer_password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            viewer_password: DEFAULT_VIEWER_PASSWORD.to_string(),
        }
    }
}

/// Settings for the insight generator. Insights degrade to an apology when
/// no endpoint is configured.
#[derive(Debug, Clone, Default)]
pub struct InsightConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let database_url = non_empty_var("DATABASE_URL");

        let local_store_path = non_empty_var("LOCAL_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data/state.json"));

        let credentials = Credentials {
            admin_password: non_empty_var("ADMIN_PASSWORD")
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            viewer_password: non_empty_var("VIEWER_PASSWORD")
                .unwrap_or_else(|| DEFAULT_VIEWER_PASSWORD.to_string()),
        };
        if credentials.admin_password == credentials.viewer_password {
            return Err(ConfigError::AmbiguousPasswords);
        }

        let insight = InsightConfig {
            api_url: non_empty_var("INSIGHT_API_URL"),
            api_key: non_empty_var("INSIGHT_API_KEY"),
            model: non_empty_var("INSIGHT_MODEL")
                .unwrap_or_else(|| DEFAULT_INSIGHT_MODEL.to_string()),
        };

        Ok(Self {
            host,
            port,
            database_url,
            local_store_path,
            credentials,
            insight,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("ADMIN_PASSWORD and VIEWER_PASSWORD must differ")]
    AmbiguousPasswords,
}
