use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

/// Configuration for the application
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,
    /// Size of the connection pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Where log lines go; the terminal belongs to the UI
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Apply the bundled migrations on startup
    #[serde(default)]
    pub run_migrations: bool,
    /// Email of the user to sign in as without showing the picker
    #[serde(default)]
    pub default_user: Option<String>,
}

fn default_max_connections() -> u32 {
    5
}

fn default_log_file() -> String {
    "workforce_manager.log".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        dotenv().ok();

        Self::from_pairs(std::env::vars())
    }

    /// Build a config from explicit key/value pairs instead of the process environment
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter::<_, Config>(pairs)?)
    }

    /// Get a direct reference to the database URL
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    Config::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_fill_optional_settings() {
        let config = Config::from_pairs(pairs(&[("DATABASE_URL", "postgres://localhost/wfm")])).unwrap();
        assert_eq!(config.database_url(), "postgres://localhost/wfm");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.log_file, "workforce_manager.log");
        assert_eq!(config.log_level(), tracing::Level::INFO);
        assert!(!config.run_migrations);
        assert!(config.default_user.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = Config::from_pairs(pairs(&[
            ("DATABASE_URL", "postgres://db/wfm"),
            ("MAX_CONNECTIONS", "12"),
            ("LOG_LEVEL", "debug"),
            ("RUN_MIGRATIONS", "true"),
            ("DEFAULT_USER", "admin@example.com"),
        ]))
        .unwrap();
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
        assert!(config.run_migrations);
        assert_eq!(config.default_user.as_deref(), Some("admin@example.com"));
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(Config::from_pairs(pairs(&[("LOG_LEVEL", "warn")])).is_err());
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = Config::from_pairs(pairs(&[("DATABASE_URL", "x"), ("LOG_LEVEL", "loud")])).unwrap();
        assert_eq!(config.log_level(), tracing::Level::INFO);
    }
}
