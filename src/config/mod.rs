use anyhow::{Context, Result};
use tracing::warn;

/// Default query endpoint for the Alpha Vantage API.
pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Target table for daily prices. Assumed to pre-exist with a compatible
/// schema; this program never creates or alters it.
pub const DAILY_PRICES_TABLE: &str = "precios_diarios";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level application configuration, built once at process entry and
/// passed by parameter into the stages that need it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
}

/// Price API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Relational store configuration. Host may carry an explicit port
/// (`db.internal:3307`).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
    pub table: String,
}

impl AppConfig {
    /// Load configuration from a `.env` file plus the process environment.
    ///
    /// Required: `API_KEY`, `DB_HOST`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`.
    /// A missing value fails here, before any pipeline stage runs.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let env = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("Failed to read process environment")?;

        Ok(Self {
            api: ApiConfig {
                key: required(&env, "api_key")?,
                base_url: env
                    .get_string("api_base_url")
                    .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
                timeout_secs: timeout_secs(&env),
            },
            database: DatabaseConfig {
                host: required(&env, "db_host")?,
                user: required(&env, "db_user")?,
                password: required(&env, "db_password")?,
                name: required(&env, "db_name")?,
                table: env
                    .get_string("db_table")
                    .unwrap_or_else(|_| DAILY_PRICES_TABLE.to_string()),
            },
        })
    }
}

fn required(env: &config::Config, key: &str) -> Result<String> {
    env.get_string(key)
        .with_context(|| format!("Missing required environment variable {}", key.to_uppercase()))
}

/// Optional request timeout. Absent falls back quietly; a value that fails
/// to parse falls back with a warning.
fn timeout_secs(env: &config::Config) -> u64 {
    match env.get_int("api_timeout_secs") {
        Ok(v) => v as u64,
        Err(config::ConfigError::NotFound(_)) => DEFAULT_TIMEOUT_SECS,
        Err(e) => {
            warn!(
                "Ignoring unparseable API_TIMEOUT_SECS ({}); using {}s",
                e, DEFAULT_TIMEOUT_SECS
            );
            DEFAULT_TIMEOUT_SECS
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with_timeout(value: &str) -> config::Config {
        config::Config::builder()
            .set_override("api_timeout_secs", value)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn valid_timeout_is_used() {
        assert_eq!(timeout_secs(&env_with_timeout("10")), 10);
    }

    #[test]
    fn malformed_timeout_falls_back_to_default() {
        assert_eq!(timeout_secs(&env_with_timeout("abc")), DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn absent_timeout_falls_back_to_default() {
        let env = config::Config::builder().build().unwrap();
        assert_eq!(timeout_secs(&env), DEFAULT_TIMEOUT_SECS);
    }
}
