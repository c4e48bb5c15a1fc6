mod cors;
mod database;
mod links;
mod logging;
mod server;

pub use cors::CorsConfig;
pub use database::{DatabaseConfig, StoreBackend};
pub use links::LinksConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use server::ServerConfig;

use crate::error::{AppError, AppResult};
use crate::services::short_code::DEFAULT_CODE_LENGTH;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub links: LinksConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let backend: StoreBackend = parse_var(&var("STORE_BACKEND", "postgres"), "STORE_BACKEND")?;
        let database_url = match (backend, lookup("DATABASE_URL")) {
            (_, Some(url)) => url,
            (StoreBackend::Memory, None) => String::new(),
            (StoreBackend::Postgres, None) => {
                return Err(AppError::MissingEnvVar("DATABASE_URL".to_string()))
            }
        };

        let config = Config {
            server: ServerConfig {
                host: var("SERVER_HOST", "127.0.0.1"),
                port: parse_var(&var("SERVER_PORT", "3000"), "SERVER_PORT")?,
            },
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections: parse_var(&var("DB_MAX_CONNECTIONS", "10"), "DB_MAX_CONNECTIONS")?,
                min_connections: parse_var(&var("DB_MIN_CONNECTIONS", "1"), "DB_MIN_CONNECTIONS")?,
                acquire_timeout_seconds: parse_var(
                    &var("DB_ACQUIRE_TIMEOUT_SECONDS", "30"),
                    "DB_ACQUIRE_TIMEOUT_SECONDS",
                )?,
                store_timeout_ms: parse_var(&var("STORE_TIMEOUT_MS", "5000"), "STORE_TIMEOUT_MS")?,
            },
            links: LinksConfig {
                short_code_length: parse_var(
                    &var("SHORT_CODE_LENGTH", &DEFAULT_CODE_LENGTH.to_string()),
                    "SHORT_CODE_LENGTH",
                )?,
                short_code_max_attempts: parse_var(
                    &var("SHORT_CODE_MAX_ATTEMPTS", "10"),
                    "SHORT_CODE_MAX_ATTEMPTS",
                )?,
                base_url: lookup("BASE_URL").filter(|url| !url.trim().is_empty()),
                strict_url_validation: parse_var(
                    &var("STRICT_URL_VALIDATION", "false"),
                    "STRICT_URL_VALIDATION",
                )?,
            },
            cors: CorsConfig {
                allowed_origins: CorsConfig::parse_origins(&var("ALLOWED_ORIGINS", "*")),
            },
            logging: LoggingConfig {
                format: parse_var(&var("LOG_FORMAT", "text"), "LOG_FORMAT")?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> AppResult<()> {
        self.database.validate().map_err(AppError::Configuration)?;
        self.links.validate().map_err(AppError::Configuration)?;
        Ok(())
    }

    /// Public base URL used to build short links
    pub fn base_url(&self) -> String {
        match &self.links.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.server.address()),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.database.store_timeout_ms)
    }
}

fn parse_var<T: FromStr>(value: &str, name: &str) -> AppResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::Configuration(format!("Invalid {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_lookup(lookup(&[("DATABASE_URL", "postgresql://localhost/test")])).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert_eq!(config.links.short_code_length, 6);
        assert_eq!(config.links.short_code_max_attempts, 10);
        assert!(!config.links.strict_url_validation);
        assert_eq!(config.store_timeout(), Duration::from_millis(5000));
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.base_url(), "http://127.0.0.1:3000");
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, AppError::MissingEnvVar(name) if name == "DATABASE_URL"));
    }

    #[test]
    fn test_memory_backend_without_database_url() {
        let config = Config::from_lookup(lookup(&[("STORE_BACKEND", "memory")])).unwrap();
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert!(config.database.url.is_empty());
    }

    #[test]
    fn test_short_code_length_bounds() {
        for length in ["5", "9"] {
            let result = Config::from_lookup(lookup(&[
                ("STORE_BACKEND", "memory"),
                ("SHORT_CODE_LENGTH", length),
            ]));
            assert!(matches!(result, Err(AppError::Configuration(_))));
        }
    }

    #[test]
    fn test_invalid_port() {
        let result = Config::from_lookup(lookup(&[
            ("STORE_BACKEND", "memory"),
            ("SERVER_PORT", "not_a_port"),
        ]));
        assert!(matches!(result, Err(AppError::Configuration(msg)) if msg.contains("SERVER_PORT")));
    }

    #[test]
    fn test_base_url_override_strips_slash() {
        let config = Config::from_lookup(lookup(&[
            ("STORE_BACKEND", "memory"),
            ("BASE_URL", "https://sho.rt/"),
        ]))
        .unwrap();
        assert_eq!(config.base_url(), "https://sho.rt");
    }

    #[test]
    fn test_cors_origins_parsing() {
        let config = Config::from_lookup(lookup(&[
            ("STORE_BACKEND", "memory"),
            ("ALLOWED_ORIGINS", "http://localhost:3000, https://example.com"),
        ]))
        .unwrap();

        assert_eq!(
            config.cors.allowed_origins,
            vec!["http://localhost:3000", "https://example.com"]
        );
        assert!(!config.cors.allows_any());
    }

    #[test]
    fn test_min_connections_above_max() {
        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("DB_MAX_CONNECTIONS", "2"),
            ("DB_MIN_CONNECTIONS", "5"),
        ]));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
