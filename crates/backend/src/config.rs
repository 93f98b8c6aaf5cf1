use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_pool_size: usize,
    pub database_tls: bool,
    pub port: u16,
    pub jwt_secret: String,
    pub token_duration_days: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub login_rate_limit_per_minute: u32,
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,
    pub frontend_dir: String,
}

impl AppConfig {
    /// Load configuration from the process environment (and `.env`).
    ///
    /// `DATABASE_URL` and `JWT_SECRET` are required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("database_pool_size", 10)?
            .set_default("database_tls", false)?
            .set_default("port", 3000)?
            .set_default("token_duration_days", 7)?
            .set_default("cookie_name", "shiftsync_token")?
            .set_default("cookie_secure", false)?
            .set_default("login_rate_limit_per_minute", 10)?
            .set_default("frontend_dir", "crates/frontend/dist")?
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .context("failed to read configuration")?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("DATABASE_URL and JWT_SECRET must be set")?;

        if config.jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET cannot be empty");
        }
        if config.login_rate_limit_per_minute == 0 {
            anyhow::bail!("LOGIN_RATE_LIMIT_PER_MINUTE must be at least 1");
        }

        Ok(config)
    }

    /// Parsed `CORS_ALLOWED_ORIGINS`; empty when unset.
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        AppConfig {
            database_url: "postgres://localhost/shiftsync_test".to_string(),
            database_pool_size: 2,
            database_tls: false,
            port: 3000,
            jwt_secret: "test-secret-key-for-testing-only".to_string(),
            token_duration_days: 7,
            cookie_name: "shiftsync_token".to_string(),
            cookie_secure: false,
            login_rate_limit_per_minute: 10,
            cors_allowed_origins: None,
            frontend_dir: "crates/frontend/dist".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_origins_parsing() {
        let mut config = AppConfig::for_tests();
        assert!(config.cors_origins().is_empty());

        config.cors_allowed_origins =
            Some(" http://localhost:8080 , ,https://shiftsync.app".to_string());
        assert_eq!(
            config.cors_origins(),
            vec!["http://localhost:8080", "https://shiftsync.app"]
        );
    }

    #[test]
    fn test_config_defaults_from_env() {
        std::env::set_var("DATABASE_URL", "postgres://localhost/shiftsync");
        std::env::set_var("JWT_SECRET", "from-env");

        let config = tokio_test::assert_ok!(AppConfig::from_env());
        assert_eq!(config.database_url, "postgres://localhost/shiftsync");
        assert_eq!(config.jwt_secret, "from-env");
        assert_eq!(config.cookie_name, "shiftsync_token");
        assert_eq!(config.token_duration_days, 7);
        assert!(config.database_pool_size >= 1);
    }
}
