//! Environment-driven service configuration.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub nats_url: Option<String>,
    pub admin_emails: Vec<String>,
    pub default_locale: String,
    pub store_currency: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Loads `.env` if present, then reads the process environment.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key).ok())
}

fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let require = |var: &str| lookup(var).ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()));
    let or_default = |var: &str, default: &str| lookup(var).unwrap_or_else(|| default.to_string());

    let port = or_default("PORT", "8083");
    let port = port.parse::<u16>().map_err(|e| ConfigError::InvalidEnvVar { var: "PORT".into(), reason: e.to_string() })?;
    let max = or_default("DATABASE_MAX_CONNECTIONS", "10");
    let database_max_connections = max
        .parse::<u32>()
        .map_err(|e| ConfigError::InvalidEnvVar { var: "DATABASE_MAX_CONNECTIONS".into(), reason: e.to_string() })?;
    if database_max_connections == 0 {
        return Err(ConfigError::InvalidEnvVar { var: "DATABASE_MAX_CONNECTIONS".into(), reason: "must be at least 1".into() });
    }

    let default_locale = or_default("DEFAULT_LOCALE", "ar");
    if default_locale != "ar" && default_locale != "en" {
        return Err(ConfigError::InvalidEnvVar { var: "DEFAULT_LOCALE".into(), reason: format!("`{default_locale}` is not ar or en") });
    }

    Ok(AppConfig {
        database_url: require("DATABASE_URL")?,
        database_max_connections,
        port,
        nats_url: lookup("NATS_URL").filter(|u| !u.trim().is_empty()),
        admin_emails: or_default("ADMIN_EMAILS", "")
            .split(',')
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect(),
        default_locale,
        store_currency: or_default("STORE_CURRENCY", "EGP"),
    })
}
