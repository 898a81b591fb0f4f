//! Process start-up, run once from `main` before serving.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use crate::config::AppConfig;

const ADMIN_CONFIG_ID: &str = "default";

/// Store-wide admin settings, seeded on first start and edited by admins afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettings {
    pub admin_emails: Vec<String>,
    pub default_locale: String,
    pub currency: String,
    pub created_at: String,
}

impl AdminSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            admin_emails: config.admin_emails.clone(),
            default_locale: config.default_locale.clone(),
            currency: config.store_currency.clone(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Applies schema migrations and seeds the admin settings document if missing.
/// Returns whether the settings document was created.
pub async fn run(db: &PgPool, config: &AppConfig) -> anyhow::Result<bool> {
    sqlx::migrate!("./migrations").run(db).await?;
    let settings = serde_json::to_value(AdminSettings::from_config(config))?;
    let inserted = sqlx::query("INSERT INTO admin_config (id, document) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
        .bind(ADMIN_CONFIG_ID)
        .bind(&settings)
        .execute(db)
        .await?
        .rows_affected()
        > 0;
    if inserted {
        tracing::info!(admins = config.admin_emails.len(), "seeded admin configuration");
    } else {
        tracing::debug!("admin configuration already present");
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let config = AppConfig {
            database_url: "postgres://localhost/catalog".into(),
            database_max_connections: 5,
            port: 8083,
            nats_url: None,
            admin_emails: vec!["owner@shop.eg".into()],
            default_locale: "ar".into(),
            store_currency: "EGP".into(),
        };
        let settings = AdminSettings::from_config(&config);
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["adminEmails"][0], "owner@shop.eg");
        assert_eq!(json["defaultLocale"], "ar");
        assert_eq!(json["currency"], "EGP");
    }
}
