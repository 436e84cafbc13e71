use anyhow::{Context, Result};
use std::str::FromStr;

use crate::checkout::CheckoutSettings;

/// Centralized application configuration, read from the environment
/// (after `.env` has been loaded by `dotenvy`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub nats_url: Option<String>,
    pub json_logs: bool,
    pub content: ContentConfig,
    pub payments: PaymentConfig,
    pub checkout: CheckoutSettings,
}

#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub api_url: String,
    pub dataset: String,
    pub api_version: String,
    pub token: Option<String>,
}

#[derive(Clone)]
pub struct PaymentConfig {
    pub api_url: String,
    pub secret_key: String,
    pub webhook_secret: String,
    pub webhook_tolerance_secs: i64,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("api_url", &self.api_url)
            .field("secret_key", &"<redacted>")
            .field("webhook_secret", &"<redacted>")
            .field("webhook_tolerance_secs", &self.webhook_tolerance_secs)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| get(key).with_context(|| format!("{} must be set", key));

        let installment_options = match get("INSTALLMENT_OPTIONS") {
            Some(raw) => parse_list::<u32>(&raw).with_context(|| format!("parsing INSTALLMENT_OPTIONS value `{}`", raw))?,
            None => vec![3, 6, 12],
        };
        if installment_options.iter().any(|n| *n < 2) {
            anyhow::bail!("INSTALLMENT_OPTIONS entries must be at least 2");
        }

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(get("PORT"), "PORT", 8083)?,
            database_url: required("DATABASE_URL")?,
            nats_url: get("NATS_URL"),
            json_logs: get("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false),
            content: ContentConfig {
                api_url: required("CONTENT_API_URL")?.trim_end_matches('/').to_string(),
                dataset: get("CONTENT_DATASET").unwrap_or_else(|| "production".into()),
                api_version: get("CONTENT_API_VERSION").unwrap_or_else(|| "2021-10-21".into()),
                token: get("CONTENT_API_TOKEN"),
            },
            payments: PaymentConfig {
                api_url: get("PAYMENT_API_URL").unwrap_or_else(|| "https://api.stripe.com".into()).trim_end_matches('/').to_string(),
                secret_key: required("PAYMENT_SECRET_KEY")?,
                webhook_secret: required("PAYMENT_WEBHOOK_SECRET")?,
                webhook_tolerance_secs: parse_or(get("PAYMENT_WEBHOOK_TOLERANCE_SECS"), "PAYMENT_WEBHOOK_TOLERANCE_SECS", 300)?,
            },
            checkout: CheckoutSettings {
                currency: get("STORE_CURRENCY").unwrap_or_else(|| "usd".into()).to_lowercase(),
                public_url: get("STORE_PUBLIC_URL").unwrap_or_else(|| "http://localhost:3000".into()).trim_end_matches('/').to_string(),
                installment_options,
                max_line_quantity: parse_or(get("MAX_LINE_QUANTITY"), "MAX_LINE_QUANTITY", 99)?,
            },
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value.parse::<T>().with_context(|| format!("parsing {} value `{}`", key, value)),
        None => Ok(default),
    }
}

fn parse_list<T>(raw: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(|s| s.parse::<T>().map_err(anyhow::Error::from)).collect()
}
