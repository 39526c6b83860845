use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use env_helpers::get_env_default;
use secrecy::SecretString;
use url::Url;

use super::{InfraError, stripe_client::StripeConfig};
use crate::application::use_cases::{
    sync::DEFAULT_PROVIDER_TIMEOUT_SECS, webhook::DEFAULT_WEBHOOK_TOLERANCE_SECS,
};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub cors_origin: HeaderValue,
    /// Provider REST client settings, injected into the client at construction.
    pub stripe: StripeConfig,
    /// Shared secret for the `Stripe-Signature` HMAC.
    pub webhook_secret: SecretString,
    /// Maximum accepted age of a signed webhook, in seconds.
    pub webhook_tolerance_secs: i64,
    /// Upper bound on the provider fetch phase of one sync.
    pub provider_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let bind_addr: SocketAddr = parse_var("BIND_ADDR", "127.0.0.1:3001")?;
        let database_url = required("DATABASE_URL")?;
        let database_max_connections: u32 = get_env_default("DATABASE_MAX_CONNECTIONS", 5);
        let redis_url: String =
            get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let cors_origin: HeaderValue = parse_var("CORS_ORIGIN", "http://localhost:3000")?;

        let provider_timeout_secs: u64 =
            get_env_default("PROVIDER_TIMEOUT_SECS", DEFAULT_PROVIDER_TIMEOUT_SECS);
        let provider_timeout = Duration::from_secs(provider_timeout_secs);

        let api_base: Url = parse_var("STRIPE_API_BASE", STRIPE_API_BASE)?;
        let stripe = StripeConfig {
            secret_key: SecretString::new(required("STRIPE_SECRET_KEY")?.into()),
            api_base: api_base.to_string(),
            timeout: provider_timeout,
        };
        let webhook_secret = SecretString::new(required("STRIPE_WEBHOOK_SECRET")?.into());
        let webhook_tolerance_secs: i64 =
            get_env_default("WEBHOOK_TOLERANCE_SECS", DEFAULT_WEBHOOK_TOLERANCE_SECS);

        if webhook_tolerance_secs <= 0 {
            return Err(InfraError::ConfigInvalid {
                var: "WEBHOOK_TOLERANCE_SECS",
            });
        }

        Ok(Self {
            bind_addr,
            database_url,
            database_max_connections,
            redis_url,
            cors_origin,
            stripe,
            webhook_secret,
            webhook_tolerance_secs,
            provider_timeout,
        })
    }
}

fn required(var: &'static str) -> Result<String, InfraError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(InfraError::ConfigMissing { var }),
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: &str) -> Result<T, InfraError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|_| InfraError::ConfigInvalid { var })
}
