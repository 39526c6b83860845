use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::services::{AccountStage, BillingDeps},
    infra::{
        config::AppConfig, postgres_persistence, redis_cache::RedisCache,
        stripe_client::StripeClient, sync_worker::TokioSyncScheduler,
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env()?;

    let postgres_arc = Arc::new(
        postgres_persistence(&config.database_url, config.database_max_connections).await?,
    );
    let cache = Arc::new(RedisCache::new(&config.redis_url).await?);
    let provider = Arc::new(StripeClient::new(&config.stripe)?);

    let services = AccountStage::new(postgres_arc.clone())
        .with_billing(BillingDeps {
            cache,
            provider,
            ledger: postgres_arc,
            fetch_timeout: config.provider_timeout,
            webhook_secret: SecretString::new(config.webhook_secret.expose_secret().into()),
            webhook_tolerance_secs: config.webhook_tolerance_secs,
        })
        .finish(|sync| Arc::new(TokioSyncScheduler::new(sync)));

    info!(
        provider_timeout = ?config.provider_timeout,
        webhook_tolerance_secs = config.webhook_tolerance_secs,
        "Billing services initialized"
    );

    Ok(AppState {
        config: Arc::new(config),
        customer_state_use_cases: services.customer_state,
        webhook_use_cases: services.webhook,
        account_use_cases: services.accounts,
    })
}

/// Installs the global subscriber. Call it before building the app state so
/// startup logs are emitted. `RUST_LOG` sets the filter and
/// `LOG_FORMAT=json` switches to one JSON object per line.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "billing_sync=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
            .ok();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_level(true))
            .try_init()
            .ok();
    }
}
