//! Test app state builder for HTTP-level integration testing.
//!
//! `TestAppStateBuilder` wires the real use cases against in-memory ports. The
//! cache, ledger and provider are public so tests can keep a handle for
//! assertions before calling `build`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use secrecy::SecretString;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        ports::payment_provider::{ProviderPayment, ProviderSubscription},
        use_cases::{
            account::AccountProfile,
            services::{AccountStage, BillingDeps},
        },
    },
    domain::entities::customer_snapshot::CustomerProfile,
    infra::{config::AppConfig, stripe_client::StripeConfig, sync_worker::TokioSyncScheduler},
    test_utils::{
        InMemoryAccountRepo, InMemoryCache, InMemoryLedger, StubProviderClient,
        TEST_WEBHOOK_SECRET,
    },
};

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let builder = TestAppStateBuilder::new()
///     .with_account(create_test_account(|a| a.provider_customer_id = Some("cus_1".into())))
///     .with_customer(create_test_customer(|c| c.id = "cus_1".into()));
/// let ledger = builder.ledger.clone();
/// let app_state = builder.build();
/// ```
pub struct TestAppStateBuilder {
    accounts: Vec<AccountProfile>,
    pub cache: Arc<InMemoryCache>,
    pub ledger: Arc<InMemoryLedger>,
    pub provider: Arc<StubProviderClient>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            accounts: vec![],
            cache: Arc::new(InMemoryCache::new()),
            ledger: Arc::new(InMemoryLedger::new()),
            provider: Arc::new(StubProviderClient::new()),
        }
    }

    /// Add an account row.
    pub fn with_account(mut self, account: AccountProfile) -> Self {
        self.accounts.push(account);
        self
    }

    /// Register a customer with the stub provider.
    pub fn with_customer(self, customer: CustomerProfile) -> Self {
        self.provider.insert_customer(customer);
        self
    }

    pub fn with_subscriptions(self, subscriptions: Vec<ProviderSubscription>) -> Self {
        self.provider.set_subscriptions(subscriptions);
        self
    }

    pub fn with_payments(self, payments: Vec<ProviderPayment>) -> Self {
        self.provider.set_payments(payments);
        self
    }

    /// Build the AppState with all configured mocks.
    pub fn build(self) -> AppState {
        let accounts = Arc::new(InMemoryAccountRepo::with_accounts(self.accounts));

        let services = AccountStage::new(accounts)
            .with_billing(BillingDeps {
                cache: self.cache,
                provider: self.provider,
                ledger: self.ledger,
                fetch_timeout: Duration::from_secs(5),
                webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
                webhook_tolerance_secs: 300,
            })
            .finish(|sync| Arc::new(TokioSyncScheduler::new(sync)));

        // Create minimal config for testing
        let config = Arc::new(AppConfig {
            bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
            database_url: String::new(),
            database_max_connections: 1,
            redis_url: String::new(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            stripe: StripeConfig {
                secret_key: SecretString::new("sk_test_unused".into()),
                api_base: "http://127.0.0.1:0".to_string(),
                timeout: Duration::from_secs(5),
            },
            webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
            webhook_tolerance_secs: 300,
            provider_timeout: Duration::from_secs(5),
        });

        AppState {
            config,
            customer_state_use_cases: services.customer_state,
            webhook_use_cases: services.webhook,
            account_use_cases: services.accounts,
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
