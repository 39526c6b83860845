//! Acyclic service assembly.
//!
//! The account stage owns only the account repository. The billing stage adds the
//! sync engine and everything that reads through it. The scheduler needs the
//! engine and the account service needs the scheduler, so the account service is
//! attached last in `finish`.

use std::{sync::Arc, time::Duration};

use secrecy::SecretString;

use crate::application::{
    ports::{cache::CacheStore, payment_provider::PaymentProviderClient},
    use_cases::{
        account::{AccountRepoTrait, AccountUseCases},
        customer_state::CustomerStateUseCases,
        identity::IdentityIndex,
        ledger::LedgerRepoTrait,
        snapshot::SnapshotCache,
        sync::{CustomerSync, SyncScheduler, SyncUseCases},
        webhook::WebhookUseCases,
    },
};

pub struct BillingDeps {
    pub cache: Arc<dyn CacheStore>,
    pub provider: Arc<dyn PaymentProviderClient>,
    pub ledger: Arc<dyn LedgerRepoTrait>,
    pub fetch_timeout: Duration,
    pub webhook_secret: SecretString,
    pub webhook_tolerance_secs: i64,
}

pub struct AccountStage {
    accounts: Arc<dyn AccountRepoTrait>,
}

impl AccountStage {
    pub fn new(accounts: Arc<dyn AccountRepoTrait>) -> Self {
        Self { accounts }
    }

    pub fn with_billing(self, deps: BillingDeps) -> BillingStage {
        let identity = Arc::new(IdentityIndex::new(deps.cache.clone(), self.accounts.clone()));
        let snapshots = Arc::new(SnapshotCache::new(deps.cache));
        let sync: Arc<dyn CustomerSync> = Arc::new(SyncUseCases::new(
            deps.provider,
            identity.clone(),
            deps.ledger,
            snapshots.clone(),
            deps.fetch_timeout,
        ));
        let customer_state = Arc::new(CustomerStateUseCases::new(
            snapshots,
            sync.clone(),
            identity.clone(),
        ));
        let webhook = Arc::new(WebhookUseCases::new(
            sync.clone(),
            deps.webhook_secret,
            deps.webhook_tolerance_secs,
        ));

        BillingStage {
            accounts: self.accounts,
            identity,
            sync,
            customer_state,
            webhook,
        }
    }
}

pub struct BillingStage {
    accounts: Arc<dyn AccountRepoTrait>,
    identity: Arc<IdentityIndex>,
    sync: Arc<dyn CustomerSync>,
    customer_state: Arc<CustomerStateUseCases>,
    webhook: Arc<WebhookUseCases>,
}

impl BillingStage {
    /// Builds the scheduler from the sync engine and attaches the account service.
    pub fn finish<F>(self, make_scheduler: F) -> Services
    where
        F: FnOnce(Arc<dyn CustomerSync>) -> Arc<dyn SyncScheduler>,
    {
        let scheduler = make_scheduler(self.sync.clone());
        let accounts = Arc::new(AccountUseCases::new(
            self.accounts,
            self.identity.clone(),
            self.customer_state.clone(),
            scheduler,
        ));

        Services {
            identity: self.identity,
            sync: self.sync,
            customer_state: self.customer_state,
            webhook: self.webhook,
            accounts,
        }
    }
}

#[derive(Clone)]
pub struct Services {
    pub identity: Arc<IdentityIndex>,
    pub sync: Arc<dyn CustomerSync>,
    pub customer_state: Arc<CustomerStateUseCases>,
    pub webhook: Arc<WebhookUseCases>,
    pub accounts: Arc<AccountUseCases>,
}
