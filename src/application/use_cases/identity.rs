use std::sync::Arc;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::{
            cache::{CacheKey, CacheStore},
            payment_provider::CustomerId,
        },
        use_cases::account::AccountRepoTrait,
    },
};

/// Bidirectional account <-> customer index.
///
/// The cache holds both directions without expiry; the account table is the
/// fallback. Lookups that miss the cache backfill it, and concurrent backfills
/// write the same value so they are free to race.
pub struct IdentityIndex {
    cache: Arc<dyn CacheStore>,
    accounts: Arc<dyn AccountRepoTrait>,
}

impl IdentityIndex {
    pub fn new(cache: Arc<dyn CacheStore>, accounts: Arc<dyn AccountRepoTrait>) -> Self {
        Self { cache, accounts }
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn resolve_account_id(&self, customer_id: &CustomerId) -> AppResult<Uuid> {
        let key = CacheKey::account_for_customer(customer_id.as_str());

        if let Some(cached) = self.cached(&key).await {
            match Uuid::parse_str(&cached) {
                Ok(account_id) => return Ok(account_id),
                Err(e) => warn!(key = %key, error = %e, "Cached account id is not a UUID"),
            }
        }

        let account_id = self
            .accounts
            .find_account_id_by_customer_id(customer_id.as_str())
            .await?
            .ok_or(AppError::NotFound)?;

        self.backfill(&key, &account_id.to_string()).await;
        Ok(account_id)
    }

    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn resolve_customer_id(&self, account_id: Uuid) -> AppResult<CustomerId> {
        let key = CacheKey::customer_for_account(&account_id.to_string());

        if let Some(cached) = self.cached(&key).await {
            if !cached.is_empty() {
                return Ok(CustomerId::new(cached));
            }
            warn!(key = %key, "Cached customer id is empty");
        }

        let customer_id = self
            .accounts
            .get_by_id(account_id)
            .await?
            .and_then(|a| a.provider_customer_id)
            .ok_or(AppError::NotFound)?;

        self.backfill(&key, &customer_id).await;
        Ok(CustomerId::new(customer_id))
    }

    /// Writes both directions into the cache. The account row is left alone.
    #[instrument(skip(self), fields(account_id = %account_id, customer_id = %customer_id))]
    pub async fn record_mapping(&self, account_id: Uuid, customer_id: &CustomerId) -> AppResult<()> {
        let account = account_id.to_string();
        self.cache
            .set(
                &CacheKey::account_for_customer(customer_id.as_str()),
                &account,
                None,
            )
            .await?;
        self.cache
            .set(&CacheKey::customer_for_account(&account), customer_id.as_str(), None)
            .await?;
        debug!("Identity mapping recorded");
        Ok(())
    }

    async fn cached(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Identity cache read failed, falling back to database");
                None
            }
        }
    }

    async fn backfill(&self, key: &str, value: &str) {
        if let Err(e) = self.cache.set(key, value, None).await {
            warn!(key = %key, error = %e, "Identity cache backfill failed");
        }
    }
}
