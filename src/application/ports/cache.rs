use std::time::Duration;

use async_trait::async_trait;

use crate::app_error::AppResult;

/// String key-value store used for the identity index and snapshots.
///
/// Errors are transport failures (`AppError::Cache`). A missing key is `Ok(None)`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Writes `value` under `key`. `None` stores without expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()>;
}

/// Key layout shared by every cache writer and reader.
pub struct CacheKey;

impl CacheKey {
    /// Serialized snapshot of one provider customer
    pub fn snapshot(customer_id: &str) -> String {
        format!("provider:customer:{customer_id}")
    }

    /// Customer -> account direction of the identity index
    pub fn account_for_customer(customer_id: &str) -> String {
        format!("provider:customer:{customer_id}:accountid")
    }

    /// Account -> customer direction of the identity index
    pub fn customer_for_account(account_id: &str) -> String {
        format!("provider:accountid:{account_id}:customer")
    }
}
