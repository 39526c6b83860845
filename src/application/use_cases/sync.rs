use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use strum::Display;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_provider::{
            CustomerId, PaymentProviderClient, ProviderPayment, ProviderSubscription,
        },
        use_cases::{
            identity::IdentityIndex,
            ledger::{LedgerRepoTrait, LedgerTx, PaymentRecord, SubscriptionRecord},
            snapshot::{SnapshotCache, build_snapshot},
        },
    },
    domain::entities::customer_snapshot::CustomerProfile,
};

pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

/// Full resync of one provider customer into the database and the cache.
#[async_trait]
pub trait CustomerSync: Send + Sync {
    async fn sync(&self, customer_id: &CustomerId) -> AppResult<()>;
}

// ============================================================================
// Background scheduling
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SyncReason {
    SignIn,
    CustomerLinked,
}

/// Handle to a submitted background sync.
pub struct SyncTicket {
    handle: JoinHandle<AppResult<()>>,
}

impl SyncTicket {
    pub fn new(handle: JoinHandle<AppResult<()>>) -> Self {
        Self { handle }
    }

    /// Waits for the sync to finish and returns its outcome.
    pub async fn wait(self) -> AppResult<()> {
        self.handle
            .await
            .map_err(|e| AppError::Internal(format!("Sync task did not complete: {e}")))?
    }
}

pub trait SyncScheduler: Send + Sync {
    /// Starts a sync in the background. Never blocks on the sync itself.
    fn submit(&self, customer_id: CustomerId, reason: SyncReason) -> SyncTicket;
}

// ============================================================================
// Synchronizer
// ============================================================================

type Fetched = (
    CustomerProfile,
    Vec<ProviderSubscription>,
    Vec<ProviderPayment>,
);

type LockTable = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

pub struct SyncUseCases {
    provider: Arc<dyn PaymentProviderClient>,
    identity: Arc<IdentityIndex>,
    ledger: Arc<dyn LedgerRepoTrait>,
    snapshots: Arc<SnapshotCache>,
    fetch_timeout: Duration,
    locks: LockTable,
}

impl SyncUseCases {
    pub fn new(
        provider: Arc<dyn PaymentProviderClient>,
        identity: Arc<IdentityIndex>,
        ledger: Arc<dyn LedgerRepoTrait>,
        snapshots: Arc<SnapshotCache>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            identity,
            ledger,
            snapshots,
            fetch_timeout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn customer_lock<'a>(&'a self, customer_id: &'a CustomerId) -> AppResult<LockLease<'a>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| AppError::Internal("Sync lock table poisoned".into()))?;
        let lock = locks
            .entry(customer_id.as_str().to_string())
            .or_default()
            .clone();
        Ok(LockLease {
            locks: &self.locks,
            customer_id: customer_id.as_str(),
            lock,
        })
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    async fn fetch(&self, customer_id: &CustomerId) -> AppResult<Fetched> {
        let fetch = async {
            tokio::try_join!(
                self.provider.get_customer(customer_id),
                self.provider.list_subscriptions(customer_id),
                self.provider.list_payments(customer_id),
            )
        };

        tokio::time::timeout(self.fetch_timeout, fetch)
            .await
            .map_err(|_| {
                AppError::Provider(format!(
                    "Provider fetch timed out after {:?}",
                    self.fetch_timeout
                ))
            })?
    }

    async fn sync_locked(&self, customer_id: &CustomerId) -> AppResult<()> {
        let (profile, subscriptions, payments) = self.fetch(customer_id).await?;

        let account_id = match self.identity.resolve_account_id(customer_id).await {
            Ok(id) => id,
            Err(AppError::NotFound) => {
                return Err(AppError::UnresolvedAccount(customer_id.to_string()));
            }
            Err(e) => return Err(e),
        };

        let mut tx = self.ledger.begin().await?;
        if let Err(e) =
            write_records(tx.as_mut(), account_id, customer_id, &subscriptions, &payments).await
        {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            return Err(match e {
                AppError::Persistence(msg) => AppError::Persistence(msg),
                other => AppError::Persistence(other.to_string()),
            });
        }
        tx.commit().await?;

        let snapshot = build_snapshot(profile, &subscriptions, &payments, Utc::now().timestamp());
        match self.snapshots.write_snapshot(customer_id, &snapshot).await {
            Ok(()) => {}
            Err(AppError::Cache(msg)) => {
                warn!(error = %msg, "Snapshot cache write failed, database is up to date");
            }
            Err(e) => return Err(e),
        }

        info!(
            account_id = %account_id,
            subscriptions = subscriptions.len(),
            payments = payments.len(),
            "Customer synced"
        );
        Ok(())
    }
}

#[async_trait]
impl CustomerSync for SyncUseCases {
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn sync(&self, customer_id: &CustomerId) -> AppResult<()> {
        let lease = self.customer_lock(customer_id)?;
        let _guard = lease.lock.lock().await;
        self.sync_locked(customer_id).await
    }
}

/// Shared handle on one customer's sync lock. Dropping it, on completion or
/// cancellation, removes the table entry once nobody else holds or waits on it.
struct LockLease<'a> {
    locks: &'a LockTable,
    customer_id: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for LockLease<'_> {
    fn drop(&mut self) {
        if let Ok(mut locks) = self.locks.lock() {
            // The table and this lease account for two references
            if Arc::strong_count(&self.lock) <= 2 {
                locks.remove(self.customer_id);
            }
        }
    }
}

async fn write_records(
    tx: &mut dyn LedgerTx,
    account_id: uuid::Uuid,
    customer_id: &CustomerId,
    subscriptions: &[ProviderSubscription],
    payments: &[ProviderPayment],
) -> AppResult<()> {
    for subscription in subscriptions {
        let record = SubscriptionRecord::from_provider(account_id, customer_id.as_str(), subscription);
        tx.upsert_subscription(&record).await?;
    }
    for payment in payments {
        let record = PaymentRecord::from_provider(account_id, customer_id.as_str(), payment);
        tx.upsert_payment(&record).await?;
    }
    Ok(())
}
