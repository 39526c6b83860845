//! In-memory implementations of the account, cache and ledger ports.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::cache::CacheStore,
        use_cases::{
            account::{AccountProfile, AccountRepoTrait},
            ledger::{LedgerRepoTrait, LedgerTx, PaymentRecord, SubscriptionRecord},
        },
    },
};

// ============================================================================
// InMemoryAccountRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryAccountRepo {
    pub accounts: Mutex<HashMap<Uuid, AccountProfile>>,
}

impl InMemoryAccountRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: Vec<AccountProfile>) -> Self {
        let map = accounts.into_iter().map(|a| (a.id, a)).collect();
        Self {
            accounts: Mutex::new(map),
        }
    }

    pub fn get(&self, account_id: Uuid) -> Option<AccountProfile> {
        self.accounts.lock().unwrap().get(&account_id).cloned()
    }
}

#[async_trait]
impl AccountRepoTrait for InMemoryAccountRepo {
    async fn get_by_id(&self, account_id: Uuid) -> AppResult<Option<AccountProfile>> {
        Ok(self.get(account_id))
    }

    async fn find_account_id_by_customer_id(&self, customer_id: &str) -> AppResult<Option<Uuid>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.provider_customer_id.as_deref() == Some(customer_id))
            .map(|a| a.id))
    }

    async fn set_customer_id_if_unset(
        &self,
        account_id: Uuid,
        customer_id: &str,
    ) -> AppResult<Option<AccountProfile>> {
        let mut accounts = self.accounts.lock().unwrap();
        let taken = accounts
            .values()
            .any(|a| a.id != account_id && a.provider_customer_id.as_deref() == Some(customer_id));
        if taken {
            return Err(AppError::InvalidInput(
                "Customer is already linked to a different account".into(),
            ));
        }
        Ok(accounts.get_mut(&account_id).map(|account| {
            if account.provider_customer_id.is_none() {
                account.provider_customer_id = Some(customer_id.to_string());
            }
            account.clone()
        }))
    }
}

// ============================================================================
// InMemoryCache
// ============================================================================

#[derive(Default)]
pub struct InMemoryCache {
    values: Mutex<HashMap<String, String>>,
    reads_fail: AtomicBool,
    writes_fail: AtomicBool,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw value, bypassing failure injection.
    pub fn insert(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn evict(&self, key: &str) {
        self.values.lock().unwrap().remove(key);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.reads_fail.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.writes_fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        if self.reads_fail.load(Ordering::SeqCst) {
            return Err(AppError::Cache("connection refused".into()));
        }
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str, _ttl: Option<Duration>) -> AppResult<()> {
        if self.writes_fail.load(Ordering::SeqCst) {
            return Err(AppError::Cache("connection refused".into()));
        }
        self.insert(key, value);
        Ok(())
    }
}

// ============================================================================
// InMemoryLedger
// ============================================================================

/// A committed row. Revisions stand in for `created_at`/`updated_at`.
#[derive(Debug, Clone)]
pub struct StoredRow<R> {
    pub record: R,
    pub created_revision: u64,
    pub updated_revision: u64,
}

#[derive(Default)]
struct LedgerState {
    payments: HashMap<String, StoredRow<PaymentRecord>>,
    subscriptions: HashMap<String, StoredRow<SubscriptionRecord>>,
    revision: u64,
    rollbacks: usize,
}

/// Ledger with transaction semantics: writes are staged and only become
/// visible on commit.
#[derive(Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
    fail_on_upsert: Mutex<Option<usize>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `n`th upsert (1-based) of every later transaction fail.
    pub fn fail_on_upsert(&self, n: usize) {
        *self.fail_on_upsert.lock().unwrap() = Some(n);
    }

    pub fn payments(&self) -> Vec<StoredRow<PaymentRecord>> {
        self.state.lock().unwrap().payments.values().cloned().collect()
    }

    pub fn payment(&self, payment_id: &str) -> Option<StoredRow<PaymentRecord>> {
        self.state.lock().unwrap().payments.get(payment_id).cloned()
    }

    pub fn subscriptions(&self) -> Vec<StoredRow<SubscriptionRecord>> {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .values()
            .cloned()
            .collect()
    }

    pub fn subscription(&self, subscription_id: &str) -> Option<StoredRow<SubscriptionRecord>> {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .get(subscription_id)
            .cloned()
    }

    pub fn rollbacks(&self) -> usize {
        self.state.lock().unwrap().rollbacks
    }
}

#[async_trait]
impl LedgerRepoTrait for InMemoryLedger {
    async fn begin(&self) -> AppResult<Box<dyn LedgerTx>> {
        Ok(Box::new(InMemoryLedgerTx {
            state: self.state.clone(),
            staged: Vec::new(),
            upserts: 0,
            fail_on: *self.fail_on_upsert.lock().unwrap(),
        }))
    }
}

enum Staged {
    Payment(PaymentRecord),
    Subscription(SubscriptionRecord),
}

pub struct InMemoryLedgerTx {
    state: Arc<Mutex<LedgerState>>,
    staged: Vec<Staged>,
    upserts: usize,
    fail_on: Option<usize>,
}

impl InMemoryLedgerTx {
    fn count_upsert(&mut self) -> AppResult<()> {
        self.upserts += 1;
        if self.fail_on == Some(self.upserts) {
            return Err(AppError::Persistence("injected upsert failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerTx for InMemoryLedgerTx {
    async fn upsert_payment(&mut self, record: &PaymentRecord) -> AppResult<()> {
        self.count_upsert()?;
        self.staged.push(Staged::Payment(record.clone()));
        Ok(())
    }

    async fn upsert_subscription(&mut self, record: &SubscriptionRecord) -> AppResult<()> {
        self.count_upsert()?;
        self.staged.push(Staged::Subscription(record.clone()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let tx = *self;
        let mut state = tx.state.lock().unwrap();
        state.revision += 1;
        let revision = state.revision;

        for staged in tx.staged {
            match staged {
                Staged::Payment(record) => match state.payments.get_mut(&record.payment_id) {
                    Some(row) => {
                        row.record.amount = record.amount;
                        row.record.status = record.status;
                        row.record.currency = record.currency;
                        row.updated_revision = revision;
                    }
                    None => {
                        state.payments.insert(
                            record.payment_id.clone(),
                            StoredRow {
                                record,
                                created_revision: revision,
                                updated_revision: revision,
                            },
                        );
                    }
                },
                Staged::Subscription(record) => {
                    match state.subscriptions.get_mut(&record.subscription_id) {
                        Some(row) => {
                            row.record.price_id = record.price_id;
                            row.record.status = record.status;
                            row.record.current_period_start = record.current_period_start;
                            row.record.current_period_end = record.current_period_end;
                            row.record.cancel_at_period_end = record.cancel_at_period_end;
                            row.updated_revision = revision;
                        }
                        None => {
                            state.subscriptions.insert(
                                record.subscription_id.clone(),
                                StoredRow {
                                    record,
                                    created_revision: revision,
                                    updated_revision: revision,
                                },
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.state.lock().unwrap().rollbacks += 1;
        Ok(())
    }
}
