//! Durable payment and subscription records.
//!
//! All upserts of one sync share a single transaction. The transaction handle is
//! consumed by `commit`/`rollback`, and an implementation must roll back when an
//! uncommitted handle is dropped.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    application::ports::payment_provider::{ProviderPayment, ProviderSubscription},
    domain::entities::{payment_status::PaymentStatus, subscription_status::SubscriptionStatus},
};

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub account_id: Uuid,
    pub customer_id: String,
    pub payment_id: String,
    /// Minor currency units
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: Option<NaiveDateTime>,
}

impl PaymentRecord {
    pub fn from_provider(account_id: Uuid, customer_id: &str, payment: &ProviderPayment) -> Self {
        Self {
            account_id,
            customer_id: payment
                .customer
                .clone()
                .unwrap_or_else(|| customer_id.to_string()),
            payment_id: payment.id.clone(),
            amount: payment.amount,
            currency: payment.currency.clone(),
            status: PaymentStatus::from_provider(&payment.status),
            created_at: timestamp_to_naive(payment.created),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionRecord {
    pub account_id: Uuid,
    pub customer_id: String,
    pub subscription_id: String,
    pub price_id: Option<String>,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<NaiveDateTime>,
    pub current_period_end: Option<NaiveDateTime>,
    pub cancel_at_period_end: bool,
}

impl SubscriptionRecord {
    pub fn from_provider(
        account_id: Uuid,
        customer_id: &str,
        subscription: &ProviderSubscription,
    ) -> Self {
        let customer_id = if subscription.customer.is_empty() {
            customer_id.to_string()
        } else {
            subscription.customer.clone()
        };

        Self {
            account_id,
            customer_id,
            subscription_id: subscription.id.clone(),
            price_id: subscription.price_id.clone(),
            status: SubscriptionStatus::from_provider(&subscription.status),
            current_period_start: subscription.current_period_start.and_then(timestamp_to_naive),
            current_period_end: subscription.current_period_end.and_then(timestamp_to_naive),
            cancel_at_period_end: subscription.cancel_at_period_end,
        }
    }
}

#[async_trait]
pub trait LedgerRepoTrait: Send + Sync {
    async fn begin(&self) -> AppResult<Box<dyn LedgerTx>>;
}

/// An open relational transaction.
#[async_trait]
pub trait LedgerTx: Send {
    /// Insert, or on a known payment id overwrite amount, status and currency.
    async fn upsert_payment(&mut self, record: &PaymentRecord) -> AppResult<()>;

    /// Insert, or on a known subscription id overwrite price, status, period
    /// bounds and the cancel flag.
    async fn upsert_subscription(&mut self, record: &SubscriptionRecord) -> AppResult<()>;

    async fn commit(self: Box<Self>) -> AppResult<()>;

    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

fn timestamp_to_naive(secs: i64) -> Option<NaiveDateTime> {
    if secs <= 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}
