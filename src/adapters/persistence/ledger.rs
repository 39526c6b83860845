use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use tracing::debug;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::ledger::{LedgerRepoTrait, LedgerTx, PaymentRecord, SubscriptionRecord},
};

const UPSERT_PAYMENT: &str = r#"
    INSERT INTO payments
        (account_id, stripe_customer_id, stripe_payment_intent_id, amount, currency, status,
         created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()), NOW())
    ON CONFLICT (stripe_payment_intent_id) DO UPDATE SET
        amount = EXCLUDED.amount,
        status = EXCLUDED.status,
        currency = EXCLUDED.currency,
        updated_at = NOW()
"#;

const UPSERT_SUBSCRIPTION: &str = r#"
    INSERT INTO subscriptions
        (account_id, stripe_customer_id, stripe_subscription_id, price_id, status,
         current_period_start, current_period_end, cancel_at_period_end, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
    ON CONFLICT (stripe_subscription_id) DO UPDATE SET
        price_id = EXCLUDED.price_id,
        status = EXCLUDED.status,
        current_period_start = EXCLUDED.current_period_start,
        current_period_end = EXCLUDED.current_period_end,
        cancel_at_period_end = EXCLUDED.cancel_at_period_end,
        updated_at = NOW()
"#;

#[async_trait]
impl LedgerRepoTrait for PostgresPersistence {
    async fn begin(&self) -> AppResult<Box<dyn LedgerTx>> {
        let tx = self.pool().begin().await.map_err(persistence_error)?;
        Ok(Box::new(PgLedgerTx { tx }))
    }
}

/// Open Postgres transaction. sqlx rolls back on drop if it was never committed.
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn upsert_payment(&mut self, record: &PaymentRecord) -> AppResult<()> {
        sqlx::query(UPSERT_PAYMENT)
            .bind(record.account_id)
            .bind(&record.customer_id)
            .bind(&record.payment_id)
            .bind(record.amount)
            .bind(&record.currency)
            .bind(record.status)
            .bind(record.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(persistence_error)?;
        debug!(payment_id = %record.payment_id, "Payment upserted");
        Ok(())
    }

    async fn upsert_subscription(&mut self, record: &SubscriptionRecord) -> AppResult<()> {
        sqlx::query(UPSERT_SUBSCRIPTION)
            .bind(record.account_id)
            .bind(&record.customer_id)
            .bind(&record.subscription_id)
            .bind(&record.price_id)
            .bind(record.status)
            .bind(record.current_period_start)
            .bind(record.current_period_end)
            .bind(record.cancel_at_period_end)
            .execute(&mut *self.tx)
            .await
            .map_err(persistence_error)?;
        debug!(subscription_id = %record.subscription_id, "Subscription upserted");
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let this = *self;
        this.tx.commit().await.map_err(persistence_error)
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let this = *self;
        this.tx.rollback().await.map_err(persistence_error)
    }
}

/// Any storage fault during reconciliation is a persistence failure, including
/// constraint violations that the generic conversion reports as bad input.
fn persistence_error(err: sqlx::Error) -> AppError {
    match AppError::from(err) {
        AppError::Persistence(msg) => AppError::Persistence(msg),
        other => AppError::Persistence(other.to_string()),
    }
}
