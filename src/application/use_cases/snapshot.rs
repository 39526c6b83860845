use std::sync::Arc;

use tracing::instrument;

use crate::{
    app_error::AppResult,
    application::ports::{
        cache::{CacheKey, CacheStore},
        payment_provider::{CustomerId, ProviderPayment, ProviderSubscription},
    },
    domain::entities::{
        customer_snapshot::{CustomerProfile, PaymentView, ProviderCustomerSnapshot, SubscriptionView},
        payment_status::PaymentStatus,
        subscription_status::SubscriptionStatus,
    },
};

/// Replace-on-write snapshot store. One JSON blob per customer, no expiry.
pub struct SnapshotCache {
    cache: Arc<dyn CacheStore>,
}

impl SnapshotCache {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    #[instrument(skip(self, snapshot), fields(customer_id = %customer_id))]
    pub async fn write_snapshot(
        &self,
        customer_id: &CustomerId,
        snapshot: &ProviderCustomerSnapshot,
    ) -> AppResult<()> {
        let json = serde_json::to_string(snapshot)?;
        self.cache
            .set(&CacheKey::snapshot(customer_id.as_str()), &json, None)
            .await
    }

    /// `Ok(None)` when nothing is cached. A blob that does not decode is an error,
    /// never a partial snapshot.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn read_snapshot(
        &self,
        customer_id: &CustomerId,
    ) -> AppResult<Option<ProviderCustomerSnapshot>> {
        let Some(json) = self.cache.get(&CacheKey::snapshot(customer_id.as_str())).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&json)?))
    }
}

/// Flattens provider data into the cached read model. Each subscription keeps
/// its own payment method.
pub fn build_snapshot(
    customer: CustomerProfile,
    subscriptions: &[ProviderSubscription],
    payments: &[ProviderPayment],
    synced_at: i64,
) -> ProviderCustomerSnapshot {
    let subscriptions = subscriptions
        .iter()
        .map(|s| SubscriptionView {
            subscription_id: s.id.clone(),
            status: SubscriptionStatus::from_provider(&s.status),
            price_id: s.price_id.clone(),
            current_period_end: s.current_period_end,
            cancel_at_period_end: s.cancel_at_period_end,
            payment_method: s.payment_method.clone(),
        })
        .collect();

    let payments = payments
        .iter()
        .map(|p| PaymentView {
            payment_id: p.id.clone(),
            status: PaymentStatus::from_provider(&p.status),
        })
        .collect();

    ProviderCustomerSnapshot {
        customer,
        subscriptions,
        payments,
        synced_at,
    }
}
