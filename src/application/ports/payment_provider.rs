use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    app_error::AppResult,
    domain::entities::customer_snapshot::{CustomerProfile, PaymentMethodSummary},
};

// ============================================================================
// Port Types
// ============================================================================

/// Identifier of a customer in the payment provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A subscription as the provider reports it. Status stays a raw string here;
/// the sync maps it onto the local vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSubscription {
    pub id: String,
    pub customer: String,
    pub status: String,
    /// Price of the first subscription item
    pub price_id: Option<String>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    /// The subscription's own default payment method, when it is a card
    pub payment_method: Option<PaymentMethodSummary>,
}

/// A payment intent as the provider reports it
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPayment {
    pub id: String,
    pub customer: Option<String>,
    /// Amount in the smallest currency unit
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub created: i64,
}

// ============================================================================
// Port Trait
// ============================================================================

/// Read-only view of the payment provider.
///
/// Every list call must return the complete set for the customer, following
/// pagination to the end.
#[async_trait]
pub trait PaymentProviderClient: Send + Sync {
    async fn get_customer(&self, customer_id: &CustomerId) -> AppResult<CustomerProfile>;

    /// All subscriptions in any status, including canceled ones
    async fn list_subscriptions(
        &self,
        customer_id: &CustomerId,
    ) -> AppResult<Vec<ProviderSubscription>>;

    async fn list_payments(&self, customer_id: &CustomerId) -> AppResult<Vec<ProviderPayment>>;
}
