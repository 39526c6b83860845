use serde::Serialize;
use strum::{Display, EnumIter, EnumString};

/// Provider webhook event types this service accepts.
///
/// Anything that does not parse into this enum is rejected outright so that new event
/// types showing up on the endpoint are visible in the logs.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum ProviderEventType {
    #[strum(serialize = "payment_intent.succeeded")]
    #[serde(rename = "payment_intent.succeeded")]
    PaymentIntentSucceeded,
    #[strum(serialize = "payment_intent.payment_failed")]
    #[serde(rename = "payment_intent.payment_failed")]
    PaymentIntentPaymentFailed,
    #[strum(serialize = "payment_intent.canceled")]
    #[serde(rename = "payment_intent.canceled")]
    PaymentIntentCanceled,
    #[strum(serialize = "customer.subscription.created")]
    #[serde(rename = "customer.subscription.created")]
    SubscriptionCreated,
    #[strum(serialize = "customer.subscription.updated")]
    #[serde(rename = "customer.subscription.updated")]
    SubscriptionUpdated,
    #[strum(serialize = "customer.subscription.deleted")]
    #[serde(rename = "customer.subscription.deleted")]
    SubscriptionDeleted,
}
