//! Denormalized, provider-shaped read model of one customer.
//!
//! The profile types deserialize straight from the provider's customer object, so unknown or
//! missing fields fall back to their defaults instead of failing the whole sync.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{payment_status::PaymentStatus, subscription_status::SubscriptionStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerAddress {
    pub city: Option<String>,
    pub country: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub postal_code: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coupon {
    pub id: String,
    pub name: Option<String>,
    pub amount_off: Option<i64>,
    pub percent_off: Option<f64>,
    pub currency: Option<String>,
    pub duration: Option<String>,
    pub duration_in_months: Option<i64>,
    pub valid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerDiscount {
    pub id: Option<String>,
    pub coupon: Option<Coupon>,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceCustomField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceSettings {
    pub custom_fields: Option<Vec<InvoiceCustomField>>,
    pub default_payment_method: Option<String>,
    pub footer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerTaxLocation {
    pub country: Option<String>,
    pub source: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerTax {
    pub automatic_tax: Option<String>,
    pub ip_address: Option<String>,
    pub location: Option<CustomerTaxLocation>,
}

/// Customer profile as the provider reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerProfile {
    pub id: String,
    pub address: Option<CustomerAddress>,
    pub balance: i64,
    pub created: i64,
    pub currency: Option<String>,
    pub default_source: Option<String>,
    pub deleted: bool,
    pub delinquent: Option<bool>,
    pub description: Option<String>,
    pub discount: Option<CustomerDiscount>,
    pub email: Option<String>,
    pub invoice_prefix: Option<String>,
    pub invoice_settings: Option<InvoiceSettings>,
    pub livemode: bool,
    /// Ordered so that identical provider data always serializes to identical bytes.
    pub metadata: BTreeMap<String, String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub preferred_locales: Option<Vec<String>>,
    pub tax: Option<CustomerTax>,
    pub tax_exempt: Option<String>,
}

/// Card summary of the payment method attached to a subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodSummary {
    pub brand: String,
    pub last4: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionView {
    pub subscription_id: String,
    pub status: SubscriptionStatus,
    pub price_id: Option<String>,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    pub payment_method: Option<PaymentMethodSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentView {
    pub payment_id: String,
    pub status: PaymentStatus,
}

/// The cached, replace-on-write view of one provider customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCustomerSnapshot {
    pub customer: CustomerProfile,
    pub subscriptions: Vec<SubscriptionView>,
    pub payments: Vec<PaymentView>,
    /// Unix seconds of the sync that produced this snapshot
    pub synced_at: i64,
}

impl ProviderCustomerSnapshot {
    pub fn customer_id(&self) -> &str {
        &self.customer.id
    }

    /// Returns true if any subscription currently grants access
    pub fn has_active_subscription(&self) -> bool {
        self.subscriptions.iter().any(|s| s.status.is_active())
    }

    pub fn subscription(&self, subscription_id: &str) -> Option<&SubscriptionView> {
        self.subscriptions
            .iter()
            .find(|s| s.subscription_id == subscription_id)
    }

    pub fn payment(&self, payment_id: &str) -> Option<&PaymentView> {
        self.payments.iter().find(|p| p.payment_id == payment_id)
    }
}
