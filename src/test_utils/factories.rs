//! Test data factories.
//!
//! Each factory returns a complete object with sensible defaults. Use the closure
//! parameter to override specific fields.

use uuid::Uuid;

use crate::{
    application::{
        ports::payment_provider::{ProviderPayment, ProviderSubscription},
        use_cases::account::AccountProfile,
    },
    domain::entities::customer_snapshot::{CustomerProfile, PaymentMethodSummary},
};

pub const TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Create a test account without a linked customer.
pub fn create_test_account(overrides: impl FnOnce(&mut AccountProfile)) -> AccountProfile {
    let mut account = AccountProfile {
        id: Uuid::new_v4(),
        provider_customer_id: None,
    };
    overrides(&mut account);
    account
}

/// Create a provider customer profile with sensible defaults.
pub fn create_test_customer(overrides: impl FnOnce(&mut CustomerProfile)) -> CustomerProfile {
    let mut customer = CustomerProfile {
        id: "cus_1".to_string(),
        created: TEST_TIMESTAMP,
        currency: Some("usd".to_string()),
        email: Some("customer@example.com".to_string()),
        name: Some("Test Customer".to_string()),
        invoice_prefix: Some("ABC123".to_string()),
        preferred_locales: Some(vec!["en".to_string()]),
        ..Default::default()
    };
    overrides(&mut customer);
    customer
}

/// Create an active provider subscription for `cus_1`.
pub fn create_test_subscription(
    overrides: impl FnOnce(&mut ProviderSubscription),
) -> ProviderSubscription {
    let mut subscription = ProviderSubscription {
        id: "sub_1".to_string(),
        customer: "cus_1".to_string(),
        status: "active".to_string(),
        price_id: Some("price_pro".to_string()),
        current_period_start: Some(TEST_TIMESTAMP),
        current_period_end: Some(TEST_TIMESTAMP + 30 * 24 * 3600),
        cancel_at_period_end: false,
        payment_method: Some(PaymentMethodSummary {
            brand: "visa".to_string(),
            last4: "4242".to_string(),
        }),
    };
    overrides(&mut subscription);
    subscription
}

/// Create a succeeded provider payment for `cus_1`.
pub fn create_test_payment(overrides: impl FnOnce(&mut ProviderPayment)) -> ProviderPayment {
    let mut payment = ProviderPayment {
        id: "pi_1".to_string(),
        customer: Some("cus_1".to_string()),
        amount: 1999,
        currency: "usd".to_string(),
        status: "succeeded".to_string(),
        created: TEST_TIMESTAMP,
    };
    overrides(&mut payment);
    payment
}
