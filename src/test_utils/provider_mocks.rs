//! Stub provider client, sync spy and webhook signing helpers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_provider::{
            CustomerId, PaymentProviderClient, ProviderPayment, ProviderSubscription,
        },
        use_cases::{sync::CustomerSync, webhook::compute_signature},
    },
    domain::entities::customer_snapshot::CustomerProfile,
};

pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Builds a `Stripe-Signature` header for `payload` signed at `timestamp`.
pub fn sign_payload(payload: &str, secret: &str, timestamp: i64) -> String {
    let ts = timestamp.to_string();
    let signature = compute_signature(payload, &ts, secret).unwrap();
    format!("t={ts},v1={signature}")
}

// ============================================================================
// StubProviderClient
// ============================================================================

/// Provider with mutable canned data. Lists are filtered by customer.
#[derive(Default)]
pub struct StubProviderClient {
    customers: Mutex<HashMap<String, CustomerProfile>>,
    subscriptions: Mutex<Vec<ProviderSubscription>>,
    payments: Mutex<Vec<ProviderPayment>>,
    failure: Mutex<Option<fn() -> AppError>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    pub customer_calls: AtomicUsize,
    /// Highest number of concurrent `get_customer` calls observed
    pub max_in_flight: AtomicUsize,
}

impl StubProviderClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customer(self, customer: CustomerProfile) -> Self {
        self.insert_customer(customer);
        self
    }

    pub fn insert_customer(&self, customer: CustomerProfile) {
        self.customers
            .lock()
            .unwrap()
            .insert(customer.id.clone(), customer);
    }

    pub fn with_subscriptions(self, subscriptions: Vec<ProviderSubscription>) -> Self {
        self.set_subscriptions(subscriptions);
        self
    }

    pub fn with_payments(self, payments: Vec<ProviderPayment>) -> Self {
        self.set_payments(payments);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_subscriptions(&self, subscriptions: Vec<ProviderSubscription>) {
        *self.subscriptions.lock().unwrap() = subscriptions;
    }

    pub fn set_payments(&self, payments: Vec<ProviderPayment>) {
        *self.payments.lock().unwrap() = payments;
    }

    pub fn fail_with(&self, failure: fn() -> AppError) {
        *self.failure.lock().unwrap() = Some(failure);
    }

    fn check_failure(&self) -> AppResult<()> {
        match *self.failure.lock().unwrap() {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentProviderClient for StubProviderClient {
    async fn get_customer(&self, customer_id: &CustomerId) -> AppResult<CustomerProfile> {
        self.customer_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.check_failure()?;
        self.customers
            .lock()
            .unwrap()
            .get(customer_id.as_str())
            .cloned()
            .ok_or_else(|| AppError::Provider(format!("No such customer: {customer_id}")))
    }

    async fn list_subscriptions(
        &self,
        customer_id: &CustomerId,
    ) -> AppResult<Vec<ProviderSubscription>> {
        self.check_failure()?;
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.customer == customer_id.as_str())
            .cloned()
            .collect())
    }

    async fn list_payments(&self, customer_id: &CustomerId) -> AppResult<Vec<ProviderPayment>> {
        self.check_failure()?;
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.customer.as_deref() == Some(customer_id.as_str()))
            .cloned()
            .collect())
    }
}

// ============================================================================
// SpySync
// ============================================================================

/// Records sync calls without doing any work.
#[derive(Default)]
pub struct SpySync {
    pub calls: AtomicUsize,
    customers: Mutex<Vec<String>>,
    failure: Mutex<Option<fn() -> AppError>>,
}

impl SpySync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customers(&self) -> Vec<String> {
        self.customers.lock().unwrap().clone()
    }

    pub fn fail_with(&self, failure: fn() -> AppError) {
        *self.failure.lock().unwrap() = Some(failure);
    }
}

#[async_trait]
impl CustomerSync for SpySync {
    async fn sync(&self, customer_id: &CustomerId) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.customers
            .lock()
            .unwrap()
            .push(customer_id.as_str().to_string());
        match *self.failure.lock().unwrap() {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}
