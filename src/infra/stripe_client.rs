use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use super::InfraError;
use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_provider::{
        CustomerId, PaymentProviderClient, ProviderPayment, ProviderSubscription,
    },
    domain::entities::customer_snapshot::{CustomerProfile, PaymentMethodSummary},
};

/// Largest page the list endpoints accept
const PAGE_LIMIT: &str = "100";

/// Connection settings for the Stripe REST API.
pub struct StripeConfig {
    pub secret_key: SecretString,
    /// Base URL without a trailing slash, e.g. `https://api.stripe.com/v1`
    pub api_base: String,
    /// Per-request timeout
    pub timeout: Duration,
}

pub struct StripeClient {
    client: Client,
    api_base: String,
    auth_header: SecretString,
}

impl StripeClient {
    pub fn new(config: &StripeConfig) -> Result<Self, InfraError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(InfraError::HttpClient)?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            auth_header: SecretString::new(auth_header(&config.secret_key).into()),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> AppResult<T> {
        let response = self
            .client
            .get(format!("{}{}", self.api_base, path))
            .header("Authorization", self.auth_header.expose_secret())
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Stripe request failed: {}", e)))?;

        self.handle_response(response).await
    }

    /// Follows `has_more`/`starting_after` until the list is exhausted.
    async fn list_all<T>(&self, path: &str, query: &[(&str, &str)]) -> AppResult<Vec<T>>
    where
        T: DeserializeOwned + StripeObject,
    {
        let mut items: Vec<T> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params: Vec<(&str, &str)> = query.to_vec();
            params.push(("limit", PAGE_LIMIT));
            if let Some(after) = cursor.as_deref() {
                params.push(("starting_after", after));
            }

            let page: StripeList<T> = self.get(path, &params).await?;
            let next = if page.has_more {
                page.data.last().map(|item| item.id().to_string())
            } else {
                None
            };
            items.extend(page.data);

            match next {
                Some(id) => cursor = Some(id),
                None => break,
            }
        }

        debug!(path, count = items.len(), "Listed provider objects");
        Ok(items)
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Stripe API error");

            if let Ok(error) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(AppError::Provider(format!(
                    "Stripe error: {}",
                    error.error.message.unwrap_or(error.error.error_type)
                )));
            }

            return Err(AppError::Provider(format!("Stripe API error: {}", status)));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse Stripe response");
            AppError::Provider(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

fn auth_header(secret_key: &SecretString) -> String {
    use base64::Engine;
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{}:", secret_key.expose_secret()));
    format!("Basic {}", encoded)
}

#[async_trait]
impl PaymentProviderClient for StripeClient {
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn get_customer(&self, customer_id: &CustomerId) -> AppResult<CustomerProfile> {
        self.get(&format!("/customers/{}", customer_id.as_str()), &[])
            .await
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn list_subscriptions(
        &self,
        customer_id: &CustomerId,
    ) -> AppResult<Vec<ProviderSubscription>> {
        let subscriptions: Vec<StripeSubscription> = self
            .list_all(
                "/subscriptions",
                &[
                    ("customer", customer_id.as_str()),
                    ("status", "all"),
                    ("expand[]", "data.default_payment_method"),
                ],
            )
            .await?;

        Ok(subscriptions
            .into_iter()
            .map(StripeSubscription::into_provider)
            .collect())
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn list_payments(&self, customer_id: &CustomerId) -> AppResult<Vec<ProviderPayment>> {
        let intents: Vec<StripePaymentIntent> = self
            .list_all("/payment_intents", &[("customer", customer_id.as_str())])
            .await?;

        Ok(intents
            .into_iter()
            .map(StripePaymentIntent::into_provider)
            .collect())
    }
}

// ============================================================================
// Stripe Types
// ============================================================================

trait StripeObject {
    fn id(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct StripeList<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
}

impl<T> Default for StripeList<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            has_more: false,
        }
    }
}

/// A field that is either an id or the expanded object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    fn into_id(self) -> String {
        match self {
            Expandable::Id(id) | Expandable::Object { id } => id,
        }
    }
}

/// Expanded payment method, or a bare id when expansion did not apply.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PaymentMethodRef {
    Object(StripePaymentMethod),
    Unexpanded(serde::de::IgnoredAny),
}

#[derive(Debug, Deserialize)]
struct StripePaymentMethod {
    card: Option<StripeCard>,
}

#[derive(Debug, Deserialize)]
struct StripeCard {
    brand: String,
    last4: String,
}

#[derive(Debug, Deserialize)]
struct StripePrice {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeSubscriptionItem {
    price: Option<StripePrice>,
    current_period_start: Option<i64>,
    current_period_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeSubscription {
    id: String,
    customer: Expandable,
    status: String,
    #[serde(default)]
    cancel_at_period_end: bool,
    current_period_start: Option<i64>,
    current_period_end: Option<i64>,
    #[serde(default)]
    items: StripeList<StripeSubscriptionItem>,
    default_payment_method: Option<PaymentMethodRef>,
}

impl StripeObject for StripeSubscription {
    fn id(&self) -> &str {
        &self.id
    }
}

impl StripeSubscription {
    /// Newer API versions report billing periods on the items only.
    fn into_provider(self) -> ProviderSubscription {
        let first_item = self.items.data.into_iter().next();
        let (item_start, item_end) = first_item
            .as_ref()
            .map(|i| (i.current_period_start, i.current_period_end))
            .unwrap_or((None, None));

        let payment_method = match self.default_payment_method {
            Some(PaymentMethodRef::Object(pm)) => pm.card.map(|card| PaymentMethodSummary {
                brand: card.brand,
                last4: card.last4,
            }),
            Some(PaymentMethodRef::Unexpanded(_)) | None => None,
        };

        ProviderSubscription {
            id: self.id,
            customer: self.customer.into_id(),
            status: self.status,
            price_id: first_item.and_then(|i| i.price).map(|p| p.id),
            current_period_start: self.current_period_start.or(item_start),
            current_period_end: self.current_period_end.or(item_end),
            cancel_at_period_end: self.cancel_at_period_end,
            payment_method,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    customer: Option<Expandable>,
    amount: i64,
    currency: String,
    status: String,
    created: i64,
}

impl StripeObject for StripePaymentIntent {
    fn id(&self) -> &str {
        &self.id
    }
}

impl StripePaymentIntent {
    fn into_provider(self) -> ProviderPayment {
        ProviderPayment {
            id: self.id,
            customer: self.customer.map(Expandable::into_id),
            amount: self.amount,
            currency: self.currency,
            status: self.status,
            created: self.created,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: Option<String>,
}
