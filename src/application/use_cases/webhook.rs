use std::{str::FromStr, sync::Arc};

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sha2::Sha256;
use tracing::{info, instrument, warn};

use crate::{
    app_error::{AppError, AppResult},
    application::{ports::payment_provider::CustomerId, use_cases::sync::CustomerSync},
    domain::entities::provider_event::ProviderEventType,
};

pub const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;

// ============================================================================
// Event states
// ============================================================================

/// An authenticated event whose type has not been checked yet.
#[derive(Debug, Deserialize)]
pub struct ReceivedEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: ReceivedEventData,
}

#[derive(Debug, Deserialize)]
pub struct ReceivedEventData {
    pub object: JsonValue,
}

/// An allow-listed event with a usable customer id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptedEvent {
    pub event_id: String,
    pub event_type: ProviderEventType,
    pub customer_id: CustomerId,
}

impl ReceivedEvent {
    pub fn parse(payload: &str) -> AppResult<Self> {
        serde_json::from_str(payload)
            .map_err(|e| AppError::MalformedEvent(format!("Invalid event payload: {e}")))
    }

    pub fn accept(self) -> AppResult<AcceptedEvent> {
        let event_type = ProviderEventType::from_str(&self.event_type)
            .map_err(|_| AppError::UnsupportedEvent(self.event_type.clone()))?;

        let customer_id = extract_customer_id(&self.data.object).ok_or_else(|| {
            AppError::MalformedEvent(format!(
                "Event {} has no usable data.object.customer",
                self.id
            ))
        })?;

        Ok(AcceptedEvent {
            event_id: self.id,
            event_type,
            customer_id,
        })
    }
}

/// The customer field is either an id string or an expanded customer object.
fn extract_customer_id(object: &JsonValue) -> Option<CustomerId> {
    let id = match object.get("customer")? {
        JsonValue::String(id) => id.as_str(),
        JsonValue::Object(customer) => customer.get("id")?.as_str()?,
        _ => return None,
    };
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    Some(CustomerId::new(id))
}

// ============================================================================
// Signature verification
// ============================================================================

/// Verifies a `t=<unix>,v1=<hex>` signature header against the raw body.
pub fn verify_signature(
    payload: &str,
    signature_header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> AppResult<()> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = Some(value),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| AppError::Authentication("Missing timestamp in signature".into()))?;
    if signatures.is_empty() {
        return Err(AppError::Authentication("Missing v1 signature".into()));
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| AppError::Authentication("Invalid signature timestamp".into()))?;

    let expected = compute_signature(payload, timestamp, secret)?;
    if !signatures.iter().any(|sig| constant_time_compare(sig, &expected)) {
        return Err(AppError::Authentication("Signature mismatch".into()));
    }

    // The timestamp is attacker-controlled until here, and may still be extreme
    match now.checked_sub(ts).map(i64::unsigned_abs) {
        Some(age) if age <= tolerance_secs.unsigned_abs() => Ok(()),
        _ => Err(AppError::Authentication(
            "Signature timestamp outside tolerance".into(),
        )),
    }
}

/// Hex HMAC-SHA256 over `"{timestamp}.{payload}"`
pub fn compute_signature(payload: &str, timestamp: &str, secret: &str) -> AppResult<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("HMAC key rejected".into()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

// ============================================================================
// Router
// ============================================================================

pub struct WebhookUseCases {
    sync: Arc<dyn CustomerSync>,
    secret: SecretString,
    tolerance_secs: i64,
}

impl WebhookUseCases {
    pub fn new(sync: Arc<dyn CustomerSync>, secret: SecretString, tolerance_secs: i64) -> Self {
        Self {
            sync,
            secret,
            tolerance_secs,
        }
    }

    /// Authenticates, filters and dispatches one delivered event. Every accepted
    /// event triggers a full resync of its customer.
    #[instrument(skip(self, payload, signature))]
    pub async fn handle_event(
        &self,
        payload: &str,
        signature: Option<&str>,
    ) -> AppResult<AcceptedEvent> {
        let signature =
            signature.ok_or_else(|| AppError::Authentication("Missing signature header".into()))?;
        verify_signature(
            payload,
            signature,
            self.secret.expose_secret(),
            self.tolerance_secs,
            chrono::Utc::now().timestamp(),
        )?;

        let received = ReceivedEvent::parse(payload)?;
        let (event_id, event_type) = (received.id.clone(), received.event_type.clone());

        let accepted = received.accept().inspect_err(|e| {
            warn!(event_id = %event_id, event_type = %event_type, error = %e, "Webhook event rejected");
        })?;

        self.sync.sync(&accepted.customer_id).await?;

        info!(
            event_id = %accepted.event_id,
            event_type = %accepted.event_type,
            customer_id = %accepted.customer_id,
            "Webhook event processed"
        );
        Ok(accepted)
    }
}
