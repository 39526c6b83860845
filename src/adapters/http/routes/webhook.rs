use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use serde::Serialize;

use crate::{adapters::http::app_state::AppState, app_error::AppResult};

pub const SIGNATURE_HEADER: &str = "stripe-signature";

pub fn router() -> Router<AppState> {
    Router::new().route("/provider", post(handle_provider_webhook))
}

#[derive(Serialize)]
struct WebhookReceipt {
    received: bool,
    event_id: String,
    event_type: String,
    customer_id: String,
}

/// POST /api/webhooks/provider
/// The body is taken as raw text because the signature covers the exact bytes.
async fn handle_provider_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let accepted = app_state
        .webhook_use_cases
        .handle_event(&body, signature)
        .await?;

    Ok(Json(WebhookReceipt {
        received: true,
        event_id: accepted.event_id,
        event_type: accepted.event_type.to_string(),
        customer_id: accepted.customer_id.to_string(),
    }))
}
