use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState, app_error::AppResult,
    application::ports::payment_provider::CustomerId,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{account_id}/billing", get(get_billing_state))
        .route(
            "/{account_id}/subscription-status",
            get(get_subscription_status),
        )
        .route("/{account_id}/customer", put(link_customer))
        .route("/{account_id}/sign-in", post(sign_in))
}

#[derive(Deserialize)]
struct LinkCustomerPayload {
    customer_id: String,
}

#[derive(Serialize)]
struct LinkCustomerResponse {
    account_id: Uuid,
    customer_id: String,
    sync_scheduled: bool,
}

#[derive(Serialize)]
struct SignInResponse {
    sync_scheduled: bool,
}

/// GET /api/accounts/{account_id}/billing
async fn get_billing_state(
    State(app_state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let snapshot = app_state
        .account_use_cases
        .billing_state(account_id)
        .await?;

    Ok(Json(snapshot))
}

/// GET /api/accounts/{account_id}/subscription-status
async fn get_subscription_status(
    State(app_state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let status = app_state
        .account_use_cases
        .subscription_status(account_id)
        .await?;

    Ok(Json(status))
}

/// PUT /api/accounts/{account_id}/customer
/// Links the account and returns before the first sync completes.
async fn link_customer(
    State(app_state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<LinkCustomerPayload>,
) -> AppResult<impl IntoResponse> {
    let customer_id = CustomerId::new(payload.customer_id.trim());

    // The sync keeps running after the ticket is dropped
    let _ticket = app_state
        .account_use_cases
        .link_customer(account_id, &customer_id)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(LinkCustomerResponse {
            account_id,
            customer_id: customer_id.to_string(),
            sync_scheduled: true,
        }),
    ))
}

/// POST /api/accounts/{account_id}/sign-in
async fn sign_in(
    State(app_state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let ticket = app_state.account_use_cases.on_sign_in(account_id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SignInResponse {
            sync_scheduled: ticket.is_some(),
        }),
    ))
}
