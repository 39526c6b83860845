use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};

use crate::{
    adapters::http::app_state::AppState, app_error::AppResult,
    application::ports::payment_provider::CustomerId,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{customer_id}/state", get(get_customer_state))
}

/// GET /api/customers/{customer_id}/state
/// Serves the cached snapshot, syncing once on a miss.
async fn get_customer_state(
    State(app_state): State<AppState>,
    Path(customer_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let snapshot = app_state
        .customer_state_use_cases
        .get_customer_state(&CustomerId::new(customer_id))
        .await?;

    Ok(Json(snapshot))
}
