pub mod account;
pub mod customer;
pub mod webhook;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/webhooks", webhook::router())
        .nest("/customers", customer::router())
        .nest("/accounts", account::router())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
