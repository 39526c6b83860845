use std::sync::Arc;

use crate::{
    application::use_cases::{
        account::AccountUseCases, customer_state::CustomerStateUseCases,
        webhook::WebhookUseCases,
    },
    infra::config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub customer_state_use_cases: Arc<CustomerStateUseCases>,
    pub webhook_use_cases: Arc<WebhookUseCases>,
    pub account_use_cases: Arc<AccountUseCases>,
}
