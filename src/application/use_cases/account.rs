use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_provider::CustomerId,
        use_cases::{
            customer_state::CustomerStateUseCases,
            identity::IdentityIndex,
            sync::{SyncReason, SyncScheduler, SyncTicket},
        },
    },
    domain::entities::customer_snapshot::ProviderCustomerSnapshot,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountProfile {
    pub id: Uuid,
    pub provider_customer_id: Option<String>,
}

/// Whether an account currently has access through an active or trialing subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionStatusSummary {
    pub customer_id: Option<String>,
    pub has_active_subscription: bool,
}

#[async_trait]
pub trait AccountRepoTrait: Send + Sync {
    async fn get_by_id(&self, account_id: Uuid) -> AppResult<Option<AccountProfile>>;

    async fn find_account_id_by_customer_id(&self, customer_id: &str) -> AppResult<Option<Uuid>>;

    /// Stores the customer id on the account only if none is set yet and
    /// returns the row as it stands afterwards.
    async fn set_customer_id_if_unset(
        &self,
        account_id: Uuid,
        customer_id: &str,
    ) -> AppResult<Option<AccountProfile>>;
}

/// Account-facing billing flows.
pub struct AccountUseCases {
    accounts: Arc<dyn AccountRepoTrait>,
    identity: Arc<IdentityIndex>,
    customer_state: Arc<CustomerStateUseCases>,
    scheduler: Arc<dyn SyncScheduler>,
}

impl AccountUseCases {
    pub fn new(
        accounts: Arc<dyn AccountRepoTrait>,
        identity: Arc<IdentityIndex>,
        customer_state: Arc<CustomerStateUseCases>,
        scheduler: Arc<dyn SyncScheduler>,
    ) -> Self {
        Self {
            accounts,
            identity,
            customer_state,
            scheduler,
        }
    }

    /// Links a provider customer to an account and schedules its first sync.
    ///
    /// A link is permanent: linking the same pair again is a no-op on the row,
    /// linking a different customer is rejected.
    #[instrument(skip(self), fields(account_id = %account_id, customer_id = %customer_id))]
    pub async fn link_customer(
        &self,
        account_id: Uuid,
        customer_id: &CustomerId,
    ) -> AppResult<SyncTicket> {
        if customer_id.as_str().trim().is_empty() {
            return Err(AppError::InvalidInput("customer_id must not be empty".into()));
        }

        let account = self
            .accounts
            .get_by_id(account_id)
            .await?
            .ok_or(AppError::NotFound)?;

        match account.provider_customer_id.as_deref() {
            Some(existing) if existing == customer_id.as_str() => {
                info!("Customer already linked to account");
            }
            Some(_) => {
                return Err(AppError::InvalidInput(
                    "Account is already linked to a different customer".into(),
                ));
            }
            None => {
                if let Some(owner) = self
                    .accounts
                    .find_account_id_by_customer_id(customer_id.as_str())
                    .await?
                    && owner != account_id
                {
                    return Err(AppError::InvalidInput(
                        "Customer is already linked to a different account".into(),
                    ));
                }

                let updated = self
                    .accounts
                    .set_customer_id_if_unset(account_id, customer_id.as_str())
                    .await?
                    .ok_or(AppError::NotFound)?;

                // Lost a race against another link for the same account
                if updated.provider_customer_id.as_deref() != Some(customer_id.as_str()) {
                    return Err(AppError::InvalidInput(
                        "Account is already linked to a different customer".into(),
                    ));
                }
                info!("Customer linked to account");
            }
        }

        if let Err(e) = self.identity.record_mapping(account_id, customer_id).await {
            warn!(error = %e, "Failed to cache identity mapping after link");
        }

        Ok(self
            .scheduler
            .submit(customer_id.clone(), SyncReason::CustomerLinked))
    }

    /// Sign-in hook. Refreshes the identity mappings and schedules a
    /// background resync without waiting for it.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn on_sign_in(&self, account_id: Uuid) -> AppResult<Option<SyncTicket>> {
        let account = self
            .accounts
            .get_by_id(account_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let Some(customer_id) = account.provider_customer_id.map(CustomerId::new) else {
            return Ok(None);
        };

        if let Err(e) = self.identity.record_mapping(account_id, &customer_id).await {
            warn!(error = %e, customer_id = %customer_id, "Failed to refresh identity mapping on sign-in");
        }

        Ok(Some(self.scheduler.submit(customer_id, SyncReason::SignIn)))
    }

    pub async fn billing_state(&self, account_id: Uuid) -> AppResult<ProviderCustomerSnapshot> {
        self.customer_state.get_account_state(account_id).await
    }

    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn subscription_status(
        &self,
        account_id: Uuid,
    ) -> AppResult<SubscriptionStatusSummary> {
        let account = self
            .accounts
            .get_by_id(account_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if account.provider_customer_id.is_none() {
            return Ok(SubscriptionStatusSummary {
                customer_id: None,
                has_active_subscription: false,
            });
        }

        let snapshot = self.billing_state(account_id).await?;

        Ok(SubscriptionStatusSummary {
            customer_id: Some(snapshot.customer_id().to_string()),
            has_active_subscription: snapshot.has_active_subscription(),
        })
    }
}
