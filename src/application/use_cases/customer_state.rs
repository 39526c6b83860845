use std::sync::Arc;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_provider::CustomerId,
        use_cases::{identity::IdentityIndex, snapshot::SnapshotCache, sync::CustomerSync},
    },
    domain::entities::customer_snapshot::ProviderCustomerSnapshot,
};

/// Read-through access to customer snapshots.
///
/// A miss triggers exactly one synchronous resync followed by one more read.
pub struct CustomerStateUseCases {
    snapshots: Arc<SnapshotCache>,
    sync: Arc<dyn CustomerSync>,
    identity: Arc<IdentityIndex>,
}

impl CustomerStateUseCases {
    pub fn new(
        snapshots: Arc<SnapshotCache>,
        sync: Arc<dyn CustomerSync>,
        identity: Arc<IdentityIndex>,
    ) -> Self {
        Self {
            snapshots,
            sync,
            identity,
        }
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn get_customer_state(
        &self,
        customer_id: &CustomerId,
    ) -> AppResult<ProviderCustomerSnapshot> {
        if let Some(snapshot) = self.snapshots.read_snapshot(customer_id).await? {
            return Ok(snapshot);
        }

        debug!("Snapshot cache miss, resyncing");
        self.sync.sync(customer_id).await?;

        match self.snapshots.read_snapshot(customer_id).await? {
            Some(snapshot) => Ok(snapshot),
            None => {
                warn!("Snapshot still missing after resync");
                Err(AppError::SyncIncomplete(customer_id.to_string()))
            }
        }
    }

    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn get_account_state(&self, account_id: Uuid) -> AppResult<ProviderCustomerSnapshot> {
        let customer_id = self.identity.resolve_customer_id(account_id).await?;
        self.get_customer_state(&customer_id).await
    }
}
