use std::sync::Arc;

use tracing::{Instrument, error, info, info_span};

use crate::application::{
    ports::payment_provider::CustomerId,
    use_cases::sync::{CustomerSync, SyncReason, SyncScheduler, SyncTicket},
};

/// Runs each submitted sync as its own task on the tokio runtime.
pub struct TokioSyncScheduler {
    sync: Arc<dyn CustomerSync>,
}

impl TokioSyncScheduler {
    pub fn new(sync: Arc<dyn CustomerSync>) -> Self {
        Self { sync }
    }
}

impl SyncScheduler for TokioSyncScheduler {
    fn submit(&self, customer_id: CustomerId, reason: SyncReason) -> SyncTicket {
        let sync = Arc::clone(&self.sync);
        let span = info_span!(
            "background-sync",
            customer_id = %customer_id,
            reason = %reason
        );

        let handle = tokio::spawn(
            async move {
                let result = sync.sync(&customer_id).await;
                match &result {
                    Ok(()) => info!("Background sync finished"),
                    Err(e) => error!(error = %e, "Background sync failed"),
                }
                result
            }
            .instrument(span),
        );

        SyncTicket::new(handle)
    }
}
