pub mod customer_snapshot;
pub mod payment_status;
pub mod provider_event;
pub mod subscription_status;
