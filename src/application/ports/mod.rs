pub mod cache;
pub mod payment_provider;
