pub mod account;
pub mod customer_state;
pub mod identity;
pub mod ledger;
pub mod services;
pub mod snapshot;
pub mod sync;
pub mod webhook;
