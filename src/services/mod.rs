pub mod booking_engine;
pub mod payment_ledger;
pub mod ttl_sweeper;
pub mod webhook_ledger;
