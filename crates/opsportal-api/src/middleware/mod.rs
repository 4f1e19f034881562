pub mod audit;
pub mod idempotency;
