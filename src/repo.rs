mod store;

/// In-process store, used for tests and local runs without Postgres
pub mod memory;
/// Postgres store backed by sqlx
pub mod postgres;

pub use store::*;
