//! PostgreSQL implementations of the storage collaborators.

pub mod access_store;
pub mod audit_log;
pub mod executor;

pub use access_store::{AccessTables, PgAccessStore};
pub use audit_log::PgAuditLog;
pub use executor::PgExecutor;
