pub mod audit;
pub mod cache;
pub mod executor;
pub mod postgres;

pub use audit::{AuditEntry, AuditSink, CustomLog, LogKind, LogOutcome};
pub use cache::{CacheDeleteMode, MemoryCache, ResultCache};
pub use executor::{JsonRow, SqlExecutor};
pub use postgres::{PgAccessStore, PgAuditLog, PgExecutor};
