use crate::domain::query::{InsertBatch, Statement};
use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

/// One result row: column name -> JSON value, in column order.
pub type JsonRow = Map<String, JsonValue>;

/// Executes synthesized statements. Mutating batches run in one transaction.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Runs a SELECT and materializes every row as a [`JsonRow`].
    async fn fetch_records(&self, stmt: &Statement) -> anyhow::Result<Vec<JsonRow>>;

    /// Runs a `SELECT COUNT(*) AS count ...`.
    async fn fetch_count(&self, stmt: &Statement) -> anyhow::Result<i64>;

    /// Runs a statement and returns the number of rows it affected.
    async fn execute(&self, stmt: &Statement) -> anyhow::Result<u64>;

    /// Runs a `... RETURNING id` statement and returns the ids as text.
    async fn execute_returning(&self, stmt: &Statement) -> anyhow::Result<Vec<String>>;

    /// Runs the INSERT template once per row inside one transaction.
    async fn insert_batch(&self, batch: &InsertBatch) -> anyhow::Result<Vec<String>>;

    /// Runs every `... RETURNING id` statement inside one transaction.
    async fn execute_batch(&self, stmts: &[Statement]) -> anyhow::Result<Vec<String>>;

    /// Round trip to the database, used by health checks.
    async fn ping(&self) -> anyhow::Result<()>;
}
