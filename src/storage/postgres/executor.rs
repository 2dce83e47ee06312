//! Statement execution against PostgreSQL through a shared `PgPool`.

use crate::domain::query::{InsertBatch, SqlValue, Statement};
use crate::storage::executor::{JsonRow, SqlExecutor};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::encode::IsNull;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgPoolOptions, PgTypeInfo};
use sqlx::query::Query;
use sqlx::{Encode, PgPool, Postgres, Row, Type};

/// A NULL sent with an unspecified parameter type, so the server infers it from the
/// column it lands in.
struct UntypedNull;

impl Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl Encode<'_, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> IsNull {
        IsNull::Yes
    }
}

/// Binds positional values in order.
pub(crate) fn bind_values<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    values: &'q [SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for value in values {
        query = match value {
            SqlValue::Null => query.bind(UntypedNull),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Uuid(u) => query.bind(*u),
            SqlValue::Json(v) => query.bind(v),
            SqlValue::Timestamp(ts) => query.bind(*ts),
        };
    }
    query
}

/// `... RETURNING id` wrapped so every id type comes back as text.
fn returning_ids_sql(sql: &str) -> String {
    format!("WITH affected AS ({}) SELECT id::text AS id FROM affected", sql)
}

#[derive(Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool with `max_connections`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_records(&self, stmt: &Statement) -> Result<Vec<JsonRow>> {
        let sql = format!("SELECT row_to_json(q.*) AS record FROM ({}) q", stmt.sql);
        let rows = bind_values(sqlx::query(&sql), &stmt.values)
            .fetch_all(&self.pool)
            .await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match row.try_get::<JsonValue, _>("record")? {
                JsonValue::Object(map) => records.push(map),
                other => anyhow::bail!("row did not materialize as an object: {}", other),
            }
        }
        tracing::debug!(sql = %stmt.sql, rows = records.len(), "fetched records");
        Ok(records)
    }

    async fn fetch_count(&self, stmt: &Statement) -> Result<i64> {
        let row = bind_values(sqlx::query(&stmt.sql), &stmt.values)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get::<i64, _>("count")?)
    }

    async fn execute(&self, stmt: &Statement) -> Result<u64> {
        let done = bind_values(sqlx::query(&stmt.sql), &stmt.values)
            .execute(&self.pool)
            .await?;
        tracing::debug!(sql = %stmt.sql, rows = done.rows_affected(), "executed statement");
        Ok(done.rows_affected())
    }

    async fn execute_returning(&self, stmt: &Statement) -> Result<Vec<String>> {
        let sql = returning_ids_sql(&stmt.sql);
        let rows = bind_values(sqlx::query(&sql), &stmt.values)
            .fetch_all(&self.pool)
            .await?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(row.try_get::<String, _>("id")?);
        }
        Ok(ids)
    }

    async fn insert_batch(&self, batch: &InsertBatch) -> Result<Vec<String>> {
        let sql = returning_ids_sql(&batch.sql);
        let mut transaction = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(batch.rows.len());
        for (index, values) in batch.rows.iter().enumerate() {
            let outcome = bind_values(sqlx::query(&sql), values)
                .fetch_one(&mut *transaction)
                .await;
            match outcome {
                Ok(row) => ids.push(row.try_get::<String, _>("id")?),
                Err(e) => {
                    tracing::warn!(table_sql = %batch.sql, record = index, error = %e, "insert failed; rolling back batch");
                    if let Err(rollback) = transaction.rollback().await {
                        tracing::warn!(error = %rollback, "rollback failed");
                    }
                    return Err(e.into());
                }
            }
        }
        transaction.commit().await?;
        Ok(ids)
    }

    async fn execute_batch(&self, stmts: &[Statement]) -> Result<Vec<String>> {
        let mut transaction = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            let sql = returning_ids_sql(&stmt.sql);
            let outcome = bind_values(sqlx::query(&sql), &stmt.values)
                .fetch_all(&mut *transaction)
                .await;
            match outcome {
                Ok(rows) => {
                    for row in rows {
                        ids.push(row.try_get::<String, _>("id")?);
                    }
                }
                Err(e) => {
                    tracing::warn!(sql = %stmt.sql, error = %e, "statement failed; rolling back batch");
                    if let Err(rollback) = transaction.rollback().await {
                        tracing::warn!(error = %rollback, "rollback failed");
                    }
                    return Err(e.into());
                }
            }
        }
        transaction.commit().await?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returning_statements_are_wrapped_for_text_ids() {
        assert_eq!(
            returning_ids_sql("UPDATE t SET a=$1 WHERE id=$2 RETURNING id"),
            "WITH affected AS (UPDATE t SET a=$1 WHERE id=$2 RETURNING id) SELECT id::text AS id FROM affected"
        );
    }
}
