use crate::domain::query::naming::table_ident;
use crate::error::{CrudError, ErrorCode};
use crate::storage::audit::{
    log_table_name, validate_custom, validate_entry, AuditEntry, AuditSink, CustomLog, LogKind,
    LogOutcome,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

/// Writes audit entries into the audit table
/// (`table_name, log_records, new_log_records, log_type, log_by, log_at`).
#[derive(Clone)]
pub struct PgAuditLog {
    pool: PgPool,
    audit_table: String,
}

impl PgAuditLog {
    pub fn new(pool: PgPool, audit_table: &str) -> anyhow::Result<Self> {
        let audit_table = if audit_table.is_empty() { "audits" } else { audit_table };
        table_ident(audit_table)?;
        Ok(Self {
            pool,
            audit_table: audit_table.to_string(),
        })
    }

    async fn insert(
        &self,
        table_name: &str,
        log_records: &Option<JsonValue>,
        new_log_records: &Option<JsonValue>,
        kind: LogKind,
        log_by: &str,
    ) -> Result<LogOutcome, CrudError> {
        let sql = format!(
            "INSERT INTO {}(table_name, log_records, new_log_records, log_type, log_by, log_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
            self.audit_table
        );
        let done = sqlx::query(&sql)
            .bind(table_name)
            .bind(log_records.clone())
            .bind(new_log_records.clone())
            .bind(kind.as_str())
            .bind(log_by)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| CrudError::new(ErrorCode::LogError, e.to_string()))?;
        Ok(LogOutcome::written(done.rows_affected()))
    }
}

#[async_trait]
impl AuditSink for PgAuditLog {
    async fn audit_log(&self, kind: LogKind, user_id: &str, entry: &AuditEntry) -> Result<LogOutcome, CrudError> {
        validate_entry(kind, user_id, entry)?;
        let new_records = if kind == LogKind::Update {
            &entry.new_log_records
        } else {
            &None
        };
        self.insert(
            &log_table_name(kind, entry),
            &entry.log_records,
            new_records,
            kind,
            user_id,
        )
        .await
    }

    async fn custom_log(&self, entry: &CustomLog) -> Result<LogOutcome, CrudError> {
        validate_custom(entry)?;
        let table_name = if entry.table_name.is_empty() {
            "not-specified"
        } else {
            entry.table_name.as_str()
        };
        self.insert(
            table_name,
            &entry.log_records,
            &entry.new_log_records,
            entry.log_type.unwrap_or(LogKind::Create),
            &entry.log_by,
        )
        .await
    }
}
