//! In-memory collaborators for driving the façade without a database.

#![allow(dead_code)]

use async_trait::async_trait;
use record_crud::domain::access::{AccessStore, RoleService, ServiceEntry, UserInfo, UserStatus};
use record_crud::domain::query::{InsertBatch, Statement};
use record_crud::storage::{
    AuditEntry, AuditSink, CustomLog, JsonRow, LogKind, LogOutcome, MemoryCache, SqlExecutor,
};
use record_crud::{AccessEngine, CrudDeps, CrudError, ErrorCode};
use serde_json::Value as JsonValue;
use std::sync::{Arc, Mutex};

pub fn row(value: JsonValue) -> JsonRow {
    match value {
        JsonValue::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

/// Records every statement; SELECTs return `rows`, RETURNING statements `returning`.
#[derive(Default)]
pub struct RecordingExecutor {
    pub rows: Mutex<Vec<JsonRow>>,
    pub returning: Vec<String>,
    pub statements: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn with_rows(rows: Vec<JsonRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    pub fn returning(ids: &[&str]) -> Self {
        Self {
            returning: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    fn record(&self, sql: &str) {
        self.statements.lock().unwrap().push(sql.to_string());
    }
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    async fn fetch_records(&self, stmt: &Statement) -> anyhow::Result<Vec<JsonRow>> {
        self.record(&stmt.sql);
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn fetch_count(&self, stmt: &Statement) -> anyhow::Result<i64> {
        self.record(&stmt.sql);
        Ok(self.rows.lock().unwrap().len() as i64)
    }

    async fn execute(&self, stmt: &Statement) -> anyhow::Result<u64> {
        self.record(&stmt.sql);
        Ok(self.rows.lock().unwrap().len() as u64)
    }

    async fn execute_returning(&self, stmt: &Statement) -> anyhow::Result<Vec<String>> {
        self.record(&stmt.sql);
        Ok(self.returning.clone())
    }

    async fn insert_batch(&self, batch: &InsertBatch) -> anyhow::Result<Vec<String>> {
        self.record(&batch.sql);
        Ok((1..=batch.rows.len()).map(|i| format!("new-{}", i)).collect())
    }

    async fn execute_batch(&self, stmts: &[Statement]) -> anyhow::Result<Vec<String>> {
        for stmt in stmts {
            self.record(&stmt.sql);
        }
        Ok(self.returning.clone())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Live session for every caller; account and permissions are scripted.
pub struct ScriptedAccess {
    pub status: Option<UserStatus>,
    pub owned: i64,
    pub rows: Vec<RoleService>,
}

impl ScriptedAccess {
    pub fn member() -> Self {
        Self {
            status: Some(UserStatus {
                id: "u1".into(),
                is_admin: false,
                is_active: true,
            }),
            owned: 0,
            rows: Vec::new(),
        }
    }

    pub fn admin() -> Self {
        let mut s = Self::member();
        if let Some(status) = s.status.as_mut() {
            status.is_admin = true;
        }
        s
    }
}

#[async_trait]
impl AccessStore for ScriptedAccess {
    async fn session_expiry(&self, _user: &UserInfo) -> anyhow::Result<Option<i64>> {
        Ok(Some(i64::MAX))
    }
    async fn active_user(&self, _user_id: &str) -> anyhow::Result<Option<UserStatus>> {
        Ok(self.status.clone())
    }
    async fn user_role_ids(&self, _user_id: &str) -> anyhow::Result<Vec<String>> {
        Ok(vec!["r1".into()])
    }
    async fn profile_role_id(&self, _user_id: &str) -> anyhow::Result<Option<String>> {
        Ok(Some("r1".into()))
    }
    async fn owned_count(&self, _table: &str, _user_id: &str, _ids: &[String]) -> anyhow::Result<i64> {
        Ok(self.owned)
    }
    async fn service_entry(&self, _table: &str) -> anyhow::Result<Option<ServiceEntry>> {
        Ok(Some(ServiceEntry {
            id: "svc-orders".into(),
            category: "table".into(),
        }))
    }
    async fn role_services(&self, _role_id: &str, _service_ids: &[String]) -> anyhow::Result<Vec<RoleService>> {
        Ok(self.rows.clone())
    }
    async fn login_user(&self, user_id: &str, _login_name: &str) -> anyhow::Result<Option<String>> {
        Ok(Some(user_id.to_string()))
    }
    async fn remove_session(&self, _user_id: &str, _token: &str) -> anyhow::Result<u64> {
        Ok(1)
    }
}

#[derive(Default)]
pub struct RecordingAudit {
    pub fail: bool,
    pub entries: Mutex<Vec<(LogKind, String, AuditEntry)>>,
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn audit_log(&self, kind: LogKind, user_id: &str, entry: &AuditEntry) -> Result<LogOutcome, CrudError> {
        if self.fail {
            return Err(CrudError::new(ErrorCode::LogError, "audit table unavailable"));
        }
        self.entries
            .lock()
            .unwrap()
            .push((kind, user_id.to_string(), entry.clone()));
        Ok(LogOutcome::written(1))
    }

    async fn custom_log(&self, _entry: &CustomLog) -> Result<LogOutcome, CrudError> {
        Ok(LogOutcome::written(1))
    }
}

pub struct Harness {
    pub executor: Arc<RecordingExecutor>,
    pub audit: Arc<RecordingAudit>,
    pub cache: Arc<MemoryCache>,
    pub deps: CrudDeps,
}

impl Harness {
    pub fn new(executor: RecordingExecutor, access: ScriptedAccess) -> Self {
        Self::with_audit(executor, access, RecordingAudit::default())
    }

    pub fn with_audit(executor: RecordingExecutor, access: ScriptedAccess, audit: RecordingAudit) -> Self {
        let executor = Arc::new(executor);
        let audit = Arc::new(audit);
        let cache = Arc::new(MemoryCache::new());
        let deps = CrudDeps {
            executor: executor.clone(),
            access: AccessEngine::new(Arc::new(access), vec!["table".into()]),
            cache: cache.clone(),
            audit: audit.clone(),
        };
        Self {
            executor,
            audit,
            cache,
            deps,
        }
    }

    /// Same executor, cache and audit sink, seen through a different caller account.
    pub fn deps_for(&self, access: ScriptedAccess) -> CrudDeps {
        CrudDeps {
            access: AccessEngine::new(Arc::new(access), vec!["table".into()]),
            ..self.deps.clone()
        }
    }
}

pub fn caller() -> UserInfo {
    UserInfo {
        user_id: "u1".into(),
        login_name: "ada@example.com".into(),
        token: "tok".into(),
        ..Default::default()
    }
}
