//! The CRUD façade.
//!
//! A [`Crud`] is built per call from caller params and decides, from the shape of
//! those params, which builder to run. Access checks happen before any statement is
//! built; audit logging and cache invalidation happen after the statement succeeds and
//! never fail the call.

use crate::app::classify::{classify_save, stamp_create, stamp_update, SaveTask};
use crate::app::options::{cache_key, normalize_page, CrudOptions, CrudParams, DEFAULT_CACHE_EXPIRE_SECS};
use crate::app::results::{to_caller_naming, CrudResult, GetResult, GetStats, RecordsCount};
use crate::domain::access::{AccessEngine, AccessInfo, TaskPermission, TaskType, UserInfo};
use crate::domain::model::{CrudModel, FieldValue, Filter, ModelRegistry, Record, ID_FIELD};
use crate::domain::query::{
    build_count, build_create, build_delete_all, build_delete_by_id, build_delete_by_ids,
    build_delete_by_param, build_select_all, build_select_by_id, build_select_by_ids,
    build_select_by_param, build_update, build_update_by_id, build_update_by_ids,
    build_update_by_param, ColumnTypes, SelectOptions, Statement,
};
use crate::error::{CrudError, ErrorCode, QueryBuildError};
use crate::storage::{
    AuditEntry, AuditSink, CacheDeleteMode, CustomLog, JsonRow, LogKind, LogOutcome, MemoryCache,
    PgAccessStore, PgAuditLog, PgExecutor, ResultCache, SqlExecutor,
};
use serde_json::{json, Map, Value as JsonValue};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Collaborators shared by every façade call.
#[derive(Clone)]
pub struct CrudDeps {
    pub executor: Arc<dyn SqlExecutor>,
    pub access: AccessEngine,
    pub cache: Arc<dyn ResultCache>,
    pub audit: Arc<dyn AuditSink>,
}

/// Which rows a read, update-pre-image or delete addresses.
#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    Id(&'a str),
    Ids(&'a [String]),
    Param(&'a Filter),
    All,
}

impl Target<'_> {
    fn select(
        &self,
        table: &str,
        fields: &[String],
        options: &SelectOptions,
        types: &ColumnTypes,
    ) -> Result<Statement, QueryBuildError> {
        match self {
            Target::Id(id) => build_select_by_id(table, fields, id, options, types),
            Target::Ids(ids) => build_select_by_ids(table, fields, ids, options),
            Target::Param(filter) => build_select_by_param(table, fields, filter, options, types),
            Target::All => build_select_all(table, fields, options),
        }
    }

    fn count(&self, table: &str, types: &ColumnTypes) -> Result<Statement, QueryBuildError> {
        match self {
            Target::Id(id) => {
                let mut filter = Filter::new();
                filter.insert(ID_FIELD.to_string(), FieldValue::from(*id));
                build_count(table, Some(&filter), types)
            }
            Target::Ids(ids) => {
                let mut filter = Filter::new();
                let list = ids.iter().map(|id| FieldValue::from(id.as_str())).collect();
                filter.insert(ID_FIELD.to_string(), FieldValue::List(list));
                build_count(table, Some(&filter), types)
            }
            Target::Param(filter) => build_count(table, Some(filter), types),
            Target::All => build_count(table, None, types),
        }
    }

    fn record_ids(&self) -> Vec<String> {
        match self {
            Target::Id(id) => vec![id.to_string()],
            Target::Ids(ids) => ids.to_vec(),
            _ => Vec::new(),
        }
    }

    fn query_param(&self) -> Filter {
        match self {
            Target::Param(filter) => (*filter).clone(),
            _ => Filter::new(),
        }
    }
}

fn record_json(record: &Record) -> JsonValue {
    JsonValue::Object(
        record
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<Map<String, JsonValue>>(),
    )
}

fn records_json(records: &[Record]) -> JsonValue {
    JsonValue::Array(records.iter().map(record_json).collect())
}

fn rows_json(rows: &[JsonRow]) -> JsonValue {
    JsonValue::Array(rows.iter().cloned().map(JsonValue::Object).collect())
}

/// Text form of a row's `id` column.
fn row_id(row: &JsonRow) -> Option<String> {
    match row.get(ID_FIELD)? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// One façade call: the caller's params plus everything derived from them.
pub struct Crud {
    deps: CrudDeps,
    options: CrudOptions,
    params: CrudParams,
    model: Option<Arc<dyn CrudModel>>,
    types: ColumnTypes,
    skip: u64,
    limit: u64,
}

impl Crud {
    /// Normalises pagination and cache settings. The table name is required.
    pub fn new(deps: CrudDeps, params: CrudParams, mut options: CrudOptions) -> Result<Self, CrudError> {
        if params.table_name.trim().is_empty() {
            return Err(CrudError::params("table-name is required."));
        }
        if options.cache_expire == 0 {
            options.cache_expire = DEFAULT_CACHE_EXPIRE_SECS;
        }
        let (skip, limit) = normalize_page(params.skip, params.limit, options.max_query_limit);
        Ok(Self {
            deps,
            options,
            params,
            model: None,
            types: ColumnTypes::new(),
            skip,
            limit,
        })
    }

    /// Attaches the table's model: its field inventory becomes the default projection
    /// and its validation runs before every create/update. Its column types decide
    /// how values are bound.
    pub fn with_model(mut self, model: Arc<dyn CrudModel>) -> Self {
        self.types = model.column_types().cloned().unwrap_or_default();
        self.model = Some(model);
        self
    }

    pub fn params(&self) -> &CrudParams {
        &self.params
    }

    /// Key a read of `target` is cached under.
    fn read_cache_key(&self, target: Target<'_>) -> String {
        cache_key(
            &self.params,
            &target.query_param(),
            &target.record_ids(),
            self.skip,
            self.limit,
        )
    }

    fn table(&self) -> &str {
        &self.params.table_name
    }

    fn user(&self) -> &UserInfo {
        &self.params.user_info
    }

    fn projection(&self) -> Vec<String> {
        if !self.params.project_params.is_empty() {
            return self.params.project_params.clone();
        }
        self.model
            .as_ref()
            .map(|m| m.field_names())
            .unwrap_or_default()
    }

    fn select_options(&self) -> SelectOptions {
        SelectOptions {
            skip: self.skip,
            limit: self.limit,
            sort: self.params.sort_params.clone(),
        }
    }

    fn validate(&self, record: &Record) -> Result<(), CrudError> {
        match &self.model {
            Some(model) => model.validate_record(record).map_err(CrudError::params),
            None => Ok(()),
        }
    }

    async fn authorize(&self, task: TaskType, record_ids: &[String]) -> Result<(), CrudError> {
        if !self.options.check_access {
            return Ok(());
        }
        self.task_permission_by_id(task, record_ids).await.map(|_| ())
    }

    async fn authorize_by_param(&self, task: TaskType, filter: &Filter) -> Result<(), CrudError> {
        if !self.options.check_access {
            return Ok(());
        }
        self.task_permission_by_param(task, filter).await.map(|_| ())
    }

    async fn audit(&self, enabled: bool, kind: LogKind, entry: AuditEntry) -> Option<LogOutcome> {
        if !(enabled || self.options.log_crud) {
            return None;
        }
        match self.deps.audit.audit_log(kind, &self.user().user_id, &entry).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(table = %self.table(), kind = %kind, error = %e, "audit log failed");
                Some(LogOutcome::failed(&e))
            }
        }
    }

    async fn invalidate_cache(&self) {
        self.deps
            .cache
            .delete("", self.table(), CacheDeleteMode::Namespace)
            .await;
    }

    /// Current rows addressed by `target`, all columns, no pagination.
    async fn current_records(&self, target: Target<'_>) -> Result<Vec<JsonRow>, CrudError> {
        let stmt = target
            .select(self.table(), &[], &SelectOptions::default(), &self.types)
            .map_err(|e| e.into_crud(ErrorCode::ReadError))?;
        self.deps
            .executor
            .fetch_records(&stmt)
            .await
            .map_err(|e| CrudError::from_db(ErrorCode::ReadError, "Error reading current record(s)", e))
    }

    /// Runs the full access pipeline for `task` on this table.
    pub async fn task_permission_by_id(&self, task: TaskType, record_ids: &[String]) -> Result<TaskPermission, CrudError> {
        self.deps
            .access
            .task_permission_by_id(self.user(), self.table(), task, record_ids)
            .await
    }

    /// Resolves `filter` to the ids it currently matches, then checks those ids.
    pub async fn task_permission_by_param(&self, task: TaskType, filter: &Filter) -> Result<TaskPermission, CrudError> {
        let rows = self.current_records(Target::Param(filter)).await?;
        if rows.is_empty() {
            return Err(CrudError::not_found(
                "Record(s) not found for the specified query-params",
            ));
        }
        let ids: Vec<String> = rows.iter().filter_map(row_id).collect();
        self.task_permission_by_id(task, &ids).await
    }

    /// Session and account status of the caller.
    pub async fn check_user_access(&self) -> Result<AccessInfo, CrudError> {
        self.deps.access.check_user_access(self.user()).await
    }

    pub async fn check_login_status(&self) -> Result<String, CrudError> {
        self.deps.access.check_login_status(self.user()).await
    }

    // Save

    /// Creates or updates, depending on the shape of `action_params`, `record_ids`
    /// and `query_params`.
    pub async fn save_record(&self) -> Result<CrudResult, CrudError> {
        let task = classify_save(
            &self.params.action_params,
            &self.params.record_ids,
            &self.params.query_params,
        );
        match task {
            SaveTask::Create(records) => {
                tracing::debug!(table = %self.table(), records = records.len(), "save classified as create");
                self.authorize(TaskType::Create, &[]).await?;
                self.create(records).await
            }
            SaveTask::UpdateById { record, id } => {
                tracing::debug!(table = %self.table(), id = %id, "save classified as update-by-id");
                self.authorize(TaskType::Update, std::slice::from_ref(&id)).await?;
                self.update_by_id(record, &id).await
            }
            SaveTask::UpdateByIds { record, ids } => {
                tracing::debug!(table = %self.table(), ids = ids.len(), "save classified as update-by-ids");
                self.authorize(TaskType::Update, &ids).await?;
                self.update_by_ids(record, &ids).await
            }
            SaveTask::UpdateByParam { record, filter } => {
                tracing::debug!(table = %self.table(), "save classified as update-by-param");
                self.authorize_by_param(TaskType::Update, &filter).await?;
                self.update_by_param(record, &filter).await
            }
            SaveTask::UpdateBatch(records) => {
                tracing::debug!(table = %self.table(), records = records.len(), "save classified as batch update");
                let ids: Vec<String> = records
                    .iter()
                    .filter_map(crate::domain::model::record_id)
                    .collect();
                self.authorize(TaskType::Update, &ids).await?;
                self.update(records).await
            }
            SaveTask::Mixed => Err(CrudError::new(
                ErrorCode::SaveError,
                "You may only create or update record(s), not both at the same time",
            )),
            SaveTask::Empty => Err(CrudError::new(
                ErrorCode::SaveError,
                "Inputs errors: actionParams required to complete create or update task.",
            )),
        }
    }

    /// Inserts `records` in one transaction.
    pub async fn create(&self, mut records: Vec<Record>) -> Result<CrudResult, CrudError> {
        if records.is_empty() {
            return Err(CrudError::params("records are required to complete the create task."));
        }
        for record in records.iter_mut() {
            self.validate(record)?;
            stamp_create(record, &self.user().user_id, &self.options.model_options);
        }
        let batch = build_create(self.table(), &records, &self.types).map_err(|e| e.into_crud(ErrorCode::InsertError))?;
        let ids = self
            .deps
            .executor
            .insert_batch(&batch)
            .await
            .map_err(|e| CrudError::from_db(ErrorCode::InsertError, "Error creating new record(s)", e))?;
        tracing::info!(table = %self.table(), created = ids.len(), "records created");
        self.invalidate_cache().await;

        let entry = AuditEntry {
            table_name: self.table().to_string(),
            log_records: Some(records_json(&records)),
            new_log_records: None,
        };
        let log_res = self.audit(self.options.log_create, LogKind::Create, entry).await;
        Ok(CrudResult {
            query_param: Filter::new(),
            records_count: ids.len(),
            record_ids: ids,
            task_type: TaskType::Create,
            log_res,
        })
    }

    /// Updates several records, each addressed by its own `id`, in one transaction.
    pub async fn update(&self, mut records: Vec<Record>) -> Result<CrudResult, CrudError> {
        if records.is_empty() {
            return Err(CrudError::params("records are required to complete the update task."));
        }
        let ids: Vec<String> = records
            .iter()
            .filter_map(crate::domain::model::record_id)
            .collect();
        for record in records.iter_mut() {
            self.validate(record)?;
            stamp_update(record, &self.user().user_id, &self.options.model_options);
        }
        let stmts = build_update(self.table(), &records, &self.types).map_err(|e| e.into_crud(ErrorCode::UpdateError))?;
        self.run_update(Target::Ids(&ids), &records, |executor| async move {
            executor.execute_batch(&stmts).await
        })
        .await
    }

    pub async fn update_by_id(&self, mut record: Record, id: &str) -> Result<CrudResult, CrudError> {
        self.validate(&record)?;
        stamp_update(&mut record, &self.user().user_id, &self.options.model_options);
        let stmt = build_update_by_id(self.table(), &record, id, &self.types).map_err(|e| e.into_crud(ErrorCode::UpdateError))?;
        self.run_update(Target::Id(id), std::slice::from_ref(&record), |executor| async move {
            executor.execute_returning(&stmt).await
        })
        .await
    }

    pub async fn update_by_ids(&self, mut record: Record, ids: &[String]) -> Result<CrudResult, CrudError> {
        self.validate(&record)?;
        stamp_update(&mut record, &self.user().user_id, &self.options.model_options);
        let stmt = build_update_by_ids(self.table(), &record, ids, &self.types).map_err(|e| e.into_crud(ErrorCode::UpdateError))?;
        self.run_update(Target::Ids(ids), std::slice::from_ref(&record), |executor| async move {
            executor.execute_returning(&stmt).await
        })
        .await
    }

    pub async fn update_by_param(&self, mut record: Record, filter: &Filter) -> Result<CrudResult, CrudError> {
        self.validate(&record)?;
        stamp_update(&mut record, &self.user().user_id, &self.options.model_options);
        let stmt = build_update_by_param(self.table(), &record, filter, &self.types).map_err(|e| e.into_crud(ErrorCode::UpdateError))?;
        self.run_update(Target::Param(filter), std::slice::from_ref(&record), |executor| async move {
            executor.execute_returning(&stmt).await
        })
        .await
    }

    async fn run_update<F, Fut>(&self, target: Target<'_>, records: &[Record], exec: F) -> Result<CrudResult, CrudError>
    where
        F: FnOnce(Arc<dyn SqlExecutor>) -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<Vec<String>>>,
    {
        let logging = self.options.log_update || self.options.log_crud;
        let pre_image = if logging {
            self.current_records(target).await?
        } else {
            Vec::new()
        };

        let ids = exec(self.deps.executor.clone())
            .await
            .map_err(|e| CrudError::from_db(ErrorCode::UpdateError, "Error updating record(s)", e))?;
        tracing::info!(table = %self.table(), updated = ids.len(), "records updated");
        self.invalidate_cache().await;

        let entry = AuditEntry {
            table_name: self.table().to_string(),
            log_records: Some(rows_json(&pre_image)),
            new_log_records: Some(records_json(records)),
        };
        let log_res = self.audit(self.options.log_update, LogKind::Update, entry).await;
        Ok(CrudResult {
            query_param: target.query_param(),
            records_count: ids.len(),
            record_ids: ids,
            task_type: TaskType::Update,
            log_res,
        })
    }

    // Delete

    /// Deletes by `record_ids` or `query_params`. Without either the call is refused.
    pub async fn delete_record(&self) -> Result<CrudResult, CrudError> {
        let ids = &self.params.record_ids;
        let filter = &self.params.query_params;
        match ids.len() {
            1 => {
                self.authorize(TaskType::Delete, ids).await?;
                self.delete_by_id(&ids[0]).await
            }
            n if n > 1 => {
                self.authorize(TaskType::Delete, ids).await?;
                self.delete_by_ids(ids).await
            }
            _ if !filter.is_empty() => {
                self.authorize_by_param(TaskType::Delete, filter).await?;
                self.delete_by_param(filter).await
            }
            _ => Err(CrudError::new(
                ErrorCode::RemoveError,
                "You may delete records by recordIds or queryParams only.",
            )),
        }
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<CrudResult, CrudError> {
        let stmt = build_delete_by_id(self.table(), id, &self.types).map_err(|e| e.into_crud(ErrorCode::DeleteError))?;
        self.run_delete(Target::Id(id), stmt).await
    }

    pub async fn delete_by_ids(&self, ids: &[String]) -> Result<CrudResult, CrudError> {
        let stmt = build_delete_by_ids(self.table(), ids).map_err(|e| e.into_crud(ErrorCode::DeleteError))?;
        self.run_delete(Target::Ids(ids), stmt).await
    }

    pub async fn delete_by_param(&self, filter: &Filter) -> Result<CrudResult, CrudError> {
        let stmt = build_delete_by_param(self.table(), filter, &self.types).map_err(|e| e.into_crud(ErrorCode::DeleteError))?;
        self.run_delete(Target::Param(filter), stmt).await
    }

    async fn run_delete(&self, target: Target<'_>, stmt: Statement) -> Result<CrudResult, CrudError> {
        let pre_image = self.current_records(target).await?;
        if pre_image.is_empty() {
            return Err(CrudError::not_found("Record not found"));
        }
        let affected = self
            .deps
            .executor
            .execute(&stmt)
            .await
            .map_err(|e| CrudError::from_db(ErrorCode::DeleteError, "Error deleting record(s)", e))?;
        tracing::info!(table = %self.table(), deleted = affected, "records deleted");
        self.invalidate_cache().await;

        let record_ids = match target {
            Target::Param(_) => pre_image.iter().filter_map(row_id).collect(),
            _ => target.record_ids(),
        };
        let entry = AuditEntry {
            table_name: self.table().to_string(),
            log_records: Some(json!({
                "logRecords": rows_json(&pre_image),
                "recordIds": record_ids,
            })),
            new_log_records: None,
        };
        let log_res = self.audit(self.options.log_delete, LogKind::Delete, entry).await;
        Ok(CrudResult {
            query_param: target.query_param(),
            record_ids,
            records_count: affected as usize,
            task_type: TaskType::Delete,
            log_res,
        })
    }

    /// Removes every row of the table. Never reached from [`Crud::delete_record`].
    pub async fn delete_all(&self) -> Result<CrudResult, CrudError> {
        self.authorize(TaskType::Delete, &[]).await?;
        let stmt = build_delete_all(self.table()).map_err(|e| e.into_crud(ErrorCode::DeleteError))?;
        let affected = self
            .deps
            .executor
            .execute(&stmt)
            .await
            .map_err(|e| CrudError::from_db(ErrorCode::DeleteError, "Error deleting record(s)", e))?;
        tracing::warn!(table = %self.table(), deleted = affected, "table cleared");
        self.invalidate_cache().await;

        let entry = AuditEntry {
            table_name: self.table().to_string(),
            log_records: Some(json!({"query": "all"})),
            new_log_records: None,
        };
        let log_res = self.audit(self.options.log_delete, LogKind::Delete, entry).await;
        Ok(CrudResult {
            query_param: Filter::new(),
            record_ids: Vec::new(),
            records_count: affected as usize,
            task_type: TaskType::Delete,
            log_res,
        })
    }

    // Get

    /// Access-gated read by `record_ids`, `query_params`, or, with neither, every row
    /// (admins) or the caller's own rows (active users).
    pub async fn get_record(&self) -> Result<GetResult, CrudError> {
        let ids = &self.params.record_ids;
        let filter = &self.params.query_params;
        match ids.len() {
            1 => {
                self.authorize(TaskType::Read, ids).await?;
                self.get_by_id(&ids[0]).await
            }
            n if n > 1 => {
                self.authorize(TaskType::Read, ids).await?;
                self.get_by_ids(ids).await
            }
            _ if !filter.is_empty() => {
                self.authorize_by_param(TaskType::Read, filter).await?;
                self.get_by_param(filter).await
            }
            _ if !self.options.check_access => self.get_all().await,
            _ => {
                let info = self.check_user_access().await?;
                if info.is_admin {
                    self.get_all().await
                } else if info.is_active && !info.user_id.is_empty() {
                    let mut own = Filter::new();
                    own.insert("createdBy".to_string(), FieldValue::from(info.user_id));
                    self.get_by_param(&own).await
                } else {
                    Err(CrudError::not_found(
                        "Records not found - ensure you have provided the correct query-parameters",
                    ))
                }
            }
        }
    }

    /// Read without access gating (lookup tables and other public data).
    pub async fn get_records(&self) -> Result<GetResult, CrudError> {
        let ids = &self.params.record_ids;
        let filter = &self.params.query_params;
        match ids.len() {
            1 => self.get_by_id(&ids[0]).await,
            n if n > 1 => self.get_by_ids(ids).await,
            _ if !filter.is_empty() => self.get_by_param(filter).await,
            _ => self.get_all().await,
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<GetResult, CrudError> {
        self.read(Target::Id(id)).await
    }

    pub async fn get_by_ids(&self, ids: &[String]) -> Result<GetResult, CrudError> {
        self.read(Target::Ids(ids)).await
    }

    pub async fn get_by_param(&self, filter: &Filter) -> Result<GetResult, CrudError> {
        self.read(Target::Param(filter)).await
    }

    pub async fn get_all(&self) -> Result<GetResult, CrudError> {
        self.read(Target::All).await
    }

    async fn read(&self, target: Target<'_>) -> Result<GetResult, CrudError> {
        let key = self.read_cache_key(target);
        if self.options.cache_result {
            if let Some(hit) = self.deps.cache.get(&key, self.table()).await {
                match serde_json::from_value::<GetResult>(hit) {
                    Ok(result) => {
                        tracing::debug!(table = %self.table(), "read served from cache");
                        return Ok(result);
                    }
                    Err(e) => tracing::warn!(table = %self.table(), error = %e, "ignoring unreadable cache entry"),
                }
            }
        }

        let select = target
            .select(self.table(), &self.projection(), &self.select_options(), &self.types)
            .map_err(|e| e.into_crud(ErrorCode::ReadError))?;
        let count = target
            .count(self.table(), &self.types)
            .map_err(|e| e.into_crud(ErrorCode::ReadError))?;

        let total = self
            .deps
            .executor
            .fetch_count(&count)
            .await
            .map_err(|e| CrudError::from_db(ErrorCode::ReadError, "Error computing records count", e))?;
        let rows = self
            .deps
            .executor
            .fetch_records(&select)
            .await
            .map_err(|e| CrudError::from_db(ErrorCode::ReadError, "Error reading record(s)", e))?;
        if rows.is_empty() {
            return Err(CrudError::not_found("Records not found"));
        }
        let records: Vec<JsonRow> = rows.into_iter().map(to_caller_naming).collect();

        let record_ids = target.record_ids();
        let query_param = target.query_param();
        let entry = AuditEntry {
            table_name: self.table().to_string(),
            log_records: Some(match target {
                Target::Param(filter) => json!({"queryParam": filter}),
                Target::All => json!({"query": "all"}),
                _ => json!({"recordIds": record_ids}),
            }),
            new_log_records: None,
        };
        let log_res = self.audit(self.options.log_read, LogKind::Read, entry).await;

        let result = GetResult {
            stats: GetStats {
                skip: self.skip,
                limit: self.limit,
                records_count: records.len(),
                total_records_count: total,
                query_param,
                record_ids,
            },
            records,
            task_type: TaskType::Read,
            log_res,
        };
        if self.options.cache_result {
            match serde_json::to_value(&result) {
                Ok(value) => {
                    self.deps
                        .cache
                        .set(&key, self.table(), value, self.options.cache_expire)
                        .await
                }
                Err(e) => tracing::warn!(table = %self.table(), error = %e, "read result not cached"),
            }
        }
        Ok(result)
    }

    /// Total rows of the table and rows created by the caller; gated as a table-wide read.
    pub async fn records_count(&self) -> Result<RecordsCount, CrudError> {
        self.authorize(TaskType::Read, &[]).await?;
        let total_stmt = build_count(self.table(), None, &self.types).map_err(|e| e.into_crud(ErrorCode::ReadError))?;
        let total = self
            .deps
            .executor
            .fetch_count(&total_stmt)
            .await
            .map_err(|e| CrudError::from_db(ErrorCode::ReadError, "Error computing records count", e))?;

        let user_id = &self.user().user_id;
        let owner = if user_id.is_empty() {
            0
        } else {
            let mut own = Filter::new();
            own.insert("createdBy".to_string(), FieldValue::from(user_id.as_str()));
            let stmt = build_count(self.table(), Some(&own), &self.types).map_err(|e| e.into_crud(ErrorCode::ReadError))?;
            self.deps
                .executor
                .fetch_count(&stmt)
                .await
                .map_err(|e| CrudError::from_db(ErrorCode::ReadError, "Error computing records count", e))?
        };
        Ok(RecordsCount {
            total_records_count: total,
            owner_records_count: owner,
        })
    }
}

/// Long-lived entry point: owns the collaborators and the model registry and hands
/// out one [`Crud`] per call.
#[derive(Clone)]
pub struct CrudService {
    deps: CrudDeps,
    options: CrudOptions,
    registry: Arc<RwLock<ModelRegistry>>,
}

impl CrudService {
    pub fn new(deps: CrudDeps, options: CrudOptions, registry: Arc<RwLock<ModelRegistry>>) -> Self {
        Self {
            deps,
            options,
            registry,
        }
    }

    /// Connects to Postgres and wires the Postgres collaborators, an in-process cache
    /// and a registry loaded from the catalog.
    pub async fn connect(database_url: &str, max_connections: u32, options: CrudOptions) -> anyhow::Result<Self> {
        let executor = PgExecutor::connect(database_url, max_connections).await?;
        let pool = executor.pool().clone();
        let store = PgAccessStore::new(pool.clone(), options.access_tables())?;
        let audit = PgAuditLog::new(pool.clone(), &options.audit_table)?;
        let registry = ModelRegistry::load_from_db(&pool).await?;

        let deps = CrudDeps {
            executor: Arc::new(executor),
            access: AccessEngine::new(Arc::new(store), options.app_tables.clone()),
            cache: Arc::new(MemoryCache::new()),
            audit: Arc::new(audit),
        };
        Ok(Self::new(deps, options, Arc::new(RwLock::new(registry))))
    }

    pub fn options(&self) -> &CrudOptions {
        &self.options
    }

    /// Login-status check outside any table context.
    pub async fn check_login_status(&self, user: &UserInfo) -> Result<String, CrudError> {
        self.deps.access.check_login_status(user).await
    }

    /// Writes a free-form audit entry for a signed-in caller. `log_by` defaults to
    /// the caller.
    pub async fn custom_log(&self, user: &UserInfo, entry: &CustomLog) -> Result<LogOutcome, CrudError> {
        if self.options.check_access {
            self.deps.access.check_user_access(user).await?;
        }
        if entry.log_by.is_empty() {
            let entry = CustomLog {
                log_by: user.user_id.clone(),
                ..entry.clone()
            };
            return self.deps.audit.custom_log(&entry).await;
        }
        self.deps.audit.custom_log(entry).await
    }

    /// Ungated read, limited to the configured lookup tables.
    pub async fn lookup(&self, params: CrudParams) -> Result<GetResult, CrudError> {
        let table = params.table_name.trim();
        if !self.options.lookup_tables.iter().any(|t| t == table) {
            return Err(CrudError::unauthorized(format!(
                "'{}' is not a lookup table",
                table
            )));
        }
        self.crud(params).await?.get_records().await
    }

    /// Checks the database is reachable.
    pub async fn ping(&self) -> anyhow::Result<()> {
        self.deps.executor.ping().await
    }

    pub fn registry(&self) -> Arc<RwLock<ModelRegistry>> {
        self.registry.clone()
    }

    /// Builds the per-call façade, attaching the table's registered model if any.
    pub async fn crud(&self, params: CrudParams) -> Result<Crud, CrudError> {
        let model = self.registry.read().await.get(&params.table_name);
        let crud = Crud::new(self.deps.clone(), params, self.options.clone())?;
        Ok(match model {
            Some(model) => crud.with_model(model),
            None => crud,
        })
    }
}
