use crate::domain::access::UserInfo;
use crate::domain::model::{Filter, Record};
use crate::domain::query::Sort;
use crate::infra::config;
use crate::storage::postgres::AccessTables;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_QUERY_LIMIT: u64 = 10_000;
pub const DEFAULT_CACHE_EXPIRE_SECS: u64 = 300;

/// Which audit stamps are added to records before they are written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelOptions {
    /// `createdAt` / `updatedAt`
    pub time_stamp: bool,
    /// `createdBy` / `updatedBy`
    pub actor_stamp: bool,
    /// `isActive = true` on create when the caller left it out
    pub active_stamp: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            time_stamp: true,
            actor_stamp: true,
            active_stamp: false,
        }
    }
}

/// Per-deployment behaviour of the CRUD façade.
#[derive(Debug, Clone, PartialEq)]
pub struct CrudOptions {
    pub audit_table: String,
    pub access_table: String,
    pub role_table: String,
    pub user_table: String,
    pub profile_table: String,
    pub service_table: String,
    pub user_role_table: String,
    pub max_query_limit: u64,
    pub check_access: bool,
    pub cache_result: bool,
    pub cache_expire: u64,
    pub log_crud: bool,
    pub log_create: bool,
    pub log_update: bool,
    pub log_read: bool,
    pub log_delete: bool,
    pub model_options: ModelOptions,
    /// Service categories (besides `table`/`collection`) that count as table-level.
    pub app_tables: Vec<String>,
    /// Tables the ungated lookup read may serve; empty means none.
    pub lookup_tables: Vec<String>,
}

impl Default for CrudOptions {
    fn default() -> Self {
        let tables = AccessTables::default();
        Self {
            audit_table: "audits".to_string(),
            access_table: tables.access_table,
            role_table: tables.role_table,
            user_table: tables.user_table,
            profile_table: tables.profile_table,
            service_table: tables.service_table,
            user_role_table: tables.user_role_table,
            max_query_limit: DEFAULT_MAX_QUERY_LIMIT,
            check_access: true,
            cache_result: false,
            cache_expire: DEFAULT_CACHE_EXPIRE_SECS,
            log_crud: false,
            log_create: false,
            log_update: false,
            log_read: false,
            log_delete: false,
            model_options: ModelOptions::default(),
            app_tables: vec!["table".to_string()],
            lookup_tables: Vec::new(),
        }
    }
}

impl CrudOptions {
    /// Defaults overlaid with the `CRUD_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            max_query_limit: config::max_query_limit(),
            cache_expire: config::cache_expire_secs(),
            check_access: config::check_access(),
            cache_result: config::cache_result(),
            log_crud: config::log_crud(),
            lookup_tables: config::lookup_tables(),
            ..Self::default()
        }
    }

    pub fn access_tables(&self) -> AccessTables {
        AccessTables {
            access_table: self.access_table.clone(),
            user_table: self.user_table.clone(),
            role_table: self.role_table.clone(),
            profile_table: self.profile_table.clone(),
            service_table: self.service_table.clone(),
            user_role_table: self.user_role_table.clone(),
        }
    }
}

/// Caller input for one façade call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrudParams {
    pub table_name: String,
    pub user_info: UserInfo,
    pub action_params: Vec<Record>,
    pub record_ids: Vec<String>,
    pub query_params: Filter,
    pub sort_params: Sort,
    pub project_params: Vec<String>,
    pub skip: i64,
    pub limit: i64,
}

/// Pagination after normalisation: negative skip -> 0, limit clamped to `(0, max]`.
pub fn normalize_page(skip: i64, limit: i64, max_query_limit: u64) -> (u64, u64) {
    let max = if max_query_limit == 0 {
        DEFAULT_MAX_QUERY_LIMIT
    } else {
        max_query_limit
    };
    let skip = skip.max(0) as u64;
    let limit = if limit <= 0 || limit as u64 > max {
        max
    } else {
        limit as u64
    };
    (skip, limit)
}

/// `table-filter-sort-projection-ids-skip-limit`, parts JSON-encoded.
///
/// `filter` and `ids` are the ones the read actually runs with, which differ from
/// the caller's when the read falls back to the caller's own rows.
pub fn cache_key(params: &CrudParams, filter: &Filter, ids: &[String], skip: u64, limit: u64) -> String {
    let json = |v: serde_json::Result<String>| v.unwrap_or_default();
    format!(
        "{}-{}-{}-{}-{}-{}-{}",
        params.table_name,
        json(serde_json::to_string(filter)),
        json(serde_json::to_string(&params.sort_params)),
        json(serde_json::to_string(&params.project_params)),
        json(serde_json::to_string(ids)),
        skip,
        limit
    )
}
