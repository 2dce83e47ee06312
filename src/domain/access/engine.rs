//! The access decision pipeline: session -> account -> ownership -> role services
//! -> per-task evaluation.

use crate::domain::access::store::AccessStore;
use crate::domain::access::types::{
    AccessDecision, AccessInfo, RoleService, TaskPermission, TaskType, UserInfo,
};
use crate::error::{CrudError, ErrorCode};
use chrono::Utc;
use std::sync::Arc;

/// Service categories that always denote table-level services.
const TABLE_CATEGORIES: [&str; 2] = ["table", "collection"];

/// Final decision over an already-resolved [`AccessDecision`].
pub fn evaluate(decision: &AccessDecision, task: TaskType, record_ids: &[String]) -> bool {
    if !decision.is_active {
        return false;
    }
    if decision.is_admin || decision.owner_permitted {
        return true;
    }
    roles_permit(&decision.role_services, &decision.table_id, task, record_ids)
}

/// Role-service evaluation.
///
/// Every table-level row must grant `task`; every targeted id needs at least one
/// record-level row granting it. Both must hold, and at least one of the two
/// levels must have something to check.
pub fn roles_permit(rows: &[RoleService], table_id: &str, task: TaskType, record_ids: &[String]) -> bool {
    let table_rows: Vec<&RoleService> = if table_id.is_empty() {
        Vec::new()
    } else {
        rows.iter().filter(|r| r.service_id == table_id).collect()
    };
    let record_ids: &[String] = if task == TaskType::Create { &[] } else { record_ids };

    if table_rows.is_empty() && record_ids.is_empty() {
        return false;
    }
    let table_ok = table_rows.iter().all(|r| r.grants(task));
    let records_ok = record_ids
        .iter()
        .all(|id| rows.iter().any(|r| &r.service_id == id && r.grants(task)));
    table_ok && records_ok
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Runs the access pipeline against an [`AccessStore`]. Nothing is cached between calls.
#[derive(Clone)]
pub struct AccessEngine {
    store: Arc<dyn AccessStore>,
    app_tables: Vec<String>,
}

impl AccessEngine {
    pub fn new(store: Arc<dyn AccessStore>, app_tables: Vec<String>) -> Self {
        Self {
            store,
            app_tables: app_tables.into_iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    pub fn store(&self) -> &Arc<dyn AccessStore> {
        &self.store
    }

    /// Session validity and account status.
    pub async fn check_user_access(&self, user: &UserInfo) -> Result<AccessInfo, CrudError> {
        let expire = match self.store.session_expiry(user).await {
            Ok(Some(expire)) => expire,
            Ok(None) => {
                return Err(CrudError::unauthorized(
                    "UnAuthorized: please ensure that you are logged-in: no active session",
                ))
            }
            Err(e) => {
                return Err(CrudError::unauthorized(format!(
                    "UnAuthorized: please ensure that you are logged-in: {}",
                    e
                )))
            }
        };
        if now_ms() > expire {
            return Err(CrudError::new(
                ErrorCode::TokenExpired,
                "Access expired: please login to continue",
            ));
        }

        let status = match self.store.active_user(&user.user_id).await {
            Ok(Some(status)) => status,
            Ok(None) => {
                return Err(CrudError::unauthorized(
                    "UnAuthorized: user information not found or is inactive",
                ))
            }
            Err(e) => {
                return Err(CrudError::unauthorized(format!(
                    "UnAuthorized: user information not found or is inactive: {}",
                    e
                )))
            }
        };

        let role_ids = self
            .store
            .user_role_ids(&user.user_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(user_id = %user.user_id, error = %e, "user-role lookup failed");
                Vec::new()
            });
        let role_id = self
            .store
            .profile_role_id(&user.user_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(user_id = %user.user_id, error = %e, "profile-role lookup failed");
                None
            })
            .unwrap_or_default();

        Ok(AccessInfo {
            user_id: status.id,
            role_id,
            role_ids,
            is_admin: status.is_admin,
            is_active: status.is_active,
        })
    }

    /// Resolves the full [`AccessDecision`] for `task` on `table` (and `record_ids`).
    pub async fn check_task_access(
        &self,
        user: &UserInfo,
        table: &str,
        task: TaskType,
        record_ids: &[String],
    ) -> Result<AccessDecision, CrudError> {
        let info = self.check_user_access(user).await?;

        let mut owner_permitted = false;
        if !info.user_id.is_empty() && info.is_active {
            if !record_ids.is_empty() {
                let owned = self
                    .store
                    .owned_count(table, &info.user_id, record_ids)
                    .await
                    .unwrap_or(0);
                owner_permitted = owned == record_ids.len() as i64;
            } else if task == TaskType::Read {
                let owned = self
                    .store
                    .owned_count(table, &info.user_id, &[])
                    .await
                    .unwrap_or(0);
                owner_permitted = owned > 0;
            }
        }

        let mut table_id = String::new();
        match self.store.service_entry(table).await {
            Ok(Some(entry)) => {
                let category = entry.category.to_lowercase();
                if TABLE_CATEGORIES.contains(&category.as_str())
                    || self.app_tables.contains(&category)
                {
                    table_id = entry.id;
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(table, error = %e, "service lookup failed"),
        }

        let mut service_ids: Vec<String> = record_ids.to_vec();
        if !table_id.is_empty() {
            service_ids.push(table_id.clone());
        }
        let role_services = if service_ids.is_empty() || info.role_id.is_empty() {
            Vec::new()
        } else {
            self.store
                .role_services(&info.role_id, &service_ids)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(role_id = %info.role_id, error = %e, "role-service lookup failed");
                    Vec::new()
                })
        };

        Ok(AccessDecision {
            user_id: info.user_id,
            role_id: info.role_id,
            role_ids: info.role_ids,
            is_admin: info.is_admin,
            is_active: info.is_active,
            role_services,
            owner_permitted,
            table_id,
        })
    }

    /// Grants or denies `task` on `table` for the given ids (or table-wide when empty).
    pub async fn task_permission_by_id(
        &self,
        user: &UserInfo,
        table: &str,
        task: TaskType,
        record_ids: &[String],
    ) -> Result<TaskPermission, CrudError> {
        let decision = self.check_task_access(user, table, task, record_ids).await?;
        if !decision.is_active {
            return Err(CrudError::unauthorized(
                "Account is not active. Validate active status",
            ));
        }
        let mut permission = TaskPermission::from(&decision);
        if !evaluate(&decision, task, record_ids) {
            tracing::debug!(table, task = %task, user_id = %decision.user_id, "task denied");
            let value = serde_json::to_value(&permission).unwrap_or_default();
            return Err(CrudError::unauthorized(
                "You are not authorized to perform the requested action/task.",
            )
            .with_value(value));
        }
        permission.ok = true;
        Ok(permission)
    }

    /// Confirms the user exists under the claimed login and still holds a live session.
    /// Expired sessions are removed.
    pub async fn check_login_status(&self, user: &UserInfo) -> Result<String, CrudError> {
        let user_id = match self.store.login_user(&user.user_id, &user.login_name).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                return Err(CrudError::unauthorized(format!(
                    "Record not found for {}. Register a new account",
                    user.login_name
                )))
            }
            Err(e) => {
                return Err(CrudError::unauthorized(format!(
                    "Record not found for {}. Register a new account: {}",
                    user.login_name, e
                )))
            }
        };

        let expire = match self.store.session_expiry(user).await {
            Ok(Some(expire)) => expire,
            Ok(None) => {
                return Err(CrudError::unauthorized(format!(
                    "Access information for {} not found. Login first, or contact system administrator",
                    user.login_name
                )))
            }
            Err(e) => {
                return Err(CrudError::unauthorized(format!(
                    "Access information for {} not found. Login first, or contact system administrator: {}",
                    user.login_name, e
                )))
            }
        };

        if now_ms() > expire {
            if let Err(e) = self.store.remove_session(&user.user_id, &user.token).await {
                tracing::warn!(user_id = %user.user_id, error = %e, "failed to remove expired session");
            }
            return Err(CrudError::new(
                ErrorCode::TokenExpired,
                "Access expired: please login to continue",
            ));
        }
        Ok(user_id)
    }
}
