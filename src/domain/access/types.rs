use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// The closed set of CRUD task kinds an access decision is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Create,
    Update,
    Delete,
    Read,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Create => "create",
            TaskType::Update => "update",
            TaskType::Delete => "delete",
            TaskType::Read => "read",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller identity as claimed by the request; verified by the session check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    pub user_id: String,
    pub login_name: String,
    pub token: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Session expiry in epoch milliseconds, when the caller already knows it.
    pub expire: i64,
}

/// Resolved account facts: session verified, user active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessInfo {
    pub user_id: String,
    pub role_id: String,
    pub role_ids: Vec<String>,
    pub is_admin: bool,
    pub is_active: bool,
}

/// One permission grant for a (role, service) pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleService {
    pub role_id: String,
    pub service_id: String,
    pub service_category: String,
    pub can_read: bool,
    pub can_create: bool,
    pub can_update: bool,
    pub can_delete: bool,
    pub can_crud: bool,
}

impl RoleService {
    /// `can_crud` grants every capability.
    pub fn grants(&self, task: TaskType) -> bool {
        self.can_crud
            || match task {
                TaskType::Create => self.can_create,
                TaskType::Update => self.can_update,
                TaskType::Delete => self.can_delete,
                TaskType::Read => self.can_read,
            }
    }
}

/// Entry of the service registry: every table (and other resource) has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub id: String,
    pub category: String,
}

/// Active user row as read from the user table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    pub id: String,
    pub is_admin: bool,
    pub is_active: bool,
}

/// Everything the per-task evaluation needs; computed fresh for each check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub user_id: String,
    pub role_id: String,
    pub role_ids: Vec<String>,
    pub is_admin: bool,
    pub is_active: bool,
    pub role_services: Vec<RoleService>,
    pub owner_permitted: bool,
    pub table_id: String,
}

/// Outcome of a granted task check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPermission {
    pub ok: bool,
    pub is_admin: bool,
    pub is_active: bool,
    pub user_id: String,
    pub role_id: String,
    pub role_ids: Vec<String>,
    pub owner_permitted: bool,
}

impl From<&AccessDecision> for TaskPermission {
    fn from(d: &AccessDecision) -> Self {
        Self {
            ok: false,
            is_admin: d.is_admin,
            is_active: d.is_active,
            user_id: d.user_id.clone(),
            role_id: d.role_id.clone(),
            role_ids: d.role_ids.clone(),
            owner_permitted: d.owner_permitted,
        }
    }
}
