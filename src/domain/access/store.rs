use crate::domain::access::types::{RoleService, ServiceEntry, UserInfo, UserStatus};
use async_trait::async_trait;

/// Lookups the access pipeline performs against the access database.
///
/// Every method reports "no row" as `Ok(None)`/empty; `Err` is a driver failure.
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Stored session expiry (epoch ms) for `(user_id, token, login_name)`.
    async fn session_expiry(&self, user: &UserInfo) -> anyhow::Result<Option<i64>>;

    /// The user row, only when the user is active.
    async fn active_user(&self, user_id: &str) -> anyhow::Result<Option<UserStatus>>;

    /// Direct role assignments of the user.
    async fn user_role_ids(&self, user_id: &str) -> anyhow::Result<Vec<String>>;

    /// Primary role id from the user's profile.
    async fn profile_role_id(&self, user_id: &str) -> anyhow::Result<Option<String>>;

    /// Rows of `table` created by `user_id`, restricted to `ids` when non-empty.
    async fn owned_count(&self, table: &str, user_id: &str, ids: &[String]) -> anyhow::Result<i64>;

    /// Service registry entry named after `table`.
    async fn service_entry(&self, table: &str) -> anyhow::Result<Option<ServiceEntry>>;

    /// Active permission rows of `role_id` for any of `service_ids`.
    async fn role_services(&self, role_id: &str, service_ids: &[String]) -> anyhow::Result<Vec<RoleService>>;

    /// User id when a user matches both the id and the login name (email or username).
    async fn login_user(&self, user_id: &str, login_name: &str) -> anyhow::Result<Option<String>>;

    /// Removes a session row; returns the number of rows removed.
    async fn remove_session(&self, user_id: &str, token: &str) -> anyhow::Result<u64>;
}
