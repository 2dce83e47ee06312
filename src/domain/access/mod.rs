//! Access decisions: who may create, read, update or delete which rows.

pub mod engine;
pub mod store;
pub mod types;

pub use engine::{evaluate, roles_permit, AccessEngine};
pub use store::AccessStore;
pub use types::{
    AccessDecision, AccessInfo, RoleService, ServiceEntry, TaskPermission, TaskType, UserInfo,
    UserStatus,
};
