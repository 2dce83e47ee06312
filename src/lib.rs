pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{Crud, CrudDeps, CrudOptions, CrudParams, CrudResult, CrudService, GetResult};
pub use domain::access::{AccessEngine, TaskType, UserInfo};
pub use domain::model::{CrudModel, DynamicModel, FieldValue, Filter, ModelRegistry, Record};
pub use error::{CrudError, ErrorCode};
