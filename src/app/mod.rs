pub mod classify;
pub mod crud_service;
pub mod options;
pub mod results;

pub use classify::{classify_save, SaveTask};
pub use crud_service::{Crud, CrudDeps, CrudService};
pub use options::{CrudOptions, CrudParams, ModelOptions};
pub use results::{CrudResult, GetResult, GetStats, RecordsCount};
