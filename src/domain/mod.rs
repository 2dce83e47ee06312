pub mod access;
pub mod model;
pub mod query;
