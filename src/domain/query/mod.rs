//! SQL synthesis for generic records: every builder returns `Ok` with statement
//! text and ordered bind values, or `Err` before any SQL exists.

pub mod coerce;
pub mod create;
pub mod delete;
pub mod naming;
pub mod select;
pub mod update;
pub mod where_clause;

pub use coerce::{ColumnTypes, SqlValue};
pub use create::{build_create, InsertBatch};
pub use delete::{build_delete_all, build_delete_by_id, build_delete_by_ids, build_delete_by_param};
pub use select::{
    build_count, build_select_all, build_select_by_id, build_select_by_ids,
    build_select_by_param, SelectOptions, Sort,
};
pub use update::{
    build_update, build_update_by_id, build_update_by_ids, build_update_by_param,
};
pub use where_clause::{build_where, WhereClause};

/// One executable statement: SQL text with `$n` placeholders and its bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }
}
