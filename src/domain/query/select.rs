use crate::domain::model::{Filter, ID_FIELD};
use crate::domain::query::coerce::{bind_param, ColumnTypes};
use crate::domain::query::naming::{column_name, id_list_literal, table_ident, validate_record_id};
use crate::domain::query::where_clause::build_where;
use crate::domain::query::Statement;
use crate::error::QueryBuildError;
use indexmap::IndexMap;

/// Field -> direction; a negative direction sorts descending.
pub type Sort = IndexMap<String, i32>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOptions {
    pub skip: u64,
    pub limit: u64,
    pub sort: Sort,
}

fn projection(fields: &[String]) -> Result<String, QueryBuildError> {
    if fields.is_empty() {
        return Ok("*".to_string());
    }
    Ok(fields
        .iter()
        .map(|f| column_name(f))
        .collect::<Result<Vec<_>, _>>()?
        .join(", "))
}

fn tail(options: &SelectOptions) -> Result<String, QueryBuildError> {
    let mut out = String::new();
    if !options.sort.is_empty() {
        let mut keys = Vec::with_capacity(options.sort.len());
        for (field, dir) in &options.sort {
            let direction = if *dir < 0 { "DESC" } else { "ASC" };
            keys.push(format!("{} {}", column_name(field)?, direction));
        }
        out.push_str(&format!(" ORDER BY {}", keys.join(", ")));
    }
    if options.limit > 0 {
        out.push_str(&format!(" LIMIT {}", options.limit));
    }
    if options.skip > 0 {
        out.push_str(&format!(" OFFSET {}", options.skip));
    }
    Ok(out)
}

fn head(table: &str, fields: &[String]) -> Result<String, QueryBuildError> {
    Ok(format!("SELECT {} FROM {}", projection(fields)?, table_ident(table)?))
}

pub fn build_select_all(table: &str, fields: &[String], options: &SelectOptions) -> Result<Statement, QueryBuildError> {
    Ok(Statement::new(
        format!("{}{}", head(table, fields)?, tail(options)?),
        vec![],
    ))
}

pub fn build_select_by_id(
    table: &str,
    fields: &[String],
    id: &str,
    options: &SelectOptions,
    types: &ColumnTypes,
) -> Result<Statement, QueryBuildError> {
    if id.is_empty() {
        return Err(QueryBuildError::new("table-name and record-id are required."));
    }
    validate_record_id(id)?;
    let (placeholder, value) = bind_param(1, ID_FIELD, &id.into(), types)?;
    Ok(Statement::new(
        format!("{} WHERE id={}{}", head(table, fields)?, placeholder, tail(options)?),
        vec![value],
    ))
}

pub fn build_select_by_ids(
    table: &str,
    fields: &[String],
    ids: &[String],
    options: &SelectOptions,
) -> Result<Statement, QueryBuildError> {
    if ids.is_empty() {
        return Err(QueryBuildError::new("table-name and record-ids are required."));
    }
    Ok(Statement::new(
        format!(
            "{} WHERE id IN ({}){}",
            head(table, fields)?,
            id_list_literal(ids)?,
            tail(options)?
        ),
        vec![],
    ))
}

pub fn build_select_by_param(
    table: &str,
    fields: &[String],
    filter: &Filter,
    options: &SelectOptions,
    types: &ColumnTypes,
) -> Result<Statement, QueryBuildError> {
    if filter.is_empty() {
        return Err(QueryBuildError::new("table-name and queryParams are required."));
    }
    let head = head(table, fields)?;
    let clause = build_where(filter, 1, types)
        .map_err(|e| QueryBuildError::new(format!("error computing where-query condition(s): {}", e)))?;
    Ok(Statement::new(
        format!("{} {}{}", head, clause.sql, tail(options)?),
        clause.values,
    ))
}

/// `SELECT COUNT(*) ...` over the whole table or over a filter.
pub fn build_count(table: &str, filter: Option<&Filter>, types: &ColumnTypes) -> Result<Statement, QueryBuildError> {
    let table = table_ident(table)?;
    match filter {
        Some(f) if !f.is_empty() => {
            let clause = build_where(f, 1, types)?;
            Ok(Statement::new(
                format!("SELECT COUNT(*) AS count FROM {} {}", table, clause.sql),
                clause.values,
            ))
        }
        _ => Ok(Statement::new(format!("SELECT COUNT(*) AS count FROM {}", table), vec![])),
    }
}
