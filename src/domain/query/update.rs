use crate::domain::model::{record_id, Filter, Record, ID_FIELD};
use crate::domain::query::coerce::{bind_param, ColumnTypes, SqlValue};
use crate::domain::query::naming::{column_name, id_list_literal, table_ident, validate_record_id};
use crate::domain::query::where_clause::build_where;
use crate::domain::query::Statement;
use crate::error::QueryBuildError;

/// `a=$1, b=$2` for every non-id field, plus the next free placeholder index.
fn set_clause(record: &Record, types: &ColumnTypes) -> Result<(String, Vec<SqlValue>, usize), QueryBuildError> {
    let mut parts = Vec::with_capacity(record.len());
    let mut values = Vec::with_capacity(record.len());
    let mut index = 1;
    for (field, value) in record {
        if field == ID_FIELD {
            continue;
        }
        let column = column_name(field)?;
        let (placeholder, bound) = bind_param(index, &column, value, types)?;
        parts.push(format!("{}={}", column, placeholder));
        values.push(bound);
        index += 1;
    }
    if parts.is_empty() {
        return Err(QueryBuildError::new("record has no fields to update."));
    }
    Ok((parts.join(", "), values, index))
}

/// One `UPDATE ... WHERE id=$n RETURNING id` per record, each record carrying its own id.
pub fn build_update(table: &str, records: &[Record], types: &ColumnTypes) -> Result<Vec<Statement>, QueryBuildError> {
    let table = table_ident(table)?;
    if records.is_empty() {
        return Err(QueryBuildError::new("table-name and at least one record are required."));
    }
    let mut statements = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let id = record_id(record).ok_or_else(|| {
            QueryBuildError::new(format!("record #{} has no id to update by", index))
        })?;
        validate_record_id(&id)?;
        let (set, mut values, next) = set_clause(record, types)?;
        let (id_placeholder, id_value) = bind_param(next, ID_FIELD, &id.into(), types)?;
        values.push(id_value);
        statements.push(Statement::new(
            format!("UPDATE {} SET {} WHERE id={} RETURNING id", table, set, id_placeholder),
            values,
        ));
    }
    Ok(statements)
}

pub fn build_update_by_id(
    table: &str,
    record: &Record,
    id: &str,
    types: &ColumnTypes,
) -> Result<Statement, QueryBuildError> {
    let table = table_ident(table)?;
    if record.is_empty() || id.is_empty() {
        return Err(QueryBuildError::new("table-name, record and record-id are required."));
    }
    validate_record_id(id)?;
    let (set, mut values, next) = set_clause(record, types)?;
    let (id_placeholder, id_value) = bind_param(next, ID_FIELD, &id.into(), types)?;
    values.push(id_value);
    Ok(Statement::new(
        format!("UPDATE {} SET {} WHERE id={} RETURNING id", table, set, id_placeholder),
        values,
    ))
}

pub fn build_update_by_ids(
    table: &str,
    record: &Record,
    ids: &[String],
    types: &ColumnTypes,
) -> Result<Statement, QueryBuildError> {
    let table = table_ident(table)?;
    if record.is_empty() || ids.is_empty() {
        return Err(QueryBuildError::new("table-name, record and record-ids are required."));
    }
    let in_list = id_list_literal(ids)?;
    let (set, values, _) = set_clause(record, types)?;
    Ok(Statement::new(
        format!("UPDATE {} SET {} WHERE id IN({}) RETURNING id", table, set, in_list),
        values,
    ))
}

/// The WHERE placeholders continue after the SET clause's own.
pub fn build_update_by_param(
    table: &str,
    record: &Record,
    filter: &Filter,
    types: &ColumnTypes,
) -> Result<Statement, QueryBuildError> {
    let table = table_ident(table)?;
    if record.is_empty() || filter.is_empty() {
        return Err(QueryBuildError::new("table-name, record and queryParams are required."));
    }
    let (set, mut values, next) = set_clause(record, types)?;
    let clause = build_where(filter, next, types)
        .map_err(|e| QueryBuildError::new(format!("error computing where-query condition(s): {}", e)))?;
    values.extend(clause.values);
    Ok(Statement::new(
        format!("UPDATE {} SET {} {} RETURNING id", table, set, clause.sql),
        values,
    ))
}
