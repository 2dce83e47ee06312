use crate::domain::model::{Filter, ID_FIELD};
use crate::domain::query::coerce::{bind_param, ColumnTypes};
use crate::domain::query::naming::{id_list_literal, table_ident, validate_record_id};
use crate::domain::query::where_clause::build_where;
use crate::domain::query::Statement;
use crate::error::QueryBuildError;

pub fn build_delete_by_id(table: &str, id: &str, types: &ColumnTypes) -> Result<Statement, QueryBuildError> {
    let table = table_ident(table)?;
    if id.is_empty() {
        return Err(QueryBuildError::new("table-name and record-id are required."));
    }
    validate_record_id(id)?;
    let (placeholder, value) = bind_param(1, ID_FIELD, &id.into(), types)?;
    Ok(Statement::new(
        format!("DELETE FROM {} WHERE id={}", table, placeholder),
        vec![value],
    ))
}

pub fn build_delete_by_ids(table: &str, ids: &[String]) -> Result<Statement, QueryBuildError> {
    let table = table_ident(table)?;
    if ids.is_empty() {
        return Err(QueryBuildError::new("table-name and record-ids are required."));
    }
    Ok(Statement::new(
        format!("DELETE FROM {} WHERE id IN({})", table, id_list_literal(ids)?),
        vec![],
    ))
}

pub fn build_delete_by_param(table: &str, filter: &Filter, types: &ColumnTypes) -> Result<Statement, QueryBuildError> {
    let table = table_ident(table)?;
    if filter.is_empty() {
        return Err(QueryBuildError::new("table-name and queryParams are required."));
    }
    let clause = build_where(filter, 1, types)
        .map_err(|e| QueryBuildError::new(format!("error computing where-query condition(s): {}", e)))?;
    Ok(Statement::new(
        format!("DELETE FROM {} {}", table, clause.sql),
        clause.values,
    ))
}

/// Unconditional table wipe; only reachable through an explicitly named call.
pub fn build_delete_all(table: &str) -> Result<Statement, QueryBuildError> {
    Ok(Statement::new(format!("DELETE FROM {}", table_ident(table)?), vec![]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::FieldValue;

    #[test]
    fn delete_variants() {
        let none = ColumnTypes::new();
        let s = build_delete_by_id("t", "X", &none).unwrap();
        assert_eq!(s.sql, "DELETE FROM t WHERE id=$1");
        assert_eq!(s.values.len(), 1);

        let s = build_delete_by_ids("t", &["a".into(), "b".into()]).unwrap();
        assert_eq!(s.sql, "DELETE FROM t WHERE id IN('a', 'b')");
        assert!(s.values.is_empty());

        let mut f = Filter::new();
        f.insert("isActive".into(), FieldValue::Bool(false));
        let s = build_delete_by_param("t", &f, &none).unwrap();
        assert_eq!(s.sql, "DELETE FROM t WHERE is_active=$1");

        assert_eq!(build_delete_all("t").unwrap().sql, "DELETE FROM t");
    }

    #[test]
    fn delete_requires_a_target() {
        let none = ColumnTypes::new();
        assert!(build_delete_by_id("t", "", &none).is_err());
        assert!(build_delete_by_ids("t", &[]).is_err());
        assert!(build_delete_by_param("t", &Filter::new(), &none).is_err());
        assert!(build_delete_all("").is_err());
    }
}
