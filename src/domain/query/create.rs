use crate::domain::model::Record;
use crate::domain::query::coerce::{bind_param, ColumnTypes, SqlValue};
use crate::domain::query::naming::{column_name, table_ident};
use crate::error::QueryBuildError;

/// A single INSERT template and one bind-value row per record.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertBatch {
    pub sql: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// `INSERT INTO t(a, b) VALUES($1, $2) RETURNING id`.
///
/// The first record's fields define the column list; every later record must
/// carry all of them (extra fields are ignored). Placeholder casts come from the
/// column types alone, so one template serves every row.
pub fn build_create(
    table: &str,
    records: &[Record],
    types: &ColumnTypes,
) -> Result<InsertBatch, QueryBuildError> {
    let table = table_ident(table)?;
    let first = records
        .first()
        .ok_or_else(|| QueryBuildError::new("table-name and at least one record are required."))?;
    if first.is_empty() {
        return Err(QueryBuildError::new("the first record has no fields to insert."));
    }

    let fields: Vec<&String> = first.keys().collect();
    let columns = fields
        .iter()
        .map(|f| column_name(f))
        .collect::<Result<Vec<_>, _>>()?;
    let mut placeholders: Vec<String> = (1..=fields.len()).map(|i| format!("${}", i)).collect();

    let mut rows = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let mut row = Vec::with_capacity(fields.len());
        for field in &fields {
            let value = record.get(field.as_str()).ok_or_else(|| {
                QueryBuildError::new(format!(
                    "record #{} is missing field '{}'; all records must share the first record's fields",
                    index, field
                ))
            })?;
            let (placeholder, bound) = bind_param(row.len() + 1, &columns[row.len()], value, types)?;
            if !matches!(bound, SqlValue::Null) {
                placeholders[row.len()] = placeholder;
            }
            row.push(bound);
        }
        rows.push(row);
    }

    Ok(InsertBatch {
        sql: format!(
            "INSERT INTO {}({}) VALUES({}) RETURNING id",
            table,
            columns.join(", "),
            placeholders.join(", ")
        ),
        columns,
        rows,
    })
}
