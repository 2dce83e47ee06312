use crate::domain::model::{FieldValue, Filter};
use crate::domain::query::coerce::{bind_param, literal, ColumnTypes, SqlValue};
use crate::domain::query::naming::column_name;
use crate::error::QueryBuildError;

/// A `WHERE ...` fragment plus the bind values its placeholders refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub sql: String,
    pub values: Vec<SqlValue>,
    /// First placeholder index not used by this clause.
    pub next_index: usize,
}

/// Builds `WHERE a=$n AND b IN ('x', 'y') ...` from `filter`, numbering
/// placeholders from `start_index`.
///
/// Scalars consume one placeholder each; lists are inlined as literals and
/// consume none. Predicates follow the filter's iteration order.
pub fn build_where(
    filter: &Filter,
    start_index: usize,
    types: &ColumnTypes,
) -> Result<WhereClause, QueryBuildError> {
    if filter.is_empty() || start_index < 1 {
        return Err(QueryBuildError::new(
            "queryParams (where-conditions) and a starting placeholder position of at least 1 are required.",
        ));
    }

    let mut predicates = Vec::with_capacity(filter.len());
    let mut values = Vec::new();
    let mut index = start_index;

    for (field, value) in filter {
        let column = column_name(field)?;
        match value {
            FieldValue::List(items) => {
                if items.is_empty() {
                    return Err(QueryBuildError::new(format!(
                        "field_name: {} | an empty list cannot form an IN condition",
                        field
                    )));
                }
                let members = items
                    .iter()
                    .map(literal)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| QueryBuildError::new(format!("field_name: {} | {}", field, e)))?;
                predicates.push(format!("{} IN ({})", column, members.join(", ")));
            }
            scalar => {
                let (placeholder, value) = bind_param(index, &column, scalar, types)?;
                values.push(value);
                predicates.push(format!("{}={}", column, placeholder));
                index += 1;
            }
        }
    }

    Ok(WhereClause {
        sql: format!("WHERE {}", predicates.join(" AND ")),
        values,
        next_index: index,
    })
}
