use crate::domain::model::{CrudModel, Record};
use crate::domain::query::naming::column_name;
use crate::domain::query::ColumnTypes;
use heck::{ToLowerCamelCase, ToSnakeCase};

/// Runtime model built from the database catalog (or registered by hand).
pub struct DynamicModel {
    table_name: String,
    fields: Vec<String>,
    columns: Vec<String>,
    column_types: ColumnTypes,
}

impl DynamicModel {
    pub fn new(table_name: String, fields: Vec<String>) -> Self {
        let columns = fields.iter().map(|f| f.to_snake_case()).collect();
        Self {
            table_name,
            fields,
            columns,
            column_types: ColumnTypes::new(),
        }
    }

    /// Builds a model from catalog columns: `(column_name, udt_name)` in ordinal order.
    ///
    /// The field inventory is exposed in caller (lowerCamelCase) naming.
    pub fn from_columns(table_name: String, columns: Vec<(String, String)>) -> Self {
        let fields = columns
            .iter()
            .map(|(name, _)| name.to_lower_camel_case())
            .collect();
        let names = columns.iter().map(|(name, _)| name.clone()).collect();
        Self {
            table_name,
            fields,
            columns: names,
            column_types: columns.into_iter().collect(),
        }
    }
}

impl CrudModel for DynamicModel {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn field_names(&self) -> Vec<String> {
        self.fields.clone()
    }

    fn column_types(&self) -> Option<&ColumnTypes> {
        if self.column_types.is_empty() {
            None
        } else {
            Some(&self.column_types)
        }
    }

    /// Keys are accepted in either naming convention (`createdBy` or `created_by`).
    fn validate_record(&self, record: &Record) -> Result<(), String> {
        // Hand-registered models carry no inventory to check against.
        if self.columns.is_empty() {
            return Ok(());
        }
        for key in record.keys() {
            let column = column_name(key).map_err(|e| e.to_string())?;
            if !self.columns.iter().any(|c| *c == column) {
                return Err(format!(
                    "field '{}' is not a column of table '{}'",
                    key, self.table_name
                ));
            }
        }
        Ok(())
    }
}
