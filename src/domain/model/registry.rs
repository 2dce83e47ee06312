//! ModelRegistry for mapping table names to CrudModel implementations.

use crate::domain::model::CrudModel;
use crate::domain::model::DynamicModel;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Arc;

/// A registry that maps table names to their CrudModel implementations.
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn CrudModel>>,
}

impl ModelRegistry {
    /// Creates a new empty ModelRegistry.
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Registers a model implementation with the given name.
    pub fn register<M: CrudModel + 'static>(&mut self, name: String, model: M) {
        self.models.insert(name, Arc::new(model));
    }

    /// Retrieves a model implementation by name.
    /// Returns None if the model is not registered.
    pub fn get(&self, name: &str) -> Option<Arc<dyn CrudModel>> {
        self.models.get(name).cloned()
    }

    /// Returns all registered model names.
    pub fn list_models(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }

    /// Loads a model for every base table of the `public` schema from `information_schema`.
    ///
    /// A catalog failure yields an empty registry; the façade still works without
    /// projections, it just selects `*`.
    pub async fn load_from_db(pool: &PgPool) -> anyhow::Result<Self> {
        let rows = match sqlx::query(
            "SELECT c.table_name::text AS table_name, c.column_name::text AS column_name, c.udt_name::text AS udt_name \
             FROM information_schema.columns c \
             JOIN information_schema.tables t \
               ON t.table_schema = c.table_schema AND t.table_name = c.table_name \
             WHERE c.table_schema = 'public' AND t.table_type = 'BASE TABLE' \
             ORDER BY c.table_name, c.ordinal_position",
        )
        .fetch_all(pool)
        .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "catalog lookup failed; starting with an empty model registry");
                return Ok(ModelRegistry::new());
            }
        };

        let mut columns: Vec<(String, Vec<(String, String)>)> = Vec::new();
        for r in rows {
            let table: String = r.try_get("table_name")?;
            let column: String = r.try_get("column_name")?;
            let udt_name: String = r.try_get("udt_name")?;
            match columns.last_mut() {
                Some((t, cols)) if *t == table => cols.push((column, udt_name)),
                _ => columns.push((table, vec![(column, udt_name)])),
            }
        }

        let mut reg = ModelRegistry::new();
        for (table, cols) in columns {
            reg.register(table.clone(), DynamicModel::from_columns(table, cols));
        }
        tracing::info!(models = reg.models.len(), "model registry loaded");
        Ok(reg)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
