use crate::domain::access::{AccessStore, RoleService, ServiceEntry, UserInfo, UserStatus};
use crate::domain::query::naming::table_ident;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};

/// Names of the tables the access pipeline reads.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessTables {
    pub access_table: String,
    pub user_table: String,
    pub role_table: String,
    pub profile_table: String,
    pub service_table: String,
    pub user_role_table: String,
}

impl Default for AccessTables {
    fn default() -> Self {
        Self {
            access_table: "accesses".to_string(),
            user_table: "users".to_string(),
            role_table: "roles".to_string(),
            profile_table: "profiles".to_string(),
            service_table: "services".to_string(),
            user_role_table: "user_roles".to_string(),
        }
    }
}

/// [`AccessStore`] over the access database. Id-like columns are compared as text
/// so the store works whether ids are stored as UUID or TEXT.
#[derive(Clone)]
pub struct PgAccessStore {
    pool: PgPool,
    tables: AccessTables,
}

impl PgAccessStore {
    pub fn new(pool: PgPool, tables: AccessTables) -> Result<Self> {
        for t in [
            &tables.access_table,
            &tables.user_table,
            &tables.role_table,
            &tables.profile_table,
            &tables.service_table,
            &tables.user_role_table,
        ] {
            table_ident(t)?;
        }
        Ok(Self { pool, tables })
    }
}

#[async_trait]
impl AccessStore for PgAccessStore {
    async fn session_expiry(&self, user: &UserInfo) -> Result<Option<i64>> {
        let sql = format!(
            "SELECT expire FROM {} WHERE user_id::text=$1 AND token=$2 AND login_name=$3",
            self.tables.access_table
        );
        let row = sqlx::query(&sql)
            .bind(&user.user_id)
            .bind(&user.token)
            .bind(&user.login_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            Some(r) => Some(r.try_get::<i64, _>("expire")?),
            None => None,
        })
    }

    async fn active_user(&self, user_id: &str) -> Result<Option<UserStatus>> {
        let sql = format!(
            "SELECT id::text AS id, is_admin, is_active FROM {} WHERE id::text=$1 AND is_active=$2",
            self.tables.user_table
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(true)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            Some(r) => Some(UserStatus {
                id: r.try_get("id")?,
                is_admin: r.try_get("is_admin")?,
                is_active: r.try_get("is_active")?,
            }),
            None => None,
        })
    }

    async fn user_role_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT id::text AS id FROM {} WHERE user_id::text=$1 AND is_active=$2",
            self.tables.user_role_table
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(true)
            .fetch_all(&self.pool)
            .await?;
        let mut ids = Vec::with_capacity(rows.len());
        for r in rows {
            ids.push(r.try_get::<String, _>("id")?);
        }
        Ok(ids)
    }

    async fn profile_role_id(&self, user_id: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT id::text AS id FROM {} WHERE user_id::text=$1 AND is_active=$2",
            self.tables.profile_table
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(true)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            Some(r) => Some(r.try_get::<String, _>("id")?),
            None => None,
        })
    }

    async fn owned_count(&self, table: &str, user_id: &str, ids: &[String]) -> Result<i64> {
        let table = table_ident(table)?;
        let row = if ids.is_empty() {
            let sql = format!(
                "SELECT COUNT(*) AS count FROM {} WHERE created_by::text = $1",
                table
            );
            sqlx::query(&sql).bind(user_id).fetch_one(&self.pool).await?
        } else {
            let sql = format!(
                "SELECT COUNT(*) AS count FROM {} WHERE id::text = ANY($1) AND created_by::text = $2",
                table
            );
            sqlx::query(&sql)
                .bind(ids.to_vec())
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(row.try_get::<i64, _>("count")?)
    }

    async fn service_entry(&self, table: &str) -> Result<Option<ServiceEntry>> {
        let sql = format!(
            "SELECT id::text AS id, category FROM {} WHERE name=$1",
            self.tables.service_table
        );
        let row = sqlx::query(&sql)
            .bind(table)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            Some(r) => Some(ServiceEntry {
                id: r.try_get("id")?,
                category: r.try_get("category")?,
            }),
            None => None,
        })
    }

    async fn role_services(&self, role_id: &str, service_ids: &[String]) -> Result<Vec<RoleService>> {
        let sql = format!(
            "SELECT role_id::text AS role_id, service_id::text AS service_id, service_category, \
             can_read, can_create, can_delete, can_update, can_crud \
             FROM {} WHERE service_id::text = ANY($1) AND role_id::text=$2 AND is_active=$3",
            self.tables.role_table
        );
        let rows = sqlx::query(&sql)
            .bind(service_ids.to_vec())
            .bind(role_id)
            .bind(true)
            .fetch_all(&self.pool)
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(RoleService {
                role_id: r.try_get("role_id")?,
                service_id: r.try_get("service_id")?,
                service_category: r.try_get("service_category")?,
                can_read: r.try_get("can_read")?,
                can_create: r.try_get("can_create")?,
                can_update: r.try_get("can_update")?,
                can_delete: r.try_get("can_delete")?,
                can_crud: r.try_get("can_crud")?,
            });
        }
        Ok(out)
    }

    async fn login_user(&self, user_id: &str, login_name: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT id::text AS id FROM {} WHERE id::text=$1 AND (email=$2 OR username=$2)",
            self.tables.user_table
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(login_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(match row {
            Some(r) => Some(r.try_get::<String, _>("id")?),
            None => None,
        })
    }

    async fn remove_session(&self, user_id: &str, token: &str) -> Result<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE user_id::text=$1 AND token=$2",
            self.tables.access_table
        );
        let done = sqlx::query(&sql)
            .bind(user_id)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }
}
