// src/repositories/mod.rs
//! Store access for every record set, behind a shared CRUD trait.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;

use crate::error::ApiResult;

pub mod chemical;
pub mod experiment;
pub mod safety;
pub mod user;

pub use chemical::ChemicalRepository;
pub use experiment::{ExperimentRepository, NewExperiment, CONSUMPTION_ID_CHUNK};
pub use safety::SafetyProtocolRepository;
pub use user::{NewUser, UserRepository};

/// Базовый trait для CRUD операций
#[async_trait]
pub trait CrudRepository<T, CreateDto>: Send + Sync
where
    T: Serialize + DeserializeOwned + Send + Unpin + for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow>,
    CreateDto: Send,
{
    fn table_name(&self) -> &'static str;

    fn id_field(&self) -> &'static str {
        "id"
    }

    /// Ordering used by `list`; insertion order unless overridden.
    fn default_order(&self) -> &'static str {
        "rowid ASC"
    }

    async fn create(&self, pool: &SqlitePool, data: CreateDto) -> ApiResult<T>;

    async fn get_by_id(&self, pool: &SqlitePool, id: &str) -> ApiResult<Option<T>> {
        let query = format!(
            "SELECT * FROM {} WHERE {} = ?",
            self.table_name(),
            self.id_field()
        );

        let result = sqlx::query_as::<_, T>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(result)
    }

    async fn list(&self, pool: &SqlitePool) -> ApiResult<Vec<T>> {
        let query = format!(
            "SELECT * FROM {} ORDER BY {}",
            self.table_name(),
            self.default_order()
        );

        let rows = sqlx::query_as::<_, T>(&query).fetch_all(pool).await?;
        Ok(rows)
    }

    async fn count(&self, pool: &SqlitePool) -> ApiResult<i64> {
        let query = format!("SELECT COUNT(*) FROM {}", self.table_name());
        let total: i64 = sqlx::query_scalar(&query).fetch_one(pool).await?;
        Ok(total)
    }

    /// Persists a fully merged record. Returns `false` when no row matched.
    async fn update(&self, pool: &SqlitePool, record: T) -> ApiResult<bool>;

    /// Returns `false` when no row matched.
    async fn delete(&self, pool: &SqlitePool, id: &str) -> ApiResult<bool> {
        let query = format!(
            "DELETE FROM {} WHERE {} = ?",
            self.table_name(),
            self.id_field()
        );

        let result = sqlx::query(&query).bind(id).execute(pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
