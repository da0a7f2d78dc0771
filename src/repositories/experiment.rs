// src/repositories/experiment.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::CrudRepository;
use crate::error::{ApiError, ApiResult};
use crate::models::{ConsumptionDetail, Experiment, ExperimentStatus, NewConsumption};

/// A validated experiment together with its consumption lines.
#[derive(Debug, Clone)]
pub struct NewExperiment {
    pub title: String,
    pub description: Option<String>,
    pub procedure: Option<String>,
    pub results: Option<String>,
    pub status: ExperimentStatus,
    pub user_id: String,
    pub consumption: Vec<NewConsumption>,
}

#[derive(Debug, sqlx::FromRow)]
struct ConsumptionRow {
    experiment_id: String,
    id: String,
    chemical_id: String,
    chemical_name: Option<String>,
    quantity_used: f64,
    unit: String,
}

impl From<ConsumptionRow> for ConsumptionDetail {
    fn from(row: ConsumptionRow) -> Self {
        Self {
            id: row.id,
            chemical_id: row.chemical_id,
            chemical_name: row.chemical_name,
            quantity_used: row.quantity_used,
            unit: row.unit,
        }
    }
}

/// Ids bound per `IN (..)` query; stays under SQLite's host parameter limit.
pub const CONSUMPTION_ID_CHUNK: usize = 500;

const CONSUMPTION_SELECT: &str = r#"
    SELECT ce.experiment_id, ce.id, ce.chemical_id, c.name AS chemical_name,
           ce.quantity_used, ce.unit
    FROM consumption_entries ce
    LEFT JOIN chemicals c ON c.id = ce.chemical_id
"#;

#[derive(Debug, Default, Clone, Copy)]
pub struct ExperimentRepository;

impl ExperimentRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list_by_owner(&self, pool: &SqlitePool, owner_id: &str) -> ApiResult<Vec<Experiment>> {
        let query = format!(
            "SELECT * FROM experiments WHERE user_id = ? ORDER BY {}",
            self.default_order()
        );
        let experiments = sqlx::query_as::<_, Experiment>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await?;
        Ok(experiments)
    }

    /// Most recently updated first; equal timestamps keep insertion order.
    pub async fn list_recent(&self, pool: &SqlitePool, limit: i64) -> ApiResult<Vec<Experiment>> {
        let experiments = sqlx::query_as::<_, Experiment>(
            "SELECT * FROM experiments ORDER BY updated_at DESC, rowid ASC LIMIT ?",
        )
            .bind(limit)
            .fetch_all(pool)
            .await?;
        Ok(experiments)
    }

    pub async fn count_active(&self, pool: &SqlitePool) -> ApiResult<i64> {
        let active: Vec<ExperimentStatus> = ExperimentStatus::all()
            .into_iter()
            .filter(ExperimentStatus::is_active)
            .collect();
        let placeholders = vec!["?"; active.len()].join(", ");
        let query = format!("SELECT COUNT(*) FROM experiments WHERE status IN ({})", placeholders);

        let mut count = sqlx::query_scalar::<_, i64>(&query);
        for status in active {
            count = count.bind(status);
        }
        Ok(count.fetch_one(pool).await?)
    }

    pub async fn consumption_for(&self, pool: &SqlitePool, experiment_id: &str) -> ApiResult<Vec<ConsumptionDetail>> {
        let query = format!("{} WHERE ce.experiment_id = ? ORDER BY ce.position ASC", CONSUMPTION_SELECT);
        let rows = sqlx::query_as::<_, ConsumptionRow>(&query)
            .bind(experiment_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(ConsumptionDetail::from).collect())
    }

    /// Consumption lines for several experiments in one query, keyed by experiment id.
    pub async fn consumption_for_many(
        &self,
        pool: &SqlitePool,
        experiment_ids: &[String],
    ) -> ApiResult<HashMap<String, Vec<ConsumptionDetail>>> {
        let mut grouped: HashMap<String, Vec<ConsumptionDetail>> = HashMap::new();
        if experiment_ids.is_empty() {
            return Ok(grouped);
        }

        for chunk in experiment_ids.chunks(CONSUMPTION_ID_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let query = format!(
                "{} WHERE ce.experiment_id IN ({}) ORDER BY ce.experiment_id, ce.position ASC",
                CONSUMPTION_SELECT, placeholders
            );

            let mut select = sqlx::query_as::<_, ConsumptionRow>(&query);
            for id in chunk {
                select = select.bind(id);
            }

            for row in select.fetch_all(pool).await? {
                grouped
                    .entry(row.experiment_id.clone())
                    .or_default()
                    .push(ConsumptionDetail::from(row));
            }
        }

        Ok(grouped)
    }
}

#[async_trait]
impl CrudRepository<Experiment, NewExperiment> for ExperimentRepository {
    fn table_name(&self) -> &'static str {
        "experiments"
    }

    fn default_order(&self) -> &'static str {
        "created_at DESC, rowid DESC"
    }

    /// Writes the experiment and its consumption lines in one transaction.
    /// A line naming an unknown chemical rolls everything back.
    async fn create(&self, pool: &SqlitePool, data: NewExperiment) -> ApiResult<Experiment> {
        let now = Utc::now();
        let experiment = Experiment {
            id: Uuid::new_v4().to_string(),
            title: data.title,
            description: data.description,
            procedure: data.procedure,
            results: data.results,
            status: data.status,
            user_id: data.user_id,
            created_at: now,
            updated_at: now,
        };

        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO experiments (
                id, title, description, procedure, results, status, user_id,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
            .bind(&experiment.id)
            .bind(&experiment.title)
            .bind(&experiment.description)
            .bind(&experiment.procedure)
            .bind(&experiment.results)
            .bind(experiment.status)
            .bind(&experiment.user_id)
            .bind(experiment.created_at)
            .bind(experiment.updated_at)
            .execute(&mut *tx)
            .await?;

        for (position, entry) in data.consumption.iter().enumerate() {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chemicals WHERE id = ?")
                .bind(&entry.chemical_id)
                .fetch_one(&mut *tx)
                .await?;

            if exists == 0 {
                return Err(ApiError::ValidationError(format!(
                    "chemicals_used[{}]: chemical '{}' does not exist",
                    position, entry.chemical_id
                )));
            }

            sqlx::query(
                r#"INSERT INTO consumption_entries (
                    id, experiment_id, chemical_id, quantity_used, unit, position
                ) VALUES (?, ?, ?, ?, ?, ?)"#,
            )
                .bind(Uuid::new_v4().to_string())
                .bind(&experiment.id)
                .bind(&entry.chemical_id)
                .bind(entry.quantity_used)
                .bind(&entry.unit)
                .bind(position as i64)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(experiment)
    }

    async fn update(&self, pool: &SqlitePool, record: Experiment) -> ApiResult<bool> {
        let result = sqlx::query(
            r#"UPDATE experiments SET
                title = ?, description = ?, procedure = ?, results = ?, status = ?, updated_at = ?
            WHERE id = ?"#,
        )
            .bind(&record.title)
            .bind(&record.description)
            .bind(&record.procedure)
            .bind(&record.results)
            .bind(record.status)
            .bind(record.updated_at)
            .bind(&record.id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, pool: &SqlitePool, id: &str) -> ApiResult<bool> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM consumption_entries WHERE experiment_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM experiments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}
