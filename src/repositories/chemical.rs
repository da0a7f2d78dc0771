// src/repositories/chemical.rs
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::CrudRepository;
use crate::error::ApiResult;
use crate::models::{Chemical, CreateChemicalRequest};

#[derive(Debug, Default, Clone, Copy)]
pub struct ChemicalRepository;

impl ChemicalRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CrudRepository<Chemical, CreateChemicalRequest> for ChemicalRepository {
    fn table_name(&self) -> &'static str {
        "chemicals"
    }

    async fn create(&self, pool: &SqlitePool, data: CreateChemicalRequest) -> ApiResult<Chemical> {
        let now = Utc::now();
        let chemical = Chemical {
            id: Uuid::new_v4().to_string(),
            name: data.name,
            formula: data.formula,
            cas_number: data.cas_number,
            quantity: data.quantity,
            unit: data.unit,
            location: data.location,
            expiry_date: data.expiry_date,
            minimum_stock: data.minimum_stock.unwrap_or(0.0),
            hazard_class: data.hazard_class,
            safety_info: data.safety_info,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"INSERT INTO chemicals (
                id, name, formula, cas_number, quantity, unit, location,
                expiry_date, minimum_stock, hazard_class, safety_info,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
            .bind(&chemical.id)
            .bind(&chemical.name)
            .bind(&chemical.formula)
            .bind(&chemical.cas_number)
            .bind(chemical.quantity)
            .bind(&chemical.unit)
            .bind(&chemical.location)
            .bind(chemical.expiry_date)
            .bind(chemical.minimum_stock)
            .bind(&chemical.hazard_class)
            .bind(&chemical.safety_info)
            .bind(chemical.created_at)
            .bind(chemical.updated_at)
            .execute(pool)
            .await?;

        Ok(chemical)
    }

    async fn update(&self, pool: &SqlitePool, record: Chemical) -> ApiResult<bool> {
        let result = sqlx::query(
            r#"UPDATE chemicals SET
                name = ?, formula = ?, cas_number = ?, quantity = ?, unit = ?,
                location = ?, expiry_date = ?, minimum_stock = ?, hazard_class = ?,
                safety_info = ?, updated_at = ?
            WHERE id = ?"#,
        )
            .bind(&record.name)
            .bind(&record.formula)
            .bind(&record.cas_number)
            .bind(record.quantity)
            .bind(&record.unit)
            .bind(&record.location)
            .bind(record.expiry_date)
            .bind(record.minimum_stock)
            .bind(&record.hazard_class)
            .bind(&record.safety_info)
            .bind(record.updated_at)
            .bind(&record.id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
