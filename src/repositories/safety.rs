// src/repositories/safety.rs
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::CrudRepository;
use crate::error::ApiResult;
use crate::models::{CreateSafetyProtocolRequest, SafetyProtocol};

#[derive(Debug, Default, Clone, Copy)]
pub struct SafetyProtocolRepository;

impl SafetyProtocolRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list_by_category(&self, pool: &SqlitePool, category: &str) -> ApiResult<Vec<SafetyProtocol>> {
        let protocols = sqlx::query_as::<_, SafetyProtocol>(
            "SELECT * FROM safety_protocols WHERE category = ? ORDER BY rowid ASC",
        )
            .bind(category)
            .fetch_all(pool)
            .await?;
        Ok(protocols)
    }
}

#[async_trait]
impl CrudRepository<SafetyProtocol, CreateSafetyProtocolRequest> for SafetyProtocolRepository {
    fn table_name(&self) -> &'static str {
        "safety_protocols"
    }

    async fn create(&self, pool: &SqlitePool, data: CreateSafetyProtocolRequest) -> ApiResult<SafetyProtocol> {
        let now = Utc::now();
        let protocol = SafetyProtocol {
            id: Uuid::new_v4().to_string(),
            title: data.title,
            description: data.description,
            category: data.category,
            applicable_to: data.applicable_to,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"INSERT INTO safety_protocols (
                id, title, description, category, applicable_to, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
            .bind(&protocol.id)
            .bind(&protocol.title)
            .bind(&protocol.description)
            .bind(&protocol.category)
            .bind(&protocol.applicable_to)
            .bind(protocol.created_at)
            .bind(protocol.updated_at)
            .execute(pool)
            .await?;

        Ok(protocol)
    }

    async fn update(&self, pool: &SqlitePool, record: SafetyProtocol) -> ApiResult<bool> {
        let result = sqlx::query(
            r#"UPDATE safety_protocols SET
                title = ?, description = ?, category = ?, applicable_to = ?, updated_at = ?
            WHERE id = ?"#,
        )
            .bind(&record.title)
            .bind(&record.description)
            .bind(&record.category)
            .bind(&record.applicable_to)
            .bind(record.updated_at)
            .bind(&record.id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
