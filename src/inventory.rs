// src/inventory.rs - Chemical stock ledger
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use validator::Validate;

use crate::auth::Identity;
use crate::error::{ApiError, ApiResult};
use crate::models::{Chemical, CreateChemicalRequest, UpdateChemicalRequest};
use crate::policy::{authorize, Action, Resource};
use crate::repositories::{ChemicalRepository, CrudRepository};
use crate::validator::CustomValidate;

#[derive(Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
    repo: ChemicalRepository,
}

impl InventoryLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            repo: ChemicalRepository::new(),
        }
    }

    pub async fn create(&self, caller: &Identity, request: CreateChemicalRequest) -> ApiResult<Chemical> {
        authorize(caller, Resource::Chemical, Action::Create, None).into_result()?;

        request.custom_validate().into_result()?;
        request.validate()?;

        let chemical = self.repo.create(&self.pool, request).await?;
        log::info!("User {} created chemical: {} ({})", caller.user_id, chemical.name, chemical.id);
        Ok(chemical)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Chemical> {
        self.repo
            .get_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| ApiError::chemical_not_found(id))
    }

    pub async fn update(&self, caller: &Identity, id: &str, update: UpdateChemicalRequest) -> ApiResult<Chemical> {
        authorize(caller, Resource::Chemical, Action::Edit, None).into_result()?;

        let mut chemical = self.get(id).await?;
        chemical.apply_update(update);
        chemical.custom_validate().into_result()?;
        chemical.updated_at = Utc::now();

        if !self.repo.update(&self.pool, chemical.clone()).await? {
            return Err(ApiError::chemical_not_found(id));
        }

        log::info!("User {} updated chemical: {}", caller.user_id, id);
        Ok(chemical)
    }

    /// Admin-only. The role check happens before any lookup.
    pub async fn delete(&self, caller: &Identity, id: &str) -> ApiResult<()> {
        authorize(caller, Resource::Chemical, Action::Delete, None).into_result()?;

        if !self.repo.delete(&self.pool, id).await? {
            return Err(ApiError::chemical_not_found(id));
        }

        log::info!("User {} deleted chemical: {}", caller.user_id, id);
        Ok(())
    }

    pub async fn list(&self) -> ApiResult<Vec<Chemical>> {
        self.repo.list(&self.pool).await
    }

    pub async fn count(&self) -> ApiResult<i64> {
        self.repo.count(&self.pool).await
    }

    pub async fn list_low_stock(&self) -> ApiResult<Vec<Chemical>> {
        let chemicals = self.list().await?;
        Ok(chemicals.into_iter().filter(Chemical::is_low_stock).collect())
    }

    pub async fn list_expiring_within(&self, window_days: i64) -> ApiResult<Vec<Chemical>> {
        self.list_expiring_within_at(window_days, Utc::now().date_naive()).await
    }

    /// Expired items are included.
    pub async fn list_expiring_within_at(&self, window_days: i64, today: NaiveDate) -> ApiResult<Vec<Chemical>> {
        if window_days < 0 {
            return Err(ApiError::validation("Expiry window must not be negative"));
        }

        let chemicals = self.list().await?;
        Ok(chemicals
            .into_iter()
            .filter(|chemical| chemical.expires_within(today, window_days))
            .collect())
    }
}
