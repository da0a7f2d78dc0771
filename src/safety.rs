// src/safety.rs - Safety protocol catalog
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::auth::Identity;
use crate::error::{ApiError, ApiResult};
use crate::models::{CreateSafetyProtocolRequest, SafetyProtocol, UpdateSafetyProtocolRequest};
use crate::policy::{authorize, Action, Resource};
use crate::repositories::{CrudRepository, SafetyProtocolRepository};
use crate::validator::{CustomValidate, FieldValidator, ValidationResult};

#[derive(Clone)]
pub struct SafetyCatalog {
    pool: SqlitePool,
    repo: SafetyProtocolRepository,
}

impl SafetyCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            repo: SafetyProtocolRepository::new(),
        }
    }

    pub async fn create(&self, caller: &Identity, request: CreateSafetyProtocolRequest) -> ApiResult<SafetyProtocol> {
        authorize(caller, Resource::SafetyProtocol, Action::Create, None).into_result()?;

        let mut result = ValidationResult::new();
        result.check("title", FieldValidator::not_empty(&request.title, "Title"));
        result.check("description", FieldValidator::not_empty(&request.description, "Description"));
        result.into_result()?;
        request.validate()?;

        let protocol = self.repo.create(&self.pool, request).await?;
        log::info!("User {} created safety protocol: {}", caller.user_id, protocol.id);
        Ok(protocol)
    }

    pub async fn get(&self, id: &str) -> ApiResult<SafetyProtocol> {
        self.repo
            .get_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| ApiError::protocol_not_found(id))
    }

    pub async fn list(&self) -> ApiResult<Vec<SafetyProtocol>> {
        self.repo.list(&self.pool).await
    }

    pub async fn list_by_category(&self, category: &str) -> ApiResult<Vec<SafetyProtocol>> {
        self.repo.list_by_category(&self.pool, category).await
    }

    pub async fn update(
        &self,
        caller: &Identity,
        id: &str,
        update: UpdateSafetyProtocolRequest,
    ) -> ApiResult<SafetyProtocol> {
        authorize(caller, Resource::SafetyProtocol, Action::Edit, None).into_result()?;

        let mut protocol = self.get(id).await?;
        protocol.apply_update(update);
        protocol.custom_validate().into_result()?;
        protocol.updated_at = Utc::now();

        if !self.repo.update(&self.pool, protocol.clone()).await? {
            return Err(ApiError::protocol_not_found(id));
        }

        log::info!("User {} updated safety protocol: {}", caller.user_id, id);
        Ok(protocol)
    }

    pub async fn delete(&self, caller: &Identity, id: &str) -> ApiResult<()> {
        authorize(caller, Resource::SafetyProtocol, Action::Delete, None).into_result()?;

        if !self.repo.delete(&self.pool, id).await? {
            return Err(ApiError::protocol_not_found(id));
        }

        log::info!("User {} deleted safety protocol: {}", caller.user_id, id);
        Ok(())
    }

    pub async fn count(&self) -> ApiResult<i64> {
        self.repo.count(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use crate::test_support::{identity_of, memory_pool};

    fn protocol(title: &str, category: Option<&str>) -> CreateSafetyProtocolRequest {
        CreateSafetyProtocolRequest {
            title: title.to_string(),
            description: format!("{} procedure", title),
            category: category.map(str::to_string),
            applicable_to: None,
        }
    }

    #[actix_rt::test]
    async fn test_writes_are_admin_only() {
        let catalog = SafetyCatalog::new(memory_pool().await);
        let admin = identity_of(UserRole::Admin);

        for role in [UserRole::Technician, UserRole::Viewer] {
            let who = identity_of(role);
            assert!(matches!(
                catalog.create(&who, protocol("Fume hood", None)).await,
                Err(ApiError::Forbidden(_))
            ));
        }

        let created = catalog.create(&admin, protocol("Fume hood", Some("equipment"))).await.unwrap();
        let tech = identity_of(UserRole::Technician);
        assert!(matches!(
            catalog.update(&tech, &created.id, UpdateSafetyProtocolRequest::default()).await,
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(catalog.delete(&tech, &created.id).await, Err(ApiError::Forbidden(_))));
        assert_eq!(catalog.get(&created.id).await.unwrap(), created);
    }

    #[actix_rt::test]
    async fn test_title_and_description_required() {
        let catalog = SafetyCatalog::new(memory_pool().await);
        let admin = identity_of(UserRole::Admin);

        let mut missing = protocol("Spill", None);
        missing.description = String::new();
        assert!(matches!(catalog.create(&admin, missing).await, Err(ApiError::ValidationError(_))));
        assert!(matches!(
            catalog.create(&admin, protocol(" ", None)).await,
            Err(ApiError::ValidationError(_))
        ));
        assert_eq!(catalog.count().await.unwrap(), 0);
    }

    #[actix_rt::test]
    async fn test_update_delete_and_category_filter() {
        let catalog = SafetyCatalog::new(memory_pool().await);
        let admin = identity_of(UserRole::Admin);

        let general = catalog.create(&admin, protocol("Lab coats", Some("ppe"))).await.unwrap();
        let gloves = catalog.create(&admin, protocol("Gloves", Some("ppe"))).await.unwrap();
        catalog.create(&admin, protocol("Evacuation", Some("emergency"))).await.unwrap();
        catalog.create(&admin, protocol("Housekeeping", None)).await.unwrap();

        let ppe: Vec<String> = catalog
            .list_by_category("ppe")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ppe, vec![general.id.clone(), gloves.id.clone()]);
        assert!(catalog.list_by_category("PPE").await.unwrap().is_empty());

        let update: UpdateSafetyProtocolRequest =
            serde_json::from_str(r#"{"title": "Lab coats and goggles", "category": null}"#).unwrap();
        let updated = catalog.update(&admin, &general.id, update).await.unwrap();
        assert_eq!(updated.title, "Lab coats and goggles");
        assert_eq!(updated.category, None);

        catalog.delete(&admin, &gloves.id).await.unwrap();
        assert!(matches!(catalog.get(&gloves.id).await, Err(ApiError::NotFound(_))));
        assert!(matches!(catalog.delete(&admin, &gloves.id).await, Err(ApiError::NotFound(_))));
        assert_eq!(catalog.list().await.unwrap().len(), 3);
    }
}
