// src/experiments.rs - Experiment records and their chemical consumption
use chrono::Utc;
use sqlx::SqlitePool;

use crate::auth::Identity;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateExperimentRequest, Experiment, ExperimentStatus, ExperimentWithConsumption, UpdateExperimentRequest,
};
use crate::policy::{authorize, Action, Resource};
use crate::repositories::{CrudRepository, ExperimentRepository, NewExperiment};
use crate::validator::{validate_consumption, CustomValidate, FieldValidator, ValidationResult, MAX_NAME_LENGTH};

#[derive(Clone)]
pub struct ExperimentLedger {
    pool: SqlitePool,
    repo: ExperimentRepository,
    default_status: ExperimentStatus,
}

impl ExperimentLedger {
    pub fn new(pool: SqlitePool, default_status: ExperimentStatus) -> Self {
        Self {
            pool,
            repo: ExperimentRepository::new(),
            default_status,
        }
    }

    /// Creates an experiment owned by the caller.
    ///
    /// Every consumption line is validated before anything is written. The
    /// record and its lines are then stored in a single transaction.
    pub async fn create(&self, caller: &Identity, request: CreateExperimentRequest) -> ApiResult<ExperimentWithConsumption> {
        authorize(caller, Resource::Experiment, Action::Create, None).into_result()?;

        let mut result = ValidationResult::new();
        result.check("title", FieldValidator::not_empty(&request.title, "Title"));
        result.check("title", FieldValidator::length(&request.title, "Title", None, Some(MAX_NAME_LENGTH)));
        result.into_result()?;

        let consumption = validate_consumption(&request.chemicals_used)?;

        let experiment = self
            .repo
            .create(
                &self.pool,
                NewExperiment {
                    title: request.title,
                    description: request.description,
                    procedure: request.procedure,
                    results: request.results,
                    status: request.status.unwrap_or(self.default_status),
                    user_id: caller.user_id.clone(),
                    consumption,
                },
            )
            .await?;

        log::info!("User {} created experiment: {}", caller.user_id, experiment.id);
        self.with_consumption(experiment).await
    }

    pub async fn get(&self, id: &str) -> ApiResult<ExperimentWithConsumption> {
        let experiment = self.find(id).await?;
        self.with_consumption(experiment).await
    }

    /// All experiments, newest first.
    pub async fn list(&self) -> ApiResult<Vec<ExperimentWithConsumption>> {
        let experiments = self.repo.list(&self.pool).await?;
        self.attach_consumption(experiments).await
    }

    pub async fn list_by_owner(&self, owner_id: &str) -> ApiResult<Vec<ExperimentWithConsumption>> {
        let experiments = self.repo.list_by_owner(&self.pool, owner_id).await?;
        self.attach_consumption(experiments).await
    }

    pub async fn list_recent(&self, limit: i64) -> ApiResult<Vec<ExperimentWithConsumption>> {
        let experiments = self.repo.list_recent(&self.pool, limit).await?;
        self.attach_consumption(experiments).await
    }

    pub async fn update(
        &self,
        caller: &Identity,
        id: &str,
        update: UpdateExperimentRequest,
    ) -> ApiResult<ExperimentWithConsumption> {
        let mut experiment = self.find(id).await?;
        authorize(caller, Resource::Experiment, Action::Edit, Some(&experiment.user_id)).into_result()?;

        experiment.apply_update(update);
        experiment.custom_validate().into_result()?;
        experiment.updated_at = Utc::now();

        if !self.repo.update(&self.pool, experiment.clone()).await? {
            return Err(ApiError::experiment_not_found(id));
        }

        log::info!("User {} updated experiment: {}", caller.user_id, id);
        self.with_consumption(experiment).await
    }

    pub async fn delete(&self, caller: &Identity, id: &str) -> ApiResult<()> {
        let experiment = self.find(id).await?;
        authorize(caller, Resource::Experiment, Action::Delete, Some(&experiment.user_id)).into_result()?;

        if !self.repo.delete(&self.pool, id).await? {
            return Err(ApiError::experiment_not_found(id));
        }

        log::info!("User {} deleted experiment: {}", caller.user_id, id);
        Ok(())
    }

    pub async fn count(&self) -> ApiResult<i64> {
        self.repo.count(&self.pool).await
    }

    pub async fn count_active(&self) -> ApiResult<i64> {
        self.repo.count_active(&self.pool).await
    }

    async fn find(&self, id: &str) -> ApiResult<Experiment> {
        self.repo
            .get_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| ApiError::experiment_not_found(id))
    }

    async fn with_consumption(&self, experiment: Experiment) -> ApiResult<ExperimentWithConsumption> {
        let chemicals_used = self.repo.consumption_for(&self.pool, &experiment.id).await?;
        Ok(ExperimentWithConsumption {
            experiment,
            chemicals_used,
        })
    }

    async fn attach_consumption(&self, experiments: Vec<Experiment>) -> ApiResult<Vec<ExperimentWithConsumption>> {
        let ids: Vec<String> = experiments.iter().map(|e| e.id.clone()).collect();
        let mut consumption = self.repo.consumption_for_many(&self.pool, &ids).await?;

        Ok(experiments
            .into_iter()
            .map(|experiment| {
                let chemicals_used = consumption.remove(&experiment.id).unwrap_or_default();
                ExperimentWithConsumption {
                    experiment,
                    chemicals_used,
                }
            })
            .collect())
    }
}
