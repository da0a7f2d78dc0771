// src/models/experiment.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// === ENUMS ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl Default for ExperimentStatus {
    fn default() -> Self {
        ExperimentStatus::Planned
    }
}

impl ExperimentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperimentStatus::Planned => "planned",
            ExperimentStatus::InProgress => "in_progress",
            ExperimentStatus::Completed => "completed",
            ExperimentStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "planned" => Some(ExperimentStatus::Planned),
            "in_progress" => Some(ExperimentStatus::InProgress),
            "completed" => Some(ExperimentStatus::Completed),
            "cancelled" => Some(ExperimentStatus::Cancelled),
            _ => None,
        }
    }

    /// Planned and in-progress experiments count as active on the dashboard.
    pub fn is_active(&self) -> bool {
        matches!(self, ExperimentStatus::Planned | ExperimentStatus::InProgress)
    }

    pub fn all() -> [Self; 4] {
        [
            ExperimentStatus::Planned,
            ExperimentStatus::InProgress,
            ExperimentStatus::Completed,
            ExperimentStatus::Cancelled,
        ]
    }
}

impl std::fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// === EXPERIMENT ===

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Experiment {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub procedure: Option<String>,
    pub results: Option<String>,
    pub status: ExperimentStatus,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Experiment {
    pub fn apply_update(&mut self, update: UpdateExperimentRequest) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(procedure) = update.procedure {
            self.procedure = procedure;
        }
        if let Some(results) = update.results {
            self.results = results;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
    }
}

// === CONSUMPTION ===

/// One chemical usage line as rendered with its experiment. `chemical_name` is
/// `None` once the referenced chemical has been deleted.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct ConsumptionDetail {
    pub id: String,
    pub chemical_id: String,
    pub chemical_name: Option<String>,
    pub quantity_used: f64,
    pub unit: String,
}

/// Incoming consumption line. Every field is optional on the wire so that
/// missing values surface as validation errors rather than parse errors.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConsumptionInput {
    pub chemical_id: Option<String>,
    pub quantity_used: Option<f64>,
    pub unit: Option<String>,
}

/// A consumption line that passed validation and is ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConsumption {
    pub chemical_id: String,
    pub quantity_used: f64,
    pub unit: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ExperimentWithConsumption {
    #[serde(flatten)]
    pub experiment: Experiment,
    pub chemicals_used: Vec<ConsumptionDetail>,
}

// === REQUESTS ===

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CreateExperimentRequest {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub procedure: Option<String>,
    pub results: Option<String>,
    pub status: Option<ExperimentStatus>,
    #[serde(default)]
    pub chemicals_used: Vec<ConsumptionInput>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct UpdateExperimentRequest {
    pub title: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub procedure: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub results: Option<Option<String>>,
    pub status: Option<ExperimentStatus>,
}
