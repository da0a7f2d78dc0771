// src/models/safety.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct SafetyProtocol {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub applicable_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SafetyProtocol {
    pub fn apply_update(&mut self, update: UpdateSafetyProtocolRequest) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(applicable_to) = update.applicable_to {
            self.applicable_to = applicable_to;
        }
    }
}

#[derive(Debug, Deserialize, Validate, Clone, Default)]
pub struct CreateSafetyProtocolRequest {
    #[serde(default)]
    #[validate(length(max = 200, message = "Title cannot exceed 200 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[validate(length(max = 50, message = "Category cannot exceed 50 characters"))]
    pub category: Option<String>,

    #[validate(length(max = 500, message = "Applicability cannot exceed 500 characters"))]
    pub applicable_to: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct UpdateSafetyProtocolRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub category: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub applicable_to: Option<Option<String>>,
}
