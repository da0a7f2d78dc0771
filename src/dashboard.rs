// src/dashboard.rs - Metrics and stock/expiry alerts
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::config::AlertConfig;
use crate::error::ApiResult;
use crate::experiments::ExperimentLedger;
use crate::identity::IdentityStore;
use crate::inventory::InventoryLedger;
use crate::models::{Chemical, ExperimentWithConsumption};
use crate::safety::SafetyCatalog;

pub const RECENT_EXPERIMENTS_LIMIT: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
    Expiring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Alert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub chemical_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_expiry: Option<i64>,
    pub chemical: Chemical,
}

#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub total_chemicals: i64,
    pub total_experiments: i64,
    pub total_users: i64,
    pub total_protocols: i64,
    pub active_experiments: i64,
    pub low_stock_count: i64,
    pub expiring_count: i64,
    pub recent_experiments: Vec<ExperimentWithConsumption>,
}

fn expiry_message(name: &str, days: i64) -> String {
    if days < 0 {
        format!("{} expired {} days ago", name, -days)
    } else {
        format!("{} expires in {} days", name, days)
    }
}

/// Builds the alert list for the given chemicals: every low-stock alert first,
/// then every expiry alert, each group in input order.
pub fn collect_alerts(chemicals: &[Chemical], today: NaiveDate, thresholds: &AlertConfig) -> Vec<Alert> {
    let low_stock = chemicals.iter().filter(|c| c.is_low_stock()).map(|c| Alert {
        alert_type: AlertType::LowStock,
        severity: Severity::Warning,
        message: format!("{} is low on stock ({} {})", c.name, c.quantity, c.unit),
        chemical_id: c.id.clone(),
        days_until_expiry: None,
        chemical: c.clone(),
    });

    let expiring = chemicals.iter().filter_map(|c| {
        let days = c.days_until_expiry(today)?;
        if days > thresholds.expiry_window_days {
            return None;
        }
        Some(Alert {
            alert_type: AlertType::Expiring,
            severity: if days < thresholds.critical_days {
                Severity::Critical
            } else {
                Severity::Warning
            },
            message: expiry_message(&c.name, days),
            chemical_id: c.id.clone(),
            days_until_expiry: Some(days),
            chemical: c.clone(),
        })
    });

    low_stock.chain(expiring).collect()
}

/// Read-only view over the ledgers. Every call re-scans current state.
#[derive(Clone)]
pub struct Dashboard {
    inventory: InventoryLedger,
    experiments: ExperimentLedger,
    safety: SafetyCatalog,
    identity: IdentityStore,
    thresholds: AlertConfig,
}

impl Dashboard {
    pub fn new(
        inventory: InventoryLedger,
        experiments: ExperimentLedger,
        safety: SafetyCatalog,
        identity: IdentityStore,
        thresholds: AlertConfig,
    ) -> Self {
        Self {
            inventory,
            experiments,
            safety,
            identity,
            thresholds,
        }
    }

    pub async fn metrics(&self) -> ApiResult<DashboardMetrics> {
        self.metrics_at(Utc::now().date_naive()).await
    }

    pub async fn metrics_at(&self, today: NaiveDate) -> ApiResult<DashboardMetrics> {
        let chemicals = self.inventory.list().await?;
        let low_stock_count = chemicals.iter().filter(|c| c.is_low_stock()).count() as i64;
        let expiring_count = chemicals
            .iter()
            .filter(|c| c.expires_within(today, self.thresholds.expiry_window_days))
            .count() as i64;

        Ok(DashboardMetrics {
            total_chemicals: chemicals.len() as i64,
            total_experiments: self.experiments.count().await?,
            total_users: self.identity.count().await?,
            total_protocols: self.safety.count().await?,
            active_experiments: self.experiments.count_active().await?,
            low_stock_count,
            expiring_count,
            recent_experiments: self.experiments.list_recent(RECENT_EXPERIMENTS_LIMIT).await?,
        })
    }

    pub async fn alerts(&self) -> ApiResult<Vec<Alert>> {
        self.alerts_at(Utc::now().date_naive()).await
    }

    pub async fn alerts_at(&self, today: NaiveDate) -> ApiResult<Vec<Alert>> {
        let chemicals = self.inventory.list().await?;
        Ok(collect_alerts(&chemicals, today, &self.thresholds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateExperimentRequest, ExperimentStatus, UpdateExperimentRequest, UserRole};
    use crate::seed::seed_sample_data_at;
    use crate::test_support::{chemical_request, create_user, identity_store, memory_pool};
    use chrono::Duration;

    fn chemical(name: &str, quantity: f64, minimum_stock: f64, expiry: Option<NaiveDate>) -> Chemical {
        let now = Utc::now();
        Chemical {
            id: format!("{}-id", name),
            name: name.to_string(),
            formula: None,
            cas_number: None,
            quantity,
            unit: "g".to_string(),
            location: None,
            expiry_date: expiry,
            minimum_stock,
            hazard_class: None,
            safety_info: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_alert_ordering_and_severity() {
        let t = today();
        let chemicals = vec![
            chemical("Soon", 10.0, 0.0, Some(t + Duration::days(3))),
            chemical("Low", 1.0, 5.0, None),
            chemical("Later", 10.0, 0.0, Some(t + Duration::days(7))),
            chemical("Expired", 2.0, 2.0, Some(t - Duration::days(4))),
            chemical("Fine", 10.0, 5.0, Some(t + Duration::days(31))),
        ];

        let alerts = collect_alerts(&chemicals, t, &AlertConfig::default());
        let summary: Vec<(AlertType, &str, Severity)> = alerts
            .iter()
            .map(|a| (a.alert_type, a.chemical.name.as_str(), a.severity))
            .collect();

        assert_eq!(
            summary,
            vec![
                (AlertType::LowStock, "Low", Severity::Warning),
                (AlertType::LowStock, "Expired", Severity::Warning),
                (AlertType::Expiring, "Soon", Severity::Critical),
                (AlertType::Expiring, "Later", Severity::Warning),
                (AlertType::Expiring, "Expired", Severity::Critical),
            ]
        );

        assert_eq!(alerts[0].message, "Low is low on stock (1 g)");
        assert_eq!(alerts[2].message, "Soon expires in 3 days");
        assert_eq!(alerts[2].days_until_expiry, Some(3));
        assert_eq!(alerts[4].message, "Expired expired 4 days ago");
        assert_eq!(alerts[4].days_until_expiry, Some(-4));
    }

    #[test]
    fn test_alert_serialization() {
        let t = today();
        let alerts = collect_alerts(
            &[chemical("Acid", 1.0, 5.0, Some(t + Duration::days(10)))],
            t,
            &AlertConfig::default(),
        );
        let low = serde_json::to_value(&alerts[0]).unwrap();
        assert_eq!(low["type"], "low_stock");
        assert_eq!(low["severity"], "warning");
        assert_eq!(low["chemical_id"], "Acid-id");
        assert!(low.get("days_until_expiry").is_none());
        assert_eq!(low["chemical"]["name"], "Acid");

        let expiring = serde_json::to_value(&alerts[1]).unwrap();
        assert_eq!(expiring["type"], "expiring");
        assert_eq!(expiring["days_until_expiry"], 10);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = today();
        let thresholds = AlertConfig {
            expiry_window_days: 10,
            critical_days: 2,
        };
        let chemicals = vec![
            chemical("A", 1.0, 0.0, Some(t + Duration::days(5))),
            chemical("B", 1.0, 0.0, Some(t + Duration::days(11))),
        ];
        let alerts = collect_alerts(&chemicals, t, &thresholds);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }

    async fn dashboard_for(pool: &sqlx::SqlitePool) -> Dashboard {
        Dashboard::new(
            InventoryLedger::new(pool.clone()),
            ExperimentLedger::new(pool.clone(), ExperimentStatus::Planned),
            SafetyCatalog::new(pool.clone()),
            identity_store(pool.clone()),
            AlertConfig::default(),
        )
    }

    #[actix_rt::test]
    async fn test_seeded_sulfuric_acid_scenario() {
        let pool = memory_pool().await;
        let t = today();
        seed_sample_data_at(&pool, t).await.unwrap();
        let dashboard = dashboard_for(&pool).await;

        let metrics = dashboard.metrics_at(t).await.unwrap();
        assert_eq!(metrics.total_chemicals, 4);
        assert_eq!(metrics.total_protocols, 4);
        assert_eq!(metrics.low_stock_count, 1);
        assert_eq!(metrics.expiring_count, 1);

        let alerts = dashboard.alerts_at(t).await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].alert_type, AlertType::LowStock);
        assert_eq!(alerts[0].chemical.name, "Sulfuric Acid");
        assert_eq!(alerts[0].message, "Sulfuric Acid is low on stock (50 ml)");
        assert_eq!(alerts[1].alert_type, AlertType::Expiring);
        assert_eq!(alerts[1].chemical.name, "Sulfuric Acid");
        assert_eq!(alerts[1].days_until_expiry, Some(30));
        assert_eq!(alerts[1].severity, Severity::Warning);
    }

    #[actix_rt::test]
    async fn test_metrics_counts_and_recent_experiments() {
        let pool = memory_pool().await;
        let tech = create_user(&pool, "tech", UserRole::Technician).await;
        let dashboard = dashboard_for(&pool).await;
        let inventory = InventoryLedger::new(pool.clone());
        let experiments = ExperimentLedger::new(pool.clone(), ExperimentStatus::Planned);

        inventory.create(&tech, chemical_request("Acetone", 5.0, Some(10.0))).await.unwrap();

        let mut ids = Vec::new();
        for i in 0..6 {
            let created = experiments
                .create(
                    &tech,
                    CreateExperimentRequest {
                        title: format!("Run {}", i),
                        status: Some(if i % 2 == 0 { ExperimentStatus::Completed } else { ExperimentStatus::InProgress }),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            ids.push(created.experiment.id);
        }

        // touching the oldest experiment moves it to the front
        experiments
            .update(
                &tech,
                &ids[0],
                UpdateExperimentRequest {
                    results: Some(Some("done".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let metrics = dashboard.metrics().await.unwrap();
        assert_eq!(metrics.total_chemicals, 1);
        assert_eq!(metrics.total_experiments, 6);
        assert_eq!(metrics.total_users, 1);
        assert_eq!(metrics.total_protocols, 0);
        assert_eq!(metrics.active_experiments, 3);
        assert_eq!(metrics.low_stock_count, 1);
        assert_eq!(metrics.recent_experiments.len(), 5);
        assert_eq!(metrics.recent_experiments[0].experiment.id, ids[0]);
        assert!(metrics.recent_experiments.iter().all(|e| e.experiment.id != ids[1]));
    }
}
