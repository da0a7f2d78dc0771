// src/models/chemical.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ==================== CHEMICAL ====================

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Chemical {
    pub id: String,
    pub name: String,
    pub formula: Option<String>,
    pub cas_number: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub location: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub minimum_stock: f64,
    pub hazard_class: Option<String>,
    pub safety_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chemical {
    /// A zero `minimum_stock` means no reorder threshold is configured.
    pub fn is_low_stock(&self) -> bool {
        self.minimum_stock > 0.0 && self.quantity <= self.minimum_stock
    }

    /// Signed number of days from `today` to the expiry date.
    pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
        self.expiry_date.map(|date| (date - today).num_days())
    }

    pub fn expires_within(&self, today: NaiveDate, window_days: i64) -> bool {
        self.days_until_expiry(today)
            .map(|days| days <= window_days)
            .unwrap_or(false)
    }

    /// Merges a partial update into this record. Only supplied fields change.
    pub fn apply_update(&mut self, update: UpdateChemicalRequest) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(formula) = update.formula {
            self.formula = formula;
        }
        if let Some(cas_number) = update.cas_number {
            self.cas_number = cas_number;
        }
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
        }
        if let Some(unit) = update.unit {
            self.unit = unit;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(expiry_date) = update.expiry_date {
            self.expiry_date = expiry_date;
        }
        if let Some(minimum_stock) = update.minimum_stock {
            self.minimum_stock = minimum_stock;
        }
        if let Some(hazard_class) = update.hazard_class {
            self.hazard_class = hazard_class;
        }
        if let Some(safety_info) = update.safety_info {
            self.safety_info = safety_info;
        }
    }
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct CreateChemicalRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,

    #[validate(length(max = 100, message = "Formula cannot exceed 100 characters"))]
    pub formula: Option<String>,

    #[validate(length(max = 50, message = "CAS number cannot exceed 50 characters"))]
    pub cas_number: Option<String>,

    #[validate(range(min = 0.0, message = "Quantity cannot be negative"))]
    pub quantity: f64,

    #[validate(length(min = 1, max = 20, message = "Unit must be between 1 and 20 characters"))]
    pub unit: String,

    #[validate(length(max = 200, message = "Location cannot exceed 200 characters"))]
    pub location: Option<String>,

    pub expiry_date: Option<NaiveDate>,

    #[validate(range(min = 0.0, message = "Minimum stock cannot be negative"))]
    pub minimum_stock: Option<f64>,

    #[validate(length(max = 100, message = "Hazard class cannot exceed 100 characters"))]
    pub hazard_class: Option<String>,

    #[validate(length(max = 2000, message = "Safety info cannot exceed 2000 characters"))]
    pub safety_info: Option<String>,
}

/// Partial update. Nullable fields distinguish "absent" (outer `None`) from an
/// explicit `null` (`Some(None)`), which clears the stored value.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct UpdateChemicalRequest {
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub formula: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub cas_number: Option<Option<String>>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub location: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expiry_date: Option<Option<NaiveDate>>,
    pub minimum_stock: Option<f64>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub hazard_class: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub safety_info: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chemical(quantity: f64, minimum_stock: f64, expiry: Option<NaiveDate>) -> Chemical {
        let now = Utc::now();
        Chemical {
            id: "c1".to_string(),
            name: "Acetone".to_string(),
            formula: None,
            cas_number: None,
            quantity,
            unit: "ml".to_string(),
            location: None,
            expiry_date: expiry,
            minimum_stock,
            hazard_class: None,
            safety_info: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_low_stock_predicate() {
        assert!(chemical(50.0, 100.0, None).is_low_stock());
        assert!(chemical(100.0, 100.0, None).is_low_stock());
        assert!(!chemical(101.0, 100.0, None).is_low_stock());
        assert!(!chemical(0.0, 0.0, None).is_low_stock());
    }

    #[test]
    fn test_days_until_expiry() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let c = chemical(1.0, 0.0, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(c.days_until_expiry(today), Some(30));
        assert!(c.expires_within(today, 30));
        assert!(!c.expires_within(today, 29));

        let expired = chemical(1.0, 0.0, NaiveDate::from_ymd_opt(2024, 2, 20));
        assert_eq!(expired.days_until_expiry(today), Some(-10));
        assert!(expired.expires_within(today, 30));

        assert!(!chemical(1.0, 0.0, None).expires_within(today, 30));
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let mut c = chemical(10.0, 5.0, NaiveDate::from_ymd_opt(2030, 1, 1));
        c.location = Some("Shelf 2".to_string());

        let update: UpdateChemicalRequest =
            serde_json::from_str(r#"{"quantity": 3.5, "location": null}"#).unwrap();
        c.apply_update(update);

        assert_eq!(c.quantity, 3.5);
        assert_eq!(c.location, None);
        assert_eq!(c.expiry_date, NaiveDate::from_ymd_opt(2030, 1, 1));
        assert_eq!(c.name, "Acetone");
    }
}
