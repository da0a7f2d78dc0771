// src/validator.rs - Centralized validation module
use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::ApiError;
use crate::models::*;

lazy_static! {
    static ref CAS_REGEX: Regex = Regex::new(r"^\d{2,7}-\d{2}-\d$").unwrap();
    static ref FORMULA_REGEX: Regex = Regex::new(r"^[A-Za-z0-9()\[\]·+-]+$").unwrap();
}

pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_UNIT_LENGTH: usize = 20;

// ==================== VALIDATION RESULT ====================

#[derive(Debug, Default, Serialize)]
pub struct ValidationResult {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Records the error of a field check, if any.
    pub fn check(&mut self, field: &str, outcome: Result<(), String>) {
        if let Err(message) = outcome {
            self.add_error(field, message);
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        let message = self
            .errors
            .iter()
            .map(|(field, errors)| format!("{}: {}", field, errors.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");

        ApiError::ValidationError(message)
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self.to_api_error())
        }
    }
}

// ==================== FIELD VALIDATORS ====================

pub struct FieldValidator;

impl FieldValidator {
    pub fn not_empty(value: &str, field: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err(format!("{} cannot be empty", field))
        } else {
            Ok(())
        }
    }

    pub fn length(value: &str, field: &str, min: Option<usize>, max: Option<usize>) -> Result<(), String> {
        let len = value.chars().count();

        if let Some(min_len) = min {
            if len < min_len {
                return Err(format!("{} must be at least {} characters", field, min_len));
            }
        }

        if let Some(max_len) = max {
            if len > max_len {
                return Err(format!("{} must not exceed {} characters", field, max_len));
            }
        }

        Ok(())
    }

    /// Finite and `>= 0`.
    pub fn non_negative(value: f64, field: &str) -> Result<(), String> {
        if !value.is_finite() {
            Err(format!("{} must be a finite number", field))
        } else if value < 0.0 {
            Err(format!("{} cannot be negative", field))
        } else {
            Ok(())
        }
    }

    /// Finite and strictly `> 0`.
    pub fn positive(value: f64, field: &str) -> Result<(), String> {
        if !value.is_finite() {
            Err(format!("{} must be a finite number", field))
        } else if value <= 0.0 {
            Err(format!("{} must be positive", field))
        } else {
            Ok(())
        }
    }

    pub fn cas_number(value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Ok(());
        }

        if !CAS_REGEX.is_match(value) {
            return Err("Invalid CAS number format (expected: XXXXX-XX-X)".to_string());
        }

        let parts: Vec<&str> = value.split('-').collect();
        if parts.len() == 3 {
            let check_digit: u32 = parts[2]
                .parse()
                .map_err(|_| "Invalid CAS check digit".to_string())?;

            let full_number = format!("{}{}", parts[0], parts[1]);
            let sum: u32 = full_number
                .chars()
                .rev()
                .enumerate()
                .filter_map(|(i, c)| c.to_digit(10).map(|d| d * (i as u32 + 1)))
                .sum();

            if sum % 10 != check_digit {
                return Err("Invalid CAS number (check digit mismatch)".to_string());
            }
        }

        Ok(())
    }

    pub fn chemical_formula(value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Ok(());
        }

        if !FORMULA_REGEX.is_match(value) {
            return Err("Invalid chemical formula format".to_string());
        }

        let mut balance = 0;
        for ch in value.chars() {
            match ch {
                '(' | '[' => balance += 1,
                ')' | ']' => balance -= 1,
                _ => {}
            }
            if balance < 0 {
                return Err("Unbalanced brackets in formula".to_string());
            }
        }

        if balance != 0 {
            return Err("Unbalanced brackets in formula".to_string());
        }

        Ok(())
    }
}

// ==================== CUSTOM VALIDATION ====================

pub trait CustomValidate {
    fn custom_validate(&self) -> ValidationResult;
}

fn validate_chemical_fields(
    name: &str,
    unit: &str,
    quantity: f64,
    minimum_stock: f64,
    formula: Option<&str>,
    cas_number: Option<&str>,
) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.check("name", FieldValidator::not_empty(name, "Name"));
    result.check("name", FieldValidator::length(name, "Name", None, Some(MAX_NAME_LENGTH)));
    result.check("unit", FieldValidator::not_empty(unit, "Unit"));
    result.check("unit", FieldValidator::length(unit, "Unit", None, Some(MAX_UNIT_LENGTH)));
    result.check("quantity", FieldValidator::non_negative(quantity, "Quantity"));
    result.check("minimum_stock", FieldValidator::non_negative(minimum_stock, "Minimum stock"));

    if let Some(formula) = formula {
        result.check("formula", FieldValidator::chemical_formula(formula));
    }
    if let Some(cas) = cas_number {
        result.check("cas_number", FieldValidator::cas_number(cas));
    }

    result
}

impl CustomValidate for CreateChemicalRequest {
    fn custom_validate(&self) -> ValidationResult {
        validate_chemical_fields(
            &self.name,
            &self.unit,
            self.quantity,
            self.minimum_stock.unwrap_or(0.0),
            self.formula.as_deref(),
            self.cas_number.as_deref(),
        )
    }
}

/// Re-validation of a chemical after a partial update has been merged.
impl CustomValidate for Chemical {
    fn custom_validate(&self) -> ValidationResult {
        validate_chemical_fields(
            &self.name,
            &self.unit,
            self.quantity,
            self.minimum_stock,
            self.formula.as_deref(),
            self.cas_number.as_deref(),
        )
    }
}

impl CustomValidate for Experiment {
    fn custom_validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.check("title", FieldValidator::not_empty(&self.title, "Title"));
        result.check("title", FieldValidator::length(&self.title, "Title", None, Some(MAX_NAME_LENGTH)));
        result
    }
}

impl CustomValidate for SafetyProtocol {
    fn custom_validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.check("title", FieldValidator::not_empty(&self.title, "Title"));
        result.check("title", FieldValidator::length(&self.title, "Title", None, Some(MAX_NAME_LENGTH)));
        result.check("description", FieldValidator::not_empty(&self.description, "Description"));
        result
    }
}

// ==================== CONSUMPTION ====================

/// Validates every consumption line up front; the first invalid line aborts
/// the whole batch with its position in the message.
pub fn validate_consumption(inputs: &[ConsumptionInput]) -> Result<Vec<NewConsumption>, ApiError> {
    let mut result = ValidationResult::new();
    let mut entries = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.iter().enumerate() {
        let field = format!("chemicals_used[{}]", index);

        let chemical_id = match input.chemical_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Some(id.to_string()),
            _ => {
                result.add_error(&field, "chemical_id is required");
                None
            }
        };

        let quantity_used = match input.quantity_used {
            Some(quantity) => match FieldValidator::positive(quantity, "quantity_used") {
                Ok(()) => Some(quantity),
                Err(e) => {
                    result.add_error(&field, e);
                    None
                }
            },
            None => {
                result.add_error(&field, "quantity_used is required");
                None
            }
        };

        let unit = match input.unit.as_deref().map(str::trim) {
            Some(unit) if !unit.is_empty() => Some(unit.to_string()),
            _ => {
                result.add_error(&field, "unit is required");
                None
            }
        };

        if let (Some(chemical_id), Some(quantity_used), Some(unit)) = (chemical_id, quantity_used, unit) {
            entries.push(NewConsumption {
                chemical_id,
                quantity_used,
                unit,
            });
        }
    }

    result.into_result()?;
    Ok(entries)
}
