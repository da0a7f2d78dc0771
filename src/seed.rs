// src/seed.rs - Bootstrap admin account and demonstration data
use std::env;

use chrono::{Duration, NaiveDate, Utc};
use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};
use sqlx::SqlitePool;

use crate::error::ApiResult;
use crate::identity::IdentityStore;
use crate::models::{CreateChemicalRequest, CreateSafetyProtocolRequest, RegisterRequest};
use crate::repositories::{ChemicalRepository, CrudRepository, SafetyProtocolRepository};

fn generate_admin_password() -> String {
    let mut rng = thread_rng();
    let mut chars: Vec<char> = vec![
        rng.gen_range(b'A'..=b'Z') as char,
        rng.gen_range(b'a'..=b'z') as char,
        rng.gen_range(b'0'..=b'9') as char,
    ];
    chars.extend((0..13).map(|_| char::from(rng.sample(Alphanumeric))));
    chars.shuffle(&mut rng);
    chars.into_iter().collect()
}

/// Creates an `admin` account when the store has no users at all.
/// Returns `true` when an account was created.
pub async fn create_default_admin_if_needed(identity: &IdentityStore) -> ApiResult<bool> {
    if identity.count().await? > 0 {
        return Ok(false);
    }

    let password = env::var("DEFAULT_ADMIN_PASSWORD").unwrap_or_else(|_| {
        let password = generate_admin_password();
        log::warn!("Generated admin password: {}", password);
        password
    });

    let admin = identity
        .register(
            None,
            RegisterRequest {
                username: "admin".to_string(),
                email: "admin@chemlab.local".to_string(),
                password,
                role: Some("admin".to_string()),
            },
        )
        .await?;

    log::info!("✅ Default admin user created: {}", admin.username);
    Ok(true)
}

fn sample_chemical(
    name: &str,
    cas_number: &str,
    quantity: f64,
    unit: &str,
    location: &str,
    expiry_date: NaiveDate,
    minimum_stock: f64,
    safety_info: &str,
) -> CreateChemicalRequest {
    CreateChemicalRequest {
        name: name.to_string(),
        formula: None,
        cas_number: Some(cas_number.to_string()),
        quantity,
        unit: unit.to_string(),
        location: Some(location.to_string()),
        expiry_date: Some(expiry_date),
        minimum_stock: Some(minimum_stock),
        hazard_class: None,
        safety_info: Some(safety_info.to_string()),
    }
}

fn sample_protocol(title: &str, description: &str, category: &str, applicable_to: Option<&str>) -> CreateSafetyProtocolRequest {
    CreateSafetyProtocolRequest {
        title: title.to_string(),
        description: description.to_string(),
        category: Some(category.to_string()),
        applicable_to: applicable_to.map(str::to_string),
    }
}

pub async fn seed_sample_data(pool: &SqlitePool) -> ApiResult<()> {
    seed_sample_data_at(pool, Utc::now().date_naive()).await
}

/// Inserts sample chemicals and protocols into empty tables. Expiry dates are
/// relative to `today`.
pub async fn seed_sample_data_at(pool: &SqlitePool, today: NaiveDate) -> ApiResult<()> {
    let chemicals = ChemicalRepository::new();
    if chemicals.count(pool).await? == 0 {
        let samples = vec![
            sample_chemical(
                "Hydrochloric Acid",
                "7647-01-0",
                500.0,
                "ml",
                "Cabinet A1",
                today + Duration::days(365),
                100.0,
                "Corrosive - wear PPE including gloves, goggles, and lab coat",
            ),
            sample_chemical(
                "Sodium Hydroxide",
                "1310-73-2",
                250.0,
                "g",
                "Cabinet A2",
                today + Duration::days(180),
                50.0,
                "Corrosive - avoid contact with skin and eyes",
            ),
            sample_chemical(
                "Ethanol",
                "64-17-5",
                1000.0,
                "ml",
                "Flammables Cabinet",
                today + Duration::days(730),
                200.0,
                "Flammable - keep away from heat sources",
            ),
            sample_chemical(
                "Sulfuric Acid",
                "7664-93-9",
                50.0,
                "ml",
                "Cabinet A1",
                today + Duration::days(30),
                100.0,
                "Highly corrosive - handle with extreme care",
            ),
        ];

        let total = samples.len();
        for sample in samples {
            chemicals.create(pool, sample).await?;
        }
        log::info!("Created {} sample chemicals", total);
    }

    let protocols = SafetyProtocolRepository::new();
    if protocols.count(pool).await? == 0 {
        let samples = vec![
            sample_protocol(
                "General Laboratory Safety",
                "Always wear appropriate PPE including lab coat, safety goggles, and gloves. \
                 No eating or drinking in the lab. Know the location of safety equipment.",
                "general",
                None,
            ),
            sample_protocol(
                "Handling Corrosive Chemicals",
                "Wear acid-resistant gloves and face shield when handling corrosive substances. \
                 Work in fume hood when possible. Have neutralizing agents readily available.",
                "chemical_specific",
                Some("HCl, NaOH, H2SO4"),
            ),
            sample_protocol(
                "Emergency Procedures",
                "In case of chemical spill: evacuate area, alert others, contain spill if safe, \
                 notify supervisor. For injuries: use eyewash/shower immediately, seek medical attention.",
                "emergency",
                None,
            ),
            sample_protocol(
                "Personal Protective Equipment",
                "Minimum PPE requirements: safety goggles, lab coat, closed-toe shoes, long pants. \
                 Additional PPE based on specific hazards.",
                "ppe",
                None,
            ),
        ];

        let total = samples.len();
        for sample in samples {
            protocols.create(pool, sample).await?;
        }
        log::info!("Created {} safety protocols", total);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::validate_password_strength;
    use crate::models::UserRole;
    use crate::test_support::{identity_store, memory_pool};

    #[test]
    fn test_generated_password_is_strong() {
        for _ in 0..20 {
            let password = generate_admin_password();
            assert_eq!(password.len(), 16);
            assert!(validate_password_strength(&password).is_ok());
        }
    }

    #[actix_rt::test]
    async fn test_default_admin_created_once() {
        let store = identity_store(memory_pool().await);

        assert!(create_default_admin_if_needed(&store).await.unwrap());
        assert!(!create_default_admin_if_needed(&store).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);

        let users = store
            .list(&crate::auth::Identity {
                user_id: "system".to_string(),
                role: UserRole::Admin,
            })
            .await
            .unwrap();
        assert_eq!(users[0].username, "admin");
        assert_eq!(users[0].role, UserRole::Admin);
    }

    #[actix_rt::test]
    async fn test_seeding_is_idempotent() {
        let pool = memory_pool().await;
        seed_sample_data(&pool).await.unwrap();
        seed_sample_data(&pool).await.unwrap();

        assert_eq!(ChemicalRepository::new().count(&pool).await.unwrap(), 4);
        let categories: Vec<Option<String>> = SafetyProtocolRepository::new()
            .list(&pool)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.category)
            .collect();
        assert_eq!(
            categories,
            vec![
                Some("general".to_string()),
                Some("chemical_specific".to_string()),
                Some("emergency".to_string()),
                Some("ppe".to_string()),
            ]
        );
    }
}
