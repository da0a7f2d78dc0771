// Shared fixtures for the inline test modules.
use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::auth::{BcryptHasher, Identity, JwtTokenService, TokenService};
use crate::config::Config;
use crate::db::run_migrations;
use crate::identity::IdentityStore;
use crate::models::{CreateChemicalRequest, RegisterRequest, UserRole};
use crate::repositories::{CrudRepository, NewUser, UserRepository};
use crate::AppState;

pub const TEST_SECRET: &str = "test_secret_0123456789abcdef0123456789";
pub const TEST_PASSWORD: &str = "Passw0rd!";

/// Single-connection in-memory database with the schema applied.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    run_migrations(&pool).await.expect("migrations");
    pool
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config.auth.bcrypt_cost = 4;
    config
}

pub fn identity_store(pool: SqlitePool) -> IdentityStore {
    IdentityStore::new(
        pool,
        Arc::new(BcryptHasher::new(4)),
        Arc::new(JwtTokenService::new(TEST_SECRET, 1)),
    )
}

pub fn test_state(pool: SqlitePool) -> Arc<AppState> {
    Arc::new(AppState::new(test_config(), pool))
}

pub fn identity_of(role: UserRole) -> Identity {
    Identity {
        user_id: format!("{}-user", role.as_str()),
        role,
    }
}

pub fn register_request(username: &str, role: Option<&str>) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: format!("{}@lab.test", username),
        password: TEST_PASSWORD.to_string(),
        role: role.map(str::to_string),
    }
}

/// Inserts a user row directly and returns its identity.
pub async fn create_user(pool: &SqlitePool, username: &str, role: UserRole) -> Identity {
    let user = UserRepository::new()
        .create(
            pool,
            NewUser {
                username: username.to_string(),
                email: format!("{}@lab.test", username),
                password_hash: format!("unused-hash-{}", username),
                role,
            },
        )
        .await
        .expect("user insert");
    Identity::from(&user)
}

pub fn chemical_request(name: &str, quantity: f64, minimum_stock: Option<f64>) -> CreateChemicalRequest {
    CreateChemicalRequest {
        name: name.to_string(),
        formula: None,
        cas_number: None,
        quantity,
        unit: "ml".to_string(),
        location: None,
        expiry_date: None,
        minimum_stock,
        hazard_class: None,
        safety_info: None,
    }
}

/// Creates a user and returns its identity with a valid bearer header value.
pub async fn bearer_for(pool: &SqlitePool, username: &str, role: UserRole) -> (Identity, String) {
    let identity = create_user(pool, username, role).await;
    let token = JwtTokenService::new(TEST_SECRET, 1)
        .issue(&identity.user_id)
        .expect("token");
    (identity, format!("Bearer {}", token))
}
