// src/db.rs - Pool construction and schema migrations

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::DatabaseConfig;

pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .with_context(|| format!("Invalid database URL: {}", config.url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to database: {}", config.url))?;

    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE CHECK(length(username) >= 3 AND length(username) <= 50),
            email TEXT NOT NULL UNIQUE CHECK(length(email) >= 3 AND length(email) <= 255),
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'technician' CHECK(
                role IN ('admin', 'technician', 'viewer')
            ),
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
        .execute(pool)
        .await
        .context("Failed to create users table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chemicals (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL CHECK(length(trim(name)) > 0 AND length(name) <= 200),
            formula TEXT CHECK(formula IS NULL OR length(formula) <= 100),
            cas_number TEXT CHECK(cas_number IS NULL OR length(cas_number) <= 50),
            quantity REAL NOT NULL CHECK(quantity >= 0),
            unit TEXT NOT NULL CHECK(length(trim(unit)) > 0 AND length(unit) <= 20),
            location TEXT CHECK(location IS NULL OR length(location) <= 200),
            expiry_date DATE,
            minimum_stock REAL NOT NULL DEFAULT 0 CHECK(minimum_stock >= 0),
            hazard_class TEXT CHECK(hazard_class IS NULL OR length(hazard_class) <= 100),
            safety_info TEXT,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
        .execute(pool)
        .await
        .context("Failed to create chemicals table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS experiments (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL CHECK(length(trim(title)) > 0 AND length(title) <= 200),
            description TEXT,
            procedure TEXT,
            results TEXT,
            status TEXT NOT NULL DEFAULT 'planned' CHECK(
                status IN ('planned', 'in_progress', 'completed', 'cancelled')
            ),
            user_id TEXT NOT NULL,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users (id)
        )
        "#,
    )
        .execute(pool)
        .await
        .context("Failed to create experiments table")?;

    // chemical_id is a plain reference: deleting a chemical keeps the usage history
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS consumption_entries (
            id TEXT PRIMARY KEY,
            experiment_id TEXT NOT NULL,
            chemical_id TEXT NOT NULL,
            quantity_used REAL NOT NULL CHECK(quantity_used > 0),
            unit TEXT NOT NULL CHECK(length(trim(unit)) > 0),
            position INTEGER NOT NULL,
            FOREIGN KEY (experiment_id) REFERENCES experiments (id) ON DELETE CASCADE
        )
        "#,
    )
        .execute(pool)
        .await
        .context("Failed to create consumption_entries table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS safety_protocols (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL CHECK(length(trim(title)) > 0 AND length(title) <= 200),
            description TEXT NOT NULL CHECK(length(trim(description)) > 0),
            category TEXT CHECK(category IS NULL OR length(category) <= 50),
            applicable_to TEXT,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
        .execute(pool)
        .await
        .context("Failed to create safety_protocols table")?;

    // ==================== CREATE INDEXES ====================

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_chemicals_expiry ON chemicals(expiry_date)",
        "CREATE INDEX IF NOT EXISTS idx_experiments_user ON experiments(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_experiments_status ON experiments(status)",
        "CREATE INDEX IF NOT EXISTS idx_experiments_updated ON experiments(updated_at)",
        "CREATE INDEX IF NOT EXISTS idx_consumption_experiment ON consumption_entries(experiment_id, position)",
        "CREATE INDEX IF NOT EXISTS idx_protocols_category ON safety_protocols(category)",
    ];

    for statement in indexes {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create index: {}", statement))?;
    }

    log::info!("✅ Database migrations completed");
    Ok(())
}
