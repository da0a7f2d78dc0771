// src/repositories/user.rs
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::CrudRepository;
use crate::error::ApiResult;
use crate::models::{User, UserRole};

/// A user ready to be stored; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UserRepository;

impl UserRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn find_by_username(&self, pool: &SqlitePool, username: &str) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, pool: &SqlitePool, email: &str) -> ApiResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl CrudRepository<User, NewUser> for UserRepository {
    fn table_name(&self) -> &'static str {
        "users"
    }

    async fn create(&self, pool: &SqlitePool, data: NewUser) -> ApiResult<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"INSERT INTO users (
                id, username, email, password_hash, role, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.role)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(pool)
            .await?;

        Ok(user)
    }

    async fn update(&self, pool: &SqlitePool, record: User) -> ApiResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET username = ?, email = ?, password_hash = ?, role = ?, updated_at = ? WHERE id = ?",
        )
            .bind(&record.username)
            .bind(&record.email)
            .bind(&record.password_hash)
            .bind(&record.role)
            .bind(record.updated_at)
            .bind(&record.id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::test_support::memory_pool;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::Technician,
        }
    }

    #[actix_rt::test]
    async fn test_unique_columns_map_to_conflict() {
        let pool = memory_pool().await;
        let repo = UserRepository::new();
        repo.create(&pool, new_user("alice", "alice@lab.test")).await.unwrap();

        let same_username = repo.create(&pool, new_user("alice", "other@lab.test")).await;
        assert!(matches!(same_username, Err(ApiError::Conflict(_))));

        let same_email = repo.create(&pool, new_user("bob", "alice@lab.test")).await;
        assert!(matches!(same_email, Err(ApiError::Conflict(_))));

        assert_eq!(repo.count(&pool).await.unwrap(), 1);
    }
}
