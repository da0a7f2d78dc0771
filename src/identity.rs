// src/identity.rs - User accounts, credentials and roles
use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::auth::{validate_password_strength, Identity, PasswordHasher, TokenService};
use crate::error::{ApiError, ApiResult};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, User, UserInfo, UserRole};
use crate::policy::{authorize, Action, Resource};
use crate::repositories::{CrudRepository, NewUser, UserRepository};

#[derive(Clone)]
pub struct IdentityStore {
    pool: SqlitePool,
    repo: UserRepository,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
}

impl IdentityStore {
    // bcrypt is CPU bound; keep it off the async workers.
    async fn hash_password(&self, password: String) -> ApiResult<String> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|_| ApiError::InternalServerError("Password hashing task failed".to_string()))?
    }

    async fn verify_password(&self, password: String, hash: String) -> ApiResult<bool> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|_| ApiError::InternalServerError("Password verification task failed".to_string()))?
    }

    pub fn new(pool: SqlitePool, hasher: Arc<dyn PasswordHasher>, tokens: Arc<dyn TokenService>) -> Self {
        Self {
            pool,
            repo: UserRepository::new(),
            hasher,
            tokens,
        }
    }

    /// Registers a new account.
    ///
    /// The role defaults to technician. Requesting `admin` requires an admin
    /// caller, unless the store is still empty and this is the first account.
    pub async fn register(&self, caller: Option<&Identity>, request: RegisterRequest) -> ApiResult<User> {
        request.validate()?;
        validate_password_strength(&request.password)?;

        let role = match request.role.as_deref() {
            None => UserRole::default(),
            Some(raw) => UserRole::from_str(raw)
                .ok_or_else(|| ApiError::ValidationError(format!("Invalid role: {}", raw)))?,
        };

        if role.is_admin() {
            if let Some(identity) = caller {
                authorize(identity, Resource::User, Action::Create, None).into_result()?;
            } else if self.count().await? > 0 {
                return Err(ApiError::forbidden("Only administrators may create admin accounts"));
            }
        }

        if self.repo.find_by_username(&self.pool, &request.username).await?.is_some() {
            return Err(ApiError::username_taken(&request.username));
        }
        if self.repo.find_by_email(&self.pool, &request.email).await?.is_some() {
            return Err(ApiError::email_taken(&request.email));
        }

        let password_hash = self.hash_password(request.password.clone()).await?;
        let user = self
            .repo
            .create(
                &self.pool,
                NewUser {
                    username: request.username,
                    email: request.email,
                    password_hash,
                    role,
                },
            )
            .await?;

        log::info!("Registered user {} with role {}", user.username, user.role);
        Ok(user)
    }

    pub async fn login(&self, request: LoginRequest) -> ApiResult<LoginResponse> {
        request.validate()?;

        let user = self
            .repo
            .find_by_username(&self.pool, &request.username)
            .await?
            .ok_or_else(ApiError::invalid_credentials)?;

        if !self.verify_password(request.password.clone(), user.password_hash.clone()).await? {
            log::warn!("Failed login attempt for user {}", request.username);
            return Err(ApiError::invalid_credentials());
        }

        let token = self.tokens.issue(&user.id)?;
        log::info!("User {} logged in", user.username);

        Ok(LoginResponse {
            token,
            expires_in: self.tokens.expires_in(),
            user: UserInfo::from(user),
        })
    }

    /// Resolves a bearer token to the identity of a stored user.
    pub async fn identify(&self, token: &str) -> ApiResult<Identity> {
        let user_id = self.tokens.identity(token)?;
        match self.get(&user_id).await {
            Ok(user) => Ok(Identity::from(&user)),
            Err(ApiError::NotFound(_)) => Err(ApiError::Unauthorized("User no longer exists".to_string())),
            Err(err) => Err(err),
        }
    }

    pub async fn get(&self, id: &str) -> ApiResult<User> {
        self.repo
            .get_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| ApiError::user_not_found(id))
    }

    pub async fn list(&self, caller: &Identity) -> ApiResult<Vec<UserInfo>> {
        if !caller.is_admin() {
            return Err(ApiError::forbidden("Only administrators may list users"));
        }
        let users = self.repo.list(&self.pool).await?;
        Ok(users.into_iter().map(UserInfo::from).collect())
    }

    pub async fn set_role(&self, caller: &Identity, id: &str, role: &str) -> ApiResult<UserInfo> {
        authorize(caller, Resource::User, Action::Edit, Some(id)).into_result()?;

        let role = UserRole::from_str(role)
            .ok_or_else(|| ApiError::ValidationError(format!("Invalid role: {}", role)))?;

        let mut user = self.get(id).await?;
        user.role = role.as_str().to_string();
        user.updated_at = Utc::now();

        if !self.repo.update(&self.pool, user.clone()).await? {
            return Err(ApiError::user_not_found(id));
        }

        log::info!("User {} set role of {} to {}", caller.user_id, user.username, role);
        Ok(UserInfo::from(user))
    }

    pub async fn count(&self) -> ApiResult<i64> {
        self.repo.count(&self.pool).await
    }
}
