//! User repository backed by PostgreSQL

use async_trait::async_trait;
use common::error::DatabaseError;
use sqlx::{PgPool, Row};
use tracing::{info, warn};

use super::{CredentialStore, StoreError, StoreResult, hash_blocking, verify_blocking};
use crate::models::{Profile, User};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, car
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(user)
    }
}

#[async_trait]
impl CredentialStore for UserRepository {
    async fn register(&self, username: &str, password: &str) -> StoreResult<User> {
        info!("Registering new user: {}", username);

        if self.find_by_username(username).await?.is_some() {
            return Err(StoreError::DuplicateUser(username.to_string()));
        }

        let password_hash = hash_blocking(password).await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, car
            "#,
        )
        .bind(username)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // A concurrent signup can slip between the lookup and the insert
            let e = DatabaseError::Query(e);
            if e.is_unique_violation() {
                StoreError::DuplicateUser(username.to_string())
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(user)
    }

    async fn verify(&self, username: &str, password: &str) -> StoreResult<Option<User>> {
        let user = self.find_by_username(username).await?;
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());

        let matches = verify_blocking(password, stored_hash).await?;
        Ok(user.filter(|_| matches))
    }

    async fn get_profile(&self, username: &str) -> StoreResult<Option<Profile>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, car
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.map(|row| Profile {
            id: row.get("id"),
            username: row.get("username"),
            car: row.get("car"),
        }))
    }

    async fn update_car(&self, user_id: i32, model: &str) -> StoreResult<()> {
        info!("Updating car for user: {}", user_id);

        let result = sqlx::query("UPDATE users SET car = $1 WHERE id = $2")
            .bind(model)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        if result.rows_affected() == 0 {
            warn!("Car update matched no user with id {}", user_id);
        }

        Ok(())
    }
}
