//! Favorites registry backed by PostgreSQL

use async_trait::async_trait;
use common::error::DatabaseError;
use sqlx::PgPool;
use tracing::info;

use super::{FavoritesRegistry, StoreError, StoreResult, normalize_spot_ids};

/// Favorite spots repository
#[derive(Clone)]
pub struct FavoritesRepository {
    pool: PgPool,
}

impl FavoritesRepository {
    /// Create a new favorites repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoritesRegistry for FavoritesRepository {
    async fn get(&self, user_id: i32) -> StoreResult<Vec<i32>> {
        let spot_ids = sqlx::query_scalar::<_, i32>(
            "SELECT spot_id FROM favorites WHERE user_id = $1 ORDER BY spot_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(spot_ids)
    }

    async fn replace(&self, user_id: i32, spot_ids: &[i32]) -> StoreResult<Vec<i32>> {
        let spot_ids = normalize_spot_ids(spot_ids);
        info!(
            "Replacing favorites for user {} with {} spots",
            user_id,
            spot_ids.len()
        );

        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;

        // Row lock on the owner serializes concurrent replaces for one user
        let owner = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DatabaseError::Query)?;

        if owner.is_none() {
            return Err(StoreError::UnknownUser(user_id));
        }

        sqlx::query("DELETE FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::Query)?;

        if !spot_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO favorites (user_id, spot_id)
                SELECT $1, UNNEST($2::INTEGER[])
                "#,
            )
            .bind(user_id)
            .bind(spot_ids.as_slice())
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::Query)?;
        }

        tx.commit().await.map_err(DatabaseError::Query)?;

        Ok(spot_ids)
    }
}
