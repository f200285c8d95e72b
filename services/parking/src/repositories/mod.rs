//! Repositories for database operations
//!
//! Every store sits behind a trait so the HTTP layer can run against
//! PostgreSQL in production and against the in-memory stores in tests.

use async_trait::async_trait;
use common::error::DatabaseError;
use std::collections::BTreeSet;
use thiserror::Error;
use tokio::task;
use tracing::warn;

use crate::{
    models::{NewReading, Profile, SensorReading, Spot, User},
    password,
};

pub mod favorites;
pub mod memory;
pub mod occupancy;
pub mod user;

pub use favorites::FavoritesRepository;
pub use occupancy::OccupancyRepository;
pub use user::UserRepository;

/// Errors raised by the stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// The username is already registered
    #[error("Username {0} is already taken")]
    DuplicateUser(String),

    /// The user referenced by a token no longer exists
    #[error("User {0} does not exist")]
    UnknownUser(i32),

    /// Password hashing failed
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// Backing store failure
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<argon2::password_hash::Error> for StoreError {
    fn from(e: argon2::password_hash::Error) -> Self {
        StoreError::PasswordHash(e.to_string())
    }
}

/// Type alias for store results
pub type StoreResult<T> = Result<T, StoreError>;

/// Persists credentials and profile data
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create a user; fails with `DuplicateUser` when the name is taken
    async fn register(&self, username: &str, password: &str) -> StoreResult<User>;

    /// Return the user when the password matches, `None` otherwise
    async fn verify(&self, username: &str, password: &str) -> StoreResult<Option<User>>;

    async fn get_profile(&self, username: &str) -> StoreResult<Option<Profile>>;

    /// Overwrite the user's car model
    async fn update_car(&self, user_id: i32, model: &str) -> StoreResult<()>;
}

/// Append-only sensor readings plus the manually-set spot state
///
/// The two are independent writers: `set_spot_occupancy` never looks at the
/// readings and `record_reading` never touches the spot table.
#[async_trait]
pub trait OccupancyLedger: Send + Sync {
    /// Append one reading in a single atomic statement
    async fn record_reading(&self, reading: NewReading) -> StoreResult<SensorReading>;

    /// Most recent reading for a sensor by timestamp, ties broken by id
    async fn latest_reading(&self, sensor_id: i32) -> StoreResult<Option<SensorReading>>;

    /// Create or overwrite the spot's occupancy
    async fn set_spot_occupancy(&self, spot_id: i32, occupied: bool) -> StoreResult<()>;

    async fn spot(&self, spot_id: i32) -> StoreResult<Option<Spot>>;
}

/// Per-user favorite spot sets
#[async_trait]
pub trait FavoritesRegistry: Send + Sync {
    /// Favorite spots in ascending order, empty when none are recorded
    async fn get(&self, user_id: i32) -> StoreResult<Vec<i32>>;

    /// Atomically replace the whole set and return what was stored
    async fn replace(&self, user_id: i32, spot_ids: &[i32]) -> StoreResult<Vec<i32>>;
}

/// Hash a password on the blocking pool
pub(crate) async fn hash_blocking(password: &str) -> StoreResult<String> {
    let password = password.to_string();

    let hash = task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| StoreError::PasswordHash(e.to_string()))??;

    Ok(hash)
}

/// Check a password against a stored hash on the blocking pool
///
/// With no stored hash a dummy verification still runs, so unknown users
/// cost the same as wrong passwords. An unreadable hash never matches.
pub(crate) async fn verify_blocking(password: &str, hash: Option<String>) -> StoreResult<bool> {
    let password = password.to_string();

    let outcome = task::spawn_blocking(move || match hash {
        Some(hash) => password::verify_password(&password, &hash),
        None => {
            password::verify_dummy(&password);
            Ok(false)
        }
    })
    .await
    .map_err(|e| StoreError::PasswordHash(e.to_string()))?;

    match outcome {
        Ok(matches) => Ok(matches),
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            Ok(false)
        }
    }
}

/// Sort and deduplicate spot ids before they are stored
pub(crate) fn normalize_spot_ids(spot_ids: &[i32]) -> Vec<i32> {
    spot_ids
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[test]
    fn test_normalize_spot_ids() {
        assert_eq!(normalize_spot_ids(&[3, 1, 2, 3, 1]), vec![1, 2, 3]);
        assert!(normalize_spot_ids(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_blocking_hash_round_trip() {
        let hash = hash_blocking("correct horse").await.unwrap();

        assert!(verify_blocking("correct horse", Some(hash.clone())).await.unwrap());
        assert!(!verify_blocking("wrong horse", Some(hash)).await.unwrap());
        assert!(!verify_blocking("correct horse", None).await.unwrap());
        assert!(!verify_blocking("x", Some("not-a-phc-string".into())).await.unwrap());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_hashing_leaves_the_runtime_free() {
        let hashing = hash_blocking("correct horse");
        let timer = tokio::time::sleep(Duration::from_millis(1));

        // argon2 takes far longer than 1ms; run inline it would finish first
        let timer_first = tokio::select! {
            biased;
            _ = hashing => false,
            _ = timer => true,
        };
        assert!(timer_first);
    }
}
