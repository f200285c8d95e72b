//! In-process stores
//!
//! Same contracts as the PostgreSQL repositories, kept in memory. The router
//! tests build the whole application on top of these.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{
    CredentialStore, FavoritesRegistry, OccupancyLedger, StoreError, StoreResult, hash_blocking,
    normalize_spot_ids, verify_blocking,
};
use crate::models::{NewReading, Profile, SensorReading, Spot, User};

/// In-memory credential store
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users registered under `username` (0 or 1)
    pub async fn count(&self, username: &str) -> usize {
        usize::from(self.users.read().await.contains_key(username))
    }

    /// Whether a user with this id is registered
    pub async fn contains_id(&self, user_id: i32) -> bool {
        self.users.read().await.values().any(|u| u.id == user_id)
    }
}

#[async_trait]
impl CredentialStore for MemoryUserStore {
    async fn register(&self, username: &str, password: &str) -> StoreResult<User> {
        if self.users.read().await.contains_key(username) {
            return Err(StoreError::DuplicateUser(username.to_string()));
        }

        let password_hash = hash_blocking(password).await?;

        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Err(StoreError::DuplicateUser(username.to_string()));
        }

        let id = users.values().map(|u| u.id).max().unwrap_or(0) + 1;
        let user = User {
            id,
            username: username.to_string(),
            password_hash,
            car: None,
        };
        users.insert(username.to_string(), user.clone());

        Ok(user)
    }

    async fn verify(&self, username: &str, password: &str) -> StoreResult<Option<User>> {
        let user = self.users.read().await.get(username).cloned();
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());

        let matches = verify_blocking(password, stored_hash).await?;
        Ok(user.filter(|_| matches))
    }

    async fn get_profile(&self, username: &str) -> StoreResult<Option<Profile>> {
        Ok(self
            .users
            .read()
            .await
            .get(username)
            .cloned()
            .map(Profile::from))
    }

    async fn update_car(&self, user_id: i32, model: &str) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if let Some(user) = users.values_mut().find(|u| u.id == user_id) {
            user.car = Some(model.to_string());
        }
        Ok(())
    }
}

#[derive(Default)]
struct LedgerState {
    readings: Vec<SensorReading>,
    spots: HashMap<i32, Option<bool>>,
}

/// In-memory occupancy ledger
#[derive(Default)]
pub struct MemoryOccupancyLedger {
    state: RwLock<LedgerState>,
}

impl MemoryOccupancyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored readings
    pub async fn reading_count(&self) -> usize {
        self.state.read().await.readings.len()
    }
}

#[async_trait]
impl OccupancyLedger for MemoryOccupancyLedger {
    async fn record_reading(&self, reading: NewReading) -> StoreResult<SensorReading> {
        let mut state = self.state.write().await;

        let stored = SensorReading {
            id: state.readings.len() as i64 + 1,
            sensor_id: reading.sensor_id,
            distance: reading.distance,
            is_occupied: reading.is_occupied,
            timestamp: Utc::now(),
        };
        state.readings.push(stored.clone());

        Ok(stored)
    }

    async fn latest_reading(&self, sensor_id: i32) -> StoreResult<Option<SensorReading>> {
        let state = self.state.read().await;

        Ok(state
            .readings
            .iter()
            .filter(|r| r.sensor_id == sensor_id)
            .max_by_key(|r| (r.timestamp, r.id))
            .cloned())
    }

    async fn set_spot_occupancy(&self, spot_id: i32, occupied: bool) -> StoreResult<()> {
        self.state
            .write()
            .await
            .spots
            .insert(spot_id, Some(occupied));
        Ok(())
    }

    async fn spot(&self, spot_id: i32) -> StoreResult<Option<Spot>> {
        let state = self.state.read().await;

        Ok(state.spots.get(&spot_id).map(|occupancy| Spot {
            id: spot_id,
            occupancy: *occupancy,
        }))
    }
}

/// In-memory favorites registry
///
/// Writes are checked against the user store, the same way the PostgreSQL
/// registry locks the owner's row.
pub struct MemoryFavoritesRegistry {
    users: Arc<MemoryUserStore>,
    favorites: RwLock<HashMap<i32, BTreeSet<i32>>>,
}

impl MemoryFavoritesRegistry {
    pub fn new(users: Arc<MemoryUserStore>) -> Self {
        Self {
            users,
            favorites: RwLock::default(),
        }
    }
}

#[async_trait]
impl FavoritesRegistry for MemoryFavoritesRegistry {
    async fn get(&self, user_id: i32) -> StoreResult<Vec<i32>> {
        Ok(self
            .favorites
            .read()
            .await
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn replace(&self, user_id: i32, spot_ids: &[i32]) -> StoreResult<Vec<i32>> {
        if !self.users.contains_id(user_id).await {
            return Err(StoreError::UnknownUser(user_id));
        }

        let spot_ids = normalize_spot_ids(spot_ids);

        self.favorites
            .write()
            .await
            .insert(user_id, spot_ids.iter().copied().collect());

        Ok(spot_ids)
    }
}
