//! Application state shared across handlers

use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    jwt::JwtService,
    rate_limiter::LoginThrottle,
    repositories::{
        CredentialStore, FavoritesRegistry, FavoritesRepository, OccupancyLedger,
        OccupancyRepository, UserRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn CredentialStore>,
    pub occupancy_repository: Arc<dyn OccupancyLedger>,
    pub favorites_repository: Arc<dyn FavoritesRegistry>,
    pub jwt_service: JwtService,
    pub login_throttle: LoginThrottle,
}

impl AppState {
    /// State backed by the PostgreSQL repositories
    pub fn postgres(pool: PgPool, jwt_service: JwtService, login_throttle: LoginThrottle) -> Self {
        Self {
            user_repository: Arc::new(UserRepository::new(pool.clone())),
            occupancy_repository: Arc::new(OccupancyRepository::new(pool.clone())),
            favorites_repository: Arc::new(FavoritesRepository::new(pool)),
            jwt_service,
            login_throttle,
        }
    }
}
