//! Parking service models

pub mod favorites;
pub mod occupancy;
pub mod user;

// Re-export for convenience
pub use favorites::{FavoritesRequest, FavoritesResponse};
pub use occupancy::{
    NewReading, OccupancyFlag, SensorDataQuery, SensorReading, Spot, SpotOccupancyRequest,
};
pub use user::{AuthResponse, Credentials, Profile, UpdateCarRequest, User};
