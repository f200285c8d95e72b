//! Favorite spot payloads

use serde::{Deserialize, Serialize};

/// Request replacing the caller's favorite spots
#[derive(Debug, Deserialize)]
pub struct FavoritesRequest {
    pub favorites: Vec<i32>,
}

/// Response after the favorites were replaced
#[derive(Debug, Serialize, Deserialize)]
pub struct FavoritesResponse {
    pub message: String,
    pub favorites: Vec<i32>,
}
