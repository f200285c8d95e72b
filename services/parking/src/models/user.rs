//! User model and related payloads

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// User entity
#[derive(Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub car: Option<String>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("car", &self.car)
            .finish()
    }
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    #[serde(rename = "user_id")]
    pub id: i32,
    pub username: String,
    pub car: Option<String>,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            car: user.car,
        }
    }
}

/// Signup and login payload
#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Response for signup and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user_id: i32,
    pub username: String,
    pub car: Option<String>,
}

/// Request for the car profile update
#[derive(Deserialize)]
pub struct UpdateCarRequest {
    pub model: String,
}
