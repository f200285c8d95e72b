//! Occupancy models: spots, sensor readings and the loose occupancy flag

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Current manually-set state of a parking spot
///
/// `occupancy` is `None` while nobody has reported the spot yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Spot {
    #[serde(rename = "spot_id")]
    pub id: i32,
    pub occupancy: Option<bool>,
}

/// One row of the append-only sensor ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SensorReading {
    pub id: i64,
    pub sensor_id: i32,
    pub distance: f64,
    pub is_occupied: bool,
    pub timestamp: DateTime<Utc>,
}

/// A validated reading ready to be appended
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewReading {
    pub sensor_id: i32,
    pub distance: f64,
    pub is_occupied: bool,
}

/// Occupancy value as sent by devices and forms
///
/// Accepts JSON booleans, the integers `0`/`1` and the strings
/// `true`/`false`/`1`/`0`/`yes`/`no` in any case.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OccupancyFlag {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl OccupancyFlag {
    /// Coerce to a boolean, `None` when the value is not boolean-like
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OccupancyFlag::Bool(b) => Some(*b),
            OccupancyFlag::Int(0) => Some(false),
            OccupancyFlag::Int(1) => Some(true),
            OccupancyFlag::Int(_) => None,
            OccupancyFlag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
        }
    }
}

/// Request for a direct spot occupancy overwrite
#[derive(Debug, Deserialize)]
pub struct SpotOccupancyRequest {
    pub spot_id: Option<i32>,
    pub spot_occupancy: Option<OccupancyFlag>,
}

/// Query parameters for the latest sensor reading
#[derive(Debug, Deserialize)]
pub struct SensorDataQuery {
    pub sensor_id: Option<i32>,
}
