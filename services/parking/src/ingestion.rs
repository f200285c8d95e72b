//! Sensor report validation for the ingestion gateway
//!
//! Reports are checked completely before the ledger is touched; a report
//! that fails here never produces a write.

use serde::Deserialize;

use crate::models::{NewReading, OccupancyFlag};

/// Raw report as posted by a sensor device
#[derive(Debug, Deserialize)]
pub struct SensorReport {
    pub sensor_id: Option<i32>,
    pub distance: Option<f64>,
    pub is_occupied: Option<OccupancyFlag>,
}

impl SensorReport {
    /// Validate the report and turn it into a ledger entry
    pub fn validate(self) -> Result<NewReading, String> {
        let sensor_id = self
            .sensor_id
            .ok_or_else(|| "sensor_id is required".to_string())?;

        let distance = self
            .distance
            .ok_or_else(|| "distance is required".to_string())?;
        if !distance.is_finite() || distance < 0.0 {
            return Err("distance must be a non-negative number".to_string());
        }

        let is_occupied = self
            .is_occupied
            .ok_or_else(|| "is_occupied is required".to_string())?
            .as_bool()
            .ok_or_else(|| "is_occupied must be a boolean".to_string())?;

        Ok(NewReading {
            sensor_id,
            distance,
            is_occupied,
        })
    }
}
