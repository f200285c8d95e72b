//! Occupancy ledger backed by PostgreSQL

use async_trait::async_trait;
use common::error::DatabaseError;
use sqlx::PgPool;
use tracing::info;

use super::{OccupancyLedger, StoreResult};
use crate::models::{NewReading, SensorReading, Spot};

/// Sensor readings and spot state repository
#[derive(Clone)]
pub struct OccupancyRepository {
    pool: PgPool,
}

impl OccupancyRepository {
    /// Create a new occupancy repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OccupancyLedger for OccupancyRepository {
    async fn record_reading(&self, reading: NewReading) -> StoreResult<SensorReading> {
        let stored = sqlx::query_as::<_, SensorReading>(
            r#"
            INSERT INTO ultrasonic_data (sensor_id, distance, is_occupied)
            VALUES ($1, $2, $3)
            RETURNING id, sensor_id, distance, is_occupied, timestamp
            "#,
        )
        .bind(reading.sensor_id)
        .bind(reading.distance)
        .bind(reading.is_occupied)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(stored)
    }

    async fn latest_reading(&self, sensor_id: i32) -> StoreResult<Option<SensorReading>> {
        let reading = sqlx::query_as::<_, SensorReading>(
            r#"
            SELECT id, sensor_id, distance, is_occupied, timestamp
            FROM ultrasonic_data
            WHERE sensor_id = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(sensor_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(reading)
    }

    async fn set_spot_occupancy(&self, spot_id: i32, occupied: bool) -> StoreResult<()> {
        info!("Setting spot {} occupancy to {}", spot_id, occupied);

        sqlx::query(
            r#"
            INSERT INTO spot (id, occupancy)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET
            occupancy = EXCLUDED.occupancy
            "#,
        )
        .bind(spot_id)
        .bind(occupied)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(())
    }

    async fn spot(&self, spot_id: i32) -> StoreResult<Option<Spot>> {
        let spot = sqlx::query_as::<_, Spot>("SELECT id, occupancy FROM spot WHERE id = $1")
            .bind(spot_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(spot)
    }
}
