//! Repository tests against PostgreSQL
//!
//! These tests need a reachable PostgreSQL instance pointed to by
//! `DATABASE_URL`. Run them with `cargo test -- --ignored`.

use chrono::Utc;
use common::database::{DatabaseConfig, init_pool, run_migrations};
use sqlx::PgPool;

use parking_service::{
    models::NewReading,
    repositories::{
        CredentialStore, FavoritesRegistry, FavoritesRepository, OccupancyLedger,
        OccupancyRepository, StoreError, UserRepository,
    },
};

async fn pool() -> Result<PgPool, Box<dyn std::error::Error>> {
    let config = DatabaseConfig::from_env()?;
    let pool = init_pool(&config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

fn unique_name(prefix: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default() % 1_000_000_000;
    format!("{}_{}_{}", prefix, std::process::id(), nanos)
}

async fn remove_user(pool: &PgPool, username: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM users WHERE username = $1")
        .bind(username)
        .execute(pool)
        .await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_register_and_verify() -> Result<(), Box<dyn std::error::Error>> {
    let pool = pool().await?;
    let users = UserRepository::new(pool.clone());
    let username = unique_name("pg_user");

    let user = users.register(&username, "correct-horse").await?;
    assert!(user.password_hash.starts_with("$argon2"));

    let duplicate = users.register(&username, "another-password").await;
    assert!(matches!(duplicate, Err(StoreError::DuplicateUser(_))));

    assert_eq!(
        users.verify(&username, "correct-horse").await?.map(|u| u.id),
        Some(user.id)
    );
    assert!(users.verify(&username, "wrong-password").await?.is_none());

    users.update_car(user.id, "Civic").await?;
    let profile = users.get_profile(&username).await?.unwrap();
    assert_eq!(profile.car.as_deref(), Some("Civic"));

    remove_user(&pool, &username).await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_latest_reading_and_spot_upsert() -> Result<(), Box<dyn std::error::Error>> {
    let pool = pool().await?;
    let ledger = OccupancyRepository::new(pool.clone());
    let sensor_id = 900_000 + (std::process::id() % 10_000) as i32;

    for (distance, is_occupied) in [(5.0, true), (80.0, false)] {
        ledger
            .record_reading(NewReading {
                sensor_id,
                distance,
                is_occupied,
            })
            .await?;
    }

    let latest = ledger.latest_reading(sensor_id).await?.unwrap();
    assert_eq!(latest.distance, 80.0);
    assert!(!latest.is_occupied);

    ledger.set_spot_occupancy(sensor_id, true).await?;
    ledger.set_spot_occupancy(sensor_id, false).await?;
    assert_eq!(ledger.spot(sensor_id).await?.unwrap().occupancy, Some(false));

    sqlx::query("DELETE FROM ultrasonic_data WHERE sensor_id = $1")
        .bind(sensor_id)
        .execute(&pool)
        .await?;
    sqlx::query("DELETE FROM spot WHERE id = $1")
        .bind(sensor_id)
        .execute(&pool)
        .await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_concurrent_favorites_replace() -> Result<(), Box<dyn std::error::Error>> {
    let pool = pool().await?;
    let users = UserRepository::new(pool.clone());
    let favorites = FavoritesRepository::new(pool.clone());
    let username = unique_name("pg_fav");
    let user = users.register(&username, "correct-horse").await?;

    let first = {
        let favorites = favorites.clone();
        tokio::spawn(async move { favorites.replace(user.id, &[1, 2, 3]).await })
    };
    let second = {
        let favorites = favorites.clone();
        tokio::spawn(async move { favorites.replace(user.id, &[7, 8]).await })
    };
    first.await??;
    second.await??;

    let stored = favorites.get(user.id).await?;
    assert!(stored == vec![1, 2, 3] || stored == vec![7, 8], "mixed favorites: {:?}", stored);

    let missing = favorites.replace(-1, &[1]).await;
    assert!(matches!(missing, Err(StoreError::UnknownUser(-1))));

    remove_user(&pool, &username).await?;
    Ok(())
}
