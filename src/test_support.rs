use crate::config::VitalsConfig;
use crate::db;
use crate::state::AppState;
use crate::vitals::Sample;
use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Single-connection in-memory database; every extra connection would see an empty schema.
pub async fn test_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    db::ensure_schema(&pool).await?;
    Ok(pool)
}

pub async fn test_state() -> Result<AppState> {
    Ok(AppState {
        config: VitalsConfig {
            database_url: "sqlite::memory:".to_string(),
            ..VitalsConfig::default()
        },
        db: test_pool().await?,
    })
}

pub fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0)
        .single()
        .expect("anchor")
}

pub fn sample_at(device_id: &str, minutes_ago: i64, metrics: (u8, u8, u8)) -> Sample {
    let (thermal_value, battery_level, memory_usage) = metrics;
    Sample {
        device_id: device_id.to_string(),
        timestamp: anchor() - Duration::minutes(minutes_ago),
        thermal_value,
        battery_level,
        memory_usage,
    }
}
