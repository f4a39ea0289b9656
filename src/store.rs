//! Append-only persistence for accepted samples.
//!
//! Timestamps are written as fixed-width UTC text so that ordering on the
//! column matches chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::vitals::{MetricValues, Sample};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
pub struct StoredSample {
    pub id: i64,
    pub device_id: String,
    pub timestamp: String,
    pub thermal_value: u8,
    pub battery_level: u8,
    pub memory_usage: u8,
}

#[derive(sqlx::FromRow)]
struct SampleRow {
    id: i64,
    device_id: String,
    timestamp: DateTime<Utc>,
    thermal_value: u8,
    battery_level: u8,
    memory_usage: u8,
}

impl From<SampleRow> for StoredSample {
    fn from(row: SampleRow) -> Self {
        Self {
            id: row.id,
            device_id: row.device_id,
            timestamp: storage_timestamp(row.timestamp),
            thermal_value: row.thermal_value,
            battery_level: row.battery_level,
            memory_usage: row.memory_usage,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReadingRow {
    thermal_value: u8,
    battery_level: u8,
    memory_usage: u8,
}

impl From<ReadingRow> for MetricValues {
    fn from(row: ReadingRow) -> Self {
        Self {
            thermal: row.thermal_value,
            battery: row.battery_level,
            memory: row.memory_usage,
        }
    }
}

pub(crate) fn storage_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Appends a validated sample and returns its row id.
pub async fn insert_sample(pool: &SqlitePool, sample: &Sample) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO vitals (device_id, timestamp, thermal_value, battery_level, memory_usage)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&sample.device_id)
    .bind(storage_timestamp(sample.timestamp))
    .bind(sample.thermal_value)
    .bind(sample.battery_level)
    .bind(sample.memory_usage)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn count_samples(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM vitals")
        .fetch_one(pool)
        .await
}

/// One page of history, newest first. Samples sharing a timestamp are ordered
/// by insertion, latest first.
pub async fn list_samples(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<StoredSample>, sqlx::Error> {
    let rows: Vec<SampleRow> = sqlx::query_as(
        r#"
        SELECT id, device_id, timestamp, thermal_value, battery_level, memory_usage
        FROM vitals
        ORDER BY timestamp DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(StoredSample::from).collect())
}

/// Metric values of the `limit` most recent samples, newest first.
pub async fn recent_readings(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<MetricValues>, sqlx::Error> {
    let rows: Vec<ReadingRow> = sqlx::query_as(
        r#"
        SELECT thermal_value, battery_level, memory_usage
        FROM vitals
        ORDER BY timestamp DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(MetricValues::from).collect())
}
