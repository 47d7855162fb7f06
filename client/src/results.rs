use std::time::{SystemTime, UNIX_EPOCH};

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::warn;

use crate::engine::DerivedStats;

/// Upper bound accepted by the result store; anything above is a reporting
/// glitch and gets clamped rather than rejected.
const MAX_WPM: u32 = 400;

/// One finished session, ready for persistence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestRecord {
    pub username: String,
    pub wpm: u32,
    pub accuracy: u8,
    /// Test mode label, e.g. "30s" or "race".
    pub mode: String,
    pub duration_secs: u32,
}

impl TestRecord {
    pub fn from_stats(
        username: impl Into<String>,
        stats: DerivedStats,
        mode: impl Into<String>,
        duration_secs: u32,
    ) -> Self {
        Self {
            username: username.into(),
            wpm: stats.wpm.min(MAX_WPM),
            accuracy: stats.accuracy.min(100),
            mode: mode.into(),
            duration_secs,
        }
    }
}

/// A leaderboard entry as served back to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub username: String,
    pub wpm: u32,
    pub accuracy: u8,
    /// Unix timestamp (seconds) of the run.
    pub recorded_at: u64,
}

/// Connect to Postgres and make sure the results table exists.
pub async fn connect(url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await?;
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS results (
            id SERIAL PRIMARY KEY,
            username TEXT NOT NULL,
            wpm INTEGER NOT NULL,
            accuracy INTEGER NOT NULL,
            mode TEXT NOT NULL,
            duration_secs INTEGER NOT NULL,
            recorded_at BIGINT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;
    Ok(pool)
}

/// Persist one finished session. Failures are reported as `false`, never
/// raised past the save boundary; the score stays visible locally either
/// way.
pub async fn save_result(pool: &PgPool, record: &TestRecord) -> bool {
    let result = sqlx::query(
        "INSERT INTO results (username, wpm, accuracy, mode, duration_secs, recorded_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(&record.username)
    .bind(record.wpm as i32)
    .bind(record.accuracy as i32)
    .bind(&record.mode)
    .bind(record.duration_secs as i32)
    .bind(unix_seconds() as i64)
    .execute(pool)
    .await;

    match result {
        Ok(_) => true,
        Err(e) => {
            warn!("failed to save result: {e}");
            false
        }
    }
}

/// Top scores for a mode, best wpm first with accuracy as tiebreaker.
/// Degrades to an empty list on query failure.
pub async fn leaderboard(pool: &PgPool, mode: &str, limit: i64) -> Vec<LeaderboardRow> {
    let rows = sqlx::query_as::<_, (String, i32, i32, i64)>(
        "SELECT username, wpm, accuracy, recorded_at FROM results \
         WHERE mode = $1 ORDER BY wpm DESC, accuracy DESC LIMIT $2",
    )
    .bind(mode)
    .bind(limit)
    .fetch_all(pool)
    .await;

    match rows {
        Ok(rows) => rows
            .into_iter()
            .map(|(username, wpm, accuracy, recorded_at)| LeaderboardRow {
                username,
                wpm: wpm.max(0) as u32,
                accuracy: accuracy.clamp(0, 100) as u8,
                recorded_at: recorded_at.max(0) as u64,
            })
            .collect(),
        Err(e) => {
            warn!("leaderboard query failed: {e}");
            Vec::new()
        }
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
