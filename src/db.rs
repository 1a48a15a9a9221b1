//! Database module - PostgreSQL connection pool and schema

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::Config;
use crate::Result;

/// Create the process-wide connection pool.
///
/// Opened once at startup; the owner closes it with [`PgPool::close`] on shutdown.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .min_connections(config.pool_min_connections)
        .max_connections(config.pool_max_connections)
        .acquire_timeout(config.pool_acquire_timeout)
        .connect(&config.database_url)
        .await?;

    tracing::info!(
        min = config.pool_min_connections,
        max = config.pool_max_connections,
        "Database pool opened"
    );
    Ok(pool)
}

/// Apply the schema. Idempotent.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Schema statements, applied in order.
///
/// Identity is the 11 feature columns; nullable measurements compare through
/// `COALESCE(.., -1)` so that two missing values collide.
const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS heart_raw (
        id              SERIAL PRIMARY KEY,
        age             INT              NOT NULL,
        sex             TEXT             NOT NULL,
        chest_pain      TEXT             NOT NULL,
        resting_bp      INT,
        cholesterol     INT,
        fasting_bs      INT              NOT NULL CHECK (fasting_bs IN (0, 1)),
        resting_ecg     TEXT             NOT NULL,
        max_hr          INT              NOT NULL,
        exercise_angina TEXT             NOT NULL,
        oldpeak         DOUBLE PRECISION NOT NULL,
        st_slope        TEXT             NOT NULL,
        heart_disease   INT              CHECK (heart_disease IN (0, 1))
    )
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS heart_raw_uniq ON heart_raw (
        age, sex, chest_pain,
        (COALESCE(resting_bp, -1)),
        (COALESCE(cholesterol, -1)),
        fasting_bs, resting_ecg, max_hr,
        exercise_angina, oldpeak, st_slope
    )
    "#,
];
