//! PostgreSQL upsert repository

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{prepare_batch, HeartRepository};
use crate::models::{HeartRecord, HeartRow, StoredRecord};
use crate::Result;

/// Postgres caps bind parameters at 65535; 12 per row.
const UPSERT_CHUNK_ROWS: usize = 1000;

const INSERT_PREFIX: &str = "INSERT INTO heart_raw (age, sex, chest_pain, resting_bp, cholesterol, \
     fasting_bs, resting_ecg, max_hr, exercise_angina, oldpeak, st_slope, heart_disease) ";

/// Conflict target must match the `heart_raw_uniq` index expressions.
const ON_CONFLICT: &str = " ON CONFLICT (age, sex, chest_pain, \
     (COALESCE(resting_bp, -1)), (COALESCE(cholesterol, -1)), \
     fasting_bs, resting_ecg, max_hr, exercise_angina, oldpeak, st_slope) \
     DO UPDATE SET heart_disease = EXCLUDED.heart_disease";

/// Repository over the `heart_raw` table. The pool is owned by the caller.
#[derive(Debug, Clone)]
pub struct PostgresHeartRepository {
    pool: PgPool,
}

impl PostgresHeartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM heart_raw")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Look up the stored row for a record's feature identity.
    pub async fn find_by_identity(&self, record: &HeartRecord) -> Result<Option<StoredRecord>> {
        let row = sqlx::query_as::<_, HeartRow>(
            r#"
            SELECT * FROM heart_raw
            WHERE age = $1 AND sex = $2 AND chest_pain = $3
              AND COALESCE(resting_bp, -1) = COALESCE($4, -1)
              AND COALESCE(cholesterol, -1) = COALESCE($5, -1)
              AND fasting_bs = $6 AND resting_ecg = $7 AND max_hr = $8
              AND exercise_angina = $9 AND oldpeak = $10 AND st_slope = $11
            "#,
        )
        .bind(record.age)
        .bind(&record.sex)
        .bind(&record.chest_pain_type)
        .bind(record.resting_bp)
        .bind(record.cholesterol)
        .bind(record.fasting_bs)
        .bind(&record.resting_ecg)
        .bind(record.max_hr)
        .bind(&record.exercise_angina)
        .bind(record.oldpeak)
        .bind(&record.st_slope)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StoredRecord::from))
    }
}

/// Prepared batch sorted by identity. Overlapping batches then take row
/// locks in the same order and cannot deadlock each other.
fn lock_ordered_batch(records: &[HeartRecord]) -> Result<Vec<HeartRecord>> {
    let mut batch = prepare_batch(records)?;
    batch.sort_by_cached_key(HeartRecord::identity);
    Ok(batch)
}

#[async_trait]
impl HeartRepository for PostgresHeartRepository {
    async fn bulk_upsert(&self, records: &[HeartRecord]) -> Result<()> {
        let batch = lock_ordered_batch(records)?;
        if batch.is_empty() {
            return Ok(());
        }

        // One transaction for every chunk; dropping it on error rolls back
        let mut tx = self.pool.begin().await?;
        for chunk in batch.chunks(UPSERT_CHUNK_ROWS) {
            let mut query: QueryBuilder<Postgres> = QueryBuilder::new(INSERT_PREFIX);
            query.push_values(chunk, |mut row, r| {
                row.push_bind(r.age)
                    .push_bind(r.sex.clone())
                    .push_bind(r.chest_pain_type.clone())
                    .push_bind(r.resting_bp)
                    .push_bind(r.cholesterol)
                    .push_bind(r.fasting_bs)
                    .push_bind(r.resting_ecg.clone())
                    .push_bind(r.max_hr)
                    .push_bind(r.exercise_angina.clone())
                    .push_bind(r.oldpeak)
                    .push_bind(r.st_slope.clone())
                    .push_bind(r.heart_disease);
            });
            query.push(ON_CONFLICT);
            query.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        tracing::debug!(
            submitted = records.len(),
            distinct = batch.len(),
            "Upserted heart records"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::scenario_record;

    fn batch(n: i32) -> Vec<HeartRecord> {
        (0..n)
            .map(|i| {
                let mut r = scenario_record();
                r.normalize_sentinels();
                r.age = 30 + i % 40;
                r.max_hr = 100 + i;
                r.heart_disease = Some(i % 2);
                r
            })
            .collect()
    }

    #[test]
    fn test_reordered_batches_write_in_same_order() {
        let forward = batch(50);
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = lock_ordered_batch(&forward).unwrap();
        let b = lock_ordered_batch(&reversed).unwrap();

        let ids = |rows: &[HeartRecord]| rows.iter().map(HeartRecord::identity).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
        assert!(ids(&a).windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_ordering_keeps_dedupe_semantics() {
        let mut first = batch(1).remove(0);
        first.heart_disease = Some(0);
        let mut second = first.clone();
        second.heart_disease = Some(1);

        let ordered = lock_ordered_batch(&[first, second]).unwrap();

        assert_eq!(ordered.len(), 1);
        assert_eq!(ordered[0].heart_disease, Some(1));
    }
}
