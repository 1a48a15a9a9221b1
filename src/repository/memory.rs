//! In-memory upsert repository.
//!
//! Same identity and atomicity rules as the Postgres adapter; data is lost
//! when the struct is dropped.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{prepare_batch, HeartRepository};
use crate::models::{FeatureIdentity, HeartRecord, StoredRecord};
use crate::Result;

#[derive(Default)]
struct Rows {
    rows: Vec<StoredRecord>,
    by_identity: HashMap<FeatureIdentity, usize>,
}

#[derive(Default)]
pub struct InMemoryHeartRepository {
    state: RwLock<Rows>,
}

impl InMemoryHeartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.rows.len()
    }

    /// Snapshot of all rows in insertion order.
    pub async fn rows(&self) -> Vec<StoredRecord> {
        self.state.read().await.rows.clone()
    }

    pub async fn find_by_identity(&self, record: &HeartRecord) -> Option<StoredRecord> {
        let state = self.state.read().await;
        state
            .by_identity
            .get(&record.identity())
            .map(|&idx| state.rows[idx].clone())
    }
}

#[async_trait]
impl HeartRepository for InMemoryHeartRepository {
    async fn bulk_upsert(&self, records: &[HeartRecord]) -> Result<()> {
        // Everything that can fail happens before the lock is taken
        let batch = prepare_batch(records)?;
        if batch.is_empty() {
            return Ok(());
        }

        let mut guard = self.state.write().await;
        let state = &mut *guard;
        for record in batch {
            let identity = record.identity();
            match state.by_identity.get(&identity).copied() {
                Some(idx) => state.rows[idx].record.heart_disease = record.heart_disease,
                None => {
                    let idx = state.rows.len();
                    state.rows.push(StoredRecord { id: idx as i64 + 1, record });
                    state.by_identity.insert(identity, idx);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::scenario_record;
    use crate::models::NULL_IDENTITY_SENTINEL;
    use crate::Error;
    use std::sync::Arc;

    fn labeled(label: i32) -> HeartRecord {
        let mut r = scenario_record();
        r.normalize_sentinels();
        r.heart_disease = Some(label);
        r
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let repo = InMemoryHeartRepository::new();
        repo.bulk_upsert(&[labeled(1)]).await.unwrap();

        repo.bulk_upsert(&[]).await.unwrap();

        assert_eq!(repo.count().await, 1);
    }

    #[tokio::test]
    async fn test_second_upsert_updates_label_only() {
        let repo = InMemoryHeartRepository::new();
        repo.bulk_upsert(&[labeled(0)]).await.unwrap();
        repo.bulk_upsert(&[labeled(1)]).await.unwrap();

        let rows = repo.rows().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].record.heart_disease, Some(1));
        assert_eq!(rows[0].record.age, 54);
        assert_eq!(rows[0].record.resting_bp, None);
    }

    #[tokio::test]
    async fn test_identical_record_twice_leaves_one_unchanged_row() {
        let repo = InMemoryHeartRepository::new();
        repo.bulk_upsert(&[labeled(1)]).await.unwrap();
        let before = repo.rows().await;

        repo.bulk_upsert(&[labeled(1)]).await.unwrap();

        assert_eq!(repo.rows().await, before);
    }

    #[tokio::test]
    async fn test_null_and_negative_sentinel_share_identity() {
        let repo = InMemoryHeartRepository::new();
        let null_bp = labeled(0);
        let mut sentinel_bp = labeled(1);
        sentinel_bp.resting_bp = Some(NULL_IDENTITY_SENTINEL);

        repo.bulk_upsert(&[null_bp]).await.unwrap();
        repo.bulk_upsert(&[sentinel_bp]).await.unwrap();

        let rows = repo.rows().await;
        assert_eq!(rows.len(), 1);
        // features stay as first stored
        assert_eq!(rows[0].record.resting_bp, None);
        assert_eq!(rows[0].record.heart_disease, Some(1));
    }

    #[tokio::test]
    async fn test_invalid_record_applies_nothing() {
        let repo = InMemoryHeartRepository::new();
        let mut other = labeled(0);
        other.age = 61;
        let mut bad = labeled(0);
        bad.sex = String::new();

        let result = repo.bulk_upsert(&[other, bad]).await;

        assert!(matches!(result, Err(Error::Constraint(_))));
        assert_eq!(repo.count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_overlapping_upserts_do_not_duplicate() {
        let repo = Arc::new(InMemoryHeartRepository::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.bulk_upsert(&[labeled(i % 2)]).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(repo.count().await, 1);
        let stored = repo.find_by_identity(&labeled(0)).await.unwrap();
        assert!(matches!(stored.record.heart_disease, Some(0) | Some(1)));
    }
}
