//! Upsert repository
//!
//! Records are keyed by their feature identity (see
//! [`HeartRecord::identity`]). On conflict only the label changes; feature
//! columns are fixed by whichever record first established the identity.

pub mod memory;
pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;

pub use memory::InMemoryHeartRepository;
pub use postgres::PostgresHeartRepository;

use crate::models::{FeatureIdentity, HeartRecord};
use crate::Result;

/// Capability: insert-or-update records as one atomic batch.
#[async_trait]
pub trait HeartRepository: Send + Sync {
    /// Apply all records or none. An empty slice is a no-op.
    async fn bulk_upsert(&self, records: &[HeartRecord]) -> Result<()>;
}

/// Validate a batch and collapse repeated identities.
///
/// The result is what applying the records one at a time would leave behind:
/// first occurrence's features, last occurrence's label, first-seen order.
/// Any invalid record rejects the whole batch.
pub(crate) fn prepare_batch(records: &[HeartRecord]) -> Result<Vec<HeartRecord>> {
    let mut batch: Vec<HeartRecord> = Vec::with_capacity(records.len());
    let mut seen: HashMap<FeatureIdentity, usize> = HashMap::with_capacity(records.len());

    for record in records {
        record.validate()?;
        let identity = record.identity();
        match seen.get(&identity).copied() {
            Some(idx) => batch[idx].heart_disease = record.heart_disease,
            None => {
                seen.insert(identity, batch.len());
                batch.push(record.clone());
            }
        }
    }

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::scenario_record;
    use crate::Error;

    #[test]
    fn test_prepare_batch_keeps_first_features_last_label() {
        let mut first = scenario_record();
        first.normalize_sentinels();
        first.heart_disease = Some(0);

        let mut second = first.clone();
        second.resting_bp = Some(-1);
        second.heart_disease = Some(1);

        let mut other = first.clone();
        other.age = 70;

        let batch = prepare_batch(&[first.clone(), other.clone(), second]).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].resting_bp, None);
        assert_eq!(batch[0].heart_disease, Some(1));
        assert_eq!(batch[1], other);
    }

    #[test]
    fn test_prepare_batch_rejects_whole_batch() {
        let good = scenario_record();
        let mut bad = scenario_record();
        bad.fasting_bs = 7;

        assert!(matches!(prepare_batch(&[good, bad]), Err(Error::Constraint(_))));
    }
}
