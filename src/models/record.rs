//! Heart record model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{Error, Result};

/// Raw value that datasets use for "not measured" in RestingBP/Cholesterol.
pub const MISSING_MEASUREMENT: i32 = 0;

/// Value a missing RestingBP/Cholesterol compares as in the storage identity.
/// Must match the `COALESCE(.., -1)` expressions of the unique index.
pub const NULL_IDENTITY_SENTINEL: i32 = -1;

/// One clinical observation with an optional outcome label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartRecord {
    #[serde(rename = "Age")]
    pub age: i32,
    #[serde(rename = "Sex")]
    pub sex: String,
    #[serde(rename = "ChestPainType")]
    pub chest_pain_type: String,
    #[serde(rename = "RestingBP")]
    pub resting_bp: Option<i32>,
    #[serde(rename = "Cholesterol")]
    pub cholesterol: Option<i32>,
    #[serde(rename = "FastingBS")]
    pub fasting_bs: i32,
    #[serde(rename = "RestingECG")]
    pub resting_ecg: String,
    #[serde(rename = "MaxHR")]
    pub max_hr: i32,
    #[serde(rename = "ExerciseAngina")]
    pub exercise_angina: String,
    #[serde(rename = "Oldpeak")]
    pub oldpeak: f64,
    #[serde(rename = "ST_Slope")]
    pub st_slope: String,
    #[serde(rename = "HeartDisease", default)]
    pub heart_disease: Option<i32>,
}

/// Storage identity of a record: the 11 feature columns with missing
/// measurements collapsed onto [`NULL_IDENTITY_SENTINEL`]. The label is not part of it.
///
/// `Ord` is an arbitrary but total order, used to write rows in a fixed sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureIdentity {
    age: i32,
    sex: String,
    chest_pain_type: String,
    resting_bp: i32,
    cholesterol: i32,
    fasting_bs: i32,
    resting_ecg: String,
    max_hr: i32,
    exercise_angina: String,
    oldpeak_bits: u64,
    st_slope: String,
}

impl HeartRecord {
    /// Replace sentinel zeros in RestingBP/Cholesterol with null.
    pub fn normalize_sentinels(&mut self) {
        if self.resting_bp == Some(MISSING_MEASUREMENT) {
            self.resting_bp = None;
        }
        if self.cholesterol == Some(MISSING_MEASUREMENT) {
            self.cholesterol = None;
        }
    }

    pub fn identity(&self) -> FeatureIdentity {
        // -0.0 and 0.0 are the same value to the database
        let oldpeak = if self.oldpeak == 0.0 { 0.0 } else { self.oldpeak };

        FeatureIdentity {
            age: self.age,
            sex: self.sex.clone(),
            chest_pain_type: self.chest_pain_type.clone(),
            resting_bp: self.resting_bp.unwrap_or(NULL_IDENTITY_SENTINEL),
            cholesterol: self.cholesterol.unwrap_or(NULL_IDENTITY_SENTINEL),
            fasting_bs: self.fasting_bs,
            resting_ecg: self.resting_ecg.clone(),
            max_hr: self.max_hr,
            exercise_angina: self.exercise_angina.clone(),
            oldpeak_bits: oldpeak.to_bits(),
            st_slope: self.st_slope.clone(),
        }
    }

    /// Storage-level checks: the same rules the table constraints enforce.
    pub fn validate(&self) -> Result<()> {
        let categorical = [
            ("Sex", &self.sex),
            ("ChestPainType", &self.chest_pain_type),
            ("RestingECG", &self.resting_ecg),
            ("ExerciseAngina", &self.exercise_angina),
            ("ST_Slope", &self.st_slope),
        ];
        for (name, value) in categorical {
            if value.trim().is_empty() {
                return Err(Error::Constraint(format!("{} must not be empty", name)));
            }
        }

        if !matches!(self.fasting_bs, 0 | 1) {
            return Err(Error::Constraint(format!(
                "FastingBS must be 0 or 1, got {}",
                self.fasting_bs
            )));
        }

        if let Some(label) = self.heart_disease {
            if !matches!(label, 0 | 1) {
                return Err(Error::Constraint(format!(
                    "HeartDisease must be 0 or 1, got {}",
                    label
                )));
            }
        }

        if !self.oldpeak.is_finite() {
            return Err(Error::Constraint("Oldpeak must be a finite number".to_string()));
        }

        Ok(())
    }
}

/// A stored row: surrogate key plus the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    pub id: i64,
    pub record: HeartRecord,
}

/// Row shape of the `heart_raw` table.
#[derive(Debug, Clone, FromRow)]
pub struct HeartRow {
    pub id: i32,
    pub age: i32,
    pub sex: String,
    pub chest_pain: String,
    pub resting_bp: Option<i32>,
    pub cholesterol: Option<i32>,
    pub fasting_bs: i32,
    pub resting_ecg: String,
    pub max_hr: i32,
    pub exercise_angina: String,
    pub oldpeak: f64,
    pub st_slope: String,
    pub heart_disease: Option<i32>,
}

impl From<HeartRow> for StoredRecord {
    fn from(row: HeartRow) -> Self {
        Self {
            id: i64::from(row.id),
            record: HeartRecord {
                age: row.age,
                sex: row.sex,
                chest_pain_type: row.chest_pain,
                resting_bp: row.resting_bp,
                cholesterol: row.cholesterol,
                fasting_bs: row.fasting_bs,
                resting_ecg: row.resting_ecg,
                max_hr: row.max_hr,
                exercise_angina: row.exercise_angina,
                oldpeak: row.oldpeak,
                st_slope: row.st_slope,
                heart_disease: row.heart_disease,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::scenario_record;

    #[test]
    fn test_sentinel_zeros_become_null() {
        let mut record = scenario_record();
        assert_eq!(record.resting_bp, Some(0));
        assert_eq!(record.cholesterol, Some(0));

        record.normalize_sentinels();

        assert_eq!(record.resting_bp, None);
        assert_eq!(record.cholesterol, None);
        assert_eq!(record.age, 54);
        assert_eq!(record.max_hr, 130);
    }

    #[test]
    fn test_real_measurements_survive_normalization() {
        let mut record = scenario_record();
        record.resting_bp = Some(140);
        record.cholesterol = Some(289);

        record.normalize_sentinels();

        assert_eq!(record.resting_bp, Some(140));
        assert_eq!(record.cholesterol, Some(289));
    }

    #[test]
    fn test_identity_collapses_null_and_negative_sentinel() {
        let mut a = scenario_record();
        a.resting_bp = None;
        let mut b = a.clone();
        b.resting_bp = Some(NULL_IDENTITY_SENTINEL);

        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_identity_ignores_label() {
        let mut a = scenario_record();
        a.heart_disease = Some(0);
        let mut b = a.clone();
        b.heart_disease = Some(1);

        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_identity_distinguishes_features() {
        let a = scenario_record();
        let mut b = a.clone();
        b.max_hr += 1;

        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn test_identity_treats_signed_zero_oldpeak_as_equal() {
        let mut a = scenario_record();
        a.oldpeak = 0.0;
        let mut b = a.clone();
        b.oldpeak = -0.0;

        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_validate_rejects_bad_label() {
        let mut record = scenario_record();
        record.heart_disease = Some(2);

        assert!(matches!(record.validate(), Err(Error::Constraint(_))));
    }

    #[test]
    fn test_validate_rejects_empty_category() {
        let mut record = scenario_record();
        record.st_slope = "  ".to_string();

        assert!(matches!(record.validate(), Err(Error::Constraint(_))));
    }

    #[test]
    fn test_deserializes_dataset_field_names() {
        let json = r#"{
            "Age": 54, "Sex": "M", "ChestPainType": "ASY", "RestingBP": null,
            "Cholesterol": 230, "FastingBS": 1, "RestingECG": "Normal", "MaxHR": 130,
            "ExerciseAngina": "Y", "Oldpeak": 1.5, "ST_Slope": "Flat"
        }"#;
        let record: HeartRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.resting_bp, None);
        assert_eq!(record.cholesterol, Some(230));
        assert_eq!(record.heart_disease, None);
    }
}
