//! Feature contract shared by training and prediction

use crate::models::HeartRecord;

/// Outcome column of a labeled dataset.
pub const LABEL_COLUMN: &str = "HeartDisease";

/// Columns imputed with the training median.
pub const NUMERIC_FEATURES: [&str; 5] = ["Age", "RestingBP", "Cholesterol", "MaxHR", "Oldpeak"];

/// Columns imputed with the most frequent value, then one-hot encoded.
pub const CATEGORICAL_FEATURES: [&str; 6] = [
    "Sex",
    "ChestPainType",
    "FastingBS",
    "RestingECG",
    "ExerciseAngina",
    "ST_Slope",
];

/// All feature columns in dataset order.
pub const FEATURE_COLUMNS: [&str; 11] = [
    "Age",
    "Sex",
    "ChestPainType",
    "RestingBP",
    "Cholesterol",
    "FastingBS",
    "RestingECG",
    "MaxHR",
    "ExerciseAngina",
    "Oldpeak",
    "ST_Slope",
];

/// Pipeline input: one record split by feature role, `None` meaning missing.
///
/// `numeric` follows [`NUMERIC_FEATURES`], `categorical` follows [`CATEGORICAL_FEATURES`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub numeric: [Option<f64>; 5],
    pub categorical: [Option<String>; 6],
}

impl From<&HeartRecord> for FeatureRow {
    fn from(r: &HeartRecord) -> Self {
        Self {
            numeric: [
                Some(f64::from(r.age)),
                r.resting_bp.map(f64::from),
                r.cholesterol.map(f64::from),
                Some(f64::from(r.max_hr)),
                Some(r.oldpeak),
            ],
            categorical: [
                category(&r.sex),
                category(&r.chest_pain_type),
                Some(r.fasting_bs.to_string()),
                category(&r.resting_ecg),
                category(&r.exercise_angina),
                category(&r.st_slope),
            ],
        }
    }
}

fn category(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
