//! Prediction request/response schemas

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::HeartRecord;

/// Body of `POST /predict`. Field names follow the dataset columns.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PredictRequest {
    #[serde(rename = "Age", deserialize_with = "lenient::number")]
    #[validate(range(min = 1, max = 120))]
    pub age: i32,

    #[serde(rename = "Sex")]
    #[validate(custom(function = "not_blank"))]
    pub sex: String,

    #[serde(rename = "ChestPainType")]
    #[validate(custom(function = "not_blank"))]
    pub chest_pain_type: String,

    #[serde(rename = "RestingBP", default, deserialize_with = "lenient::optional_number")]
    #[validate(range(min = 0))]
    pub resting_bp: Option<i32>,

    #[serde(rename = "Cholesterol", default, deserialize_with = "lenient::optional_number")]
    #[validate(range(min = 0))]
    pub cholesterol: Option<i32>,

    #[serde(rename = "FastingBS", deserialize_with = "lenient::number")]
    #[validate(range(min = 0, max = 1))]
    pub fasting_bs: i32,

    #[serde(rename = "RestingECG")]
    #[validate(custom(function = "not_blank"))]
    pub resting_ecg: String,

    #[serde(rename = "MaxHR", deserialize_with = "lenient::number")]
    #[validate(range(min = 1, max = 300))]
    pub max_hr: i32,

    #[serde(rename = "ExerciseAngina")]
    #[validate(custom(function = "not_blank"))]
    pub exercise_angina: String,

    #[serde(rename = "Oldpeak", deserialize_with = "lenient::number")]
    #[validate(range(min = -10.0, max = 10.0))]
    pub oldpeak: f64,

    #[serde(rename = "ST_Slope")]
    #[validate(custom(function = "not_blank"))]
    pub st_slope: String,
}

impl From<PredictRequest> for HeartRecord {
    fn from(req: PredictRequest) -> Self {
        Self {
            age: req.age,
            sex: trimmed(req.sex),
            chest_pain_type: trimmed(req.chest_pain_type),
            resting_bp: req.resting_bp,
            cholesterol: req.cholesterol,
            fasting_bs: req.fasting_bs,
            resting_ecg: trimmed(req.resting_ecg),
            max_hr: req.max_hr,
            exercise_angina: trimmed(req.exercise_angina),
            oldpeak: req.oldpeak,
            st_slope: trimmed(req.st_slope),
            heart_disease: None,
        }
    }
}

fn trimmed(value: String) -> String {
    value.trim().to_string()
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Form clients send numbers as JSON strings; accept both spellings.
mod lenient {
    use std::str::FromStr;

    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText<T> {
        Number(T),
        Text(String),
    }

    fn parse<T: FromStr, E: de::Error>(value: NumberOrText<T>) -> Result<T, E> {
        match value {
            NumberOrText::Number(n) => Ok(n),
            NumberOrText::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected a number, got {:?}", text))),
        }
    }

    pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + FromStr,
    {
        parse(NumberOrText::deserialize(deserializer)?)
    }

    /// `null` and `""` are both missing.
    pub fn optional_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + FromStr,
    {
        match Option::<NumberOrText<T>>::deserialize(deserializer)? {
            None => Ok(None),
            Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(None),
            Some(value) => parse(value).map(Some),
        }
    }
}

/// Scored outcome for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub probability: f64,
    pub has_disease: bool,
}

impl Prediction {
    /// Label stored alongside the record once it has been classified.
    pub fn label(&self) -> i32 {
        i32::from(self.has_disease)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> serde_json::Value {
        json!({
            "Age": 54, "Sex": "M", "ChestPainType": "ASY", "RestingBP": 140, "Cholesterol": 289,
            "FastingBS": 1, "RestingECG": "Normal", "MaxHR": 130, "ExerciseAngina": "Y",
            "Oldpeak": 1.5, "ST_Slope": "Flat"
        })
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let mut value = body();
        value["Age"] = json!("54");
        value["FastingBS"] = json!("1");
        value["Oldpeak"] = json!(" 1.5 ");
        value["RestingBP"] = json!("140");

        let req: PredictRequest = serde_json::from_value(value).unwrap();

        assert_eq!(req.age, 54);
        assert_eq!(req.fasting_bs, 1);
        assert_eq!(req.oldpeak, 1.5);
        assert_eq!(req.resting_bp, Some(140));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_string_measurement_is_missing() {
        let mut value = body();
        value["Cholesterol"] = json!("");
        value.as_object_mut().unwrap().remove("RestingBP");

        let req: PredictRequest = serde_json::from_value(value).unwrap();

        assert_eq!(req.cholesterol, None);
        assert_eq!(req.resting_bp, None);
    }

    #[test]
    fn test_non_numeric_string_is_rejected() {
        let mut value = body();
        value["Age"] = json!("fifty");

        assert!(serde_json::from_value::<PredictRequest>(value).is_err());
    }

    #[test]
    fn test_blank_category_fails_validation() {
        let mut value = body();
        value["Sex"] = json!("   ");

        let req: PredictRequest = serde_json::from_value(value).unwrap();

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_categories_are_trimmed_into_record() {
        let mut value = body();
        value["Sex"] = json!("M ");
        value["ST_Slope"] = json!(" Flat");

        let req: PredictRequest = serde_json::from_value(value).unwrap();
        let record = HeartRecord::from(req);

        assert_eq!(record.sex, "M");
        assert_eq!(record.st_slope, "Flat");
    }
}
