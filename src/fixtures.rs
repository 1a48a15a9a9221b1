//! Shared test data

use crate::dataset::Table;
use crate::models::HeartRecord;
use crate::pipeline::{ForestParams, ModelArtifact};
use crate::services::TrainingService;

pub const HEADER: &str = "Age,Sex,ChestPainType,RestingBP,Cholesterol,FastingBS,RestingECG,MaxHR,ExerciseAngina,Oldpeak,ST_Slope,HeartDisease";

/// Raw record straight from the dataset, sentinel zeros included.
pub fn scenario_record() -> HeartRecord {
    HeartRecord {
        age: 54,
        sex: "M".to_string(),
        chest_pain_type: "ASY".to_string(),
        resting_bp: Some(0),
        cholesterol: Some(0),
        fasting_bs: 1,
        resting_ecg: "Normal".to_string(),
        max_hr: 130,
        exercise_angina: "Y".to_string(),
        oldpeak: 1.5,
        st_slope: "Flat".to_string(),
        heart_disease: None,
    }
}

pub fn high_risk_record() -> HeartRecord {
    HeartRecord {
        age: 61,
        sex: "M".to_string(),
        chest_pain_type: "ASY".to_string(),
        resting_bp: Some(142),
        cholesterol: Some(262),
        fasting_bs: 1,
        resting_ecg: "ST".to_string(),
        max_hr: 116,
        exercise_angina: "Y".to_string(),
        oldpeak: 2.0,
        st_slope: "Flat".to_string(),
        heart_disease: None,
    }
}

pub fn low_risk_record() -> HeartRecord {
    HeartRecord {
        age: 38,
        sex: "F".to_string(),
        chest_pain_type: "ATA".to_string(),
        resting_bp: Some(120),
        cholesterol: Some(201),
        fasting_bs: 0,
        resting_ecg: "Normal".to_string(),
        max_hr: 171,
        exercise_angina: "N".to_string(),
        oldpeak: 0.0,
        st_slope: "Up".to_string(),
        heart_disease: None,
    }
}

/// 80 labeled rows; positives and negatives differ on most features.
pub fn training_csv() -> String {
    let mut lines = vec![HEADER.to_string()];
    for i in 0..80u32 {
        let line = if i % 2 == 0 {
            let cholesterol = if i % 8 == 0 { 0 } else { 240 + i % 30 };
            format!(
                "{},M,ASY,{},{},{},{},{},Y,{:.1},Flat,1",
                55 + i % 12,
                130 + i % 20,
                cholesterol,
                u32::from(i % 4 == 0),
                if i % 3 == 0 { "ST" } else { "Normal" },
                108 + i % 20,
                1.2 + f64::from(i % 5) * 0.3,
            )
        } else {
            format!(
                "{},{},ATA,{},{},0,Normal,{},N,0,Up,0",
                35 + i % 12,
                if i % 3 == 0 { "M" } else { "F" },
                118 + i % 15,
                185 + i % 25,
                158 + i % 20,
            )
        };
        lines.push(line);
    }
    lines.join("\n")
}

pub fn training_table() -> Table {
    Table::from_csv_reader(training_csv().as_bytes()).unwrap()
}

pub fn quick_params() -> ForestParams {
    ForestParams { n_estimators: 25, ..Default::default() }
}

pub fn fitted_artifact() -> ModelArtifact {
    TrainingService::with_params(quick_params())
        .fit(&training_table())
        .unwrap()
}
