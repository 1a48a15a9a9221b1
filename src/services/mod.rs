//! Services: training, prediction and ETL

pub mod etl;
pub mod prediction;
pub mod training;


pub use etl::HeartEtlService;
pub use prediction::{decide, PredictionService, DECISION_THRESHOLD};
pub use training::TrainingService;
