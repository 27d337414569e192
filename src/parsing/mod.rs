pub mod training;

pub use training::{Employee, ParseResult, TRAINING_COLUMNS, TrainingRecord, parse_training_data};
