//! Error types for the engine.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown control: {key}")]
    UnknownControl { key: String },

    #[error("Control '{key}' is derived and cannot be set directly")]
    NotControllable { key: String },

    #[error("Value '{value}' is not allowed for control '{key}'")]
    ValueNotAllowed { key: String, value: String },

    #[error(transparent)]
    Value(#[from] pl_core::PlError),

    #[error("No close-up image for equipment: {equipment}")]
    NoEquipmentImage { equipment: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Dataset error: {0}")]
    Dataset(#[from] pl_dataset::DatasetError),

    #[error("Validation error: {0}")]
    Validation(#[from] pl_dataset::ValidationError),

    #[error("Report error: {0}")]
    Report(#[from] pl_report::ReportError),

    #[error("Settings error: {0}")]
    Settings(#[from] pl_settings::SettingsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
