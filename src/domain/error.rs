// Dashboard error taxonomy
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DashboardError {
    #[error("requested entry {requested} back but only {length} stored")]
    OutOfRange { requested: usize, length: usize },

    #[error("no derived record contains field \"{0}\"")]
    FieldNotFound(String),

    #[error("derived history is empty")]
    EmptyHistory,

    #[error("field \"{field}\" requires \"{key}\" which is missing from the snapshot")]
    MissingField { field: String, key: String },

    #[error("snapshot value \"{key}\" is not a {expected}")]
    InvalidField { key: String, expected: &'static str },

    #[error("invalid chart scale: max={max}, min={min}")]
    InvalidScale { min: f64, max: f64 },

    #[error("field \"{0}\" is not defined in the field registry")]
    UnknownField(String),

    #[error("field \"{0}\" has no chart configuration")]
    NotChartable(String),
}
