use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilingAnalysisError {
    #[error("Required column missing from input: {0}")]
    MissingColumn(String),

    #[error("Invalid submission date '{value}' on line {line}")]
    InvalidDate { line: usize, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not enough data: {0}")]
    InsufficientData(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FilingAnalysisError>;
