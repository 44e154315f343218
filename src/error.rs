use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrateError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Missing required CSV header: {0}")]
    MissingHeader(String),

    #[error("Missing required value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Failed to parse rules file {path:?}: {source}")]
    RulesParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize rules: {0}")]
    RulesSerializeError(serde_json::Error),

    #[error("Invalid rule in '{table}': {reason}")]
    InvalidRule { table: String, reason: String },

    #[error("Failed to encode front matter: {0}")]
    FrontMatterError(#[from] serde_yaml::Error),

    #[error("Input directory not found: {0:?}")]
    MissingDirectory(PathBuf),
}

pub type Result<T> = std::result::Result<T, CrateError>;
