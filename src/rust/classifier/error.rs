use std::io;
use std::path::PathBuf;

use crate::model_manager::ModelError;

/// Represents the different types of errors that can occur while loading data,
/// fitting the pipeline, evaluating it or making predictions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required input file does not exist
    #[error("The file was not found: {}", .path.display())]
    FileNotFound { path: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// A data row does not fit the declared record shape
    #[error("Malformed row at {}:{line}: {message}", .path.display())]
    MalformedRow {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("Column '{0}' not found")]
    MissingColumn(String),
    #[error("Column '{column}' is {actual}, expected {expected}")]
    ColumnType {
        column: String,
        expected: String,
        actual: String,
    },
    /// A loaded model does not accept the record it is asked to predict on
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("Featurization error: {0}")]
    Featurization(String),
    #[error("Training error: {0}")]
    Training(String),
    #[error("Evaluation error: {0}")]
    Evaluation(String),
    /// Invalid input parameters
    #[error("Validation error: {0}")]
    Validation(String),
    #[error(transparent)]
    Model(#[from] ModelError),
}
