// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error in {path}: {msg}")]
    Csv { path: PathBuf, msg: String },

    #[error("No batch files found in {0}")]
    NoInputs(PathBuf),

    #[error("Input file not found: {0}")]
    MissingInput(PathBuf),

    #[error("Unknown group {group} (known: {known})")]
    UnknownGroup { group: u32, known: String },

    #[error("Taxonomy: {0}")]
    Taxonomy(String),

    #[error("Logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
