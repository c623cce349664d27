// Error types for settings loading and validation

use crate::validation::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Configuration has {} error(s): {}", .0.len(), join_messages(.0))]
    Invalid(Vec<Diagnostic>),

    #[error("Invalid value for {key}: {value}")]
    InvalidEnvValue { key: String, value: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn join_messages(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("{}: {}", d.field, d.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ConfigError>;
