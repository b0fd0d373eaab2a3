//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Playwright not found. Install with: npm install playwright @playwright/test && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Flow spec parse error: {0}")]
    SpecParse(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("{operation}: expected HTTP {expected}, got {actual}")]
    UnexpectedStatus {
        operation: String,
        expected: u16,
        actual: u16,
    },

    #[error("{context}: response failed validation ({type_errors} type, {value_errors} value): {details}")]
    Validation {
        context: String,
        type_errors: usize,
        value_errors: usize,
        details: String,
    },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Schema error: {0}")]
    Schema(#[from] bookcheck_common::SchemaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
