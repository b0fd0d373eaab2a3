//! Error types for bookcheck schemas

use thiserror::Error;

use crate::types::FieldKind;

/// Result type alias using the schema error
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Problems found while building or loading a record schema.
///
/// These are programming errors in the schema definition, never runtime
/// properties of a validated record.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Schema {0} declares no fields")]
    Empty(String),

    #[error("Field name must not be empty (under {parent})")]
    EmptyName { parent: String },

    #[error("Invalid field name: {0}")]
    InvalidName(String),

    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    #[error("Field {name} is not a direct child of {parent}")]
    NotAChild { parent: String, name: String },

    #[error("Field {field}: {constraint} does not apply to {kind} fields")]
    IncompatibleConstraint {
        field: String,
        constraint: &'static str,
        kind: FieldKind,
    },

    #[error("Field {field}: invalid pattern: {source}")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },

    #[error("Field {field}: unknown format {format:?}")]
    UnknownFormat { field: String, format: String },

    #[error("Field {0}: format and pattern are mutually exclusive")]
    ConflictingFormat(String),

    #[error("Invariant references undeclared string field: {0}")]
    UnknownInvariantField(String),

    #[error("Unsupported schema file extension: {0}")]
    UnsupportedExtension(String),
}
