//! Validation reports

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::types::{FieldKind, ValueKind};

/// Which half of the report a violation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Structure, type or format does not conform to the schema
    Type,
    /// A structurally present value differs from the expected one
    Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    Missing,
    WrongType {
        expected: FieldKind,
        actual: ValueKind,
    },
    DateFormat,
    PatternFormat {
        pattern: String,
    },
    TooShort {
        min_length: usize,
        actual: usize,
    },
    BelowMinimum {
        minimum: f64,
        actual: f64,
    },
    Mismatch {
        expected: Option<Value>,
        actual: Value,
    },
    PatternMismatch {
        pattern: String,
        actual: Value,
    },
    UnusablePattern {
        expected: Option<Value>,
    },
    DateOrder {
        earlier: String,
        earlier_value: String,
        later_value: String,
    },
}

/// One structured finding, rendered to a message at the report boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub path: String,
    pub category: ErrorCategory,
    pub kind: ViolationKind,
}

impl Violation {
    pub fn type_error(path: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            path: path.into(),
            category: ErrorCategory::Type,
            kind,
        }
    }

    pub fn value_error(path: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            path: path.into(),
            category: ErrorCategory::Value,
            kind,
        }
    }
}

fn render(value: Option<&Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "nothing".to_string(),
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = &self.path;
        match &self.kind {
            ViolationKind::Missing => write!(f, "{} must be present", path),
            ViolationKind::WrongType { expected, actual } => write!(
                f,
                "{} must be {} {} (got {})",
                path,
                expected.article(),
                expected,
                actual
            ),
            ViolationKind::DateFormat => write!(f, "{} must be in YYYY-MM-DD format", path),
            ViolationKind::PatternFormat { pattern } => {
                write!(f, "{} must match /{}/", path, pattern)
            }
            ViolationKind::TooShort { min_length, actual } => write!(
                f,
                "{} must be at least {} characters long (got {})",
                path, min_length, actual
            ),
            ViolationKind::BelowMinimum { minimum, actual } => {
                write!(f, "{} must be at least {} (got {})", path, minimum, actual)
            }
            ViolationKind::Mismatch { expected, actual } => write!(
                f,
                "{} value mismatch: expected {}, got {}",
                path,
                render(expected.as_ref()),
                actual
            ),
            ViolationKind::PatternMismatch { pattern, actual } => write!(
                f,
                "{} value mismatch: expected to match /{}/, got {}",
                path, pattern, actual
            ),
            ViolationKind::UnusablePattern { expected } => write!(
                f,
                "{} cannot be pattern-matched: expected value {} is not a valid pattern",
                path,
                render(expected.as_ref())
            ),
            ViolationKind::DateOrder {
                earlier,
                earlier_value,
                later_value,
            } => write!(
                f,
                "{} ({}) must not be before {} ({})",
                path, later_value, earlier, earlier_value
            ),
        }
    }
}

/// Error counts per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_errors: usize,
    pub type_error_count: usize,
    pub value_error_count: usize,
}

/// Categorized result of comparing an actual record to an expected one.
///
/// The serialized field names (`valid`, `errors`, `typeErrors`,
/// `valueErrors`, `summary`) are a stable contract for consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    /// Type errors followed by value errors
    pub errors: Vec<String>,
    pub type_errors: Vec<String>,
    pub value_errors: Vec<String>,
    pub summary: ReportSummary,
    /// Structured form of `errors`, in the same order
    #[serde(default)]
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Build a report, keeping declaration order within each category
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        let (mut ordered, values): (Vec<_>, Vec<_>) = violations
            .into_iter()
            .partition(|v| v.category == ErrorCategory::Type);
        let type_errors: Vec<String> = ordered.iter().map(ToString::to_string).collect();
        let value_errors: Vec<String> = values.iter().map(ToString::to_string).collect();
        ordered.extend(values);

        let summary = ReportSummary {
            total_errors: ordered.len(),
            type_error_count: type_errors.len(),
            value_error_count: value_errors.len(),
        };

        Self {
            valid: ordered.is_empty(),
            errors: type_errors.iter().chain(&value_errors).cloned().collect(),
            type_errors,
            value_errors,
            summary,
            violations: ordered,
        }
    }

    /// Violations recorded for one dotted path
    pub fn violations_for<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.violations.iter().filter(move |v| v.path == path)
    }

    pub fn has_type_error(&self, path: &str) -> bool {
        self.violations_for(path)
            .any(|v| v.category == ErrorCategory::Type)
    }

    pub fn has_value_error(&self, path: &str) -> bool {
        self.violations_for(path)
            .any(|v| v.category == ErrorCategory::Value)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            return write!(f, "valid (0 errors)");
        }
        writeln!(
            f,
            "invalid: {} error(s) ({} type, {} value)",
            self.summary.total_errors, self.summary.type_error_count, self.summary.value_error_count
        )?;
        for error in &self.type_errors {
            writeln!(f, "  [type]  {}", error)?;
        }
        for error in &self.value_errors {
            writeln!(f, "  [value] {}", error)?;
        }
        Ok(())
    }
}
