//! bookcheck common library
//!
//! Record validation engine shared by the e2e runner and the CLI: a
//! declarative [`RecordSchema`], the [`validate`] comparator that splits
//! findings into type errors and value errors, and the booking domain
//! (schema and test payload generator).

pub mod booking;
pub mod error;
pub mod report;
pub mod schema;
pub mod types;
pub mod validator;

// Re-export commonly used types
pub use booking::{BookingDates, BookingPayload};
pub use error::{Result, SchemaError};
pub use report::{ErrorCategory, ReportSummary, ValidationReport, Violation, ViolationKind};
pub use schema::{RecordSchema, SchemaBuilder, SchemaDocument};
pub use types::{CompareMode, FieldKind, FieldSpec, Format, Invariant, ValueKind};
pub use validator::{validate, RecordValidator};

/// bookcheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
