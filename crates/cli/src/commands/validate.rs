//! Validate Command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bookcheck_common::{booking, RecordSchema, RecordValidator, ValidationReport};
use clap::Args;
use serde_json::Value;
use tracing::{debug, warn};

use crate::output::{print_report, OutputFormat};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Record returned by the system under test (JSON or YAML)
    #[arg(short, long)]
    pub actual: PathBuf,

    /// Record the caller expected (JSON or YAML)
    #[arg(short, long)]
    pub expected: PathBuf,

    /// Schema document; the built-in booking schema when omitted
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// Use the booking schema with the checkout >= checkin rule
    #[arg(long)]
    pub strict: bool,
}

/// Read a record, as YAML when the extension says so and JSON otherwise
pub fn read_record(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let value = if yaml {
        serde_yaml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
    } else {
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
    };
    Ok(value)
}

pub fn run(args: &ValidateArgs) -> Result<ValidationReport> {
    let loaded;
    let schema: &RecordSchema = match &args.schema {
        Some(path) => {
            if args.strict {
                warn!("--strict only applies to the built-in booking schema");
            }
            loaded = RecordSchema::load(path)
                .with_context(|| format!("loading schema {}", path.display()))?;
            &loaded
        }
        None if args.strict => booking::strict_schema(),
        None => booking::schema(),
    };
    debug!(schema = schema.name(), "validating {}", args.actual.display());

    let actual = read_record(&args.actual)?;
    let expected = read_record(&args.expected)?;
    Ok(RecordValidator::new(schema).validate(&actual, &expected))
}

/// Returns whether the record was valid
pub fn execute(args: ValidateArgs, format: OutputFormat) -> Result<bool> {
    let report = run(&args)?;
    print_report(&report, format);
    Ok(report.valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BOOKING: &str = r#"{
        "firstname": "Jim", "lastname": "Brown", "totalprice": 111,
        "depositpaid": true,
        "bookingdates": {"checkin": "2026-01-01", "checkout": "2026-01-03"},
        "additionalneeds": "Breakfast"
    }"#;

    fn args(dir: &TempDir, actual: &str, expected: &str) -> ValidateArgs {
        let actual_path = dir.path().join("actual.json");
        let expected_path = dir.path().join("expected.yaml");
        std::fs::write(&actual_path, actual).unwrap();
        std::fs::write(&expected_path, expected).unwrap();
        ValidateArgs {
            actual: actual_path,
            expected: expected_path,
            schema: None,
            strict: false,
        }
    }

    #[test]
    fn test_json_against_yaml_record() {
        let tmp = TempDir::new().unwrap();
        // JSON is valid YAML
        let report = run(&args(&tmp, BOOKING, BOOKING)).unwrap();
        assert!(report.valid);
    }

    #[test]
    fn test_strict_flag_selects_date_order() {
        let tmp = TempDir::new().unwrap();
        let reversed = BOOKING.replace("2026-01-03", "2025-12-30");
        let mut args = args(&tmp, &reversed, &reversed);
        assert!(run(&args).unwrap().valid);

        args.strict = true;
        let report = run(&args).unwrap();
        assert_eq!(report.summary.value_error_count, 1);
    }

    #[test]
    fn test_custom_schema() {
        let tmp = TempDir::new().unwrap();
        let schema = tmp.path().join("schema.yaml");
        std::fs::write(&schema, "name: sku\nfields:\n  - name: sku\n    type: string\n").unwrap();

        let mut args = args(&tmp, r#"{"sku": 7}"#, r#"{"sku": "7"}"#);
        args.schema = Some(schema);
        let report = run(&args).unwrap();
        assert!(report.has_type_error("sku"));
        assert!(report.has_value_error("sku"));
    }

    #[test]
    fn test_unreadable_record() {
        let tmp = TempDir::new().unwrap();
        let mut args = args(&tmp, "{", BOOKING);
        assert!(run(&args).is_err());
        args.actual = tmp.path().join("missing.json");
        assert!(run(&args).is_err());
    }
}
