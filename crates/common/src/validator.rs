//! Record validation against a schema and an expected record
//!
//! Every field is checked twice, independently:
//!
//! - **type**: presence, runtime kind, format and constraints
//! - **value**: comparison with the expected record, attempted whenever the
//!   field is present, even if the type check already failed
//!
//! Nested objects whose parent is absent or not an object produce a single
//! type error for the parent and nothing for their children.

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::booking::DATE_FORMAT;
use crate::report::{ValidationReport, Violation, ViolationKind};
use crate::schema::RecordSchema;
use crate::types::{CompareMode, FieldSpec, Format, Invariant, ValueKind};

/// Compare `actual` with `expected` under `schema`.
///
/// Never fails: malformed or missing data is reported, not raised.
pub fn validate(actual: &Value, expected: &Value, schema: &RecordSchema) -> ValidationReport {
    RecordValidator::new(schema).validate(actual, expected)
}

/// Validator bound to one schema
#[derive(Debug, Clone, Copy)]
pub struct RecordValidator<'s> {
    schema: &'s RecordSchema,
}

impl<'s> RecordValidator<'s> {
    pub fn new(schema: &'s RecordSchema) -> Self {
        Self { schema }
    }

    pub fn validate(&self, actual: &Value, expected: &Value) -> ValidationReport {
        let mut walk = Walk::default();
        walk.fields(
            self.schema.fields(),
            actual.as_object(),
            expected.as_object(),
        );
        for invariant in self.schema.invariants() {
            walk.invariant(invariant, actual);
        }

        let report = ValidationReport::from_violations(walk.violations);
        debug!(
            schema = self.schema.name(),
            type_errors = report.summary.type_error_count,
            value_errors = report.summary.value_error_count,
            "validated record"
        );
        report
    }
}

#[derive(Default)]
struct Walk {
    violations: Vec<Violation>,
    /// Check structure only, at every depth
    skip_values: bool,
}

impl Walk {
    fn fields(
        &mut self,
        specs: &[FieldSpec],
        actual: Option<&Map<String, Value>>,
        expected: Option<&Map<String, Value>>,
    ) {
        for spec in specs {
            let key = spec.segment();
            self.field(
                spec,
                actual.and_then(|m| m.get(key)),
                expected.and_then(|m| m.get(key)),
            );
        }
    }

    fn field(&mut self, spec: &FieldSpec, actual: Option<&Value>, expected: Option<&Value>) {
        let Some(value) = actual else {
            if spec.required {
                self.violations
                    .push(Violation::type_error(&spec.name, ViolationKind::Missing));
            }
            return;
        };

        if spec.is_nested() {
            match value.as_object() {
                Some(map) => self.fields(&spec.fields, Some(map), expected.and_then(Value::as_object)),
                None => self.wrong_type(spec, value),
            }
            return;
        }

        if spec.expected_type.matches(value) {
            self.conformance(spec, value);
        } else {
            self.wrong_type(spec, value);
        }
        if !self.skip_values {
            self.value(spec, value, expected);
        }
    }

    fn wrong_type(&mut self, spec: &FieldSpec, value: &Value) {
        self.violations.push(Violation::type_error(
            &spec.name,
            ViolationKind::WrongType {
                expected: spec.expected_type,
                actual: ValueKind::of(value),
            },
        ));
    }

    fn conformance(&mut self, spec: &FieldSpec, value: &Value) {
        if let (Some(format), Some(text)) = (&spec.format, value.as_str()) {
            if !format.matches(text) {
                let kind = match format {
                    Format::Date => ViolationKind::DateFormat,
                    Format::Pattern(re) => ViolationKind::PatternFormat {
                        pattern: re.as_str().to_string(),
                    },
                };
                self.violations.push(Violation::type_error(&spec.name, kind));
            }
        }

        if let (Some(min_length), Some(text)) = (spec.min_length, value.as_str()) {
            let actual = text.chars().count();
            if actual < min_length {
                self.violations.push(Violation::type_error(
                    &spec.name,
                    ViolationKind::TooShort { min_length, actual },
                ));
            }
        }

        if let (Some(minimum), Some(actual)) = (spec.minimum, value.as_f64()) {
            if actual < minimum {
                self.violations.push(Violation::type_error(
                    &spec.name,
                    ViolationKind::BelowMinimum { minimum, actual },
                ));
            }
        }
    }

    fn value(&mut self, spec: &FieldSpec, actual: &Value, expected: Option<&Value>) {
        match spec.compare {
            CompareMode::TypeOnly => {}
            CompareMode::Exact => {
                if !expected.is_some_and(|e| json_eq(actual, e)) {
                    self.violations.push(Violation::value_error(
                        &spec.name,
                        ViolationKind::Mismatch {
                            expected: expected.cloned(),
                            actual: actual.clone(),
                        },
                    ));
                }
            }
            CompareMode::Pattern => {
                let pattern = expected.and_then(Value::as_str).map(Regex::new);
                match pattern {
                    Some(Ok(re)) => {
                        let matched = match actual {
                            Value::String(s) => re.is_match(s),
                            other => re.is_match(&other.to_string()),
                        };
                        if !matched {
                            self.violations.push(Violation::value_error(
                                &spec.name,
                                ViolationKind::PatternMismatch {
                                    pattern: re.as_str().to_string(),
                                    actual: actual.clone(),
                                },
                            ));
                        }
                    }
                    _ => self.violations.push(Violation::value_error(
                        &spec.name,
                        ViolationKind::UnusablePattern {
                            expected: expected.cloned(),
                        },
                    )),
                }
            }
        }
    }

    fn invariant(&mut self, invariant: &Invariant, actual: &Value) {
        match invariant {
            Invariant::DateOrder { earlier, later } => {
                let (Some(earlier_value), Some(later_value)) =
                    (resolve_str(actual, earlier), resolve_str(actual, later))
                else {
                    return;
                };
                let parsed = (
                    NaiveDate::parse_from_str(earlier_value, DATE_FORMAT),
                    NaiveDate::parse_from_str(later_value, DATE_FORMAT),
                );
                if let (Ok(from), Ok(to)) = parsed {
                    if to < from {
                        self.violations.push(Violation::value_error(
                            later,
                            ViolationKind::DateOrder {
                                earlier: earlier.clone(),
                                earlier_value: earlier_value.to_string(),
                                later_value: later_value.to_string(),
                            },
                        ));
                    }
                }
            }
        }
    }
}

fn resolve_str<'v>(root: &'v Value, path: &str) -> Option<&'v str> {
    path.split('.')
        .try_fold(root, |node, key| node.as_object()?.get(key))?
        .as_str()
}

/// JSON equality where numbers compare by value, so `150` equals `150.0`
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                x.as_f64() == y.as_f64()
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

impl FieldSpec {
    /// Whether `value` satisfies this field's kind, format and constraints,
    /// ignoring any expected value
    pub fn conforms(&self, value: &Value) -> bool {
        let mut walk = Walk {
            skip_values: true,
            ..Walk::default()
        };
        walk.field(self, Some(value), None);
        walk.violations.is_empty()
    }
}

impl RecordSchema {
    /// Shorthand for [`validate`]
    pub fn validate(&self, actual: &Value, expected: &Value) -> ValidationReport {
        RecordValidator::new(self).validate(actual, expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn schema() -> RecordSchema {
        RecordSchema::builder("sample")
            .field(FieldSpec::string("name").min_length(1))
            .field(FieldSpec::number("price").minimum(0.0))
            .field(FieldSpec::string("code").compare(CompareMode::Pattern))
            .field(FieldSpec::string("note").optional().compare(CompareMode::TypeOnly))
            .build()
            .unwrap()
    }

    #[test_case(json!(150), json!(150.0) ; "int equals float")]
    #[test_case(json!(-3), json!(-3.0) ; "negative")]
    #[test_case(json!({"a": [1, 2]}), json!({"a": [1.0, 2.0]}) ; "nested numbers")]
    fn test_numeric_equality(a: Value, b: Value) {
        assert!(json_eq(&a, &b));
    }

    #[test_case(json!(1), json!("1") ; "number vs string")]
    #[test_case(json!(true), json!(1) ; "bool vs number")]
    #[test_case(json!({"a": 1}), json!({"a": 1, "b": 2}) ; "extra key")]
    fn test_numeric_inequality(a: Value, b: Value) {
        assert!(!json_eq(&a, &b));
    }

    #[test]
    fn test_pattern_compare() {
        let schema = schema();
        let expected = json!({"name": "x", "price": 1, "code": "^BK-\\d+$"});

        let ok = schema.validate(&json!({"name": "x", "price": 1, "code": "BK-42"}), &expected);
        assert!(ok.valid, "{}", ok);

        let bad = schema.validate(&json!({"name": "x", "price": 1, "code": "XX-42"}), &expected);
        assert_eq!(bad.value_errors.len(), 1);
        assert!(bad.value_errors[0].contains("expected to match"));
    }

    #[test]
    fn test_unusable_expected_pattern() {
        let report = schema().validate(
            &json!({"name": "x", "price": 1, "code": "BK-1"}),
            &json!({"name": "x", "price": 1, "code": "(["}),
        );
        assert!(report.has_value_error("code"));
        assert!(report.type_errors.is_empty());
    }

    #[test]
    fn test_constraints_are_type_errors() {
        let actual = json!({"name": "", "price": -5, "code": "a"});
        let report = schema().validate(&actual, &json!({"name": "", "price": -5, "code": "a"}));

        assert_eq!(report.summary.type_error_count, 2);
        assert_eq!(report.summary.value_error_count, 0);
        assert!(report.type_errors[0].contains("at least 1 characters"));
        assert!(report.type_errors[1].contains("price must be at least 0"));
    }

    #[test]
    fn test_type_only_skips_value() {
        let report = schema().validate(
            &json!({"name": "x", "price": 1, "code": "a", "note": "anything"}),
            &json!({"name": "x", "price": 1, "code": "a", "note": "else"}),
        );
        assert!(report.valid, "{}", report);
    }

    #[test]
    fn test_non_object_record() {
        let report = schema().validate(&json!("not a record"), &json!({}));
        assert_eq!(report.summary.type_error_count, 3);
        assert_eq!(report.summary.value_error_count, 0);
    }

    #[test]
    fn test_conforms() {
        let spec = FieldSpec::string("d").with_format(Format::Date);
        assert!(spec.conforms(&json!("2024-01-01")));
        assert!(!spec.conforms(&json!("01/01/2024")));
        assert!(!spec.conforms(&json!(20240101)));
    }

    #[test]
    fn test_conforms_nested_object() {
        let dates = crate::booking::schema().field("bookingdates").unwrap();
        assert!(dates.conforms(&json!({"checkin": "2024-06-01", "checkout": "2024-06-05"})));
        assert!(!dates.conforms(&json!({"checkin": "2024-06-01", "checkout": "soon"})));
        assert!(!dates.conforms(&json!({"checkin": "2024-06-01"})));
        assert!(!dates.conforms(&json!(null)));
    }

    #[test]
    fn test_resolve_str() {
        let value = json!({"a": {"b": "c"}, "n": 1});
        assert_eq!(resolve_str(&value, "a.b"), Some("c"));
        assert_eq!(resolve_str(&value, "a.x"), None);
        assert_eq!(resolve_str(&value, "n"), None);
    }
}
