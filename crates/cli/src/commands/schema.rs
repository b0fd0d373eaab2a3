//! Schema Commands

use std::path::PathBuf;

use anyhow::{Context, Result};
use bookcheck_common::{booking, CompareMode, FieldSpec, Format, Invariant, RecordSchema};
use clap::Subcommand;
use serde::Serialize;

use crate::output::{print_info, print_list, print_success, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum SchemaCommands {
    /// Load a schema document and list its fields
    Check {
        /// YAML or JSON schema document
        file: PathBuf,
    },

    /// Print the built-in booking schema as a YAML document
    Show {
        /// Include the checkout >= checkin rule
        #[arg(long)]
        strict: bool,
    },
}

/// One schema field flattened for display
#[derive(Debug, Serialize)]
pub struct FieldRow {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
    pub format: Option<String>,
    pub compare: String,
    pub constraints: Vec<String>,
}

impl FieldRow {
    fn from_spec(spec: &FieldSpec) -> Self {
        let mut constraints = Vec::new();
        if let Some(n) = spec.min_length {
            constraints.push(format!("min_length {}", n));
        }
        if let Some(n) = spec.minimum {
            constraints.push(format!("minimum {}", n));
        }

        Self {
            path: spec.name.clone(),
            kind: spec.expected_type.to_string(),
            required: spec.required,
            format: spec.format.as_ref().map(|f| match f {
                Format::Date => "date".to_string(),
                Format::Pattern(re) => format!("/{}/", re.as_str()),
            }),
            compare: match spec.compare {
                CompareMode::Exact => "exact",
                CompareMode::Pattern => "pattern",
                CompareMode::TypeOnly => "type_only",
            }
            .to_string(),
            constraints,
        }
    }
}

impl TableDisplay for FieldRow {
    fn headers() -> Vec<&'static str> {
        vec!["Field", "Type", "Required", "Format", "Compare", "Constraints"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.path.clone(),
            self.kind.clone(),
            if self.required { "yes" } else { "no" }.to_string(),
            self.format.clone().unwrap_or_else(|| "-".to_string()),
            self.compare.clone(),
            if self.constraints.is_empty() {
                "-".to_string()
            } else {
                self.constraints.join(", ")
            },
        ]
    }
}

/// Every field in declaration order, parents before their children
pub fn field_rows(schema: &RecordSchema) -> Vec<FieldRow> {
    fn walk(fields: &[FieldSpec], out: &mut Vec<FieldRow>) {
        for field in fields {
            out.push(FieldRow::from_spec(field));
            walk(&field.fields, out);
        }
    }

    let mut rows = Vec::new();
    walk(schema.fields(), &mut rows);
    rows
}

pub fn execute(cmd: SchemaCommands, format: OutputFormat) -> Result<()> {
    match cmd {
        SchemaCommands::Check { file } => {
            let schema = RecordSchema::load(&file)
                .with_context(|| format!("loading schema {}", file.display()))?;
            print_list(&field_rows(&schema), format);
            for invariant in schema.invariants() {
                let Invariant::DateOrder { earlier, later } = invariant;
                print_info(&format!("invariant: {} must not be before {}", later, earlier));
            }
            print_success(&format!("Schema '{}' is valid", schema.name()));
        }

        SchemaCommands::Show { strict } => {
            let schema = if strict {
                booking::strict_schema()
            } else {
                booking::schema()
            };
            print!("{}", schema.to_document().to_yaml()?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_rows() {
        let rows = field_rows(booking::schema());
        let paths: Vec<_> = rows.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "firstname",
                "lastname",
                "totalprice",
                "depositpaid",
                "bookingdates",
                "bookingdates.checkin",
                "bookingdates.checkout",
                "additionalneeds",
            ]
        );

        let checkin = &rows[5];
        assert_eq!(checkin.format.as_deref(), Some("date"));
        assert_eq!(rows[2].constraints, vec!["minimum 0".to_string()]);
        assert!(!rows[7].required);
    }
}
