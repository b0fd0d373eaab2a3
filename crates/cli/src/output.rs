//! Output formatting for CLI

use bookcheck_common::{ErrorCategory, ValidationReport};
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

fn table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Serialize for the machine-readable formats; `None` for table and plain
pub fn render_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Option<String> {
    match format {
        OutputFormat::Json => Some(serde_json::to_string_pretty(value).unwrap_or_default()),
        OutputFormat::Yaml => Some(serde_yaml::to_string(value).unwrap_or_default()),
        OutputFormat::Table | OutputFormat::Plain => None,
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if let Some(rendered) = render_structured(items, format) {
        println!("{}", rendered);
        return;
    }
    if items.is_empty() {
        println!("No items found.");
        return;
    }

    match format {
        OutputFormat::Plain => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                let row = item.row();
                for (header, value) in T::headers().iter().zip(row.iter()) {
                    println!("{}: {}", header, value);
                }
            }
        }
        _ => {
            let mut table = table();
            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }
            println!("{table}");
        }
    }
}

/// Print a validation report
pub fn print_report(report: &ValidationReport, format: OutputFormat) {
    if let Some(rendered) = render_structured(report, format) {
        println!("{}", rendered);
        return;
    }

    match format {
        OutputFormat::Plain => print!("{}", report),
        _ => {
            if report.valid {
                print_success("Record matches the schema and the expected values");
                return;
            }
            let mut table = table();
            table.set_header(vec!["Category", "Field", "Problem"]);
            for violation in &report.violations {
                let category = match violation.category {
                    ErrorCategory::Type => "type",
                    ErrorCategory::Value => "value",
                };
                table.add_row(vec![
                    category.to_string(),
                    violation.path.clone(),
                    violation.to_string(),
                ]);
            }
            println!("{table}");
            print_error(&format!(
                "{} error(s): {} type, {} value",
                report.summary.total_errors,
                report.summary.type_error_count,
                report.summary.value_error_count
            ));
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structured_formats() {
        let value = json!({"valid": true});
        assert_eq!(
            render_structured(&value, OutputFormat::Json).unwrap(),
            "{\n  \"valid\": true\n}"
        );
        assert_eq!(render_structured(&value, OutputFormat::Yaml).unwrap(), "valid: true\n");
        assert!(render_structured(&value, OutputFormat::Table).is_none());
    }
}
