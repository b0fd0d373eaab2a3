//! Record schemas and their serialized documents

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Result, SchemaError};
use crate::types::{CompareMode, FieldKind, FieldSpec, Format, Invariant};

/// Ordered, validated set of field specs for one record type.
///
/// A schema can only be obtained through [`SchemaBuilder::build`] or a
/// [`SchemaDocument`], both of which reject malformed definitions, so a
/// `RecordSchema` value is always well-formed and immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldSpec>,
    invariants: Vec<Invariant>,
}

impl RecordSchema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            invariants: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn invariants(&self) -> &[Invariant] {
        &self.invariants
    }

    /// Find a field by its dotted path
    pub fn field(&self, path: &str) -> Option<&FieldSpec> {
        fn find<'a>(fields: &'a [FieldSpec], path: &str) -> Option<&'a FieldSpec> {
            fields.iter().find_map(|f| {
                if f.name == path {
                    Some(f)
                } else if path.starts_with(&format!("{}.", f.name)) {
                    find(&f.fields, path)
                } else {
                    None
                }
            })
        }
        find(&self.fields, path)
    }

    /// Parse a schema from a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let doc: SchemaDocument = serde_yaml::from_str(yaml)?;
        doc.into_schema()
    }

    /// Parse a schema from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: SchemaDocument = serde_json::from_str(json)?;
        doc.into_schema()
    }

    /// Load a schema file, picking the parser from its extension
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(SchemaError::UnsupportedExtension(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn to_document(&self) -> SchemaDocument {
        SchemaDocument {
            name: self.name.clone(),
            fields: self.fields.iter().map(FieldDocument::from_spec).collect(),
            invariants: self.invariants.clone(),
        }
    }

    fn check(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(SchemaError::Empty(self.name.clone()));
        }
        check_fields(&self.fields, None)?;

        for invariant in &self.invariants {
            let Invariant::DateOrder { earlier, later } = invariant;
            for path in [earlier, later] {
                match self.field(path) {
                    Some(f) if f.expected_type == FieldKind::String => {}
                    _ => return Err(SchemaError::UnknownInvariantField(path.clone())),
                }
            }
        }
        Ok(())
    }
}

fn check_fields(fields: &[FieldSpec], parent: Option<&str>) -> Result<()> {
    let mut seen = HashSet::new();

    for field in fields {
        let segment = match parent {
            Some(parent) => field
                .name
                .strip_prefix(parent)
                .and_then(|rest| rest.strip_prefix('.'))
                .ok_or_else(|| SchemaError::NotAChild {
                    parent: parent.to_string(),
                    name: field.name.clone(),
                })?,
            None => field.name.as_str(),
        };

        if segment.is_empty() {
            return Err(SchemaError::EmptyName {
                parent: parent.unwrap_or("<root>").to_string(),
            });
        }
        if segment.contains('.') || segment.trim() != segment {
            return Err(SchemaError::InvalidName(field.name.clone()));
        }
        if !seen.insert(segment) {
            return Err(SchemaError::DuplicateField(field.name.clone()));
        }

        check_constraints(field)?;

        if !field.fields.is_empty() {
            check_fields(&field.fields, Some(&field.name))?;
        }
    }
    Ok(())
}

fn check_constraints(field: &FieldSpec) -> Result<()> {
    let kind = field.expected_type;
    let incompatible = |constraint| SchemaError::IncompatibleConstraint {
        field: field.name.clone(),
        constraint,
        kind,
    };

    if field.format.is_some() && kind != FieldKind::String {
        return Err(incompatible("format"));
    }
    if field.min_length.is_some() && kind != FieldKind::String {
        return Err(incompatible("min_length"));
    }
    if field.minimum.is_some() && kind != FieldKind::Number {
        return Err(incompatible("minimum"));
    }
    if field.compare == CompareMode::Pattern && kind != FieldKind::String {
        return Err(incompatible("pattern compare"));
    }
    if !field.fields.is_empty() && kind != FieldKind::Object {
        return Err(incompatible("child fields"));
    }
    Ok(())
}

/// Incremental schema construction, validated on [`SchemaBuilder::build`]
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    invariants: Vec<Invariant>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn invariant(mut self, invariant: Invariant) -> Self {
        self.invariants.push(invariant);
        self
    }

    pub fn build(self) -> Result<RecordSchema> {
        let schema = RecordSchema {
            name: self.name,
            fields: self.fields,
            invariants: self.invariants,
        };
        schema.check()?;
        Ok(schema)
    }
}

/// Serialized form of a schema (YAML or JSON).
///
/// Child fields use names relative to their parent:
///
/// ```yaml
/// name: booking
/// fields:
///   - name: bookingdates
///     type: object
///     fields:
///       - name: checkin
///         type: string
///         format: date
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invariants: Vec<Invariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default = "default_required")]
    pub required: bool,
    /// Named format; only `date` is known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Regex format, mutually exclusive with `format`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default)]
    pub compare: CompareMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDocument>,
}

fn default_required() -> bool {
    true
}

impl FieldDocument {
    fn from_spec(spec: &FieldSpec) -> Self {
        let (format, pattern) = match &spec.format {
            Some(Format::Date) => (Some("date".to_string()), None),
            Some(Format::Pattern(re)) => (None, Some(re.as_str().to_string())),
            None => (None, None),
        };
        Self {
            name: spec.segment().to_string(),
            kind: spec.expected_type,
            required: spec.required,
            format,
            pattern,
            compare: spec.compare,
            min_length: spec.min_length,
            minimum: spec.minimum,
            fields: spec.fields.iter().map(Self::from_spec).collect(),
        }
    }

    fn into_spec(self) -> Result<FieldSpec> {
        let format = match (self.format.as_deref(), self.pattern) {
            (None, None) => None,
            (Some("date"), None) => Some(Format::Date),
            (None, Some(pattern)) => Some(Format::pattern(&pattern).map_err(|source| {
                SchemaError::InvalidPattern {
                    field: self.name.clone(),
                    source,
                }
            })?),
            (Some(_), Some(_)) => return Err(SchemaError::ConflictingFormat(self.name)),
            (Some(other), None) => {
                return Err(SchemaError::UnknownFormat {
                    field: self.name,
                    format: other.to_string(),
                })
            }
        };

        let mut spec = FieldSpec::new(self.name, self.kind);
        spec.required = self.required;
        spec.format = format;
        spec.compare = self.compare;
        spec.min_length = self.min_length;
        spec.minimum = self.minimum;
        for child in self.fields {
            spec = spec.child(child.into_spec()?);
        }
        Ok(spec)
    }
}

impl SchemaDocument {
    pub fn into_schema(self) -> Result<RecordSchema> {
        let mut builder = RecordSchema::builder(self.name);
        for field in self.fields {
            builder = builder.field(field.into_spec()?);
        }
        for invariant in self.invariants {
            builder = builder.invariant(invariant);
        }
        builder.build()
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BOOKING_YAML: &str = r#"
name: booking
fields:
  - name: firstname
    type: string
    min_length: 1
  - name: totalprice
    type: number
    minimum: 0
  - name: bookingdates
    type: object
    fields:
      - name: checkin
        type: string
        format: date
      - name: checkout
        type: string
        format: date
  - name: additionalneeds
    type: string
    required: false
invariants:
  - kind: date_order
    earlier: bookingdates.checkin
    later: bookingdates.checkout
"#;

    #[test]
    fn test_parse_yaml_schema() {
        let schema = RecordSchema::from_yaml(BOOKING_YAML).unwrap();
        assert_eq!(schema.name(), "booking");
        assert_eq!(schema.fields().len(), 4);

        let checkin = schema.field("bookingdates.checkin").unwrap();
        assert_eq!(checkin.format, Some(Format::Date));
        assert!(checkin.required);
        assert!(!schema.field("additionalneeds").unwrap().required);
        assert_eq!(schema.invariants().len(), 1);
    }

    #[test]
    fn test_document_round_trip() {
        let schema = RecordSchema::from_yaml(BOOKING_YAML).unwrap();
        let yaml = schema.to_document().to_yaml().unwrap();
        let reparsed = RecordSchema::from_yaml(&yaml).unwrap();
        assert_eq!(schema, reparsed);
    }

    #[test]
    fn test_load_by_extension() {
        let tmp = TempDir::new().unwrap();
        let yaml_path = tmp.path().join("booking.yaml");
        std::fs::write(&yaml_path, BOOKING_YAML).unwrap();
        assert!(RecordSchema::load(&yaml_path).is_ok());

        let json_path = tmp.path().join("tiny.json");
        std::fs::write(
            &json_path,
            r#"{"name":"tiny","fields":[{"name":"id","type":"number"}]}"#,
        )
        .unwrap();
        assert_eq!(RecordSchema::load(&json_path).unwrap().fields().len(), 1);

        let txt_path = tmp.path().join("schema.txt");
        std::fs::write(&txt_path, BOOKING_YAML).unwrap();
        assert!(matches!(
            RecordSchema::load(&txt_path),
            Err(SchemaError::UnsupportedExtension(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_fields() {
        let result = RecordSchema::builder("dup")
            .field(FieldSpec::string("name"))
            .field(FieldSpec::number("name"))
            .build();
        assert!(matches!(result, Err(SchemaError::DuplicateField(f)) if f == "name"));
    }

    #[test]
    fn test_rejects_format_on_number() {
        let result = RecordSchema::builder("bad")
            .field(FieldSpec::number("price").with_format(Format::Date))
            .build();
        assert!(matches!(
            result,
            Err(SchemaError::IncompatibleConstraint { constraint: "format", .. })
        ));
    }

    #[test]
    fn test_rejects_dotted_top_level_name() {
        let result = RecordSchema::builder("bad")
            .field(FieldSpec::string("booking.dates"))
            .build();
        assert!(matches!(result, Err(SchemaError::InvalidName(_))));
    }

    #[test]
    fn test_rejects_foreign_child() {
        let mut parent = FieldSpec::object("dates");
        parent.fields.push(FieldSpec::string("other.checkin"));
        let result = RecordSchema::builder("bad").field(parent).build();
        assert!(matches!(result, Err(SchemaError::NotAChild { .. })));
    }

    #[test]
    fn test_rejects_unknown_invariant_field() {
        let result = RecordSchema::builder("bad")
            .field(FieldSpec::string("checkin"))
            .invariant(Invariant::DateOrder {
                earlier: "checkin".to_string(),
                later: "checkout".to_string(),
            })
            .build();
        assert!(matches!(result, Err(SchemaError::UnknownInvariantField(f)) if f == "checkout"));
    }

    #[test]
    fn test_rejects_empty_schema_and_bad_pattern() {
        assert!(matches!(
            RecordSchema::builder("none").build(),
            Err(SchemaError::Empty(_))
        ));

        let yaml = r#"
name: bad
fields:
  - name: code
    type: string
    pattern: "([a-z"
"#;
        assert!(matches!(
            RecordSchema::from_yaml(yaml),
            Err(SchemaError::InvalidPattern { .. })
        ));

        let yaml = r#"
name: bad
fields:
  - name: code
    type: string
    format: uuid
"#;
        assert!(matches!(
            RecordSchema::from_yaml(yaml),
            Err(SchemaError::UnknownFormat { .. })
        ));
    }
}
