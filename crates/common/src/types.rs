//! Core types for record schemas

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is a valid regex"));

/// Type a field is declared to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Object,
}

impl FieldKind {
    /// Whether a runtime value carries this kind
    pub fn matches(&self, value: &Value) -> bool {
        ValueKind::of(value) == ValueKind::from(*self)
    }

    pub(crate) fn article(&self) -> &'static str {
        match self {
            FieldKind::Object => "an",
            _ => "a",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::String => write!(f, "string"),
            FieldKind::Number => write!(f, "number"),
            FieldKind::Boolean => write!(f, "boolean"),
            FieldKind::Object => write!(f, "object"),
        }
    }
}

/// Type a runtime value actually has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }
}

impl From<FieldKind> for ValueKind {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::String => ValueKind::String,
            FieldKind::Number => ValueKind::Number,
            FieldKind::Boolean => ValueKind::Boolean,
            FieldKind::Object => ValueKind::Object,
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Boolean => write!(f, "boolean"),
            ValueKind::Number => write!(f, "number"),
            ValueKind::String => write!(f, "string"),
            ValueKind::Array => write!(f, "array"),
            ValueKind::Object => write!(f, "object"),
        }
    }
}

/// How a present field is compared against its expected value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    /// Values must be equal (numbers compare numerically)
    #[default]
    Exact,
    /// The expected value is a regex the actual string must match
    Pattern,
    /// Only the type is checked
    TypeOnly,
}

/// Format predicate for string fields
#[derive(Debug, Clone)]
pub enum Format {
    /// Calendar date rendered as `YYYY-MM-DD`
    Date,
    /// Arbitrary regular expression
    Pattern(Regex),
}

impl Format {
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Format::Pattern)
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            Format::Date => DATE_PATTERN.is_match(text),
            Format::Pattern(re) => re.is_match(text),
        }
    }
}

impl PartialEq for Format {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Format::Date, Format::Date) => true,
            (Format::Pattern(a), Format::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// Declarative description of one validated field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Dotted path from the record root, e.g. `bookingdates.checkin`
    pub name: String,
    pub expected_type: FieldKind,
    pub required: bool,
    pub format: Option<Format>,
    pub compare: CompareMode,
    /// Minimum character count (strings only)
    pub min_length: Option<usize>,
    /// Inclusive lower bound (numbers only)
    pub minimum: Option<f64>,
    /// Child fields (objects only)
    pub fields: Vec<FieldSpec>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, expected_type: FieldKind) -> Self {
        Self {
            name: name.into(),
            expected_type,
            required: true,
            format: None,
            compare: CompareMode::Exact,
            min_length: None,
            minimum: None,
            fields: Vec::new(),
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Object)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn compare(mut self, mode: CompareMode) -> Self {
        self.compare = mode;
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// Attach a child field. The child's name is taken relative to this
    /// field and rewritten to its full dotted path.
    pub fn child(mut self, child: FieldSpec) -> Self {
        let prefix = self.name.clone();
        self.fields.push(child.prefixed(&prefix));
        self
    }

    fn prefixed(mut self, prefix: &str) -> Self {
        self.name = format!("{}.{}", prefix, self.name);
        let name = self.name.clone();
        self.fields = self
            .fields
            .into_iter()
            .map(|f| {
                let local = f.segment().to_string();
                FieldSpec { name: local, ..f }.prefixed(&name)
            })
            .collect();
        self
    }

    /// Last path segment, the key looked up in the enclosing object
    pub fn segment(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Object field whose children are validated individually
    pub fn is_nested(&self) -> bool {
        self.expected_type == FieldKind::Object && !self.fields.is_empty()
    }
}

/// Cross-field rule evaluated after all fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Invariant {
    /// `later` must not be a date before `earlier`
    DateOrder { earlier: String, later: String },
}
