//! Declarative field validation for decoded request payloads.
//!
//! Each payload type declares its rules statically through [`Validate`],
//! keyed by the field's wire name so failure messages use the same
//! vocabulary as the JSON body. Rules for a field run in declaration order
//! and stop at the first failure; failures across fields are flattened into
//! one `", "`-joined description.
use std::fmt;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

const DATE_FORMAT: &str = "%Y-%m-%d";

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid pattern is valid")
});

/// Why a request payload was rejected before reaching business logic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Body is not syntactically valid JSON (including an empty body).
    #[error("InvalidJson: {0}")]
    InvalidJson(String),

    /// Body is JSON but a value does not match the declared type.
    /// `field` is the wire path of the offending value, `body` for the root.
    #[error("InvalidType for field: {field}. Expected: {expected}")]
    InvalidType { field: String, expected: String },

    /// One or more field rules failed.
    #[error("InvalidValue: {0}")]
    InvalidValue(String),

    /// Anything else, e.g. the body could not be read.
    #[error("{0}")]
    Unexpected(String),
}

impl ValidationError {
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::InvalidJson(_) => "InvalidJson",
            ValidationError::InvalidType { .. } => "InvalidType",
            ValidationError::InvalidValue(_) => "InvalidValue",
            ValidationError::Unexpected(_) => "Unexpected",
        }
    }
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Syntax | Category::Eof => ValidationError::InvalidJson(err.to_string()),
            Category::Data => ValidationError::InvalidType {
                field: ROOT_FIELD.to_string(),
                expected: expected_type(&err),
            },
            Category::Io => ValidationError::Unexpected(err.to_string()),
        }
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for ValidationError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let field = err.path().to_string();
        let inner = err.into_inner();
        match ValidationError::from(inner) {
            ValidationError::InvalidType { expected, .. } if field != "." => {
                ValidationError::InvalidType { field, expected }
            }
            other => other,
        }
    }
}

/// Name reported for a type mismatch on the document itself.
const ROOT_FIELD: &str = "body";

/// The type from serde's "expected ..." clause, in JSON vocabulary.
fn expected_type(err: &serde_json::Error) -> String {
    let message = err.to_string();
    let message = message
        .rsplit_once(" at line ")
        .map_or(message.as_str(), |(text, _)| text);
    let Some((_, expected)) = message.rsplit_once("expected ") else {
        return message.to_string();
    };
    let expected = expected
        .strip_prefix("a ")
        .or_else(|| expected.strip_prefix("an "))
        .unwrap_or(expected);

    if expected.starts_with("struct ") || expected.starts_with("map") {
        "object".to_string()
    } else if expected.starts_with("sequence") || expected.starts_with("tuple") {
        "array".to_string()
    } else {
        expected.to_string()
    }
}

/// Decode a JSON document, naming the offending field on a type mismatch.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ValidationError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(value)
}

/// A single field rule.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    /// Value must be present and non-empty.
    Required,
    /// Value must contain something other than whitespace.
    NotBlank,
    /// At most `n` characters.
    Max(usize),
    /// Absolute URL with a scheme.
    Url,
    /// Canonical hyphenated UUID.
    Uuid,
    /// Calendar date in `YYYY-MM-DD`.
    Date,
    /// Skip the remaining rules when the value is empty.
    OmitEmpty,
    /// Caller-supplied check reported under its own tag.
    Custom {
        tag: &'static str,
        check: fn(&str) -> bool,
    },
}

impl Rule {
    pub fn tag(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::NotBlank => "notblank",
            Rule::Max(_) => "max",
            Rule::Url => "url",
            Rule::Uuid => "uuid",
            Rule::Date => "date",
            Rule::OmitEmpty => "omitempty",
            Rule::Custom { tag, .. } => *tag,
        }
    }

    fn passes(&self, value: &str) -> bool {
        match self {
            Rule::Required => !value.is_empty(),
            Rule::NotBlank => !value.trim().is_empty(),
            Rule::Max(max) => value.chars().count() <= *max,
            Rule::Url => url::Url::parse(value).is_ok(),
            Rule::Uuid => UUID_RE.is_match(value),
            Rule::Date => NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok(),
            Rule::OmitEmpty => true,
            Rule::Custom { check, .. } => check(value),
        }
    }
}

/// Rules attached to one wire field.
#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub field: &'static str,
    pub rules: &'static [Rule],
}

impl FieldRules {
    pub const fn new(field: &'static str, rules: &'static [Rule]) -> Self {
        Self { field, rules }
    }
}

/// Implemented by every request payload that is validated after decoding.
pub trait Validate {
    /// Static rule table, keyed by wire name.
    const RULES: &'static [FieldRules];

    /// Current value of the field with the given wire name; `None` when absent.
    fn field_value(&self, field: &str) -> Option<&str>;
}

/// A failed rule on a named field.
#[derive(Debug, Clone, Copy)]
pub struct FieldFailure {
    pub field: &'static str,
    pub rule: Rule,
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.field;
        match self.rule {
            Rule::Required => write!(f, "{field} is a required field"),
            Rule::NotBlank => write!(f, "{field} should not be empty"),
            Rule::Max(max) => write!(f, "{field} must be a maximum of {max} in length"),
            Rule::Url => write!(f, "{field} must be a valid URL"),
            Rule::Uuid => write!(f, "{field} must be a valid uuid"),
            Rule::Date => write!(f, "{field} must be a valid date"),
            rule => write!(f, "validation failed for {field} on {}", rule.tag()),
        }
    }
}

/// Evaluate every field rule and collect the first failure per field.
pub fn field_failures<T: Validate>(payload: &T) -> Vec<FieldFailure> {
    let mut failures = Vec::new();

    for field_rules in T::RULES {
        let value = payload.field_value(field_rules.field).unwrap_or_default();
        for rule in field_rules.rules {
            if matches!(rule, Rule::OmitEmpty) && value.is_empty() {
                break;
            }
            if !rule.passes(value) {
                failures.push(FieldFailure {
                    field: field_rules.field,
                    rule: *rule,
                });
                break;
            }
        }
    }

    failures
}

/// Validate a payload, aggregating all field failures into a single error.
pub fn validate<T: Validate>(payload: &T) -> Result<(), ValidationError> {
    let failures = field_failures(payload);
    if failures.is_empty() {
        return Ok(());
    }

    let message = failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(ValidationError::InvalidValue(message))
}
