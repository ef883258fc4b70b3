//! Declarative expectation documents
//!
//! A document describes one API call (method, URL, parameters, body) together
//! with everything the response is expected to satisfy. Documents are read
//! once and never mutated; they can be written by hand in tests or loaded
//! from JSON / YAML files.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};
use crate::path::FieldPath;

/// HTTP method of the request under test
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        };
        f.write_str(label)
    }
}

/// One test case: request shape plus response expectations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectationDocument {
    /// Name used in results and logs
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags for filtering cases
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub method: HttpMethod,

    /// Absolute URL or a path relative to the configured base URL
    #[serde(default)]
    pub url: String,

    /// Query parameters
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub request_body: Option<Value>,

    /// Send the request without a bearer token
    #[serde(default)]
    pub skip_auth: bool,

    #[serde(default)]
    pub expected_status: Option<u16>,

    /// Soft threshold in milliseconds
    #[serde(default)]
    pub expected_response_time: Option<u64>,

    /// Body compared in exact mode
    #[serde(default)]
    pub expected_body: Option<Value>,

    /// Body compared in subset mode
    #[serde(default)]
    pub subset_expected_body: Option<Value>,

    /// Fields that must be present and non-empty; their values are not compared
    #[serde(default)]
    pub non_empty_fields: Vec<FieldPath>,

    #[serde(default)]
    pub validate_amounts: bool,

    #[serde(default)]
    pub amount_fields: Vec<FieldPath>,

    #[serde(default)]
    pub validate_transaction_ids: bool,

    #[serde(default)]
    pub transaction_id_fields: Vec<FieldPath>,

    #[serde(default)]
    pub validate_data_masking: bool,

    #[serde(default)]
    pub sensitive_fields: Vec<FieldPath>,

    #[serde(default)]
    pub custom_validations: Vec<CustomRule>,

    /// Values captured into the suite context after the case passes,
    /// keyed by variable name
    #[serde(default)]
    pub store: BTreeMap<String, FieldPath>,
}

impl ExpectationDocument {
    pub fn from_json(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json).map_err(ValidationError::from)
    }

    pub fn from_yaml(yaml: &str) -> ValidationResult<Self> {
        serde_yaml::from_str(yaml).map_err(ValidationError::from)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        load_document(path)
    }

    /// Paths exempt from value comparison
    pub fn non_empty_set(&self) -> HashSet<FieldPath> {
        self.non_empty_fields.iter().cloned().collect()
    }

    /// Display name, falling back to `METHOD url`
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("{} {}", self.method, self.url)
        } else {
            self.name.clone()
        }
    }
}

/// Kind of an ad hoc custom rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    ArrayLength,
    Contains,
    GreaterThan,
    DataType,
    Unknown(String),
}

impl RuleKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "arrayLength" => RuleKind::ArrayLength,
            "contains" => RuleKind::Contains,
            "greaterThan" => RuleKind::GreaterThan,
            "dataType" => RuleKind::DataType,
            other => RuleKind::Unknown(other.to_string()),
        }
    }
}

/// `{ field, type, expectedValue | expectedLength | expectedType }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRule {
    pub field: FieldPath,

    /// Rule type name, kept verbatim so unknown types survive loading
    #[serde(rename = "type")]
    pub rule_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_type: Option<String>,
}

impl CustomRule {
    pub fn kind(&self) -> RuleKind {
        RuleKind::from_name(&self.rule_type)
    }
}

/// An ordered list of cases executed one after another against one context
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSuite {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub cases: Vec<ExpectationDocument>,
}

impl TestSuite {
    pub fn from_json(json: &str) -> ValidationResult<Self> {
        serde_json::from_str(json).map_err(ValidationError::from)
    }

    pub fn from_yaml(yaml: &str) -> ValidationResult<Self> {
        serde_yaml::from_str(yaml).map_err(ValidationError::from)
    }

    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        load_document(path)
    }

    /// Copy of the suite keeping only cases carrying `tag`
    pub fn filter_by_tag(&self, tag: &str) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            cases: self
                .cases
                .iter()
                .filter(|c| c.tags.iter().any(|t| t == tag))
                .cloned()
                .collect(),
        }
    }
}

fn load_document<T: DeserializeOwned>(path: &Path) -> ValidationResult<T> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(serde_json::from_str(&content)?),
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
        other => Err(ValidationError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}
