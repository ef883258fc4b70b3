//! Recursive structural comparison of a response body against an expectation
//!
//! The walk is driven by the *expected* value: every expected key must be
//! present in the actual object, containers must agree in kind, and leaves are
//! compared by value unless the leaf path is listed as non-empty-only.
//!
//! Arrays are not compared element by element. The first element of an
//! expected array is a template: when it is an object every actual element is
//! validated against it, when it is a primitive every actual element must have
//! the same runtime type. The expected array's length is never compared.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ValidationError, ValidationResult};
use crate::json;
use crate::path::FieldPath;
use crate::report::{ValidationReport, WarningKind};

/// How strictly the actual object must follow the expected keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Extra actual keys are reported as warnings
    #[default]
    Exact,
    /// Extra actual keys are tolerated silently
    Subset,
}

/// Structural comparator for one declared body
pub struct StructuralValidator<'a> {
    mode: MatchMode,
    non_empty: &'a HashSet<FieldPath>,
}

impl<'a> StructuralValidator<'a> {
    pub fn new(mode: MatchMode, non_empty: &'a HashSet<FieldPath>) -> Self {
        Self { mode, non_empty }
    }

    /// Compare from the root of the body
    pub fn validate_root(
        &self,
        actual: &Value,
        expected: &Value,
        report: &mut ValidationReport,
    ) -> ValidationResult<()> {
        self.validate(actual, expected, &FieldPath::root(), report)
    }

    /// Compare `actual` against `expected` below `path`, stopping at the first
    /// violation
    pub fn validate(
        &self,
        actual: &Value,
        expected: &Value,
        path: &FieldPath,
        report: &mut ValidationReport,
    ) -> ValidationResult<()> {
        let Value::Object(expected_map) = expected else {
            return Ok(());
        };
        let actual_map = actual.as_object();

        if self.mode == MatchMode::Exact {
            if let Some(actual_map) = actual_map {
                let extra: Vec<&str> = actual_map
                    .keys()
                    .filter(|k| !expected_map.contains_key(k.as_str()))
                    .map(String::as_str)
                    .collect();
                if !extra.is_empty() {
                    report.warn(
                        WarningKind::ExtraProperties,
                        (!path.is_root()).then(|| path.to_string()),
                        format!("Extra properties found: {}", extra.join(", ")),
                    );
                }
            }
        }

        for (key, expected_value) in expected_map {
            let field_path = path.child_key(key);
            let actual_value = actual_map.and_then(|m| m.get(key)).ok_or_else(|| {
                ValidationError::MissingProperty {
                    key: key.clone(),
                    path: field_path.to_string(),
                }
            })?;

            match expected_value {
                Value::Array(template) => {
                    self.validate_array(key, actual_value, template, &field_path, report)?
                }
                Value::Object(_) => {
                    if !actual_value.is_object() {
                        return Err(ValidationError::NotAnObject {
                            key: key.clone(),
                            path: field_path.to_string(),
                        });
                    }
                    self.validate(actual_value, expected_value, &field_path, report)?;
                }
                _ => self.validate_leaf(key, actual_value, expected_value, &field_path)?,
            }
        }

        Ok(())
    }

    fn validate_array(
        &self,
        key: &str,
        actual: &Value,
        template: &[Value],
        path: &FieldPath,
        report: &mut ValidationReport,
    ) -> ValidationResult<()> {
        let Value::Array(items) = actual else {
            return Err(ValidationError::NotAnArray {
                key: key.to_string(),
                path: path.to_string(),
            });
        };
        let Some(first) = template.first() else {
            return Ok(());
        };

        if first.is_object() {
            for (index, item) in items.iter().enumerate() {
                self.validate(item, first, &path.child_index(index), report)?;
            }
            return Ok(());
        }

        let expected_type = json::type_name(first);
        for (index, item) in items.iter().enumerate() {
            let actual_type = json::type_name(item);
            if actual_type != expected_type {
                return Err(ValidationError::ElementTypeMismatch {
                    path: path.child_index(index).to_string(),
                    expected: expected_type.to_string(),
                    actual: actual_type.to_string(),
                });
            }
        }
        Ok(())
    }

    fn validate_leaf(
        &self,
        key: &str,
        actual: &Value,
        expected: &Value,
        path: &FieldPath,
    ) -> ValidationResult<()> {
        if self.non_empty.contains(path) {
            debug!(path = %path, "value comparison skipped for non-empty field");
            return Ok(());
        }

        let matches = match (expected, actual) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            _ => json::loose_eq(actual, expected),
        };

        if !matches {
            return Err(ValidationError::ValueMismatch {
                key: key.to_string(),
                path: path.to_string(),
                expected: json::display(expected),
                actual: json::display(actual),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(
        actual: &Value,
        expected: &Value,
        mode: MatchMode,
        non_empty: &[&str],
    ) -> (ValidationResult<()>, ValidationReport) {
        let set: HashSet<FieldPath> = non_empty
            .iter()
            .map(|p| FieldPath::parse(p).unwrap())
            .collect();
        let mut report = ValidationReport::new();
        let result = StructuralValidator::new(mode, &set).validate_root(actual, expected, &mut report);
        (result, report)
    }

    #[test]
    fn test_exact_match_passes() {
        let body = json!({"status": "ok", "id": "ABC123456"});
        let (result, report) = run(&body, &body, MatchMode::Exact, &[]);
        assert!(result.is_ok());
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_missing_property() {
        let (result, _) = run(&json!({"a": 1}), &json!({"a": 1, "b": 2}), MatchMode::Exact, &[]);
        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("Missing property: b"));
    }

    #[test]
    fn test_missing_property_in_subset_mode() {
        let (result, _) = run(&json!({"a": 1}), &json!({"b": 2}), MatchMode::Subset, &[]);
        assert!(matches!(result, Err(ValidationError::MissingProperty { .. })));
    }

    #[test]
    fn test_non_empty_field_skips_value_comparison() {
        let (result, _) = run(
            &json!({"createdAt": "2025-06-01"}),
            &json!({"createdAt": "2024-01-01"}),
            MatchMode::Exact,
            &["createdAt"],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_array_template_compares_template_values() {
        let expected = json!({"items": [{"id": "x", "qty": 1}]});
        let actual = json!({"items": [{"id": "a", "qty": 5}, {"id": "b", "qty": 2}]});
        let (result, _) = run(&actual, &expected, MatchMode::Exact, &[]);
        let err = result.unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Value mismatch for id. Expected: x, Got: a"));
        assert_eq!(err.path(), Some("items[0].id"));
    }

    #[test]
    fn test_array_template_with_non_empty_paths() {
        let expected = json!({"items": [{"id": "x", "qty": 1}]});
        let actual = json!({"items": [{"id": "a", "qty": 5}, {"id": "b", "qty": 2}]});
        let (result, _) = run(
            &actual,
            &expected,
            MatchMode::Exact,
            &["items[0].id", "items[0].qty", "items[1].id", "items[1].qty"],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_array_length_is_not_compared() {
        let expected = json!({"items": [{"kind": "card"}, {"kind": "other"}, {"kind": "x"}]});
        let actual = json!({"items": [{"kind": "card"}]});
        let (result, _) = run(&actual, &expected, MatchMode::Exact, &[]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_primitive_template_checks_type_only() {
        let expected = json!({"tags": ["a"]});
        let (ok, _) = run(&json!({"tags": ["x", "y"]}), &expected, MatchMode::Exact, &[]);
        assert!(ok.is_ok());

        let (err, _) = run(&json!({"tags": ["x", 3]}), &expected, MatchMode::Exact, &[]);
        match err.unwrap_err() {
            ValidationError::ElementTypeMismatch { path, expected, actual } => {
                assert_eq!(path, "tags[1]");
                assert_eq!(expected, "string");
                assert_eq!(actual, "number");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_expected_array_accepts_any_array() {
        let (result, _) = run(&json!({"list": [1, "a", {}]}), &json!({"list": []}), MatchMode::Exact, &[]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_container_kind_mismatches() {
        let (arr, _) = run(&json!({"items": {}}), &json!({"items": []}), MatchMode::Exact, &[]);
        assert!(arr.unwrap_err().to_string().starts_with("items should be an array"));

        let (obj, _) = run(&json!({"meta": null}), &json!({"meta": {"a": 1}}), MatchMode::Exact, &[]);
        assert!(obj.unwrap_err().to_string().starts_with("meta should be an object"));
    }

    #[test]
    fn test_null_leaf_comparison() {
        let (ok, _) = run(&json!({"v": null}), &json!({"v": null}), MatchMode::Exact, &[]);
        assert!(ok.is_ok());

        let (err, _) = run(&json!({"v": 0}), &json!({"v": null}), MatchMode::Exact, &[]);
        assert!(matches!(err, Err(ValidationError::ValueMismatch { .. })));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let (result, _) = run(&json!({"amount": 10.0}), &json!({"amount": 10}), MatchMode::Exact, &[]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_exact_mode_warns_on_extra_keys_at_each_level() {
        let expected = json!({"data": {"id": 1}});
        let actual = json!({"data": {"id": 1, "extra": true}, "meta": {}});
        let (result, report) = run(&actual, &expected, MatchMode::Exact, &[]);
        assert!(result.is_ok());

        let extras: Vec<_> = report.warnings_of(WarningKind::ExtraProperties).collect();
        assert_eq!(extras.len(), 2);
        assert_eq!(extras[0].path, None);
        assert!(extras[0].message.contains("meta"));
        assert_eq!(extras[1].path.as_deref(), Some("data"));
    }

    #[test]
    fn test_subset_mode_is_silent_on_extra_keys() {
        let (result, report) = run(
            &json!({"a": 1, "b": 2}),
            &json!({"a": 1}),
            MatchMode::Subset,
            &[],
        );
        assert!(result.is_ok());
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_non_object_expectation_is_ignored() {
        let (result, _) = run(&json!([1, 2]), &json!("anything"), MatchMode::Exact, &[]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_dotted_key_exempted_by_quoted_path() {
        let expected = json!({"meta.createdAt": "2024-01-01"});
        let actual = json!({"meta.createdAt": "2025-06-01"});

        let (result, _) = run(&actual, &expected, MatchMode::Exact, &[]);
        let err = result.unwrap_err();
        assert_eq!(err.path(), Some(r#"["meta.createdAt"]"#));

        let (result, _) = run(&actual, &expected, MatchMode::Exact, &[r#"["meta.createdAt"]"#]);
        assert!(result.is_ok());

        // The unquoted form addresses meta -> createdAt, not this key
        let (result, _) = run(&actual, &expected, MatchMode::Exact, &["meta.createdAt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_first_violation_wins() {
        let expected = json!({"a": 1, "b": 2, "c": 3});
        let actual = json!({"a": 9, "c": 3});
        let (result, _) = run(&actual, &expected, MatchMode::Exact, &[]);
        assert!(matches!(result, Err(ValidationError::ValueMismatch { ref key, .. }) if key == "a"));
    }
}
