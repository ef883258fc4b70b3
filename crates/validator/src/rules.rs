//! Ad hoc custom validation rules

use serde_json::Value;

use crate::error::{ValidationError, ValidationResult};
use crate::expectation::{CustomRule, RuleKind};
use crate::json;
use crate::report::{ValidationReport, WarningKind};

/// Apply rules in order, stopping at the first failure
pub fn apply_custom_rules(
    actual: &Value,
    rules: &[CustomRule],
    report: &mut ValidationReport,
) -> ValidationResult<()> {
    rules
        .iter()
        .try_for_each(|rule| apply_custom_rule(actual, rule, report))
}

/// Apply a single rule. Unknown rule types are reported and skipped.
pub fn apply_custom_rule(
    actual: &Value,
    rule: &CustomRule,
    report: &mut ValidationReport,
) -> ValidationResult<()> {
    let fail = |reason: String| ValidationError::RuleFailed {
        rule: rule.rule_type.clone(),
        path: rule.field.to_string(),
        reason,
    };

    let kind = rule.kind();
    if let RuleKind::Unknown(name) = &kind {
        report.warn(
            WarningKind::UnknownRule,
            Some(rule.field.to_string()),
            format!("Unknown custom validation type: {}", name),
        );
        return Ok(());
    }

    let value = rule
        .field
        .resolve(actual)
        .ok_or_else(|| fail("field not found".to_string()))?;

    match kind {
        RuleKind::ArrayLength => {
            let expected = rule
                .expected_length
                .ok_or_else(|| fail("expectedLength is required".to_string()))?;
            match value {
                Value::Array(items) if items.len() == expected => Ok(()),
                Value::Array(items) => Err(fail(format!(
                    "expected length {}, got {}",
                    expected,
                    items.len()
                ))),
                other => Err(fail(format!(
                    "expected an array, got {}",
                    json::type_name(other)
                ))),
            }
        }
        RuleKind::Contains => {
            let expected = rule
                .expected_value
                .as_ref()
                .ok_or_else(|| fail("expectedValue is required".to_string()))?;
            let found = match value {
                Value::Array(items) => items.iter().any(|item| json::loose_eq(item, expected)),
                Value::String(s) => s.contains(json::display(expected).as_str()),
                other => {
                    return Err(fail(format!(
                        "expected an array or string, got {}",
                        json::type_name(other)
                    )))
                }
            };
            if found {
                Ok(())
            } else {
                Err(fail(format!("does not contain {}", json::display(expected))))
            }
        }
        RuleKind::GreaterThan => {
            let threshold = rule
                .expected_value
                .as_ref()
                .and_then(json::as_number)
                .ok_or_else(|| fail("expectedValue must be numeric".to_string()))?;
            let number = json::as_number(value)
                .ok_or_else(|| fail(format!("{} is not numeric", json::display(value))))?;
            if number > threshold {
                Ok(())
            } else {
                Err(fail(format!(
                    "{} is not greater than {}",
                    json::display(value),
                    threshold
                )))
            }
        }
        RuleKind::DataType => {
            let expected = rule
                .expected_type
                .as_deref()
                .ok_or_else(|| fail("expectedType is required".to_string()))?;
            let actual_type = json::type_name(value);
            if actual_type == expected {
                Ok(())
            } else {
                Err(fail(format!("expected type {}, got {}", expected, actual_type)))
            }
        }
        RuleKind::Unknown(_) => Ok(()),
    }
}
