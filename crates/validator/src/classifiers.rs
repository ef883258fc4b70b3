//! Domain field classifiers: monetary amounts, transaction IDs and masking
//!
//! Each classifier resolves its declared paths independently and skips a path
//! whose value is missing or null; the checks only apply to fields that are
//! actually present in the response.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{ValidationError, ValidationResult};
use crate::json;
use crate::path::FieldPath;
use crate::report::{ValidationReport, WarningKind};

/// Largest accepted magnitude for a monetary value
pub const MAX_AMOUNT_MAGNITUDE: f64 = 1_000_000_000.0;

/// Decimal places tolerated without a precision warning
pub const MAX_AMOUNT_DECIMALS: usize = 2;

/// Transaction IDs must be longer than this many characters
pub const MIN_TRANSACTION_ID_LEN: usize = 5;

static TRANSACTION_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("transaction id pattern is valid"));

fn present<'v>(actual: &'v Value, path: &FieldPath) -> Option<&'v Value> {
    let value = path.resolve(actual).filter(|v| !v.is_null());
    if value.is_none() {
        debug!(path = %path, "field absent, classifier skipped");
    }
    value
}

/// Monetary fields must be finite numbers (or numeric strings) within
/// [`MAX_AMOUNT_MAGNITUDE`]. Numeric strings with more than
/// [`MAX_AMOUNT_DECIMALS`] decimal places only produce a warning.
pub fn validate_amounts(
    actual: &Value,
    fields: &[FieldPath],
    report: &mut ValidationReport,
) -> ValidationResult<()> {
    for path in fields {
        let Some(value) = present(actual, path) else {
            continue;
        };

        let amount = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|a| a.is_finite())
        .ok_or_else(|| ValidationError::InvalidAmount {
            path: path.to_string(),
            value: json::display(value),
        })?;

        if amount.abs() > MAX_AMOUNT_MAGNITUDE {
            return Err(ValidationError::AmountOutOfBounds {
                path: path.to_string(),
                value: json::display(value),
            });
        }

        if let Value::String(s) = value {
            if let Some((_, fraction)) = s.trim().split_once('.') {
                let decimals = fraction.chars().take_while(|c| c.is_ascii_digit()).count();
                if decimals > MAX_AMOUNT_DECIMALS {
                    report.warn(
                        WarningKind::ExcessPrecision,
                        Some(path.to_string()),
                        format!("Amount field {} has {} decimal places: {}", path, decimals, s),
                    );
                }
            }
        }
    }
    Ok(())
}

/// Transaction IDs must be strings longer than [`MIN_TRANSACTION_ID_LEN`]
/// characters made of letters, digits, `_` and `-`.
pub fn validate_transaction_ids(actual: &Value, fields: &[FieldPath]) -> ValidationResult<()> {
    for path in fields {
        let Some(value) = present(actual, path) else {
            continue;
        };

        let invalid = |reason: &str| ValidationError::InvalidTransactionId {
            path: path.to_string(),
            value: json::display(value),
            reason: reason.to_string(),
        };

        let Value::String(id) = value else {
            return Err(invalid("should be a string"));
        };
        if id.chars().count() <= MIN_TRANSACTION_ID_LEN {
            return Err(invalid("is too short"));
        }
        if !TRANSACTION_ID.is_match(id) {
            return Err(invalid("contains invalid characters"));
        }
    }
    Ok(())
}

/// Whether a string carries a masking marker (`***` or `XXX`)
pub fn is_masked(value: &str) -> bool {
    value.contains("***") || value.contains("XXX")
}

/// Card and account fields should be masked. Advisory only: an unmasked
/// value is reported as a warning.
pub fn check_masking(actual: &Value, fields: &[FieldPath], report: &mut ValidationReport) {
    for path in fields {
        let Some(Value::String(value)) = present(actual, path) else {
            continue;
        };

        let name = path.to_string().to_lowercase();
        if !(name.contains("card") || name.contains("account")) {
            continue;
        }

        if !is_masked(value) {
            report.warn(
                WarningKind::UnmaskedField,
                Some(path.to_string()),
                format!("Sensitive field {} does not appear to be masked", path),
            );
        }
    }
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    proptest! {
        #[test]
        fn amounts_within_bounds_pass(x in -MAX_AMOUNT_MAGNITUDE..=MAX_AMOUNT_MAGNITUDE) {
            let path = vec![FieldPath::parse("amount").unwrap()];
            let mut report = ValidationReport::new();
            let numeric = json!({"amount": x});
            let textual = json!({"amount": x.to_string()});
            prop_assert!(validate_amounts(&numeric, &path, &mut report).is_ok());
            prop_assert!(validate_amounts(&textual, &path, &mut report).is_ok());
        }

        #[test]
        fn amounts_beyond_bounds_fail(x in 1.000_001e9f64..1e15, negative in any::<bool>()) {
            let x = if negative { -x } else { x };
            let path = vec![FieldPath::parse("amount").unwrap()];
            let mut report = ValidationReport::new();
            let body = json!({"amount": x});
            prop_assert!(validate_amounts(&body, &path, &mut report).is_err());
        }

        #[test]
        fn well_formed_transaction_ids_pass(id in "[A-Za-z0-9_-]{6,24}") {
            let path = vec![FieldPath::parse("id").unwrap()];
            let body = json!({"id": id});
            prop_assert!(validate_transaction_ids(&body, &path).is_ok());
        }

        #[test]
        fn short_transaction_ids_fail(id in "[A-Za-z0-9_-]{1,5}") {
            let path = vec![FieldPath::parse("id").unwrap()];
            let body = json!({"id": id});
            prop_assert!(validate_transaction_ids(&body, &path).is_err());
        }

        #[test]
        fn transaction_ids_with_foreign_characters_fail(
            prefix in "[A-Za-z0-9]{3,8}",
            bad in "[ #@.!/]",
            suffix in "[A-Za-z0-9]{3,8}",
        ) {
            let id = format!("{prefix}{bad}{suffix}");
            let path = vec![FieldPath::parse("id").unwrap()];
            let body = json!({"id": id});
            prop_assert!(validate_transaction_ids(&body, &path).is_err());
        }
    }
}
