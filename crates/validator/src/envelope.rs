//! Checks on the response envelope: status code, timing and security headers

use std::collections::BTreeMap;

use crate::error::{ValidationError, ValidationResult};
use crate::report::{ValidationReport, WarningKind};

/// Exact status match; skipped when no status is expected
pub fn validate_status(expected: Option<u16>, actual: u16) -> ValidationResult<()> {
    match expected {
        Some(expected) if expected != actual => {
            Err(ValidationError::StatusMismatch { expected, actual })
        }
        _ => Ok(()),
    }
}

/// Soft response-time threshold
pub fn check_response_time(
    expected_ms: Option<u64>,
    actual_ms: Option<u64>,
    report: &mut ValidationReport,
) {
    if let (Some(limit), Some(took)) = (expected_ms, actual_ms) {
        if took > limit {
            report.warn(
                WarningKind::SlowResponse,
                None,
                format!("Response time {} ms exceeded expected {} ms", took, limit),
            );
        }
    }
}

/// Inspect well-known security headers. Never fails; every finding is a
/// warning. Header names are expected lower-cased.
pub fn check_security_headers(headers: &BTreeMap<String, String>, report: &mut ValidationReport) {
    if !headers.contains_key("content-type") {
        missing(report, "content-type");
    }

    if let Some(origin) = headers.get("access-control-allow-origin") {
        if origin.trim() == "*" {
            report.warn(
                WarningKind::InsecureHeader,
                Some("access-control-allow-origin".to_string()),
                "CORS allows any origin (*)",
            );
        }
    }

    match headers.get("x-content-type-options") {
        None => missing(report, "x-content-type-options"),
        Some(value) if !value.trim().eq_ignore_ascii_case("nosniff") => report.warn(
            WarningKind::InsecureHeader,
            Some("x-content-type-options".to_string()),
            format!("x-content-type-options should be nosniff, got {}", value),
        ),
        Some(_) => {}
    }

    match headers.get("x-frame-options") {
        None => missing(report, "x-frame-options"),
        Some(value) => {
            let value = value.trim();
            if !value.eq_ignore_ascii_case("DENY") && !value.eq_ignore_ascii_case("SAMEORIGIN") {
                report.warn(
                    WarningKind::InsecureHeader,
                    Some("x-frame-options".to_string()),
                    format!("x-frame-options should be DENY or SAMEORIGIN, got {}", value),
                );
            }
        }
    }
}

fn missing(report: &mut ValidationReport, name: &str) {
    report.warn(
        WarningKind::MissingHeader,
        Some(name.to_string()),
        format!("Security header {} is missing", name),
    );
}
