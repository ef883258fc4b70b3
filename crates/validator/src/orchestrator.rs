//! Top-level validation of one response against one expectation document
//!
//! Passes run in a fixed order so that shape problems surface before value
//! problems:
//!
//! 1. status code (fatal)
//! 2. response time (warning)
//! 3. security headers (warnings)
//! 4. `expectedBody`, exact mode (fatal)
//! 5. `subsetExpectedBody`, subset mode (fatal)
//! 6. non-empty fields (fatal)
//! 7. monetary amounts (fatal, precision warnings)
//! 8. transaction IDs (fatal)
//! 9. data masking (warnings)
//! 10. custom rules (fatal, unknown types warn)
//!
//! The first fatal violation is returned. [`validate_api_response`] drops the
//! warnings gathered before it; [`validate_api_response_into`] leaves them in
//! the caller's report.

use tracing::debug;

use crate::classifiers::{check_masking, validate_amounts, validate_transaction_ids};
use crate::envelope::{check_response_time, check_security_headers, validate_status};
use crate::error::ValidationResult;
use crate::expectation::ExpectationDocument;
use crate::non_empty::validate_non_empty;
use crate::report::{Check, ValidationReport};
use crate::response::ActualResponse;
use crate::rules::apply_custom_rules;
use crate::structural::{MatchMode, StructuralValidator};

/// Validate `response` against `doc`
pub fn validate_api_response(
    doc: &ExpectationDocument,
    response: &ActualResponse,
) -> ValidationResult<ValidationReport> {
    let mut report = ValidationReport::new();
    validate_api_response_into(doc, response, &mut report)?;
    Ok(report)
}

/// Like [`validate_api_response`], accumulating into `report` so that
/// warnings raised before a fatal violation are still available
pub fn validate_api_response_into(
    doc: &ExpectationDocument,
    response: &ActualResponse,
    report: &mut ValidationReport,
) -> ValidationResult<()> {
    let name = doc.display_name();
    debug!(case = %name, status = response.status, "validating response");

    validate_status(doc.expected_status, response.status)?;
    report.record(Check::Status);

    if doc.expected_response_time.is_some() {
        check_response_time(doc.expected_response_time, response.duration_ms, report);
        report.record(Check::ResponseTime);
    }

    check_security_headers(&response.headers, report);
    report.record(Check::SecurityHeaders);

    let non_empty = doc.non_empty_set();

    if let Some(expected) = &doc.expected_body {
        StructuralValidator::new(MatchMode::Exact, &non_empty).validate_root(
            &response.data,
            expected,
            report,
        )?;
        report.record(Check::ExactBody);
    }

    if let Some(expected) = &doc.subset_expected_body {
        StructuralValidator::new(MatchMode::Subset, &non_empty).validate_root(
            &response.data,
            expected,
            report,
        )?;
        report.record(Check::SubsetBody);
    }

    if !doc.non_empty_fields.is_empty() {
        validate_non_empty(&response.data, &doc.non_empty_fields)?;
        report.record(Check::NonEmpty);
    }

    if doc.validate_amounts {
        validate_amounts(&response.data, &doc.amount_fields, report)?;
        report.record(Check::Amounts);
    }

    if doc.validate_transaction_ids {
        validate_transaction_ids(&response.data, &doc.transaction_id_fields)?;
        report.record(Check::TransactionIds);
    }

    if doc.validate_data_masking {
        check_masking(&response.data, &doc.sensitive_fields, report);
        report.record(Check::Masking);
    }

    if !doc.custom_validations.is_empty() {
        apply_custom_rules(&response.data, &doc.custom_validations, report)?;
        report.record(Check::Custom);
    }

    debug!(
        case = %name,
        warnings = report.warnings.len(),
        "response validated"
    );
    Ok(())
}
