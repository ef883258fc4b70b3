//! finprobe response validation engine
//!
//! Compares an HTTP response against a declarative expectation document and
//! either returns a report of advisory warnings or the first fatal violation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  validate_api_response(doc, response)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  envelope      status (fatal), timing + headers (warn)      │
//! │  structural    expectedBody (exact), subsetExpectedBody     │
//! │  non_empty     nonEmptyFields                               │
//! │  classifiers   amounts, transaction IDs, masking (warn)     │
//! │  rules         customValidations                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  path          FieldPath: `a.b[0].c` generation/resolution  │
//! │  context       SuiteContext: values shared between steps    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation is a pure function of its two inputs: no I/O, no shared state.

pub mod classifiers;
pub mod context;
pub mod envelope;
pub mod error;
pub mod expectation;
pub mod json;
pub mod non_empty;
pub mod orchestrator;
pub mod path;
pub mod report;
pub mod response;
pub mod rules;
pub mod structural;

pub use context::SuiteContext;
pub use error::{ErrorCategory, ValidationError, ValidationResult};
pub use expectation::{CustomRule, ExpectationDocument, HttpMethod, RuleKind, TestSuite};
pub use orchestrator::{validate_api_response, validate_api_response_into};
pub use path::{FieldPath, PathSegment};
pub use report::{Check, ValidationReport, Warning, WarningKind};
pub use response::ActualResponse;
pub use structural::{MatchMode, StructuralValidator};
