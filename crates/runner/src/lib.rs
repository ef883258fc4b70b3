//! finprobe suite runner
//!
//! Drives expectation suites against a live API:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  SuiteRunner                                                │
//! │    ├── run_suites(suites)   concurrent, one task per suite  │
//! │    ├── run_suite(suite)     sequential, one SuiteContext    │
//! │    └── run_case(doc, ctx)                                   │
//! │          ├── PreparedRequest::from_document (interpolate)   │
//! │          ├── TokenSource::token  (static / client creds)    │
//! │          ├── Transport::send     (reqwest, retries)         │
//! │          ├── validate_api_response                          │
//! │          └── SuiteContext::capture (store)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod output;
pub mod runner;
pub mod transport;

pub use auth::{AuthSession, StaticToken, TokenSource};
pub use config::{AuthConfig, RunnerConfig};
pub use error::{RunnerError, RunnerResult};
pub use runner::{CaseResult, SuiteResult, SuiteRunner};
pub use transport::{PreparedRequest, ReqwestTransport, Transport};
