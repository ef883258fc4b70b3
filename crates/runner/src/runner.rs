//! Suite runner: executes cases in order against one shared context

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use finprobe_validator::{
    validate_api_response_into, ActualResponse, ErrorCategory, ExpectationDocument,
    SuiteContext, TestSuite, ValidationReport, Warning,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::{AuthSession, StaticToken, TokenSource};
use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::transport::{PreparedRequest, ReqwestTransport, Transport};

/// Outcome of a single case
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseResult {
    pub name: String,
    pub success: bool,
    pub status: Option<u16>,
    pub duration_ms: u64,
    pub warnings: Vec<Warning>,
    pub error: Option<String>,
    /// Set when the failure came from validation rather than the request
    pub error_category: Option<ErrorCategory>,
    /// Number of values stored into the suite context
    pub captured: usize,
}

impl CaseResult {
    fn request_failed(name: String, duration: Duration, err: &RunnerError) -> Self {
        Self {
            name,
            success: false,
            status: None,
            duration_ms: duration.as_millis() as u64,
            warnings: Vec::new(),
            error: Some(err.to_string()),
            error_category: None,
            captured: 0,
        }
    }
}

/// Outcome of a whole suite
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteResult {
    pub run_id: Uuid,
    pub name: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub results: Vec<CaseResult>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Runs suites against the API under test
#[derive(Clone)]
pub struct SuiteRunner {
    config: Arc<RunnerConfig>,
    transport: Arc<dyn Transport>,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl SuiteRunner {
    /// Runner with the `reqwest` transport and the token source the
    /// configuration asks for
    pub fn new(config: RunnerConfig) -> RunnerResult<Self> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        let tokens = token_source(&config)?;
        Ok(Self::with_transport(config, transport, tokens))
    }

    pub fn with_transport(
        config: RunnerConfig,
        transport: Arc<dyn Transport>,
        tokens: Option<Arc<dyn TokenSource>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            tokens,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every case of a suite in order. A failing case does not stop the
    /// suite; later cases simply see whatever the context holds.
    pub async fn run_suite(&self, suite: &TestSuite) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut ctx = SuiteContext::new();
        let mut results = Vec::with_capacity(suite.cases.len());
        let mut passed = 0;
        let mut failed = 0;

        info!("Running suite '{}' ({} case(s))", suite.name, suite.cases.len());

        for case in &suite.cases {
            let result = self.run_case(case, &mut ctx).await;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Suite '{}': {} passed, {} failed ({} ms)",
            suite.name, passed, failed, duration_ms
        );

        SuiteResult {
            run_id: Uuid::new_v4(),
            name: suite.name.clone(),
            total: suite.cases.len(),
            passed,
            failed,
            duration_ms,
            started_at,
            results,
        }
    }

    /// Send one case, validate the response and capture stored values
    pub async fn run_case(&self, doc: &ExpectationDocument, ctx: &mut SuiteContext) -> CaseResult {
        let start = Instant::now();
        let name = doc.display_name();
        debug!("Running case: {}", name);

        let response = match self.exchange(doc, ctx).await {
            Ok(response) => response,
            Err(e) => return CaseResult::request_failed(name, start.elapsed(), &e),
        };

        let duration_ms = response
            .duration_ms
            .unwrap_or_else(|| start.elapsed().as_millis() as u64);

        let mut report = ValidationReport::new();
        match validate_api_response_into(doc, &response, &mut report) {
            Ok(()) => {
                let captured = ctx.capture(&doc.store, &response.data);
                CaseResult {
                    name,
                    success: true,
                    status: Some(response.status),
                    duration_ms,
                    warnings: report.warnings,
                    error: None,
                    error_category: None,
                    captured,
                }
            }
            Err(e) => CaseResult {
                name,
                success: false,
                status: Some(response.status),
                duration_ms,
                warnings: report.warnings,
                error_category: Some(e.category()),
                error: Some(e.to_string()),
                captured: 0,
            },
        }
    }

    async fn exchange(
        &self,
        doc: &ExpectationDocument,
        ctx: &SuiteContext,
    ) -> RunnerResult<ActualResponse> {
        let mut request = PreparedRequest::from_document(doc, &self.config, ctx)?;

        let tokens = if doc.skip_auth {
            None
        } else {
            self.tokens.as_deref()
        };
        if let Some(source) = tokens {
            request.bearer_token = Some(source.token().await?);
        }

        let response = self.transport.send(&request).await?;

        // A rejected token gets one refresh unless the case expects the 401
        if response.status == 401 && doc.expected_status != Some(401) {
            if let Some(source) = tokens {
                warn!("{} returned 401, refreshing token", request.url);
                source.invalidate().await;
                request.bearer_token = Some(source.token().await?);
                return self.transport.send(&request).await;
            }
        }

        Ok(response)
    }

    /// Run independent suites concurrently; results keep the input order
    pub async fn run_suites(&self, suites: Vec<TestSuite>) -> RunnerResult<Vec<SuiteResult>> {
        let mut set = JoinSet::new();
        let count = suites.len();

        for (index, suite) in suites.into_iter().enumerate() {
            let runner = self.clone();
            set.spawn(async move { (index, runner.run_suite(&suite).await) });
        }

        let mut slots: Vec<Option<SuiteResult>> = vec![None; count];
        while let Some(joined) = set.join_next().await {
            let (index, result) = joined?;
            slots[index] = Some(result);
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Write `<output_dir>/<suite>-results.json` and return its path
    pub fn write_results(&self, result: &SuiteResult) -> RunnerResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        let path = self
            .config
            .output_dir
            .join(format!("{}-results.json", file_stem(&result.name)));
        std::fs::write(&path, serde_json::to_string_pretty(result)?)?;
        info!("Results written to {}", path.display());
        Ok(path)
    }
}

fn token_source(config: &RunnerConfig) -> RunnerResult<Option<Arc<dyn TokenSource>>> {
    let Some(auth) = &config.auth else {
        return Ok(None);
    };

    if let Some(token) = &auth.static_token {
        return Ok(Some(Arc::new(StaticToken::new(token.clone()))));
    }
    if auth.token_url.is_some() {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        return Ok(Some(Arc::new(AuthSession::new(auth, client)?)));
    }
    Ok(None)
}

fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    if stem.is_empty() {
        "suite".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use test_case::test_case;

    #[test_case("payments", "payments" ; "plain")]
    #[test_case("Card API / v2", "Card-API---v2" ; "spaces and slash")]
    #[test_case("", "suite" ; "empty")]
    fn test_file_stem(name: &str, expected: &str) {
        assert_eq!(file_stem(name), expected);
    }

    #[test]
    fn test_token_source_selection() {
        assert!(token_source(&RunnerConfig::default()).unwrap().is_none());

        let config = RunnerConfig {
            auth: Some(AuthConfig {
                static_token: Some("tok".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(token_source(&config).unwrap().is_some());

        let config = RunnerConfig {
            auth: Some(AuthConfig {
                token_url: Some("https://auth.example.com/token".into()),
                client_id: Some("qa".into()),
                client_secret: Some("s3cret".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(token_source(&config).unwrap().is_some());
    }

    #[test]
    fn test_suite_result_success() {
        let result = SuiteResult {
            run_id: Uuid::new_v4(),
            name: "s".into(),
            total: 0,
            passed: 0,
            failed: 0,
            duration_ms: 0,
            started_at: Utc::now(),
            results: vec![],
        };
        assert!(result.success());
    }
}
