//! HTTP transport: turns a prepared request into an [`ActualResponse`]

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use finprobe_validator::{ActualResponse, ExpectationDocument, HttpMethod, SuiteContext};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};

/// A fully interpolated request ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub bearer_token: Option<String>,
}

impl PreparedRequest {
    /// Build the request for a case, substituting stored suite values
    pub fn from_document(
        doc: &ExpectationDocument,
        config: &RunnerConfig,
        ctx: &SuiteContext,
    ) -> RunnerResult<Self> {
        let url = config.resolve_url(&ctx.interpolate(&doc.url))?;

        let params = doc
            .params
            .iter()
            .map(|(k, v)| (k.clone(), ctx.interpolate(v)))
            .collect();

        let mut headers = config.default_headers.clone();
        for (k, v) in &doc.headers {
            headers.insert(k.to_ascii_lowercase(), ctx.interpolate(v));
        }

        Ok(Self {
            method: doc.method,
            url,
            params,
            headers,
            body: doc.request_body.as_ref().map(|b| ctx.interpolate_value(b)),
            bearer_token: None,
        })
    }
}

/// Performs the network call for a case
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> RunnerResult<ActualResponse>;
}

/// [`Transport`] backed by `reqwest`
pub struct ReqwestTransport {
    client: reqwest::Client,
    retries: u32,
    backoff: Duration,
}

impl ReqwestTransport {
    pub fn new(config: &RunnerConfig) -> RunnerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            retries: config.retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    async fn send_once(&self, request: &PreparedRequest) -> Result<ActualResponse, reqwest::Error> {
        let mut builder = self.client.request(to_reqwest_method(request.method), &request.url);

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let bytes = response.bytes().await?;
        let duration_ms = started.elapsed().as_millis() as u64;

        Ok(ActualResponse {
            status,
            headers,
            data: decode_body(&bytes),
            duration_ms: Some(duration_ms),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &PreparedRequest) -> RunnerResult<ActualResponse> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(method = %request.method, url = %request.url, attempt, "sending request");

            match self.send_once(request).await {
                Ok(response) => return Ok(response),
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt <= self.retries => {
                    warn!("Request to {} failed ({}), retrying", request.url, e);
                    sleep(self.backoff * attempt).await;
                }
                Err(e) => {
                    return Err(RunnerError::Transport {
                        url: request.url.clone(),
                        attempts: attempt,
                        source: e,
                    })
                }
            }
        }
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}

/// JSON when possible, otherwise the raw text; an empty body is `null`
pub fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(b" \n"), Value::Null);
        assert_eq!(decode_body(br#"{"ok":true}"#), json!({"ok": true}));
        assert_eq!(decode_body(b"<html>oops</html>"), json!("<html>oops</html>"));
    }

    #[test]
    fn test_prepare_interpolates_from_context() {
        let doc = ExpectationDocument::from_json(
            r#"{
                "method": "POST",
                "url": "/v1/payments/{{paymentId}}/refunds",
                "params": {"currency": "{{currency}}"},
                "headers": {"Idempotency-Key": "refund-{{paymentId}}"},
                "requestBody": {"amount": "{{amount}}", "reason": "duplicate"}
            }"#,
        )
        .unwrap();

        let mut ctx = SuiteContext::new();
        ctx.store("paymentId", json!("PAY_778899"));
        ctx.store("currency", json!("EUR"));
        ctx.store("amount", json!(12.5));

        let mut config = RunnerConfig {
            base_url: "https://api.example.com".into(),
            ..Default::default()
        };
        config
            .default_headers
            .insert("x-client".into(), "finprobe".into());

        let request = PreparedRequest::from_document(&doc, &config, &ctx).unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.url,
            "https://api.example.com/v1/payments/PAY_778899/refunds"
        );
        assert_eq!(request.params["currency"], "EUR");
        assert_eq!(request.headers["idempotency-key"], "refund-PAY_778899");
        assert_eq!(request.headers["x-client"], "finprobe");
        assert_eq!(
            request.body,
            Some(json!({"amount": 12.5, "reason": "duplicate"}))
        );
        assert!(request.bearer_token.is_none());
    }

    #[test]
    fn test_transport_builds_from_config() {
        assert!(ReqwestTransport::new(&RunnerConfig::default()).is_ok());
    }
}
