//! HTTP-backed translator.
//!
//! POSTs `{source, target_lang, prior_target}` to the configured endpoint
//! and expects `{"content": "..."}` back. Status and transport failures map
//! onto the engine's error taxonomy: 429 is a retryable rate limit, 5xx and
//! transport errors are retryable outages, anything else is a broken
//! response contract.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use polydoc_engine::{TranslateError, TranslateRequest, Translator};

/// Ceiling for a single translation call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct HttpTranslator {
    endpoint: String,
    agent: ureq::Agent,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    source: &'a str,
    target_lang: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prior_target: Option<&'a str>,
}

#[derive(Deserialize)]
struct WireResponse {
    content: String,
}

impl HttpTranslator {
    pub fn new(endpoint: String) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .build();
        Self { endpoint, agent }
    }
}

impl Translator for HttpTranslator {
    fn translate(&self, request: &TranslateRequest) -> Result<String, TranslateError> {
        let payload = WireRequest {
            source: &request.source_content,
            target_lang: &request.target_language.0,
            prior_target: request.prior_target.as_deref(),
        };

        let response = self
            .agent
            .post(&self.endpoint)
            .send_json(&payload)
            .map_err(classify_send_error)?;

        let body: WireResponse = response
            .into_json()
            .map_err(|e| TranslateError::MalformedResponse(e.to_string()))?;
        if body.content.trim().is_empty() {
            return Err(TranslateError::MalformedResponse(
                "backend returned empty content".to_string(),
            ));
        }
        Ok(body.content)
    }
}

fn classify_send_error(err: ureq::Error) -> TranslateError {
    match err {
        ureq::Error::Status(429, _) => TranslateError::RateLimited,
        ureq::Error::Status(code, _) if code >= 500 => {
            TranslateError::NetworkUnavailable(format!("backend returned HTTP {code}"))
        }
        ureq::Error::Status(code, _) => {
            TranslateError::MalformedResponse(format!("backend returned HTTP {code}"))
        }
        ureq::Error::Transport(transport) => {
            TranslateError::NetworkUnavailable(transport.to_string())
        }
    }
}
