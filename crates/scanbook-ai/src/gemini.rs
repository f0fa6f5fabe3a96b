// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gemini `generateContent` client over blocking HTTP.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use scanbook_core::AppConfig;
use scanbook_core::error::{Result, ScanbookError};

use crate::generator::{Part, TextGenerator};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// HTTP client for the generative-language API.
pub struct GeminiClient {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(endpoint: &str, model: &str, api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ScanbookError::Ai(format!("HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client,
            timeout_secs,
        })
    }

    /// Client for the configured model, keyed from `GEMINI_API_KEY`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).ok();
        if api_key.is_none() {
            warn!("{API_KEY_ENV} is not set; AI features will fail");
        }
        Self::new(&config.ai_endpoint, &config.ai_model, api_key, config.ai_timeout_secs)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }
}

// -- Wire format --------------------------------------------------------------

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn request_body<'a>(parts: &[Part<'a>]) -> GenerateRequest<'a> {
    let parts = parts
        .iter()
        .map(|part| match *part {
            Part::Text(text) => RequestPart::Text { text },
            Part::Jpeg(jpeg) => RequestPart::Inline {
                inline_data: InlineData {
                    mime_type: "image/jpeg",
                    data: BASE64.encode(jpeg),
                },
            },
        })
        .collect();
    GenerateRequest {
        contents: vec![RequestContent { parts }],
    }
}

/// Text of the first candidate, all parts joined.
fn response_text(response: GenerateResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ScanbookError::Ai("model returned no text".into()));
    }
    Ok(text)
}

impl TextGenerator for GeminiClient {
    #[instrument(skip_all, fields(model = %self.model, parts = parts.len()))]
    fn generate(&self, parts: &[Part<'_>]) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ScanbookError::Ai(format!("{API_KEY_ENV} is not set")))?;

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&request_body(parts))
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ScanbookError::Ai(format!("request timed out after {}s", self.timeout_secs))
                } else {
                    ScanbookError::Ai(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ScanbookError::Ai(format!("HTTP {}: {}", status.as_u16(), body)));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ScanbookError::Ai(format!("unreadable response: {e}")))?;

        let text = response_text(parsed)?;
        debug!(chars = text.len(), "generation complete");
        Ok(text)
    }
}
