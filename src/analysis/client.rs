//! External analysis client — the single untrusted collaborator.
//!
//! `GeminiClient` talks to a Gemini-style `generateContent` endpoint. The
//! uploaded PDF is inlined base64-encoded next to the prompt. When
//! structured output is enabled the request carries a response schema and
//! the reply is expected to already conform; otherwise the reply is free
//! text that the normalizer has to parse and repair locally.

use std::path::Path;

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::prompt::response_schema;
use super::AnalysisError;

/// What the upstream service handed back.
///
/// The normalizer is exhaustive over both variants: a schema-validated
/// object needs no parsing, free text goes through the repair chain.
#[derive(Debug, Clone)]
pub enum ModelOutput {
    Structured(serde_json::Value),
    FreeText(String),
}

/// A document-understanding service that can analyse one stored document
/// against a prompt. Implementations are blocking; the HTTP layer drives
/// them through `spawn_blocking`.
pub trait AnalysisClient: Send + Sync {
    fn analyze(
        &self,
        document: &Path,
        prompt: &str,
        system: &str,
    ) -> Result<ModelOutput, AnalysisError>;
}

/// Gemini `generateContent` client over blocking reqwest.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    structured_output: bool,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        structured_output: bool,
    ) -> Result<Self, AnalysisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AnalysisError::Upstream(format!("HTTP client init failed: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            structured_output,
            client,
            timeout_secs,
        })
    }
}

// ── Wire types (Gemini REST dialect) ──────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    #[serde(rename = "systemInstruction")]
    system_instruction: ContentParts<'a>,
    contents: Vec<ContentParts<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct ContentParts<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
enum Part<'a> {
    #[serde(rename = "text")]
    Text(&'a str),
    #[serde(rename = "inlineData")]
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: String,
        data: String,
    },
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    #[serde(rename = "responseSchema")]
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl AnalysisClient for GeminiClient {
    fn analyze(
        &self,
        document: &Path,
        prompt: &str,
        system: &str,
    ) -> Result<ModelOutput, AnalysisError> {
        let bytes = std::fs::read(document)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = GenerateRequest {
            system_instruction: ContentParts {
                parts: vec![Part::Text(system)],
            },
            contents: vec![ContentParts {
                parts: vec![
                    Part::InlineData {
                        mime_type: "application/pdf".into(),
                        data: encoded,
                    },
                    Part::Text(prompt),
                ],
            }],
            generation_config: self.structured_output.then(|| GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            }),
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                AnalysisError::Upstream(format!("Cannot reach analysis API at {}", self.base_url))
            } else if e.is_timeout() {
                AnalysisError::Upstream(format!(
                    "Analysis API timed out after {}s",
                    self.timeout_secs
                ))
            } else {
                AnalysisError::Upstream(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AnalysisError::Upstream(format!(
                "Analysis API returned status {status}: {body}"
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| AnalysisError::Upstream(format!("Unexpected response body: {e}")))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AnalysisError::Upstream(
                "Analysis API returned no candidates".into(),
            ));
        }

        // Structured mode: the service validated the reply against our
        // schema, so a parse failure here means it fell back to free text.
        if self.structured_output {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
                return Ok(ModelOutput::Structured(value));
            }
            tracing::warn!("Structured output requested but reply is not JSON, treating as text");
        }

        Ok(ModelOutput::FreeText(text))
    }
}

/// Mock analysis client for tests — returns a configured output or error.
pub struct MockAnalysisClient {
    outcome: Result<ModelOutput, String>,
}

impl MockAnalysisClient {
    pub fn structured(value: serde_json::Value) -> Self {
        Self {
            outcome: Ok(ModelOutput::Structured(value)),
        }
    }

    pub fn free_text(text: &str) -> Self {
        Self {
            outcome: Ok(ModelOutput::FreeText(text.to_string())),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
        }
    }
}

impl AnalysisClient for MockAnalysisClient {
    fn analyze(
        &self,
        _document: &Path,
        _prompt: &str,
        _system: &str,
    ) -> Result<ModelOutput, AnalysisError> {
        match &self.outcome {
            Ok(output) => Ok(output.clone()),
            Err(msg) => Err(AnalysisError::Upstream(msg.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_client_trims_trailing_slash() {
        let client =
            GeminiClient::new("https://example.test/", "key", "gemini-1.5-flash", 60, true)
                .unwrap();
        assert_eq!(client.base_url, "https://example.test");
        assert_eq!(client.timeout_secs, 60);
    }

    #[test]
    fn request_body_carries_schema_only_when_structured() {
        let body = GenerateRequest {
            system_instruction: ContentParts {
                parts: vec![Part::Text("system")],
            },
            contents: vec![ContentParts {
                parts: vec![Part::Text("prompt")],
            }],
            generation_config: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("generationConfig").is_none());

        let body = GenerateRequest {
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            }),
            ..body
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn inline_data_serializes_with_mime_type() {
        let part = Part::InlineData {
            mime_type: "application/pdf".into(),
            data: "QUJD".into(),
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["inlineData"]["mimeType"], "application/pdf");
    }

    #[test]
    fn candidate_response_concatenates_parts() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .map(|p| p.text.clone())
            .collect();
        assert_eq!(text, "{\"a\":1}");
    }

    #[test]
    fn mock_client_returns_configured_output() {
        let client = MockAnalysisClient::free_text("hello");
        let output = client
            .analyze(Path::new("/nonexistent"), "p", "s")
            .unwrap();
        assert!(matches!(output, ModelOutput::FreeText(t) if t == "hello"));
    }

    #[test]
    fn mock_client_failure_maps_to_upstream() {
        let client = MockAnalysisClient::failing("quota exceeded");
        let err = client
            .analyze(Path::new("/nonexistent"), "p", "s")
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Upstream(m) if m == "quota exceeded"));
    }
}
