//! Reasoning service client and the assessment requestor
//!
//! The reasoning service is an opaque generative model behind a JSON
//! contract. [`GeminiClient`] talks to the Gemini `generateContent` API;
//! tests substitute their own [`ReasoningService`].

use async_trait::async_trait;
use guardian_common::config::ReasoningConfig;
use guardian_common::model::{MediaRef, MediaSource, Signal};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::prompt::build_emergency_prompt;

const USER_AGENT: &str = concat!("guardian-alert/", env!("CARGO_PKG_VERSION"));

/// Reasoning call errors
///
/// None of these reach an API caller: every one routes to the fallback assessor.
#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Reasoning call timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Reasoning service returned no text")]
    EmptyResponse,

    #[error("Reasoning service not configured: {0}")]
    NotConfigured(String),
}

/// One generation request: prompt text plus media attachments
#[derive(Debug, Clone)]
pub struct ReasoningRequest {
    pub prompt: String,
    pub attachments: Vec<MediaRef>,
}

/// Generative reasoning backend
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Model identifier, for logs and health output
    fn model(&self) -> &str;

    /// Raw model output text
    async fn generate(&self, request: &ReasoningRequest) -> Result<String, ReasoningError>;
}

/// Turns a signal into a prompt and calls the reasoning service once
#[derive(Clone)]
pub struct AssessmentRequestor {
    service: Arc<dyn ReasoningService>,
    timeout: Duration,
}

impl AssessmentRequestor {
    pub fn new(service: Arc<dyn ReasoningService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub fn model(&self) -> &str {
        self.service.model()
    }

    /// Raw output or a transport error; never retried
    pub async fn request(&self, signal: &Signal) -> Result<String, ReasoningError> {
        let request = ReasoningRequest {
            prompt: build_emergency_prompt(signal),
            attachments: signal.attachments().cloned().collect(),
        };

        tracing::debug!(
            model = self.service.model(),
            prompt_chars = request.prompt.len(),
            attachments = request.attachments.len(),
            "Calling reasoning service"
        );

        tokio::time::timeout(self.timeout, self.service.generate(&request))
            .await
            .map_err(|_| ReasoningError::Timeout(self.timeout))?
    }
}

// ---------------------------------------------------------------------------
// Gemini wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl From<&MediaRef> for Part {
    fn from(media: &MediaRef) -> Self {
        match &media.source {
            MediaSource::Uri(uri) => Part::FileData {
                file_data: FileData {
                    mime_type: media.mime_type.clone(),
                    file_uri: uri.clone(),
                },
            },
            MediaSource::Inline(data) => Part::InlineData {
                inline_data: InlineData {
                    mime_type: media.mime_type.clone(),
                    data: data.clone(),
                },
            },
        }
    }
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Duration,
    generation_config: GenerationConfig,
}

impl GeminiClient {
    pub fn new(config: &ReasoningConfig) -> Result<Self, ReasoningError> {
        let api_key = config
            .api_key()
            .ok_or_else(|| ReasoningError::NotConfigured("missing API key".to_string()))?
            .to_string();

        let timeout = Duration::from_millis(config.timeout_ms);
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ReasoningError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            timeout,
            generation_config: GenerationConfig {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                max_output_tokens: config.max_output_tokens,
            },
        })
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl ReasoningService for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &ReasoningRequest) -> Result<String, ReasoningError> {
        let mut parts = vec![Part::Text {
            text: request.prompt.clone(),
        }];
        parts.extend(request.attachments.iter().map(Part::from));

        let body = GenerateContentRequest {
            contents: vec![Content { role: "user", parts }],
            generation_config: self.generation_config.clone(),
        };

        let response = self
            .http_client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReasoningError::Timeout(self.timeout)
                } else {
                    ReasoningError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ReasoningError::Api(status.as_u16(), error_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ReasoningError::Parse(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ReasoningError::EmptyResponse);
        }

        tracing::info!(model = %self.model, chars = text.len(), "Reasoning service responded");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_common::model::MediaKind;

    #[test]
    fn test_client_requires_api_key() {
        let config = ReasoningConfig::default();
        assert!(matches!(
            GeminiClient::new(&config),
            Err(ReasoningError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_url_format() {
        let config = ReasoningConfig {
            api_key: Some("k".to_string()),
            endpoint: "https://generativelanguage.googleapis.com/".to_string(),
            ..Default::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let audio = MediaRef {
            kind: MediaKind::Audio,
            mime_type: "audio/wav".to_string(),
            source: MediaSource::Uri("gs://bucket/a.wav".to_string()),
        };
        let image = MediaRef {
            kind: MediaKind::Image,
            mime_type: "image/png".to_string(),
            source: MediaSource::Inline("aGk=".to_string()),
        };
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text {
                        text: "p".to_string(),
                    },
                    Part::from(&audio),
                    Part::from(&image),
                ],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: 2048,
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "p");
        assert_eq!(parts[1]["fileData"]["fileUri"], "gs://bucket/a.wav");
        assert_eq!(parts[2]["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn test_response_text_extraction() {
        let parsed: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#,
        )
        .unwrap();
        let content = parsed.candidates.into_iter().next().unwrap().content.unwrap();
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        assert_eq!(text, "{\"a\":1}");
    }

    struct SlowService;

    #[async_trait]
    impl ReasoningService for SlowService {
        fn model(&self) -> &str {
            "slow"
        }

        async fn generate(&self, _request: &ReasoningRequest) -> Result<String, ReasoningError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("{}".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_requestor_enforces_timeout() {
        let requestor = AssessmentRequestor::new(Arc::new(SlowService), Duration::from_millis(500));
        let signal = Signal::new(
            Some("help".to_string()),
            None,
            None,
            guardian_common::model::Context::new("2026-01-28T12:34:56.789Z"),
        )
        .unwrap();

        let result = requestor.request(&signal).await;
        assert!(matches!(result, Err(ReasoningError::Timeout(_))));
    }
}
