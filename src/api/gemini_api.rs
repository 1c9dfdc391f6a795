use crate::api::error::GenAiError;
use crate::api::schema::Schema;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";

/// A block of conversation content (one turn, or the system instruction)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.into()),
                thought: None,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    // Set on thinking summaries, which are not part of the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub google_search: GoogleSearch,
}

/// Live web search augmentation. Serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GoogleSearch {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

/// Body of a `generateContent` call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WebSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl GenerateContentResponse {
    /// Answer text of the first candidate, thinking parts excluded.
    /// `None` when the model produced nothing.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter(|part| part.thought != Some(true))
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Grounding source URLs in the order the service listed them
    pub fn citations(&self) -> Vec<Option<String>> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .map(|chunk| chunk.web.as_ref().and_then(|w| w.uri.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Error envelope returned by Google APIs
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Anything that can answer a `generateContent` call
#[async_trait]
pub trait GenerativeService: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenAiError>;
}

/// Gemini REST client. Built once from configuration and shared.
pub struct GenAiClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GenAiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, GEMINI_API_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl GenerativeService for GenAiClient {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenAiError> {
        let url = format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, API_VERSION, model
        );

        info!("Calling Gemini model {}", model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = match serde_json::from_slice::<ApiErrorEnvelope>(&body) {
                Ok(envelope) => match envelope.error.status {
                    Some(code) => format!("{}: {}", code, envelope.error.message),
                    None => envelope.error.message,
                },
                Err(_) => String::from_utf8_lossy(&body).into_owned(),
            };
            return Err(GenAiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::Transient;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn structured_request() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::text(Some("user"), "Top NBA news")],
            system_instruction: Some(Content::text(None, "Be precise.")),
            tools: vec![Tool {
                google_search: GoogleSearch::default(),
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(Schema::array(Schema::string())),
                thinking_config: Some(ThinkingConfig {
                    thinking_budget: 4096,
                }),
            }),
        }
    }

    #[test]
    fn test_request_wire_format() {
        let value = serde_json::to_value(structured_request()).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "Top NBA news"}]}],
                "systemInstruction": {"parts": [{"text": "Be precise."}]},
                "tools": [{"googleSearch": {}}],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": {"type": "ARRAY", "items": {"type": "STRING"}},
                    "thinkingConfig": {"thinkingBudget": 4096}
                }
            })
        );
    }

    #[test]
    fn test_text_skips_thoughts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Checking injury reports...", "thought": true},
                        {"text": "[\"a\","},
                        {"text": "\"b\"]"}
                    ]
                }
            }]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("[\"a\",\"b\"]"));
    }

    #[test]
    fn test_missing_text_and_citations() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert_eq!(response.text(), None);
        assert!(response.citations().is_empty());

        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"parts": [{"text": "[]"}]},
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://x.com/ShamsCharania/status/1", "title": "x.com"}},
                        {"retrievedContext": {}},
                        {"web": {"uri": "https://espn.com/nba/story"}}
                    ]
                }
            }]
        }))
        .unwrap();
        assert_eq!(
            response.citations(),
            vec![
                Some("https://x.com/ShamsCharania/status/1".to_string()),
                None,
                Some("https://espn.com/nba/story".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_generate_posts_to_model_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({"tools": [{"googleSearch": {}}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "[]"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GenAiClient::with_base_url("test-key".to_string(), format!("{}/", server.uri()));
        let response = client
            .generate("gemini-2.5-flash", &structured_request())
            .await
            .unwrap();

        assert_eq!(response.text().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_error_envelope_is_decoded() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {
                    "code": 429,
                    "message": "Resource has been exhausted (e.g. check quota).",
                    "status": "RESOURCE_EXHAUSTED"
                }
            })))
            .mount(&server)
            .await;

        let client = GenAiClient::with_base_url("test-key".to_string(), server.uri());
        let err = client
            .generate("gemini-2.5-pro", &structured_request())
            .await
            .unwrap_err();

        match &err {
            GenAiError::Api { status, message } => {
                assert_eq!(*status, 429);
                assert!(message.starts_with("RESOURCE_EXHAUSTED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_transient() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "code": 400,
                    "message": "API key not valid. Please pass a valid API key.",
                    "status": "INVALID_ARGUMENT"
                }
            })))
            .mount(&server)
            .await;

        let client = GenAiClient::with_base_url(String::new(), server.uri());
        let err = client
            .generate("gemini-2.5-flash", &structured_request())
            .await
            .unwrap_err();

        assert!(matches!(err, GenAiError::Api { status: 400, .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    #[ignore]
    async fn test_live_generate() {
        dotenv::dotenv().ok();
        let api_key = std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY not set");
        let client = GenAiClient::new(api_key);

        let request = GenerateContentRequest {
            contents: vec![Content::text(Some("user"), "Name one NBA team.")],
            ..Default::default()
        };
        let response = client.generate("gemini-2.5-flash", &request).await.unwrap();
        assert!(response.text().is_some());
    }
}
