use crate::api::error::GenAiError;
use crate::api::gemini_api::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, GenerativeService,
    GoogleSearch, ThinkingConfig, Tool,
};
use crate::api::retry::RetryPolicy;
use crate::api::schema::Schema;
use serde::de::DeserializeOwned;
use std::sync::Arc;

const JSON_MIME_TYPE: &str = "application/json";

/// One schema-constrained generation: prompt in, typed value out
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub model: String,
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub use_search: bool,
    pub schema: Schema,
    pub thinking_budget: Option<u32>,
}

impl StructuredRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, schema: Schema) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system_instruction: None,
            use_search: false,
            schema,
            thinking_budget: None,
        }
    }

    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_search(mut self) -> Self {
        self.use_search = true;
        self
    }

    pub fn thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }

    fn to_wire(&self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::text(Some("user"), self.prompt.clone())],
            system_instruction: self
                .system_instruction
                .as_ref()
                .map(|text| Content::text(None, text.clone())),
            tools: search_tools(self.use_search),
            generation_config: Some(GenerationConfig {
                response_mime_type: Some(JSON_MIME_TYPE.to_string()),
                response_schema: Some(self.schema.clone()),
                thinking_config: self.thinking_budget.map(|thinking_budget| ThinkingConfig {
                    thinking_budget,
                }),
            }),
        }
    }
}

/// A free-text conversational turn with prior context
#[derive(Debug, Clone)]
pub struct ConversationRequest {
    pub model: String,
    pub system_instruction: Option<String>,
    pub use_search: bool,
    /// Earlier turns as (role, text); role is "user" or "model"
    pub history: Vec<(String, String)>,
    pub message: String,
}

impl ConversationRequest {
    fn to_wire(&self) -> GenerateContentRequest {
        let mut contents: Vec<Content> = self
            .history
            .iter()
            .map(|(role, text)| Content::text(Some(role.as_str()), text.clone()))
            .collect();
        contents.push(Content::text(Some("user"), self.message.clone()));

        GenerateContentRequest {
            contents,
            system_instruction: self
                .system_instruction
                .as_ref()
                .map(|text| Content::text(None, text.clone())),
            tools: search_tools(self.use_search),
            generation_config: None,
        }
    }
}

fn search_tools(enabled: bool) -> Vec<Tool> {
    if enabled {
        vec![Tool {
            google_search: GoogleSearch::default(),
        }]
    } else {
        Vec::new()
    }
}

/// Parsed data plus the grounding sources the service attached
#[derive(Debug, Clone, PartialEq)]
pub struct Grounded<T> {
    pub data: T,
    /// Source URLs by position; `None` where a chunk had no web URI
    pub citations: Vec<Option<String>>,
}

/// Schema-constrained requests over any [`GenerativeService`], with retry
pub struct StructuredClient<S> {
    service: Arc<S>,
    retry: RetryPolicy,
}

impl<S> Clone for StructuredClient<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            retry: self.retry,
        }
    }
}

impl<S: GenerativeService> StructuredClient<S> {
    pub fn new(service: Arc<S>, retry: RetryPolicy) -> Self {
        Self { service, retry }
    }

    async fn send(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenAiError> {
        self.retry
            .run(|| self.service.generate(model, request))
            .await
    }

    /// List-shaped query. No response text means "nothing found".
    pub async fn fetch_list<T: DeserializeOwned>(
        &self,
        request: &StructuredRequest,
    ) -> Result<Grounded<Vec<T>>, GenAiError> {
        let response = self.send(&request.model, &request.to_wire()).await?;
        let citations = response.citations();
        let data = match response.text() {
            Some(text) => serde_json::from_str(&text)?,
            None => Vec::new(),
        };
        Ok(Grounded { data, citations })
    }

    /// Object-shaped query. No response text is an error: an empty object
    /// has no meaning for these shapes.
    pub async fn fetch_object<T: DeserializeOwned>(
        &self,
        request: &StructuredRequest,
    ) -> Result<Grounded<T>, GenAiError> {
        let response = self.send(&request.model, &request.to_wire()).await?;
        let citations = response.citations();
        let text = response.text().ok_or(GenAiError::EmptyResponse)?;
        let data = serde_json::from_str(&text)?;
        Ok(Grounded { data, citations })
    }

    /// Free-text conversation turn; `None` when the model said nothing
    pub async fn converse(
        &self,
        request: &ConversationRequest,
    ) -> Result<Option<String>, GenAiError> {
        let response = self.send(&request.model, &request.to_wire()).await?;
        Ok(response.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedService;
    use serde_json::json;

    fn client(service: &Arc<ScriptedService>) -> StructuredClient<ScriptedService> {
        StructuredClient::new(service.clone(), RetryPolicy::default())
    }

    fn request() -> StructuredRequest {
        StructuredRequest::new("gemini-2.5-flash", "List things", Schema::array(Schema::string()))
            .system_instruction("Only list real things.")
            .with_search()
    }

    #[tokio::test]
    async fn test_list_parses_and_keeps_citations() {
        let service = Arc::new(ScriptedService::new());
        service.push_json_with_citations(json!(["a", "b"]), &["https://a.example"]);

        let result: Grounded<Vec<String>> = client(&service).fetch_list(&request()).await.unwrap();
        assert_eq!(result.data, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(result.citations, vec![Some("https://a.example".to_string())]);

        let sent = service.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "gemini-2.5-flash");
        let body = serde_json::to_value(&sent[0].1).unwrap();
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["tools"], json!([{"googleSearch": {}}]));
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Only list real things.");
        assert!(body["generationConfig"].get("thinkingConfig").is_none());
    }

    #[tokio::test]
    async fn test_empty_list_response() {
        let service = Arc::new(ScriptedService::new());
        service.push_empty();
        service.push_json(json!([]));

        let client = client(&service);
        let missing: Grounded<Vec<String>> = client.fetch_list(&request()).await.unwrap();
        assert!(missing.data.is_empty());
        let empty: Grounded<Vec<String>> = client.fetch_list(&request()).await.unwrap();
        assert!(empty.data.is_empty());
    }

    #[tokio::test]
    async fn test_object_requires_text() {
        let service = Arc::new(ScriptedService::new());
        service.push_empty();

        let result = client(&service)
            .fetch_object::<serde_json::Value>(&request())
            .await;
        assert!(matches!(result, Err(GenAiError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_hard_error() {
        let service = Arc::new(ScriptedService::new());
        service.push_text("[\"a\", ");

        let result = client(&service).fetch_list::<String>(&request()).await;
        assert!(matches!(result, Err(GenAiError::Decode(_))));
        // Decode failures are not retried
        assert_eq!(service.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried() {
        let service = Arc::new(ScriptedService::new());
        service.push_error(GenAiError::Api {
            status: 503,
            message: "UNAVAILABLE".to_string(),
        });
        service.push_json(json!(["a"]));

        let result = client(&service).fetch_list::<String>(&request()).await.unwrap();
        assert_eq!(result.data, vec!["a".to_string()]);
        assert_eq!(service.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_conversation_sends_history() {
        let service = Arc::new(ScriptedService::new());
        service.push_text("Tatum is questionable.");

        let request = ConversationRequest {
            model: "gemini-2.5-flash".to_string(),
            system_instruction: None,
            use_search: true,
            history: vec![
                ("user".to_string(), "Is Tatum playing?".to_string()),
                ("model".to_string(), "Checking.".to_string()),
            ],
            message: "Any update?".to_string(),
        };
        let reply = client(&service).converse(&request).await.unwrap();
        assert_eq!(reply.as_deref(), Some("Tatum is questionable."));

        let body = serde_json::to_value(&service.requests()[0].1).unwrap();
        let roles: Vec<&str> = body["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert!(body.get("generationConfig").is_none());
    }
}
