//! Scripted stand-in for the Gemini service used by unit tests

use crate::api::error::GenAiError;
use crate::api::gemini_api::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerativeService,
    GroundingChunk, GroundingMetadata, WebSource,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

struct Scripted {
    delay: Option<Duration>,
    result: Result<GenerateContentResponse, GenAiError>,
}

/// Answers calls in order from a queue and records every request
#[derive(Default)]
pub struct ScriptedService {
    queue: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<(String, GenerateContentRequest)>>,
}

pub fn text_response(text: &str, citations: &[&str]) -> GenerateContentResponse {
    let grounding_metadata = if citations.is_empty() {
        None
    } else {
        Some(GroundingMetadata {
            grounding_chunks: citations
                .iter()
                .map(|uri| GroundingChunk {
                    web: Some(WebSource {
                        uri: Some(uri.to_string()),
                        title: None,
                    }),
                })
                .collect(),
        })
    };

    GenerateContentResponse {
        candidates: vec![Candidate {
            content: Some(Content::text(Some("model"), text)),
            grounding_metadata,
        }],
    }
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, delay: Option<Duration>, result: Result<GenerateContentResponse, GenAiError>) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Scripted { delay, result });
    }

    pub fn push_text(&self, text: &str) {
        self.push(None, Ok(text_response(text, &[])));
    }

    pub fn push_json(&self, value: serde_json::Value) {
        self.push_text(&value.to_string());
    }

    pub fn push_json_with_citations(&self, value: serde_json::Value, citations: &[&str]) {
        self.push(None, Ok(text_response(&value.to_string(), citations)));
    }

    /// Respond with JSON only after `delay` has passed
    pub fn push_json_delayed(&self, value: serde_json::Value, delay: Duration) {
        self.push(Some(delay), Ok(text_response(&value.to_string(), &[])));
    }

    /// A candidate with no text at all
    pub fn push_empty(&self) {
        self.push(
            None,
            Ok(GenerateContentResponse {
                candidates: vec![Candidate::default()],
            }),
        );
    }

    pub fn push_error(&self, error: GenAiError) {
        self.push(None, Err(error));
    }

    pub fn requests(&self) -> Vec<(String, GenerateContentRequest)> {
        self.requests.lock().unwrap().clone()
    }

    /// Prompt text of the last user turn of request `index`
    pub fn prompt(&self, index: usize) -> String {
        let requests = self.requests.lock().unwrap();
        requests[index]
            .1
            .contents
            .last()
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GenerativeService for ScriptedService {
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenAiError> {
        self.requests
            .lock()
            .unwrap()
            .push((model.to_string(), request.clone()));

        let next = self.queue.lock().unwrap().pop_front();
        let Some(next) = next else {
            return Err(GenAiError::Api {
                status: 500,
                message: "no scripted response".to_string(),
            });
        };

        if let Some(delay) = next.delay {
            tokio::time::sleep(delay).await;
        }
        next.result
    }
}
