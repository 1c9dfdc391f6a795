use crate::api::gemini_api::{GenAiClient, GenerativeService};
use crate::models::ChatMessage;
use crate::queries::Queries;
use crate::views::slot::ViewError;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

pub const WELCOME_MESSAGE: &str = "Hi, I'm your NBA Betting Copilot. Ask me about player stats, \
team trends, or specific matchup details!";

const CHAT_ERROR: &str = "The copilot couldn't answer that. Please try again.";

struct ChatState {
    messages: Vec<ChatMessage>,
    is_typing: bool,
    error: Option<ViewError>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSnapshot {
    pub messages: Vec<ChatMessage>,
    pub is_typing: bool,
    pub error: Option<ViewError>,
}

/// One copilot conversation, opened with a welcome message
pub struct ChatView<S = GenAiClient> {
    queries: Arc<Queries<S>>,
    state: Arc<RwLock<ChatState>>,
}

impl<S> Clone for ChatView<S> {
    fn clone(&self) -> Self {
        Self {
            queries: self.queries.clone(),
            state: self.state.clone(),
        }
    }
}

impl<S: GenerativeService + 'static> ChatView<S> {
    pub fn new(queries: Arc<Queries<S>>) -> Self {
        let state = ChatState {
            messages: vec![ChatMessage::assistant(WELCOME_MESSAGE)],
            is_typing: false,
            error: None,
        };
        Self {
            queries,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Send `text` and wait for the reply. Returns false when the message
    /// was ignored (blank, or a reply is still pending).
    pub async fn send(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        let history = {
            let mut state = self.state.write().await;
            if state.is_typing {
                return false;
            }
            let history = state.messages.clone();
            state.messages.push(ChatMessage::user(text));
            state.is_typing = true;
            state.error = None;
            history
        };

        let outcome = self.queries.chat(&history, text).await;

        let mut state = self.state.write().await;
        match outcome {
            Ok(reply) => state.messages.push(ChatMessage::assistant(reply)),
            Err(e) => {
                warn!("Copilot reply failed: {}", e);
                state.error = Some(ViewError::from_service(&e, CHAT_ERROR));
            }
        }
        state.is_typing = false;
        true
    }

    pub async fn snapshot(&self) -> ChatSnapshot {
        let state = self.state.read().await;
        ChatSnapshot {
            messages: state.messages.clone(),
            is_typing: state.is_typing,
            error: state.error.clone(),
        }
    }
}
