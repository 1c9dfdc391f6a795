use thiserror::Error;

/// Failure talking to the generative AI service
#[derive(Error, Debug)]
pub enum GenAiError {
    /// The service answered with a non-success status
    #[error("Gemini API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Gemini request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gemini returned no response text")]
    EmptyResponse,

    #[error("Failed to parse structured response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors that can tell whether trying again might help
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Rate limiting and temporary unavailability
const TRANSIENT_STATUSES: [u16; 2] = [429, 503];

impl Transient for GenAiError {
    fn is_transient(&self) -> bool {
        match self {
            GenAiError::Api { status, message } => {
                TRANSIENT_STATUSES.contains(status) || mentions_transient_status(message)
            }
            // Without a status it's a connect/timeout/body failure, never a rate limit
            GenAiError::Transport(e) => e
                .status()
                .is_some_and(|status| TRANSIENT_STATUSES.contains(&status.as_u16())),
            GenAiError::EmptyResponse | GenAiError::Decode(_) => false,
        }
    }
}

fn mentions_transient_status(message: &str) -> bool {
    TRANSIENT_STATUSES
        .iter()
        .any(|status| message.contains(&status.to_string()))
}
