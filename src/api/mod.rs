pub mod error;
pub mod gemini_api;
pub mod retry;
pub mod schema;
pub mod structured;

pub use error::{GenAiError, Transient};
pub use gemini_api::{GenAiClient, GenerativeService};
pub use retry::{with_retry, RetryPolicy};
pub use schema::Schema;
pub use structured::{ConversationRequest, Grounded, StructuredClient, StructuredRequest};
