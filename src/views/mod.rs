pub mod analyzer;
pub mod chat;
pub mod feed;
pub mod player;
pub mod refresh;
pub mod slot;

pub use analyzer::{AnalyzerMode, AnalyzerSnapshot, AnalyzerView, BetFilter, PARLAY_STAGES};
pub use chat::{ChatSnapshot, ChatView, WELCOME_MESSAGE};
pub use feed::NewsFeedView;
pub use player::{PlayerLookupView, PlayerSnapshot};
pub use refresh::RefreshHandle;
pub use slot::{ErrorKind, Phase, QuerySlot, RefreshMode, SlotSnapshot, ViewError};
