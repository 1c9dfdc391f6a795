use crate::api::gemini_api::{GenAiClient, GenerativeService};
use crate::models::PlayerStatsReport;
use crate::queries::Queries;
use crate::views::slot::{QuerySlot, RefreshMode, SlotSnapshot, ViewError};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Default)]
struct PlayerState {
    query: String,
    report: QuerySlot<PlayerStatsReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub query: String,
    pub report: SlotSnapshot<PlayerStatsReport>,
}

/// Player stats lookup. The last report stays up while a new search runs.
pub struct PlayerLookupView<S = GenAiClient> {
    queries: Arc<Queries<S>>,
    state: Arc<RwLock<PlayerState>>,
}

impl<S> Clone for PlayerLookupView<S> {
    fn clone(&self) -> Self {
        Self {
            queries: self.queries.clone(),
            state: self.state.clone(),
        }
    }
}

impl<S: GenerativeService + 'static> PlayerLookupView<S> {
    pub fn new(queries: Arc<Queries<S>>) -> Self {
        Self {
            queries,
            state: Arc::new(RwLock::new(PlayerState::default())),
        }
    }

    /// Look up `name`; blank names are ignored
    pub async fn search(&self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        let ticket = {
            let mut state = self.state.write().await;
            state.query = name.to_string();
            state.report.begin(RefreshMode::Foreground)
        };

        info!("Looking up player {}", name);
        let outcome = self.queries.analyze_player_stats(name).await.map_err(|e| {
            warn!("Player lookup for {} failed: {}", name, e);
            ViewError::from_service(&e, &e.to_string())
        });
        self.state.write().await.report.resolve(ticket, outcome);
        true
    }

    pub async fn snapshot(&self) -> PlayerSnapshot {
        let state = self.state.read().await;
        PlayerSnapshot {
            query: state.query.clone(),
            report: state.report.snapshot(),
        }
    }
}
