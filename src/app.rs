use crate::api::gemini_api::{GenAiClient, GenerativeService};
use crate::config::Config;
use crate::models::NewsItem;
use crate::queries::Queries;
use crate::views::analyzer::{AnalyzerSnapshot, AnalyzerView};
use crate::views::chat::{ChatSnapshot, ChatView};
use crate::views::feed::NewsFeedView;
use crate::views::player::{PlayerLookupView, PlayerSnapshot};
use crate::views::refresh::RefreshHandle;
use crate::views::slot::{RefreshMode, SlotSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Destination {
    /// Analyzer, news feed and a compact copilot
    Dashboard,
    Chat,
    PlayerStats,
}

struct Navigation {
    destination: Destination,
    dashboard_timers: Vec<RefreshHandle>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    pub destination: Destination,
    pub news: SlotSnapshot<Vec<NewsItem>>,
    pub analyzer: AnalyzerSnapshot,
    pub chat: ChatSnapshot,
    pub player: PlayerSnapshot,
}

/// Top-level shell: owns every view and the dashboard's refresh timers.
/// One chat session is shared by the dashboard panel and the chat page.
pub struct App<S = GenAiClient> {
    pub feed: NewsFeedView<S>,
    pub analyzer: AnalyzerView<S>,
    pub chat: ChatView<S>,
    pub player: PlayerLookupView<S>,
    feed_refresh: Duration,
    matchup_refresh: Duration,
    nav: Mutex<Navigation>,
}

impl App<GenAiClient> {
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(Arc::new(Queries::from_config(cfg)), cfg)
    }
}

impl<S: GenerativeService + 'static> App<S> {
    pub fn new(queries: Arc<Queries<S>>, cfg: &Config) -> Self {
        Self {
            feed: NewsFeedView::new(queries.clone()),
            analyzer: AnalyzerView::new(queries.clone(), cfg.parlay_stage_interval),
            chat: ChatView::new(queries.clone()),
            player: PlayerLookupView::new(queries),
            feed_refresh: cfg.feed_refresh,
            matchup_refresh: cfg.matchup_refresh,
            nav: Mutex::new(Navigation {
                destination: Destination::Dashboard,
                dashboard_timers: Vec::new(),
            }),
        }
    }

    /// Switch destination. Showing the dashboard loads its data and starts
    /// the refresh timers; leaving it stops them.
    pub async fn navigate(&self, destination: Destination) {
        let mut nav = self.nav.lock().await;
        nav.destination = destination;

        if destination != Destination::Dashboard {
            if !nav.dashboard_timers.is_empty() {
                info!("Leaving dashboard, stopping auto-refresh");
                nav.dashboard_timers.clear();
            }
            return;
        }
        if !nav.dashboard_timers.is_empty() {
            return;
        }

        info!("Opening dashboard");
        let feed = self.feed.clone();
        tokio::spawn(async move { feed.load(RefreshMode::Silent).await });
        let analyzer = self.analyzer.clone();
        tokio::spawn(async move { analyzer.refresh_matchups_if_idle().await });

        nav.dashboard_timers = vec![
            self.feed.start_auto_refresh(self.feed_refresh),
            self.analyzer.start_auto_refresh(self.matchup_refresh),
        ];
    }

    pub async fn destination(&self) -> Destination {
        self.nav.lock().await.destination
    }

    pub async fn timers_running(&self) -> bool {
        let nav = self.nav.lock().await;
        !nav.dashboard_timers.is_empty() && nav.dashboard_timers.iter().all(|t| t.is_running())
    }

    pub async fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            destination: self.destination().await,
            news: self.feed.snapshot().await,
            analyzer: self.analyzer.snapshot().await,
            chat: self.chat.snapshot().await,
            player: self.player.snapshot().await,
        }
    }
}
