use crate::api::gemini_api::{GenAiClient, GenerativeService};
use crate::models::NewsItem;
use crate::queries::Queries;
use crate::views::refresh::{spawn_auto_refresh, RefreshHandle};
use crate::views::slot::{QuerySlot, RefreshMode, SlotSnapshot, ViewError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::warn;

const FEED_ERROR: &str = "Failed to load news.";

/// Live news wire: headlines with citations, refreshed in the background
pub struct NewsFeedView<S = GenAiClient> {
    queries: Arc<Queries<S>>,
    news: Arc<RwLock<QuerySlot<Vec<NewsItem>>>>,
}

impl<S> Clone for NewsFeedView<S> {
    fn clone(&self) -> Self {
        Self {
            queries: self.queries.clone(),
            news: self.news.clone(),
        }
    }
}

impl<S: GenerativeService + 'static> NewsFeedView<S> {
    pub fn new(queries: Arc<Queries<S>>) -> Self {
        Self {
            queries,
            news: Arc::new(RwLock::new(QuerySlot::default())),
        }
    }

    pub async fn load(&self, mode: RefreshMode) {
        let ticket = self.news.write().await.begin(mode);
        let outcome = self.queries.fetch_news().await;

        let mut news = self.news.write().await;
        match outcome {
            // An empty answer doesn't wipe headlines we already have
            Ok(items) if items.is_empty() && news.data().is_some_and(|d| !d.is_empty()) => {
                news.settle(ticket);
            }
            Ok(items) => {
                news.resolve(ticket, Ok(items));
            }
            Err(e) => {
                warn!("Failed to load news ({:?}): {}", mode, e);
                news.resolve(ticket, Err(ViewError::from_service(&e, FEED_ERROR)));
            }
        }
    }

    /// Silent refresh every `period` until the handle is dropped
    pub fn start_auto_refresh(&self, period: Duration) -> RefreshHandle {
        let view = self.clone();
        spawn_auto_refresh("news feed", period, move || {
            let view = view.clone();
            async move { view.load(RefreshMode::Silent).await }
        })
    }

    pub async fn snapshot(&self) -> SlotSnapshot<Vec<NewsItem>> {
        self.news.read().await.snapshot()
    }
}
