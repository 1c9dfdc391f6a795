pub mod prompts;

use crate::api::error::GenAiError;
use crate::api::gemini_api::{GenAiClient, GenerativeService};
use crate::api::retry::RetryPolicy;
use crate::api::structured::{ConversationRequest, Grounded, StructuredClient, StructuredRequest};
use crate::config::{Config, ModelConfig};
use crate::models::{
    AiParlay, BetSuggestion, ChatMessage, ChatRole, Matchup, MarketOption, NewsItem,
    PlayerStatsReport,
};
use chrono::Local;
use prompts::*;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Reply shown when the copilot answers with no text
pub const EMPTY_CHAT_REPLY: &str = "I couldn't generate a response.";

#[derive(Debug, Deserialize)]
struct MatchupAnalysis {
    #[serde(default)]
    bets: Vec<BetSuggestion>,
}

/// The betting queries, each a prompt + schema over one structured client
pub struct Queries<S = GenAiClient> {
    client: StructuredClient<S>,
    models: ModelConfig,
}

impl Queries<GenAiClient> {
    pub fn from_config(cfg: &Config) -> Self {
        let service = GenAiClient::with_base_url(cfg.api_key.clone(), cfg.base_url.clone());
        Self::new(Arc::new(service), cfg.models.clone(), cfg.retry)
    }
}

impl<S: GenerativeService> Queries<S> {
    pub fn new(service: Arc<S>, models: ModelConfig, retry: RetryPolicy) -> Self {
        Self {
            client: StructuredClient::new(service, retry),
            models,
        }
    }

    /// Breaking news, each headline paired with the search citation at the
    /// same position (when there is one)
    pub async fn fetch_news(&self) -> Result<Vec<NewsItem>, GenAiError> {
        let request = StructuredRequest::new(&self.models.news, NEWS_PROMPT, news_schema())
            .with_search();

        let Grounded { data, citations } = self.client.fetch_list::<NewsItem>(&request).await?;
        info!(
            "Fetched {} news items with {} citations",
            data.len(),
            citations.len()
        );
        Ok(attach_citations(data, &citations))
    }

    /// Today's and tomorrow's games with DraftKings/FanDuel lines
    pub async fn fetch_live_matchups(&self) -> Result<Vec<Matchup>, GenAiError> {
        let request =
            StructuredRequest::new(&self.models.news, LIVE_MATCHUPS_PROMPT, matchups_schema())
                .with_search();

        let matchups = self.client.fetch_list::<Matchup>(&request).await?.data;
        Ok(matchups
            .into_iter()
            .filter(|m| {
                let valid = m.is_valid();
                if !valid {
                    warn!(
                        "Dropping matchup with invalid teams: {:?} vs {:?}",
                        m.home_team, m.away_team
                    );
                }
                valid
            })
            .collect())
    }

    /// Lines and props offered for one game
    pub async fn fetch_available_bets(
        &self,
        home: &str,
        away: &str,
    ) -> Result<Vec<MarketOption>, GenAiError> {
        let request = StructuredRequest::new(
            &self.models.news,
            available_bets_prompt(home, away),
            market_options_schema(),
        )
        .system_instruction(AGGREGATOR_INSTRUCTION)
        .with_search();

        Ok(self.client.fetch_list(&request).await?.data)
    }

    pub async fn analyze_single_bet(
        &self,
        bet_label: &str,
        home: &str,
        away: &str,
    ) -> Result<BetSuggestion, GenAiError> {
        let request = StructuredRequest::new(
            &self.models.analysis,
            single_bet_prompt(bet_label, home, away),
            single_bet_schema(),
        )
        .system_instruction(ANALYST_INSTRUCTION)
        .with_search()
        .thinking_budget(ANALYSIS_THINKING_BUDGET);

        Ok(self.client.fetch_object(&request).await?.data)
    }

    /// Bet suggestions for any two teams. No answer means no suggestions.
    pub async fn analyze_matchup(
        &self,
        team_a: &str,
        team_b: &str,
    ) -> Result<Vec<BetSuggestion>, GenAiError> {
        let request = StructuredRequest::new(
            &self.models.analysis,
            matchup_prompt(team_a, team_b),
            matchup_analysis_schema(),
        )
        .system_instruction(ANALYST_INSTRUCTION)
        .with_search()
        .thinking_budget(ANALYSIS_THINKING_BUDGET);

        match self.client.fetch_object::<MatchupAnalysis>(&request).await {
            Ok(grounded) => Ok(grounded.data.bets),
            Err(GenAiError::EmptyResponse) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    pub async fn analyze_player_stats(
        &self,
        player_name: &str,
    ) -> Result<PlayerStatsReport, GenAiError> {
        let request = StructuredRequest::new(
            &self.models.analysis,
            player_stats_prompt(player_name),
            player_stats_schema(),
        )
        .system_instruction(PLAYER_INSTRUCTION)
        .with_search();

        Ok(self.client.fetch_object(&request).await?.data)
    }

    /// A 4-leg parlay across today's slate
    pub async fn generate_parlay(&self) -> Result<AiParlay, GenAiError> {
        let today = Local::now().format("%B %-d, %Y").to_string();
        let request = StructuredRequest::new(
            &self.models.analysis,
            parlay_prompt(&today),
            parlay_schema(),
        )
        .system_instruction(PARLAY_INSTRUCTION)
        .with_search()
        .thinking_budget(ANALYSIS_THINKING_BUDGET);

        Ok(self.client.fetch_object(&request).await?.data)
    }

    /// One copilot turn. `history` is every message before `message`.
    pub async fn chat(&self, history: &[ChatMessage], message: &str) -> Result<String, GenAiError> {
        let request = ConversationRequest {
            model: self.models.chat.clone(),
            system_instruction: Some(COPILOT_INSTRUCTION.to_string()),
            use_search: true,
            history: history
                .iter()
                .map(|m| {
                    let role = match m.role {
                        ChatRole::User => "user",
                        ChatRole::Assistant => "model",
                    };
                    (role.to_string(), m.text.clone())
                })
                .collect(),
            message: message.to_string(),
        };

        let reply = self.client.converse(&request).await?;
        Ok(reply.unwrap_or_else(|| EMPTY_CHAT_REPLY.to_string()))
    }
}

/// Pair items with citations by index. Best-effort: extra citations are
/// ignored and items past the end keep whatever URL they had.
fn attach_citations(items: Vec<NewsItem>, citations: &[Option<String>]) -> Vec<NewsItem> {
    items
        .into_iter()
        .enumerate()
        .map(|(idx, mut item)| {
            if let Some(Some(uri)) = citations.get(idx) {
                item.url = Some(uri.clone());
            }
            item
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedService;
    use serde_json::json;

    fn queries(service: &Arc<ScriptedService>) -> Queries<ScriptedService> {
        Queries::new(service.clone(), ModelConfig::default(), RetryPolicy::default())
    }

    fn news_json() -> serde_json::Value {
        json!([
            {"title": "Embiid out vs Knicks", "source": "Shams", "snippet": "Left knee soreness."},
            {"title": "Kings trade for guard", "source": "ESPN", "snippet": "Two seconds sent out."},
            {"title": "Celtics rest Holiday", "source": "Boston Globe", "snippet": "Back-to-back."}
        ])
    }

    #[tokio::test]
    async fn test_news_citations_zip_by_index() {
        let service = Arc::new(ScriptedService::new());
        service.push_json_with_citations(
            news_json(),
            &["https://x.com/shams/1", "https://espn.com/story"],
        );

        let news = queries(&service).fetch_news().await.unwrap();
        assert_eq!(news.len(), 3);
        assert_eq!(news[0].url.as_deref(), Some("https://x.com/shams/1"));
        assert_eq!(news[1].url.as_deref(), Some("https://espn.com/story"));
        assert_eq!(news[2].url, None);

        let (model, request) = &service.requests()[0];
        assert_eq!(model, "gemini-2.5-flash");
        assert_eq!(request.tools.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_list_is_not_an_error() {
        let service = Arc::new(ScriptedService::new());
        service.push_json(json!([]));
        service.push_empty();

        let queries = queries(&service);
        assert!(queries.fetch_news().await.unwrap().is_empty());
        assert!(queries
            .fetch_available_bets("Boston Celtics", "Miami Heat")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_invalid_matchups_are_dropped() {
        let service = Arc::new(ScriptedService::new());
        service.push_json(json!([
            {"homeTeam": "Denver Nuggets", "awayTeam": "Phoenix Suns", "time": "9:00 PM ET", "date": "Today",
             "odds": {"draftKings": {"spread": "DEN -5.5", "moneyline": "-220", "total": "229.5"}}},
            {"homeTeam": "Denver Nuggets", "awayTeam": "Denver Nuggets", "time": "9:00 PM ET", "date": "Today"},
            {"homeTeam": "", "awayTeam": "Utah Jazz", "time": "TBD", "date": "Tomorrow"}
        ]));

        let matchups = queries(&service).fetch_live_matchups().await.unwrap();
        assert_eq!(matchups.len(), 1);
        assert_eq!(matchups[0].label(), "Phoenix Suns @ Denver Nuggets");
        let dk = matchups[0].odds.as_ref().unwrap().draft_kings.as_ref().unwrap();
        assert_eq!(dk.total.as_deref(), Some("229.5"));
    }

    #[tokio::test]
    async fn test_single_bet_uses_analysis_model_and_thinking() {
        let service = Arc::new(ScriptedService::new());
        service.push_json(json!({
            "title": "Heat +6.5",
            "type": "Spread",
            "odds": "-110",
            "confidence": "High",
            "reasoning": "Monte Carlo gives Miami a 58% cover rate.",
            "riskLevel": 4
        }));

        let bet = queries(&service)
            .analyze_single_bet("Heat +6.5", "Boston Celtics", "Miami Heat")
            .await
            .unwrap();
        assert_eq!(bet.title, "Heat +6.5");

        let (model, request) = &service.requests()[0];
        assert_eq!(model, "gemini-2.5-pro");
        let thinking = request
            .generation_config
            .as_ref()
            .and_then(|g| g.thinking_config.as_ref())
            .unwrap();
        assert_eq!(thinking.thinking_budget, 4096);
        assert!(service.prompt(0).contains("Miami Heat @ Boston Celtics"));
    }

    #[tokio::test]
    async fn test_single_bet_rejects_malformed_payload() {
        let service = Arc::new(ScriptedService::new());
        service.push_text("{\"title\": \"Heat +6.5\", \"confidence\": ");

        let result = queries(&service)
            .analyze_single_bet("Heat +6.5", "Boston Celtics", "Miami Heat")
            .await;
        assert!(matches!(result, Err(GenAiError::Decode(_))));
    }

    #[tokio::test]
    async fn test_single_bet_rejects_empty_response() {
        let service = Arc::new(ScriptedService::new());
        service.push_empty();

        let result = queries(&service)
            .analyze_single_bet("Heat +6.5", "Boston Celtics", "Miami Heat")
            .await;
        assert!(matches!(result, Err(GenAiError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_matchup_analysis_unwraps_bets() {
        let service = Arc::new(ScriptedService::new());
        service.push_json(json!({"bets": [
            {"title": "Over 231.5", "type": "Over/Under", "odds": "-108", "confidence": "Medium",
             "reasoning": "Pace projection", "riskLevel": 6}
        ]}));
        service.push_empty();
        service.push_json(json!({}));

        let queries = queries(&service);
        let bets = queries
            .analyze_matchup("Indiana Pacers", "Atlanta Hawks")
            .await
            .unwrap();
        assert_eq!(bets.len(), 1);
        assert!(queries
            .analyze_matchup("Indiana Pacers", "Atlanta Hawks")
            .await
            .unwrap()
            .is_empty());
        assert!(queries
            .analyze_matchup("Indiana Pacers", "Atlanta Hawks")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_player_stats_partial_report() {
        let service = Arc::new(ScriptedService::new());
        service.push_json(json!({
            "playerName": "Jalen Brunson",
            "team": "New York Knicks",
            "seasonAverages": {"points": 28.1},
            "propRecommendations": [{"prop": "Over 6.5 Ast", "reasoning": "Usage", "confidence": "Low"}]
        }));

        let report = queries(&service)
            .analyze_player_stats("Jalen Brunson")
            .await
            .unwrap();
        assert_eq!(report.season_averages.points, Some(28.1));
        assert_eq!(report.season_averages.assists, None);
        assert!(report.recent_trends.is_empty());
        assert_eq!(report.prop_recommendations.len(), 1);
    }

    #[tokio::test]
    async fn test_parlay() {
        let service = Arc::new(ScriptedService::new());
        service.push_json(json!({
            "legs": [
                {"game": "Lakers vs Celtics", "leg": "LeBron Over 24.5 Pts", "odds": "-120", "reason": "Poisson"},
                {"game": "Knicks vs Heat", "leg": "Knicks -3.5", "odds": "-110", "reason": "Elo edge"}
            ],
            "totalOdds": "+264",
            "masterReasoning": "Uncorrelated legs",
            "confidenceScore": 71
        }));

        let parlay = queries(&service).generate_parlay().await.unwrap();
        assert_eq!(parlay.legs.len(), 2);
        assert_eq!(parlay.confidence_score, 71.0);
        assert!(service.prompt(0).contains("4-leg"));
    }

    #[tokio::test]
    async fn test_chat_maps_roles_and_falls_back() {
        let service = Arc::new(ScriptedService::new());
        service.push_empty();

        let history = vec![
            ChatMessage::assistant("Hi, ask me anything."),
            ChatMessage::user("Is Tatum playing?"),
            ChatMessage::assistant("He is probable."),
        ];
        let reply = queries(&service)
            .chat(&history, "What about Brown?")
            .await
            .unwrap();
        assert_eq!(reply, EMPTY_CHAT_REPLY);

        let (model, request) = &service.requests()[0];
        assert_eq!(model, "gemini-2.5-flash");
        let roles: Vec<_> = request
            .contents
            .iter()
            .map(|c| c.role.clone().unwrap())
            .collect();
        assert_eq!(roles, vec!["model", "user", "model", "user"]);
        assert_eq!(service.prompt(0), "What about Brown?");
    }
}
