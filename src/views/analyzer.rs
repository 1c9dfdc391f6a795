use crate::api::gemini_api::{GenAiClient, GenerativeService};
use crate::models::{AiParlay, BetSuggestion, MarketCategory, MarketOption, Matchup};
use crate::queries::Queries;
use crate::views::refresh::{spawn_auto_refresh, RefreshHandle};
use crate::views::slot::{ErrorKind, QuerySlot, RefreshMode, SlotSnapshot, ViewError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{interval_at, Instant};
use tracing::{info, warn};

const MATCHUPS_ERROR: &str = "Failed to load today's games. Please check your connection and try again.";
const MARKETS_ERROR: &str = "Failed to load betting lines for this game.";
const BET_ANALYSIS_ERROR: &str = "Failed to analyze this bet. Please check your connection and try again.";
const CUSTOM_ERROR: &str = "Failed to analyze this matchup. Please check your connection and try again.";
const PARLAY_ERROR: &str = "Failed to synthesize parlay data. Please check your connection and try again.";

/// Progress labels shown while a parlay is generated. They advance on a
/// timer and say nothing about how far the real request has got.
pub const PARLAY_STAGES: [&str; 6] = [
    "Scanning today's NBA schedule and open betting markets...",
    "Checking X/Twitter for breaking injury news and insider reports...",
    "Analyzing player usage rates and historical matchup data...",
    "Comparing the news against DraftKings and FanDuel prices...",
    "Simulating parlay combinations for the best expected value...",
    "Finalizing the 4-leg parlay slip...",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalyzerMode {
    Live,
    Custom,
    Parlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BetFilter {
    #[default]
    All,
    #[serde(rename = "Top Picks")]
    TopPicks,
    Spread,
    Moneyline,
    Total,
    Points,
    Rebounds,
    Assists,
}

impl BetFilter {
    pub fn matches(&self, option: &MarketOption) -> bool {
        let prop_mentions = |keywords: &[&str]| {
            let label = option.label.to_lowercase();
            option.category == MarketCategory::Prop && keywords.iter().any(|k| label.contains(k))
        };

        match self {
            BetFilter::All => true,
            BetFilter::TopPicks => option.is_top_pick(),
            BetFilter::Spread => option.category == MarketCategory::Spread,
            BetFilter::Moneyline => option.category == MarketCategory::Moneyline,
            BetFilter::Total => option.category == MarketCategory::Total,
            BetFilter::Points => prop_mentions(&["points", "pts"]),
            BetFilter::Rebounds => prop_mentions(&["rebounds", "rebs"]),
            BetFilter::Assists => prop_mentions(&["assists", "ast"]),
        }
    }
}

pub fn filter_options(options: &[MarketOption], filter: BetFilter) -> Vec<MarketOption> {
    options
        .iter()
        .filter(|option| filter.matches(option))
        .cloned()
        .collect()
}

struct AnalyzerState {
    mode: AnalyzerMode,
    matchups: QuerySlot<Vec<Matchup>>,
    selected_matchup: Option<Matchup>,
    available_bets: QuerySlot<Vec<MarketOption>>,
    bet_filter: BetFilter,
    selected_bet: Option<MarketOption>,
    bet_analysis: QuerySlot<BetSuggestion>,
    custom_teams: Option<(String, String)>,
    custom_bets: QuerySlot<Vec<BetSuggestion>>,
    parlay: QuerySlot<AiParlay>,
    parlay_stage: usize,
}

impl Default for AnalyzerState {
    fn default() -> Self {
        Self {
            mode: AnalyzerMode::Live,
            matchups: QuerySlot::default(),
            selected_matchup: None,
            available_bets: QuerySlot::default(),
            bet_filter: BetFilter::All,
            selected_bet: None,
            bet_analysis: QuerySlot::default(),
            custom_teams: None,
            custom_bets: QuerySlot::default(),
            parlay: QuerySlot::default(),
            parlay_stage: 0,
        }
    }
}

impl AnalyzerState {
    /// Leave any drill-down or parlay and go back to the live game list
    fn reset_nested(&mut self) {
        self.selected_matchup = None;
        self.available_bets.reset();
        self.bet_filter = BetFilter::All;
        self.selected_bet = None;
        self.bet_analysis.reset();
        self.parlay.reset();
        self.parlay_stage = 0;
        self.mode = AnalyzerMode::Live;
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParlayProgress {
    pub stage: usize,
    pub label: &'static str,
    pub stages: &'static [&'static str],
}

/// Everything the analyzer panel renders
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerSnapshot {
    pub mode: AnalyzerMode,
    pub matchups: SlotSnapshot<Vec<Matchup>>,
    pub selected_matchup: Option<Matchup>,
    pub available_bets: SlotSnapshot<Vec<MarketOption>>,
    pub bet_filter: BetFilter,
    pub filtered_bets: Vec<MarketOption>,
    pub selected_bet: Option<MarketOption>,
    pub bet_analysis: SlotSnapshot<BetSuggestion>,
    pub custom_teams: Option<(String, String)>,
    pub custom_bets: SlotSnapshot<Vec<BetSuggestion>>,
    pub parlay: SlotSnapshot<AiParlay>,
    pub parlay_progress: Option<ParlayProgress>,
}

/// Matchup analyzer: live game list with drill-down into a game's lines,
/// single-bet analysis, custom two-team analysis, and parlay generation
pub struct AnalyzerView<S = GenAiClient> {
    queries: Arc<Queries<S>>,
    state: Arc<RwLock<AnalyzerState>>,
    stage_interval: Duration,
}

impl<S> Clone for AnalyzerView<S> {
    fn clone(&self) -> Self {
        Self {
            queries: self.queries.clone(),
            state: self.state.clone(),
            stage_interval: self.stage_interval,
        }
    }
}

impl<S: GenerativeService + 'static> AnalyzerView<S> {
    pub fn new(queries: Arc<Queries<S>>, stage_interval: Duration) -> Self {
        Self {
            queries,
            state: Arc::new(RwLock::new(AnalyzerState::default())),
            stage_interval,
        }
    }

    pub async fn load_matchups(&self, mode: RefreshMode) {
        let ticket = self.state.write().await.matchups.begin(mode);
        let outcome = self.queries.fetch_live_matchups().await;

        let mut state = self.state.write().await;
        match outcome {
            Ok(games) if games.is_empty() && state.matchups.data().is_some_and(|d| !d.is_empty()) => {
                state.matchups.settle(ticket);
            }
            Ok(games) => {
                state.matchups.resolve(ticket, Ok(games));
            }
            Err(e) => {
                warn!("Failed to load matchups ({:?}): {}", mode, e);
                state
                    .matchups
                    .resolve(ticket, Err(ViewError::from_service(&e, MATCHUPS_ERROR)));
            }
        }
    }

    /// Background refresh, skipped while the user is inside a game or
    /// away from the live list
    pub async fn refresh_matchups_if_idle(&self) {
        let idle = {
            let state = self.state.read().await;
            state.mode == AnalyzerMode::Live && state.selected_matchup.is_none()
        };
        if idle {
            self.load_matchups(RefreshMode::Silent).await;
        }
    }

    pub fn start_auto_refresh(&self, period: Duration) -> RefreshHandle {
        let view = self.clone();
        spawn_auto_refresh("live matchups", period, move || {
            let view = view.clone();
            async move { view.refresh_matchups_if_idle().await }
        })
    }

    /// Drill into a game and load the lines offered for it
    pub async fn select_matchup(&self, matchup: Matchup) {
        let ticket = {
            let mut state = self.state.write().await;
            state.mode = AnalyzerMode::Live;
            state.selected_matchup = Some(matchup.clone());
            state.selected_bet = None;
            state.bet_analysis.reset();
            state.bet_filter = BetFilter::All;
            state.available_bets.begin_fresh()
        };

        info!("Loading markets for {}", matchup.label());
        let outcome = self
            .queries
            .fetch_available_bets(&matchup.home_team, &matchup.away_team)
            .await;

        let outcome = outcome.map_err(|e| {
            warn!("Failed to load markets for {}: {}", matchup.label(), e);
            ViewError::from_service(&e, MARKETS_ERROR)
        });
        self.state
            .write()
            .await
            .available_bets
            .resolve(ticket, outcome);
    }

    pub async fn set_filter(&self, filter: BetFilter) {
        self.state.write().await.bet_filter = filter;
    }

    pub async fn filtered_bets(&self) -> Vec<MarketOption> {
        let state = self.state.read().await;
        state
            .available_bets
            .data()
            .map(|options| filter_options(options, state.bet_filter))
            .unwrap_or_default()
    }

    /// Deep-dive one line of the selected game. Ignored with no game selected.
    pub async fn analyze_bet(&self, bet: MarketOption) {
        let (ticket, matchup) = {
            let mut state = self.state.write().await;
            let Some(matchup) = state.selected_matchup.clone() else {
                warn!("Ignoring bet analysis with no matchup selected");
                return;
            };
            state.selected_bet = Some(bet.clone());
            (state.bet_analysis.begin_fresh(), matchup)
        };

        let outcome = self
            .queries
            .analyze_single_bet(&bet.label, &matchup.home_team, &matchup.away_team)
            .await
            .map_err(|e| {
                warn!("Failed to analyze {:?}: {}", bet.label, e);
                ViewError::from_service(&e, BET_ANALYSIS_ERROR)
            });
        self.state
            .write()
            .await
            .bet_analysis
            .resolve(ticket, outcome);
    }

    /// Bet suggestions for any two teams
    pub async fn analyze_custom(&self, team_a: &str, team_b: &str) {
        let team_a = team_a.trim().to_string();
        let team_b = team_b.trim().to_string();

        let ticket = {
            let mut state = self.state.write().await;
            state.mode = AnalyzerMode::Custom;
            state.custom_teams = Some((team_a.clone(), team_b.clone()));
            let ticket = state.custom_bets.begin_fresh();

            if team_a.is_empty() || team_b.is_empty() || team_a.eq_ignore_ascii_case(&team_b) {
                state.custom_bets.resolve(
                    ticket,
                    Err(ViewError {
                        kind: ErrorKind::Failed,
                        message: "Pick two different teams.".to_string(),
                    }),
                );
                return;
            }
            ticket
        };

        let outcome = self
            .queries
            .analyze_matchup(&team_a, &team_b)
            .await
            .map_err(|e| {
                warn!("Failed to analyze {} vs {}: {}", team_a, team_b, e);
                ViewError::from_service(&e, CUSTOM_ERROR)
            });
        self.state.write().await.custom_bets.resolve(ticket, outcome);
    }

    /// Generate a parlay while stepping through the cosmetic stage labels.
    /// The labels stop at the last one until the real answer lands.
    pub async fn generate_parlay(&self) {
        let ticket = {
            let mut state = self.state.write().await;
            state.mode = AnalyzerMode::Parlay;
            state.parlay_stage = 0;
            state.parlay.begin_fresh()
        };

        let request = self.queries.generate_parlay();
        tokio::pin!(request);
        let mut ticker = interval_at(Instant::now() + self.stage_interval, self.stage_interval);

        let outcome = loop {
            tokio::select! {
                outcome = &mut request => break outcome,
                _ = ticker.tick() => {
                    let mut state = self.state.write().await;
                    if state.parlay.is_current(ticket) {
                        state.parlay_stage = (state.parlay_stage + 1).min(PARLAY_STAGES.len() - 1);
                    }
                }
            }
        };

        let outcome = outcome.map_err(|e| {
            warn!("Failed to generate parlay: {}", e);
            ViewError::from_service(&e, PARLAY_ERROR)
        });
        self.state.write().await.parlay.resolve(ticket, outcome);
    }

    /// Back to the live game list, dropping any nested state
    pub async fn reset(&self) {
        self.state.write().await.reset_nested();
    }

    /// Switch between the live list and custom analysis tabs
    pub async fn switch_mode(&self, mode: AnalyzerMode) {
        let mut state = self.state.write().await;
        state.reset_nested();
        state.mode = mode;
    }

    pub async fn snapshot(&self) -> AnalyzerSnapshot {
        let state = self.state.read().await;
        let parlay_progress = state.parlay.is_loading().then(|| ParlayProgress {
            stage: state.parlay_stage,
            label: PARLAY_STAGES[state.parlay_stage],
            stages: &PARLAY_STAGES,
        });

        AnalyzerSnapshot {
            mode: state.mode,
            matchups: state.matchups.snapshot(),
            selected_matchup: state.selected_matchup.clone(),
            available_bets: state.available_bets.snapshot(),
            bet_filter: state.bet_filter,
            filtered_bets: state
                .available_bets
                .data()
                .map(|options| filter_options(options, state.bet_filter))
                .unwrap_or_default(),
            selected_bet: state.selected_bet.clone(),
            bet_analysis: state.bet_analysis.snapshot(),
            custom_teams: state.custom_teams.clone(),
            custom_bets: state.custom_bets.snapshot(),
            parlay: state.parlay.snapshot(),
            parlay_progress,
        }
    }
}
