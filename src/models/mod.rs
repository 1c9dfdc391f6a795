use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A headline from the news feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>, // Citation from search grounding, matched by position
}

/// Lines posted by a single sportsbook. Values are free-form because the
/// model may report them as "unavailable" or leave them out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookOdds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moneyline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupOdds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_kings: Option<BookOdds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_duel: Option<BookOdds>,
}

/// A scheduled game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matchup {
    pub home_team: String,
    pub away_team: String,
    pub time: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odds: Option<MatchupOdds>,
}

impl Matchup {
    /// Home and away must both be named and must not be the same team
    pub fn is_valid(&self) -> bool {
        let home = self.home_team.trim();
        let away = self.away_team.trim();
        !home.is_empty() && !away.is_empty() && !home.eq_ignore_ascii_case(away)
    }

    /// "Away @ Home"
    pub fn label(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }

    /// Format for display
    pub fn format(&self) -> String {
        let mut out = format!("{} | {} {}", self.label(), self.date, self.time);
        if let Some(odds) = &self.odds {
            for (book, lines) in [("DK", &odds.draft_kings), ("FD", &odds.fan_duel)] {
                if let Some(lines) = lines {
                    out.push_str(&format!(
                        "\n   {}: spread {} | ML {} | total {}",
                        book,
                        lines.spread.as_deref().unwrap_or("-"),
                        lines.moneyline.as_deref().unwrap_or("-"),
                        lines.total.as_deref().unwrap_or("-"),
                    ));
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketCategory {
    Spread,
    Moneyline,
    Total,
    Prop,
}

impl MarketCategory {
    pub const ALL: [MarketCategory; 4] = [
        MarketCategory::Spread,
        MarketCategory::Moneyline,
        MarketCategory::Total,
        MarketCategory::Prop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketCategory::Spread => "Spread",
            MarketCategory::Moneyline => "Moneyline",
            MarketCategory::Total => "Total",
            MarketCategory::Prop => "Prop",
        }
    }
}

/// A betting line offered for a specific game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub label: String,
    pub category: MarketCategory,
    pub book: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_confidence: Option<bool>,
}

impl MarketOption {
    pub fn is_top_pick(&self) -> bool {
        self.high_confidence == Some(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetType {
    Spread,
    Moneyline,
    #[serde(rename = "Over/Under")]
    OverUnder,
    #[serde(rename = "Player Prop")]
    PlayerProp,
}

impl BetType {
    pub const ALL: [BetType; 4] = [
        BetType::Spread,
        BetType::Moneyline,
        BetType::OverUnder,
        BetType::PlayerProp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BetType::Spread => "Spread",
            BetType::Moneyline => "Moneyline",
            BetType::OverUnder => "Over/Under",
            BetType::PlayerProp => "Player Prop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub const ALL: [Confidence; 3] = [Confidence::High, Confidence::Medium, Confidence::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}

/// Coarse grouping of a 1-10 risk level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

/// A single bet recommendation from the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetSuggestion {
    pub title: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub bet_type: Option<BetType>,
    #[serde(default)]
    pub odds: String,
    pub confidence: Confidence,
    pub reasoning: String,
    #[serde(deserialize_with = "whole_number")]
    pub risk_level: i64, // Expected 1-10, not enforced by the schema
}

/// Schema NUMBER fields may arrive as `5` or `5.0`
fn whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.round() as i64)
}

impl BetSuggestion {
    pub fn risk_band(&self) -> RiskBand {
        match self.risk_level {
            i64::MIN..=3 => RiskBand::Low,
            4..=6 => RiskBand::Medium,
            _ => RiskBand::High,
        }
    }

    /// Format for display
    pub fn format(&self) -> String {
        format!(
            "{} ({}) @ {}\n   Confidence: {} | Risk: {}/10\n   {}",
            self.title,
            self.bet_type.map(|t| t.as_str()).unwrap_or("Bet"),
            if self.odds.is_empty() { "n/a" } else { &self.odds },
            self.confidence.as_str(),
            self.risk_level,
            self.reasoning
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParlayLeg {
    pub game: String,
    pub leg: String,
    pub odds: String,
    pub reason: String,
}

/// A model-built multi-leg parlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiParlay {
    pub legs: Vec<ParlayLeg>,
    pub total_odds: String,
    pub master_reasoning: String,
    pub confidence_score: f64, // Expected 0-100
}

impl AiParlay {
    /// Format for display
    pub fn format(&self) -> String {
        let mut out = format!(
            "{}-leg parlay @ {} (confidence {:.0}/100)\n",
            self.legs.len(),
            self.total_odds,
            self.confidence_score
        );
        for (i, leg) in self.legs.iter().enumerate() {
            out.push_str(&format!(
                "{}. [{}] {} @ {}\n   {}\n",
                i + 1,
                leg.game,
                leg.leg,
                leg.odds,
                leg.reason
            ));
        }
        out.push_str(&self.master_reasoning);
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonAverages {
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub rebounds: Option<f64>,
    #[serde(default)]
    pub assists: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropRecommendation {
    pub prop: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

/// Recent performance and prop angles for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatsReport {
    pub player_name: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub season_averages: SeasonAverages,
    #[serde(default)]
    pub recent_trends: Vec<String>,
    #[serde(default)]
    pub prop_recommendations: Vec<PropRecommendation>,
}

impl PlayerStatsReport {
    /// Format for display
    pub fn format(&self) -> String {
        let avg = |v: Option<f64>| v.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "-".into());
        let mut out = format!(
            "{} ({})\nPTS {} | REB {} | AST {}\n",
            self.player_name,
            self.team,
            avg(self.season_averages.points),
            avg(self.season_averages.rebounds),
            avg(self.season_averages.assists)
        );
        for trend in &self.recent_trends {
            out.push_str(&format!(" - {}\n", trend));
        }
        for rec in &self.prop_recommendations {
            out.push_str(&format!(
                "{} [{}]\n   {}\n",
                rec.prop,
                rec.confidence.map(|c| c.as_str()).unwrap_or("?"),
                rec.reasoning
            ));
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn in a copilot conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(ChatRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, text)
    }

    fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}
