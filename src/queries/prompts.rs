//! Prompt text, system instructions, and response schemas for each query.
//!
//! The two constraints the model is asked to honor everywhere (players must
//! belong to one of the teams being discussed, and a bet is left out rather
//! than invented) cannot be checked locally. They live here as instructions
//! and nowhere else.

use crate::api::schema::Schema;
use crate::models::{BetType, Confidence, MarketCategory};

/// Thinking budget for the heavier analysis calls
pub const ANALYSIS_THINKING_BUDGET: u32 = 4096;

pub const AGGREGATOR_INSTRUCTION: &str = "You are a precise NBA sports data aggregator. \
Only report games, lines and players you have confirmed with search. Never assign a player \
to a team they are not currently rostered on; if you are unsure of a player's team, leave \
that player out. Never invent a betting line: omit it instead.";

pub const ANALYST_INSTRUCTION: &str = "You are a rigorous NBA betting quantitative analyst. \
Every player you mention must be on one of the teams in the matchup under discussion; verify \
affiliations with search before using them. Use current injury news and recent box scores, \
and ground probabilities in explicit models (Poisson scoring, Monte Carlo simulation, \
regression). If you cannot support a bet with real data, leave it out rather than guess.";

pub const PARLAY_INSTRUCTION: &str = "You are an elite NBA betting quantitative analyst \
building a single best parlay for today's slate. Each leg must reference a real scheduled \
game, and every player must be on the active roster of a team playing in that game. \
Check late injury and lineup news on X/Twitter and major outlets. Back each leg with the \
probability model you applied. Drop any leg you cannot verify.";

pub const PLAYER_INSTRUCTION: &str = "You are an expert NBA player performance analyst. \
Report accurate, current statistics from recent game logs and give actionable prop angles. \
Do not invent numbers: leave a field out if it cannot be confirmed.";

pub const COPILOT_INSTRUCTION: &str = "You are an expert NBA betting copilot. Answer \
questions about injuries, trends, player stats and matchups using live search, and cite \
your sources. When giving betting advice, back it with probability reasoning, never \
attribute a player to the wrong team, and remind the user to bet responsibly.";

pub const NEWS_PROMPT: &str = "Search X/Twitter and major sports news outlets for the 5 most \
important NBA stories of the last 24 hours that would move betting markets: injuries, \
trades, and lineup or rotation changes. Prefer real-time reports from established \
insiders. Return one entry per story with a headline, the outlet or reporter, and a short \
snippet.";

pub const LIVE_MATCHUPS_PROMPT: &str = "Find every NBA game scheduled for today and \
tomorrow. For each game, find the current spread, moneyline and total (over/under) at \
DraftKings and FanDuel. If a line is not posted, leave it blank but still list the game.";

pub fn available_bets_prompt(home: &str, away: &str) -> String {
    format!(
        "List the betting lines currently available for {away} @ {home} at DraftKings and \
FanDuel.\n\
1. Include the spread and moneyline for both teams and the game total.\n\
2. Add about 10 popular player props (points, rebounds, assists).\n\
3. Every player prop must be for a player currently on the {home} or {away} roster; \
confirm this before listing it.\n\
4. Mark 2-3 options as highConfidence based on recent news and market movement.\n\
Return a flat list."
    )
}

pub fn single_bet_prompt(bet_label: &str, home: &str, away: &str) -> String {
    format!(
        "Analyze this NBA bet in depth: \"{bet_label}\" for {away} @ {home}.\n\
1. If the bet names a player, confirm they are on the {home} or {away} roster.\n\
2. Search for the latest injury reports and lineup news.\n\
3. Review the last 5 games for the relevant teams or player.\n\
4. Estimate the true probability with explicit models (Poisson, Monte Carlo, regression).\n\
5. Check for sharp money or line movement.\n\
Give a High/Medium/Low confidence, a 1-10 risk level, and reasoning that names the models used."
    )
}

pub fn matchup_prompt(team_a: &str, team_b: &str) -> String {
    format!(
        "Analyze the NBA matchup between {team_a} and {team_b}.\n\
1. Search for the latest news and injury reports for both teams.\n\
2. Only suggest bets involving players currently on the {team_a} or {team_b} roster.\n\
3. Estimate outcome probabilities with explicit models (Poisson, Monte Carlo, regression).\n\
4. Return 3-5 high-value bet suggestions backed by that analysis."
    )
}

pub fn player_stats_prompt(player_name: &str) -> String {
    format!(
        "Analyze recent performance for NBA player {player_name}.\n\
1. Find their last 5-10 game logs.\n\
2. Report current season averages for points, rebounds and assists.\n\
3. Identify meaningful trends (minutes, shooting, injury recovery).\n\
4. Consider their next matchup if one is scheduled.\n\
5. Give 3 specific player prop recommendations based on the data."
    )
}

pub fn parlay_prompt(date: &str) -> String {
    format!(
        "Build the best 4-leg NBA parlay for today's slate ({date}).\n\
1. Find every scheduled game.\n\
2. Check the latest injury and lineup news, including real-time reports on X/Twitter.\n\
3. Confirm each player you use is on the active roster of the team in that leg.\n\
4. Estimate each candidate's true probability with explicit models (Poisson, Monte Carlo, \
Elo, regression).\n\
5. Pick the 4 highest-value legs. Legs may be spreads, totals or player props.\n\
Give a reason for each leg, master reasoning for the combination, the total parlay odds, \
and a 1-100 confidence score."
    )
}

fn bet_suggestion_schema() -> Schema {
    Schema::object()
        .required_property("title", Schema::string())
        .property(
            "type",
            Schema::string_enum(BetType::ALL.iter().map(|t| t.as_str())),
        )
        .property("odds", Schema::string())
        .required_property(
            "confidence",
            Schema::string_enum(Confidence::ALL.iter().map(|c| c.as_str())),
        )
        .required_property("reasoning", Schema::string())
        .required_property("riskLevel", Schema::number().describe("1-10 scale"))
}

pub fn news_schema() -> Schema {
    Schema::array(
        Schema::object()
            .required_property("title", Schema::string())
            .required_property("source", Schema::string())
            .required_property("snippet", Schema::string()),
    )
}

pub fn matchups_schema() -> Schema {
    let book = || {
        Schema::object()
            .property("spread", Schema::string())
            .property("moneyline", Schema::string())
            .property("total", Schema::string())
    };

    Schema::array(
        Schema::object()
            .required_property("homeTeam", Schema::string())
            .required_property("awayTeam", Schema::string())
            .required_property("time", Schema::string())
            .required_property("date", Schema::string())
            .property(
                "odds",
                Schema::object()
                    .property("draftKings", book())
                    .property("fanDuel", book()),
            ),
    )
}

pub fn market_options_schema() -> Schema {
    Schema::array(
        Schema::object()
            .property("id", Schema::string())
            .required_property("label", Schema::string())
            .required_property(
                "category",
                Schema::string_enum(MarketCategory::ALL.iter().map(|c| c.as_str())),
            )
            .required_property("book", Schema::string())
            .property("highConfidence", Schema::boolean()),
    )
}

pub fn single_bet_schema() -> Schema {
    bet_suggestion_schema()
}

pub fn matchup_analysis_schema() -> Schema {
    Schema::object().required_property("bets", Schema::array(bet_suggestion_schema()))
}

pub fn player_stats_schema() -> Schema {
    Schema::object()
        .required_property("playerName", Schema::string())
        .property("team", Schema::string())
        .property(
            "seasonAverages",
            Schema::object()
                .property("points", Schema::number())
                .property("rebounds", Schema::number())
                .property("assists", Schema::number()),
        )
        .property("recentTrends", Schema::array(Schema::string()))
        .property(
            "propRecommendations",
            Schema::array(
                Schema::object()
                    .required_property("prop", Schema::string())
                    .property("reasoning", Schema::string())
                    .property(
                        "confidence",
                        Schema::string_enum(Confidence::ALL.iter().map(|c| c.as_str())),
                    ),
            ),
        )
}

pub fn parlay_schema() -> Schema {
    Schema::object()
        .required_property(
            "legs",
            Schema::array(
                Schema::object()
                    .required_property("game", Schema::string().describe("e.g. Lakers vs Celtics"))
                    .required_property("leg", Schema::string().describe("e.g. LeBron Over 24.5 Pts"))
                    .required_property("odds", Schema::string())
                    .required_property("reason", Schema::string()),
            ),
        )
        .required_property("totalOdds", Schema::string())
        .required_property("masterReasoning", Schema::string())
        .required_property("confidenceScore", Schema::number().describe("1-100 scale"))
}
