use crate::api::gemini_api::GEMINI_API_BASE_URL;
use crate::api::retry::RetryPolicy;
use anyhow::{bail, Context, Result};
use std::str::FromStr;
use std::time::Duration;

/// Which model each family of queries runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub news: String,     // Feeds, odds boards, market lists
    pub analysis: String, // Deep dives and parlays
    pub chat: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            news: "gemini-2.5-flash".to_string(),
            analysis: "gemini-2.5-pro".to_string(),
            chat: "gemini-2.5-flash".to_string(),
        }
    }
}

/// Application settings, read once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub models: ModelConfig,
    pub retry: RetryPolicy,
    pub feed_refresh: Duration,
    pub matchup_refresh: Duration,
    pub parlay_stage_interval: Duration,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: GEMINI_API_BASE_URL.to_string(),
            models: ModelConfig::default(),
            retry: RetryPolicy::default(),
            feed_refresh: Duration::from_secs(5 * 60),
            matchup_refresh: Duration::from_secs(2 * 60),
            parlay_stage_interval: Duration::from_millis(2500),
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Config {
    /// Load from the process environment (after `.env`).
    ///
    /// A missing API key is not an error here; the service rejects the
    /// request and that failure surfaces in the view that made it.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = var("GEMINI_API_KEY")
            .or_else(|| var("API_KEY"))
            .unwrap_or_default();

        let models = ModelConfig {
            news: var("COURTSIDE_NEWS_MODEL").unwrap_or(defaults.models.news),
            analysis: var("COURTSIDE_ANALYSIS_MODEL").unwrap_or(defaults.models.analysis),
            chat: var("COURTSIDE_CHAT_MODEL").unwrap_or(defaults.models.chat),
        };

        let max_retries = parse_var(&var, "COURTSIDE_MAX_RETRIES")?
            .unwrap_or(defaults.retry.max_retries);
        let initial_delay = parse_var(&var, "COURTSIDE_RETRY_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry.initial_delay);

        Ok(Self {
            api_key,
            base_url: var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            models,
            retry: RetryPolicy::new(max_retries, initial_delay),
            feed_refresh: parse_period(&var, "COURTSIDE_FEED_REFRESH_SECS", Duration::from_secs)?
                .unwrap_or(defaults.feed_refresh),
            matchup_refresh: parse_period(&var, "COURTSIDE_MATCHUP_REFRESH_SECS", Duration::from_secs)?
                .unwrap_or(defaults.matchup_refresh),
            parlay_stage_interval: parse_period(&var, "COURTSIDE_PARLAY_STAGE_MS", Duration::from_millis)?
                .unwrap_or(defaults.parlay_stage_interval),
            bind_addr: var("COURTSIDE_BIND").unwrap_or(defaults.bind_addr),
        })
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
        })
        .transpose()
}

/// Timer periods must be non-zero
fn parse_period(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    unit: fn(u64) -> Duration,
) -> Result<Option<Duration>> {
    match parse_var::<u64>(var, key)? {
        Some(0) => bail!("Invalid value for {}: must be greater than zero", key),
        value => Ok(value.map(unit)),
    }
}
