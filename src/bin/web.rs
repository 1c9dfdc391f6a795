use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use courtside_ai::models::{MarketOption, Matchup};
use courtside_ai::views::{AnalyzerMode, BetFilter, RefreshMode};
use courtside_ai::{App, Config, Destination};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

type SharedApp = Arc<App>;

#[derive(Deserialize)]
struct NavigateBody {
    destination: Destination,
}

#[derive(Deserialize)]
struct SelectBody {
    matchup: Matchup,
}

#[derive(Deserialize)]
struct FilterBody {
    filter: BetFilter,
}

#[derive(Deserialize)]
struct BetBody {
    bet: MarketOption,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomBody {
    team_a: String,
    team_b: String,
}

#[derive(Deserialize)]
struct ModeBody {
    mode: AnalyzerMode,
}

#[derive(Deserialize)]
struct ChatBody {
    text: String,
}

#[derive(Deserialize)]
struct PlayerBody {
    name: String,
}

/// Long-running actions run in the background; clients poll the snapshot
fn accepted() -> Response {
    StatusCode::ACCEPTED.into_response()
}

async fn dashboard(State(app): State<SharedApp>) -> impl IntoResponse {
    Json(app.snapshot().await)
}

async fn navigate(State(app): State<SharedApp>, Json(body): Json<NavigateBody>) -> Response {
    app.navigate(body.destination).await;
    StatusCode::NO_CONTENT.into_response()
}

async fn news(State(app): State<SharedApp>) -> impl IntoResponse {
    Json(app.feed.snapshot().await)
}

async fn refresh_news(State(app): State<SharedApp>) -> Response {
    let feed = app.feed.clone();
    tokio::spawn(async move { feed.load(RefreshMode::Foreground).await });
    accepted()
}

async fn analyzer(State(app): State<SharedApp>) -> impl IntoResponse {
    Json(app.analyzer.snapshot().await)
}

async fn refresh_matchups(State(app): State<SharedApp>) -> Response {
    let analyzer = app.analyzer.clone();
    tokio::spawn(async move { analyzer.load_matchups(RefreshMode::Foreground).await });
    accepted()
}

async fn select_matchup(State(app): State<SharedApp>, Json(body): Json<SelectBody>) -> Response {
    if !body.matchup.is_valid() {
        return (StatusCode::BAD_REQUEST, "Matchup needs two different teams").into_response();
    }
    let analyzer = app.analyzer.clone();
    tokio::spawn(async move { analyzer.select_matchup(body.matchup).await });
    accepted()
}

async fn set_filter(State(app): State<SharedApp>, Json(body): Json<FilterBody>) -> Response {
    app.analyzer.set_filter(body.filter).await;
    StatusCode::NO_CONTENT.into_response()
}

async fn analyze_bet(State(app): State<SharedApp>, Json(body): Json<BetBody>) -> Response {
    if app.analyzer.snapshot().await.selected_matchup.is_none() {
        return (StatusCode::CONFLICT, "Select a matchup first").into_response();
    }
    let analyzer = app.analyzer.clone();
    tokio::spawn(async move { analyzer.analyze_bet(body.bet).await });
    accepted()
}

async fn analyze_custom(State(app): State<SharedApp>, Json(body): Json<CustomBody>) -> Response {
    let analyzer = app.analyzer.clone();
    tokio::spawn(async move { analyzer.analyze_custom(&body.team_a, &body.team_b).await });
    accepted()
}

async fn generate_parlay(State(app): State<SharedApp>) -> Response {
    let analyzer = app.analyzer.clone();
    tokio::spawn(async move { analyzer.generate_parlay().await });
    accepted()
}

async fn reset_analyzer(State(app): State<SharedApp>) -> Response {
    app.analyzer.reset().await;
    StatusCode::NO_CONTENT.into_response()
}

async fn switch_mode(State(app): State<SharedApp>, Json(body): Json<ModeBody>) -> Response {
    app.analyzer.switch_mode(body.mode).await;
    StatusCode::NO_CONTENT.into_response()
}

async fn chat(State(app): State<SharedApp>) -> impl IntoResponse {
    Json(app.chat.snapshot().await)
}

async fn send_chat(State(app): State<SharedApp>, Json(body): Json<ChatBody>) -> Response {
    if body.text.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Message is empty").into_response();
    }
    if app.chat.snapshot().await.is_typing {
        return (StatusCode::CONFLICT, "Still waiting on the last reply").into_response();
    }
    let chat = app.chat.clone();
    tokio::spawn(async move { chat.send(&body.text).await });
    accepted()
}

async fn player(State(app): State<SharedApp>) -> impl IntoResponse {
    Json(app.player.snapshot().await)
}

async fn search_player(State(app): State<SharedApp>, Json(body): Json<PlayerBody>) -> Response {
    if body.name.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Player name is empty").into_response();
    }
    let player = app.player.clone();
    tokio::spawn(async move { player.search(&body.name).await });
    accepted()
}

fn router(app: SharedApp) -> Router {
    Router::new()
        .route("/api/dashboard", get(dashboard))
        .route("/api/navigate", post(navigate))
        .route("/api/news", get(news))
        .route("/api/news/refresh", post(refresh_news))
        .route("/api/analyzer", get(analyzer))
        .route("/api/analyzer/matchups/refresh", post(refresh_matchups))
        .route("/api/analyzer/select", post(select_matchup))
        .route("/api/analyzer/filter", post(set_filter))
        .route("/api/analyzer/bet", post(analyze_bet))
        .route("/api/analyzer/custom", post(analyze_custom))
        .route("/api/analyzer/parlay", post(generate_parlay))
        .route("/api/analyzer/reset", post(reset_analyzer))
        .route("/api/analyzer/mode", post(switch_mode))
        .route("/api/chat", get(chat).post(send_chat))
        .route("/api/player", get(player).post(search_player))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let cfg = Config::from_env().context("Failed to load configuration")?;
    if cfg.api_key.is_empty() {
        warn!("GEMINI_API_KEY is not set; every AI request will be rejected");
    }

    let app = Arc::new(App::from_config(&cfg));
    app.navigate(Destination::Dashboard).await;

    info!("News model {}, analysis model {}", cfg.models.news, cfg.models.analysis);
    println!("\nStarting web server at http://{}", cfg.bind_addr);
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.bind_addr))?;

    axum::serve(listener, router(app))
        .await
        .context("Server stopped with an error")?;

    Ok(())
}
