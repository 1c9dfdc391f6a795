use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use courtside_ai::views::{AnalyzerView, ChatView, PARLAY_STAGES};
use courtside_ai::{ChatRole, Config, Queries};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

#[derive(Parser)]
#[command(name = "courtside", about = "AI-researched NBA betting insights")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Breaking NBA news with sources
    News,
    /// Today's games with DraftKings and FanDuel lines
    Matchups,
    /// Betting lines available for one game
    Markets {
        #[arg(long)]
        home: String,
        #[arg(long)]
        away: String,
    },
    /// Deep-dive a single bet
    Bet {
        #[arg(long)]
        home: String,
        #[arg(long)]
        away: String,
        /// e.g. "Celtics -6.5"
        label: String,
    },
    /// Bet suggestions for any two teams
    Matchup { team_a: String, team_b: String },
    /// Season averages, trends and prop picks for a player
    Player { name: String },
    /// A 4-leg parlay across today's slate
    Parlay,
    /// Talk to the betting copilot
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::from_env().context("Failed to load configuration")?;
    if cfg.api_key.is_empty() {
        warn!("GEMINI_API_KEY not set in .env file; requests will be rejected");
    }
    let queries = Arc::new(Queries::from_config(&cfg));

    match cli.command {
        Command::News => {
            let news = queries.fetch_news().await.context("Failed to fetch news")?;
            if news.is_empty() {
                println!("No news right now.");
            }
            for item in news {
                println!("{} ({})", item.title, item.source);
                println!("  {}", item.snippet);
                if let Some(url) = item.url {
                    println!("  {}", url);
                }
                println!();
            }
        }
        Command::Matchups => {
            let games = queries
                .fetch_live_matchups()
                .await
                .context("Failed to fetch matchups")?;
            println!("=== Today's Games ({}) ===\n", games.len());
            for game in games {
                println!("{}", game.format());
            }
        }
        Command::Markets { home, away } => {
            let options = queries
                .fetch_available_bets(&home, &away)
                .await
                .context("Failed to fetch betting lines")?;
            println!("=== {} @ {} ({} lines) ===\n", away, home, options.len());
            for option in options {
                let star = if option.is_top_pick() { "*" } else { " " };
                println!(
                    "{} {:<10} {:<10} {}",
                    star,
                    option.category.as_str(),
                    option.book,
                    option.label
                );
            }
        }
        Command::Bet { home, away, label } => {
            let analysis = queries
                .analyze_single_bet(&label, &home, &away)
                .await
                .context("Failed to analyze bet")?;
            println!("{}", analysis.format());
        }
        Command::Matchup { team_a, team_b } => {
            let bets = queries
                .analyze_matchup(&team_a, &team_b)
                .await
                .context("Failed to analyze matchup")?;
            if bets.is_empty() {
                println!("No suggestions for {} vs {}.", team_a, team_b);
            }
            for bet in bets {
                println!("{}", bet.format());
            }
        }
        Command::Player { name } => {
            let report = queries
                .analyze_player_stats(&name)
                .await
                .context("Failed to fetch player stats")?;
            println!("{}", report.format());
        }
        Command::Parlay => run_parlay(queries, &cfg).await?,
        Command::Chat => run_chat(queries).await?,
    }

    Ok(())
}

/// Generate through the analyzer view so the stage labels show while it works
async fn run_parlay(queries: Arc<Queries>, cfg: &Config) -> Result<()> {
    let analyzer = AnalyzerView::new(queries, cfg.parlay_stage_interval);
    let task = tokio::spawn({
        let analyzer = analyzer.clone();
        async move { analyzer.generate_parlay().await }
    });

    let mut shown = None;
    while !task.is_finished() {
        if let Some(progress) = analyzer.snapshot().await.parlay_progress {
            if shown != Some(progress.stage) {
                println!("[{}/{}] {}", progress.stage + 1, PARLAY_STAGES.len(), progress.label);
                shown = Some(progress.stage);
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    task.await.context("Parlay task failed")?;

    let parlay = analyzer.snapshot().await.parlay;
    match (parlay.data, parlay.error) {
        (Some(parlay), _) => println!("\n{}", parlay.format()),
        (None, Some(error)) => bail!(error.message),
        (None, None) => bail!("No parlay was generated"),
    }
    Ok(())
}

async fn run_chat(queries: Arc<Queries>) -> Result<()> {
    let chat = ChatView::new(queries);
    let mut seen = 0;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let snapshot = chat.snapshot().await;
        for message in &snapshot.messages[seen..] {
            if message.role == ChatRole::Assistant {
                println!("\ncopilot> {}\n", message.text);
            }
        }
        seen = snapshot.messages.len();
        if let Some(error) = snapshot.error {
            eprintln!("{}", error.message);
        }

        print!("you> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        chat.send(&line).await;
    }

    Ok(())
}
