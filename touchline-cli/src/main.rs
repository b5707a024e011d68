//! Touchline CLI
//!
//! Command-line interface for the Touchline soccer analytics backend.

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use touchline_api::{ApiConfig, ApiServer, AppState, Dashboard, MatchReport};
use touchline_core::constants::{DEFAULT_DAYS_BACK, DEFAULT_DAYS_FORWARD, MAX_WINDOW_DAYS};
use touchline_core::types::{BigSixComparison, MatchWindow, Standings, TeamRecord};

/// Touchline - Premier League analytics with a cache-through freshness layer
#[derive(Parser)]
#[command(name = "touchline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print raw JSON instead of formatted output
    #[arg(long, global = true)]
    json: bool,

    /// football-data.org API token
    #[arg(long, global = true, env = "FOOTBALL_DATA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Snapshot file for the store (in-memory when unset)
    #[arg(long, global = true, env = "TOUCHLINE_STORE_PATH")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current league table
    Standings,

    /// List fixtures around today
    Matches {
        /// Days to look back (at most 90)
        #[arg(long, default_value_t = DEFAULT_DAYS_BACK, value_parser = window_days())]
        days_back: u32,
        /// Days to look forward (at most 90)
        #[arg(long, default_value_t = DEFAULT_DAYS_FORWARD, value_parser = window_days())]
        days_forward: u32,
    },

    /// Show one team's league record
    Team {
        /// Team name, e.g. "Arsenal" or "Manchester United FC"
        name: String,
    },

    /// Analyze a match
    Analyze {
        /// football-data.org match id
        match_id: u64,
    },

    /// Compare the big six clubs
    BigSix,

    /// Search stored documents
    Search {
        /// Search text
        query: String,
        /// Collection to search
        #[arg(short, long, default_value = "epl_teams")]
        collection: String,
        /// Maximum results
        #[arg(short, long, default_value = "5")]
        n: usize,
    },

    /// Show store statistics
    Stats,

    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "touchline=debug,info"
    } else {
        "touchline=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = build_config(&cli);
    let json = cli.json;

    match cli.command {
        Commands::Standings => cmd_standings(config, json).await,
        Commands::Matches {
            days_back,
            days_forward,
        } => cmd_matches(config, MatchWindow::checked(days_back, days_forward)?, json).await,
        Commands::Team { name } => cmd_team(config, &name, json).await,
        Commands::Analyze { match_id } => cmd_analyze(config, match_id, json).await,
        Commands::BigSix => cmd_big_six(config, json).await,
        Commands::Search {
            query,
            collection,
            n,
        } => cmd_search(config, &collection, &query, n, json).await,
        Commands::Stats => cmd_stats(config, json).await,
        Commands::Serve { port, bind } => cmd_serve(config, port, &bind).await,
    }
}

fn window_days() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(0..=i64::from(MAX_WINDOW_DAYS))
}

fn build_config(cli: &Cli) -> ApiConfig {
    let mut config = ApiConfig::from_env();
    if cli.api_key.is_some() {
        config.api_key = cli.api_key.clone();
    }
    if cli.store.is_some() {
        config.store_path = cli.store.clone();
    }
    config
}

async fn open_dashboard(config: ApiConfig) -> Result<Dashboard> {
    let state = AppState::from_config(config)
        .await
        .context("Failed to set up data sources")?;
    Ok(state.dashboard)
}

/// Runs `fut` behind a spinner.
async fn spin<T>(message: &str, fut: impl Future<Output = T>) -> Result<T> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    let out = fut.await;
    pb.finish_and_clear();
    Ok(out)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn unavailable(what: &str) {
    println!(
        "{}",
        format!("⚠️  {} data is currently unavailable.", what).yellow()
    );
    println!("   Check your API key and rate limit, then try again.");
}

/// Show the league table
async fn cmd_standings(config: ApiConfig, json: bool) -> Result<()> {
    let dashboard = open_dashboard(config).await?;
    let standings = spin("Fetching standings...", dashboard.standings())
        .await?
        .context("Failed to fetch standings")?;

    match standings {
        Some(s) if json => print_json(&s),
        Some(s) => {
            println!("{}", "🏆 Premier League table".cyan().bold());
            print!("{}", format_table(&s));
            Ok(())
        }
        None => {
            unavailable("Standings");
            Ok(())
        }
    }
}

fn format_table(standings: &Standings) -> String {
    let mut out = format!(
        "{:>3}  {:<28} {:>3} {:>3} {:>3} {:>3} {:>5} {:>4}\n",
        "#", "Team", "P", "W", "D", "L", "GD", "Pts"
    );
    for row in standings.table() {
        out.push_str(&format!(
            "{:>3}  {:<28} {:>3} {:>3} {:>3} {:>3} {:>+5} {:>4}\n",
            row.position,
            row.team.name,
            row.played_games,
            row.won,
            row.draw,
            row.lost,
            row.goal_difference,
            row.points
        ));
    }
    out
}

/// List fixtures
async fn cmd_matches(config: ApiConfig, window: MatchWindow, json: bool) -> Result<()> {
    let dashboard = open_dashboard(config).await?;
    let report = spin("Fetching matches...", dashboard.matches(window))
        .await?
        .context("Failed to fetch matches")?;

    match report {
        Some(r) if json => print_json(&r),
        Some(r) => {
            print!("{}", format_matches(&r));
            Ok(())
        }
        None => {
            unavailable("Match");
            Ok(())
        }
    }
}

fn format_matches(report: &MatchReport) -> String {
    let mut out = format!("📅 Matches {}\n", report.date_range);
    for (id, m) in &report.matches {
        out.push_str(&format!(
            "   {} {} vs {} [{}] (#{})\n",
            m.date, m.home_team, m.away_team, m.status, id
        ));
    }
    out
}

/// Show a team's record
async fn cmd_team(config: ApiConfig, name: &str, json: bool) -> Result<()> {
    let dashboard = open_dashboard(config).await?;
    let team = spin("Looking up team...", dashboard.team(name))
        .await?
        .context("Failed to look up team")?;

    match team {
        Some(t) if json => print_json(&t),
        Some(t) => {
            print!("{}", format_team(&t));
            Ok(())
        }
        None => {
            println!("{} {}", "⚠️  Team not found:".yellow(), name);
            Ok(())
        }
    }
}

fn format_team(team: &TeamRecord) -> String {
    let mut out = format!("⚽ {}\n", team.team.name);
    out.push_str(&format!("   Position:  {}\n", team.position));
    out.push_str(&format!("   Points:    {}\n", team.points));
    out.push_str(&format!(
        "   Record:    {}W {}D {}L from {}\n",
        team.won, team.draw, team.lost, team.played_games
    ));
    out.push_str(&format!(
        "   Goals:     {} for, {} against ({:+})\n",
        team.goals_for, team.goals_against, team.goal_difference
    ));
    if let Some(form) = &team.form {
        out.push_str(&format!("   Form:      {}\n", form));
    }
    out
}

/// Analyze a match
async fn cmd_analyze(config: ApiConfig, match_id: u64, json: bool) -> Result<()> {
    let dashboard = open_dashboard(config).await?;
    let analysis = spin("Analyzing match...", dashboard.analysis(match_id))
        .await?
        .context("Failed to analyze match")?;

    match analysis {
        Some(a) if json => print_json(&a),
        Some(a) => {
            println!("{} {}", "📊 Match analysis".cyan().bold(), match_id);
            println!("{}", a.report);
            Ok(())
        }
        None => {
            unavailable("Match analysis");
            Ok(())
        }
    }
}

/// Compare the big six
async fn cmd_big_six(config: ApiConfig, json: bool) -> Result<()> {
    let dashboard = open_dashboard(config).await?;
    let comparison = spin("Fetching standings...", dashboard.big_six())
        .await?
        .context("Failed to compare the big six")?;

    match comparison {
        Some(c) if json => print_json(&c),
        Some(c) => {
            println!("{}", "🔝 Big six".cyan().bold());
            print!("{}", format_big_six(&c));
            Ok(())
        }
        None => {
            unavailable("Standings");
            Ok(())
        }
    }
}

fn format_big_six(comparison: &BigSixComparison) -> String {
    let mut entries: Vec<_> = comparison.values().collect();
    entries.sort_by_key(|e| e.position);

    let mut out = String::new();
    for e in entries {
        out.push_str(&format!(
            "{:>3}  {:<28} {:>4} pts {:>+5} GD  {}\n",
            e.position, e.team_name, e.points, e.goal_difference, e.form
        ));
    }
    out
}

/// Search the store
async fn cmd_search(
    config: ApiConfig,
    collection: &str,
    query: &str,
    n: usize,
    json: bool,
) -> Result<()> {
    let store = config
        .store_config()
        .open()
        .await
        .context("Failed to open store")?;
    let results = store
        .query(&touchline_core::QueryDescriptor::search(collection, query, n))
        .await
        .context("Search failed")?;

    if json {
        let docs: Vec<_> = results
            .iter()
            .map(|d| serde_json::json!({ "id": d.id, "score": d.score, "document": d.document }))
            .collect();
        return print_json(&docs);
    }

    if results.is_empty() {
        println!("{}", "No matching documents.".yellow());
        return Ok(());
    }

    println!("{} {} result(s) in {}", "🔎".cyan(), results.len(), collection);
    for doc in &results {
        let first_line = doc.document.lines().next().unwrap_or_default();
        println!("   {:.3}  {}  {}", doc.score, doc.id.dimmed(), first_line);
    }

    Ok(())
}

/// Show store statistics
async fn cmd_stats(config: ApiConfig, json: bool) -> Result<()> {
    let store = config
        .store_config()
        .open()
        .await
        .context("Failed to open store")?;
    let counts = store
        .collection_counts()
        .await
        .context("Failed to count documents")?;

    if json {
        let map: std::collections::BTreeMap<_, _> = counts.into_iter().collect();
        return print_json(&map);
    }

    println!("{}", "📦 Store".cyan().bold());
    for (collection, count) in &counts {
        println!("   {:<20} {:>6}", collection, count);
    }
    let total: u64 = counts.iter().map(|(_, n)| n).sum();
    println!("   {:<20} {:>6}", "total".bold(), total);

    Ok(())
}

/// Run API server
async fn cmd_serve(config: ApiConfig, port: u16, bind: &str) -> Result<()> {
    println!("{}", "🚀 Starting Touchline API server...".cyan().bold());
    println!("   {} http://{}:{}", "Listening on:".green(), bind, port);
    println!("   {} http://{}:{}/health", "Health check:".dimmed(), bind, port);
    println!("\n   Press Ctrl+C to stop.\n");

    let server = ApiServer::from_config(config)
        .await
        .context("Failed to set up data sources")?;

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    server.run(addr).await?;

    Ok(())
}
