use anyhow::Context;
use api_client::YahooClient;
use clap::{Parser, Subcommand};
use comfy_table::{Cell, CellAlignment, Table, presets::UTF8_FULL};
use configuration::{Config, SettingsUpdate, init_tracing, load_config, load_config_from};
use core_types::RecommendationSnapshot;
use database::{DbRepository, connect, run_migrations};
use engine::{Ports, RecommendationEngine, RunGate, WeeklySchedule};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use web_server::AppState;

/// The main entry point for the rebalancing advisor.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; it only supplies optional overrides.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    // The guard flushes the log file on exit, so it must outlive every command.
    let _log_guard = init_tracing(&config.logging).context("Failed to initialise logging")?;

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| config.database.url.clone());
    let db_pool = connect(&database_url)
        .await
        .context("Failed to connect to the database")?;
    run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    let db_repo = DbRepository::new(db_pool);
    db_repo
        .seed_defaults(&config.defaults)
        .await
        .context("Failed to seed default settings")?;

    match cli.command {
        Commands::Run { json } => handle_run(&config, db_repo, json).await,
        Commands::Serve(args) => handle_serve(&config, db_repo, args).await,
        Commands::Latest { json } => handle_latest(&db_repo, json).await,
        Commands::Holdings { command } => handle_holdings(&db_repo, command).await,
        Commands::Settings { command } => handle_settings(&db_repo, command).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Weekly momentum/volatility rebalancing advisor.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (default: ./config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one recommendation pass now and print it.
    Run {
        /// Print the snapshot as JSON instead of tables.
        #[arg(long)]
        json: bool,
    },
    /// Serve the HTTP API and run the weekly schedule.
    Serve(ServeArgs),
    /// Print the most recent recommendation.
    Latest {
        #[arg(long)]
        json: bool,
    },
    /// Inspect or edit the paper holdings.
    Holdings {
        #[command(subcommand)]
        command: HoldingsCommand,
    },
    /// Inspect or edit the portfolio settings.
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Parser)]
struct ServeArgs {
    /// Address to listen on, overriding `server.addr`.
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Do not start the weekly scheduler.
    #[arg(long)]
    no_schedule: bool,
}

#[derive(Subcommand)]
enum HoldingsCommand {
    /// List current holdings.
    List,
    /// Set the quantity held of one instrument. Use CASH for the cash balance.
    Set { instrument: String, quantity: f64 },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Show the current settings.
    Show,
    /// Change one or more settings. Out-of-range values are clamped.
    Set {
        /// Comma-separated instrument identifiers (at least 5).
        #[arg(long)]
        universe: Option<String>,
        #[arg(long)]
        top_n: Option<f64>,
        #[arg(long)]
        max_single_weight: Option<f64>,
        #[arg(long)]
        capital_usd: Option<Decimal>,
    },
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn build_engine(config: &Config, db_repo: DbRepository) -> anyhow::Result<RecommendationEngine> {
    let prices = YahooClient::new(&config.price_provider).context("Failed to build price client")?;
    let store = Arc::new(db_repo);
    let ports = Ports {
        prices: Arc::new(prices),
        settings: store.clone(),
        holdings: store.clone(),
        snapshots: store,
    };
    Ok(RecommendationEngine::new(&config.strategy, ports)?)
}

async fn handle_run(config: &Config, db_repo: DbRepository, json: bool) -> anyhow::Result<()> {
    let engine = build_engine(config, db_repo)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message("Downloading prices and ranking the universe...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = engine.run().await;
    spinner.finish_and_clear();

    let snapshot = result?;
    print_snapshot(&snapshot, json)
}

async fn handle_serve(config: &Config, db_repo: DbRepository, args: ServeArgs) -> anyhow::Result<()> {
    let engine = build_engine(config, db_repo.clone())?;
    let runs = Arc::new(RunGate::new(Arc::new(engine)));

    if config.schedule.enabled && !args.no_schedule {
        engine::scheduler::spawn(WeeklySchedule::from_config(&config.schedule), runs.clone());
    } else {
        tracing::info!("Weekly scheduler disabled.");
    }

    let addr = args.addr.unwrap_or(config.server.addr);
    web_server::run_server(addr, Arc::new(AppState { db_repo, runs })).await
}

async fn handle_latest(db_repo: &DbRepository, json: bool) -> anyhow::Result<()> {
    match db_repo.latest_recommendation().await? {
        Some(snapshot) => print_snapshot(&snapshot, json),
        None => {
            println!("No recommendation has been run yet. Try `rebalancer run`.");
            Ok(())
        }
    }
}

async fn handle_holdings(db_repo: &DbRepository, command: HoldingsCommand) -> anyhow::Result<()> {
    if let HoldingsCommand::Set { instrument, quantity } = &command {
        db_repo.upsert_holding(instrument, *quantity).await?;
    }

    let holdings = db_repo.holdings().await?;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Instrument", "Quantity"]);
    for (instrument, quantity) in holdings.positions() {
        table.add_row(vec![Cell::new(instrument), number_cell(format!("{quantity:.4}"))]);
    }
    table.add_row(vec![Cell::new(core_types::CASH), number_cell(format!("{:.2}", holdings.cash()))]);
    println!("{table}");
    Ok(())
}

async fn handle_settings(db_repo: &DbRepository, command: SettingsCommand) -> anyhow::Result<()> {
    let settings = match command {
        SettingsCommand::Show => db_repo.portfolio_settings().await?,
        SettingsCommand::Set {
            universe,
            top_n,
            max_single_weight,
            capital_usd,
        } => {
            let update = SettingsUpdate {
                universe,
                top_n,
                max_single_weight,
                capital_usd,
            };
            let (settings, adjustments) = db_repo.update_portfolio_settings(&update).await?;
            for note in adjustments {
                println!("note: {note}");
            }
            settings
        }
    };

    println!("universe ({}): {}", settings.universe.len(), settings.universe.join(", "));
    println!("top_n: {}", settings.top_n);
    println!("max_single_weight: {}", settings.max_single_weight);
    println!("capital_usd: {}", settings.capital_usd);
    Ok(())
}

// ==============================================================================
// Output
// ==============================================================================

fn number_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn print_snapshot(snapshot: &RecommendationSnapshot, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    println!("Run {} at {}", snapshot.run_id, snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    if let Some(failure) = &snapshot.error {
        println!("Run failed: {failure}");
        return Ok(());
    }

    println!(
        "Universe: {} instruments, selected: {}",
        snapshot.universe_size,
        if snapshot.selected.is_empty() {
            "none".to_string()
        } else {
            snapshot.selected.join(", ")
        }
    );
    println!("Estimated portfolio value: ${:.2}", snapshot.portfolio_value_est);

    let mut signals = Table::new();
    signals
        .load_preset(UTF8_FULL)
        .set_header(vec!["Rank", "Instrument", "Momentum", "Volatility", "Score"]);
    for (rank, signal) in snapshot.signals.iter().take(15).enumerate() {
        signals.add_row(vec![
            number_cell((rank + 1).to_string()),
            Cell::new(&signal.instrument),
            number_cell(format!("{:.2}%", signal.momentum * 100.0)),
            number_cell(format!("{:.2}%", signal.volatility * 100.0)),
            number_cell(format!("{:.3}", signal.score)),
        ]);
    }
    println!("{signals}");

    let mut weights = Table::new();
    weights
        .load_preset(UTF8_FULL)
        .set_header(vec!["Instrument", "Current", "Target"]);
    let mut instruments: Vec<&str> = snapshot
        .current_weights
        .iter()
        .chain(snapshot.target_weights.iter())
        .map(|(id, _)| id)
        .collect();
    instruments.sort_unstable();
    instruments.dedup();
    for id in instruments {
        weights.add_row(vec![
            Cell::new(id),
            number_cell(format!("{:.2}%", snapshot.current_weights.weight(id) * 100.0)),
            number_cell(format!("{:.2}%", snapshot.target_weights.weight(id) * 100.0)),
        ]);
    }
    println!("{weights}");

    if snapshot.trades.is_empty() {
        println!("No trades needed.");
    } else {
        let mut trades = Table::new();
        trades
            .load_preset(UTF8_FULL)
            .set_header(vec!["Side", "Instrument", "Delta USD", "Ref price", "Est. quantity"]);
        for trade in &snapshot.trades {
            trades.add_row(vec![
                Cell::new(trade.side),
                Cell::new(&trade.instrument),
                number_cell(format!("{:.2}", trade.delta_usd)),
                number_cell(format!("{:.2}", trade.reference_price)),
                number_cell(format!("{:.4}", trade.est_quantity)),
            ]);
        }
        println!("{trades}");
    }

    for skipped in &snapshot.skipped_trades {
        println!("skipped {}: {:?}", skipped.instrument, skipped.reason);
    }
    for note in &snapshot.notes {
        println!("note: {note}");
    }
    Ok(())
}
