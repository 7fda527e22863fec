//! tabcap CLI.
//!
//! Thin wrapper over `tabcap-core`: drives the population controller
//! against an in-memory browser simulator and inspects configuration.

mod sim;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabcap_core::{Config, MemoryStore, TabController};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::sim::{LogBadge, SimPlatform};

#[derive(Parser)]
#[command(name = "tabcap")]
#[command(about = "Bounded working-set control for browser tabs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a randomized browsing session against the controller
    Simulate(SimulateArgs),

    /// Inspect or validate controller configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct SimulateArgs {
    /// Initial number of open tabs
    #[arg(long, default_value_t = 10)]
    tabs: usize,

    /// Number of random browsing events to drive
    #[arg(long, default_value_t = 200)]
    events: usize,

    /// Cap on visible non-pinned tabs
    #[arg(long, default_value_t = 20)]
    limit: usize,

    /// Derive the cap from window width instead of the fixed limit
    #[arg(long)]
    adaptive: bool,

    /// Initial window width in pixels
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Bound on the hidden queue
    #[arg(long, default_value_t = 80)]
    hidden_max: usize,

    /// RNG seed, for a reproducible session
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the default configuration as JSON
    Show,
    /// Validate a JSON configuration file
    Check { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Simulate(args) => simulate(args).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&Config::default())?);
                Ok(())
            }
            ConfigAction::Check { path } => check_config(&path),
        },
    }
}

async fn simulate(args: SimulateArgs) -> Result<()> {
    let platform = Arc::new(SimPlatform::new(args.width));
    let store = Arc::new(MemoryStore::new());
    let badge = Arc::new(LogBadge::default());
    let controller = TabController::new(
        Arc::clone(&platform) as _,
        store as _,
        Arc::clone(&badge) as _,
    );

    let config = Config {
        tab_limit: args.limit,
        hidden_queue_max: args.hidden_max,
        adaptive_limit: args.adaptive,
        ..Config::default()
    };
    controller.apply_config(config).await?;

    let started = chrono::Local::now();
    info!(
        tabs = args.tabs,
        events = args.events,
        limit = args.limit,
        adaptive = args.adaptive,
        seed = args.seed,
        "simulation starting"
    );

    for i in 0..args.tabs {
        let tab = platform.open_tab(&format!("https://example.test/seed/{i}"));
        controller.on_tab_created(&tab).await;
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    for step in 0..args.events {
        match rng.random_range(0..10u32) {
            // Open a tab.
            0..=3 => {
                let tab = platform.open_tab(&format!("https://example.test/{step}"));
                debug!(step, tab_id = tab.id, "event: open");
                controller.on_tab_created(&tab).await;
            }
            // Focus a random tab.
            4..=6 => {
                let ids = platform.tab_ids();
                if ids.is_empty() {
                    continue;
                }
                let id = ids[rng.random_range(0..ids.len())];
                platform.focus_tab(id);
                debug!(step, tab_id = id, "event: focus");
                controller.on_tab_activated(id).await;
            }
            // Close a random tab.
            7..=8 => {
                let ids = platform.tab_ids();
                if ids.is_empty() {
                    continue;
                }
                let id = ids[rng.random_range(0..ids.len())];
                platform.close_tab(id);
                debug!(step, tab_id = id, "event: close");
                controller.on_tab_removed(id, false).await;
            }
            // Resize the window.
            _ => {
                let width = rng.random_range(600..=2_600);
                platform.set_width(width);
                debug!(step, width, "event: resize");
                controller.on_window_resized();
            }
        }
    }

    // Let the trailing resize debounce and fire-and-forget writes land.
    tokio::time::sleep(Duration::from_millis(700)).await;

    let stats = platform.stats();
    let capacity = controller.current_effective_capacity().await;
    let visible = platform.visible();
    let hidden = controller.hidden_entries();
    let summary = serde_json::json!({
        "started": started.to_rfc3339(),
        "finished": chrono::Local::now().to_rfc3339(),
        "events": args.events,
        "capacity": capacity,
        "visible_tabs": visible,
        "hidden_entries": hidden.len(),
        "evictions": stats.removed,
        "restorations": stats.created,
        "auto_moves": stats.moved,
        "badge": badge.text(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    ensure!(
        visible <= capacity,
        "population ended above capacity: {visible} > {capacity}"
    );
    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: Config =
        serde_json::from_str(&raw).context("config is not valid JSON for this schema")?;
    config.validate()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    info!(path = %path.display(), "config is valid");
    Ok(())
}
