mod commands;
mod config;
mod render;
mod source;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::ViewOptions;

#[derive(Parser)]
#[command(name = "icsview")]
#[command(about = "View events from an iCalendar (.ics) feed in your timezone")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ViewArgs {
    /// Calendar to read: a file, `-` for stdin, or an http(s):// or webcal:// URL
    source: Option<String>,

    /// Timezone to show events in (e.g. "Europe/Paris")
    #[arg(long)]
    tz: Option<String>,

    /// Treat this RFC 3339 timestamp as the current time
    #[arg(long)]
    now: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List upcoming events, grouped by day
    Events {
        #[command(flatten)]
        view: ViewArgs,

        /// How many days ahead to show
        #[arg(short, long)]
        days: Option<i64>,

        /// Print occurrences as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one month as a calendar grid
    Month {
        #[command(flatten)]
        view: ViewArgs,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long)]
        month: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;

    init_logging(&cfg.log_level);

    match cli.command {
        Commands::Events { view, days, json } => {
            let opts = resolve(&cfg, &view, days)?;
            commands::events::run(opts, json).await
        }
        Commands::Month { view, year, month } => {
            let opts = resolve(&cfg, &view, None)?;
            commands::month::run(opts, year, month).await
        }
    }
}

fn resolve(cfg: &config::Config, view: &ViewArgs, days: Option<i64>) -> Result<ViewOptions> {
    ViewOptions::resolve(
        cfg,
        view.source.as_deref(),
        view.tz.as_deref(),
        view.now.as_deref(),
        days,
    )
}

/// Log to stderr. RUST_LOG wins over the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
