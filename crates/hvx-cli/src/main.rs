//! 🚀 hvx-cli: the front door, the bouncer, the maitre d' of hvx.
//!
//! 🎬 *[narrator voice]* "It all started with a simple main() function..."
//! 📦 Thin wrapper: read the flags, load the config, set up logging, hand the
//! range to the library, print the score. Like a manager. 🦆

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{Table, presets::UTF8_FULL};
use tracing::{Subscriber, error};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use hvx::app_config::{ConfigOverrides, load_config};
use hvx::events::TallySnapshot;

/// 🌾 Harvest every record in an ID range into a bulk sink.
#[derive(Debug, Parser)]
#[command(name = "hvx", version, about)]
struct Cli {
    /// Path to the TOML config. Skipped silently if the file isn't there.
    #[arg(short, long, env = "HVX_CONFIG", default_value = "hvx.toml")]
    config: PathBuf,

    /// First ID to visit. Beats the config file.
    #[arg(long)]
    low: Option<u64>,

    /// Last ID to visit, inclusive. Beats the config file.
    #[arg(long)]
    high: Option<u64>,
}

/// 🚀 main(): parse, load, log, run, report. In that order, no take-backs.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 🔒 Check the config file exists before we get too emotionally attached
    let config_file = cli
        .config
        .try_exists()
        .with_context(|| {
            format!(
                "💀 Couldn't tell whether the config file exists. If it's a relative path, \
                 check your working directory. Was checking here: '{}'",
                cli.config.display()
            )
        })?
        .then_some(cli.config.as_path());

    // 📡 run_mode isn't known until the config is read, so loading logs through a
    // stand-in subscriber that only listens to RUST_LOG
    let startup = startup_subscriber(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        std::io::stdout,
    );
    let overrides = ConfigOverrides {
        low: cli.low,
        high: cli.high,
    };
    let app_config = tracing::subscriber::with_default(startup, || load_config(config_file, overrides))
        .context("💀 In hvx-cli, main, we couldn't load the config. Check the file and the HVX_* variables.")?;

    // 📡 RUST_LOG wins; otherwise run_mode decides how chatty we are
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(app_config.default_log_filter())),
        )
        .init();

    let id_range = app_config.id_range;
    match hvx::run(app_config).await {
        Ok(tally) => {
            println!("{}", summary_table(&id_range.to_string(), &tally));
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            // 🗑️ Exit with prejudice. Process exitus maximus.
            std::process::exit(1);
        }
    }
}

fn summary_table(range: &str, tally: &TallySnapshot) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["📊 Harvest", range]);
    let rows = [
        ("IDs visited", tally.visited),
        ("Found", tally.found),
        ("Not found", tally.not_found),
        ("Fetch failures", tally.fetch_failures),
        ("Bulk writes", tally.flushes),
        ("Bulk write failures", tally.flush_failures),
        ("Records written", tally.records_written),
        ("Records dropped", tally.records_dropped),
    ];
    for (label, count) in rows {
        table.add_row(vec![label.to_string(), count.to_string()]);
    }
    table
}

fn startup_subscriber<W>(filter: EnvFilter, make_writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(make_writer)
        .finish()
}

// 🕵️ Fragments that show up in reqwest/hyper errors when the other end isn't there.
const UNREACHABLE_SMELLS: &[&str] = &[
    "error sending request",
    "connection refused",
    "tcp connect error",
    "dns error",
];

fn smells_unreachable(cause: &str) -> bool {
    let cause = cause.to_ascii_lowercase();
    UNREACHABLE_SMELLS.iter().any(|smell| cause.contains(smell))
}

fn report_failure(err: &anyhow::Error) {
    error!("💀 error: {}", err);
    // -- 🧅 peel the onion of sadness, one layer at a time
    let mut unreachable = false;
    for cause in err.chain().skip(1) {
        error!("⚠️  cause: {}", cause);
        unreachable |= smells_unreachable(&cause.to_string());
    }

    if unreachable {
        error!(
            "🔧 hint: looks like a service isn't reachable. Check that the record API and \
             the sink (Elasticsearch, etc.) are actually up. If you're using Docker, \
             `docker ps` shows what's running. ☕"
        );
    }
}
