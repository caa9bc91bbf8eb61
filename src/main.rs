use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

use tokenscout::{
    arguments::{get_enabled_debug_modes, is_logger_flag},
    config::{self, Config},
    database::TokenDatabase,
    logger::{self, LogTag},
    paths,
    scanner::{PassReport, ScannerService},
    tokens::batch::BatchReport,
};

/// Solana meme-token scanner: discover, enrich, score, store, serve
#[derive(Debug, Parser)]
#[command(name = "tokenscout", version, about)]
struct Cli {
    /// Config file (default: data/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file, overrides [database].path
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Tokens enriched per pass, overrides [scanner].batch_limit
    #[arg(long, global = true)]
    limit: Option<usize>,

    /// Seconds between passes, overrides [scanner].interval_secs
    #[arg(long, global = true)]
    interval: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a single discovery and enrichment pass
    Scan,
    /// Run passes every interval until Ctrl-C
    Run {
        /// Also serve the JSON API from this process
        #[arg(long)]
        api: bool,
    },
    /// Serve the read-only JSON API
    #[cfg(feature = "web")]
    Serve,
    /// Enrich specific token addresses now
    Enrich {
        #[arg(required = true)]
        addresses: Vec<String>,
    },
}

/// Arguments for clap, without the logger's own flags
fn clap_args() -> Vec<String> {
    let mut args = Vec::new();
    let mut skip_value = false;
    for arg in std::env::args() {
        if skip_value {
            skip_value = false;
            continue;
        }
        if arg == "--log-tags" {
            skip_value = true;
            continue;
        }
        if !is_logger_flag(&arg) {
            args.push(arg);
        }
    }
    args
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().unwrap_or_else(paths::get_config_path);
    let mut config = config::load_config_from_path(&path).map_err(|e| anyhow!(e))?;

    if let Some(database) = &cli.database {
        config.database.path = database.display().to_string();
    } else {
        config.database.path = paths::resolve(&config.database.path)
            .display()
            .to_string();
    }
    if let Some(limit) = cli.limit {
        config.scanner.batch_limit = limit;
    }
    if let Some(interval) = cli.interval {
        config.scanner.interval_secs = interval;
    }
    Ok(config)
}

fn print_pass(report: &PassReport) {
    println!(
        "{} discovered {} ({} new), selected {}",
        "pass".bright_cyan().bold(),
        report.discovered,
        report.newly_recorded,
        report.selected
    );
    print_batch(&report.batch);
}

fn print_batch(batch: &BatchReport) {
    println!(
        "{} {} enriched, {} failed, {} timed out, {} stored in {}ms",
        "batch".bright_cyan().bold(),
        batch.enriched.to_string().green(),
        batch.failed.to_string().red(),
        batch.timed_out.to_string().yellow(),
        batch.stored,
        batch.elapsed_ms
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_from(clap_args());

    paths::ensure_all_directories().map_err(|e| anyhow!(e))?;
    logger::init();

    let debug_modes = get_enabled_debug_modes();
    if !debug_modes.is_empty() {
        logger::info(
            LogTag::System,
            &format!("Debug modes enabled: {}", debug_modes.join(", ")),
        );
    }

    let config = load_config(&cli)?;
    let database = TokenDatabase::from_config(&config.database)
        .map_err(|e| anyhow!(e))
        .context("opening token database")?;

    let result = run(cli.command, config, database).await;
    logger::flush();
    result
}

async fn run(command: Command, config: Config, database: TokenDatabase) -> Result<()> {
    match command {
        Command::Scan => {
            let scanner = ScannerService::from_config(&config, database).map_err(|e| anyhow!(e))?;
            let report = scanner.run_pass().await.map_err(|e| anyhow!(e))?;
            print_pass(&report);
        }
        Command::Run { api } => {
            #[cfg(feature = "web")]
            if api {
                let web = config.webserver.clone();
                let db = database.clone();
                tokio::spawn(async move {
                    if let Err(e) = tokenscout::webserver::start_server(web, db).await {
                        logger::error(LogTag::Webserver, &e);
                    }
                });
            }
            #[cfg(not(feature = "web"))]
            if api {
                logger::warning(LogTag::System, "Built without the web feature, --api ignored");
            }

            let scanner = ScannerService::from_config(&config, database).map_err(|e| anyhow!(e))?;
            scanner
                .run_forever(Duration::from_secs(config.scanner.interval_secs))
                .await;

            #[cfg(feature = "web")]
            if api {
                tokenscout::webserver::shutdown();
            }
        }
        #[cfg(feature = "web")]
        Command::Serve => {
            tokenscout::webserver::start_server(config.webserver.clone(), database)
                .await
                .map_err(|e| anyhow!(e))?;
        }
        Command::Enrich { addresses } => {
            let scanner =
                ScannerService::from_config(&config, database.clone()).map_err(|e| anyhow!(e))?;
            let batch = scanner
                .enrich_addresses(addresses.clone())
                .await
                .map_err(|e| anyhow!(e))?;
            print_batch(&batch);

            for address in &addresses {
                match database.get_token(address).await.map_err(|e| anyhow!(e))? {
                    Some(record) if record.is_enriched() => {
                        println!("{}", serde_json::to_string_pretty(&record)?);
                    }
                    _ => println!("{} {}", "no data".red(), address),
                }
            }
        }
    }
    Ok(())
}
