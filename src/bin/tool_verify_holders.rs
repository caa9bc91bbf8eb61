/// Holder Count Verification Tool
///
/// Queries every holder source (Solscan, Helius RPC, RugCheck) for the same
/// mints and prints the counts side by side, so a disagreeing source is easy
/// to spot before changing `holder_sources`.
///
/// Usage:
///   cargo run --bin tool_verify_holders -- <MINT> [<MINT>...]
///   cargo run --bin tool_verify_holders -- --config data/config.toml <MINT>
use anyhow::{anyhow, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Instant;

use tokenscout::{
    apis::ApiManager,
    arguments::is_logger_flag,
    config,
    logger::{self, LogTag},
    paths,
    tokens::holders::verify_holders,
};

#[derive(Debug, Parser)]
#[command(name = "tool_verify_holders", about = "Compare holder counts across sources")]
struct Args {
    /// Config file (default: data/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Token mint addresses
    #[arg(required = true)]
    mints: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_from(std::env::args().filter(|a| !is_logger_flag(a)));
    logger::init();

    let path = args.config.clone().unwrap_or_else(paths::get_config_path);
    config::load_config_from_path(&path).map_err(|e| anyhow!(e))?;
    let apis = config::with_config(ApiManager::new).map_err(|e| anyhow!(e))?;

    println!("{}", "Holder count verification".bright_cyan().bold());
    println!("{}", "=".repeat(60).dimmed());

    for mint in &args.mints {
        let started = Instant::now();
        let results = verify_holders(&apis, mint).await;

        println!("\n{} {}", "Mint:".bright_white(), mint.yellow());
        let mut counts = Vec::new();
        for (source, result) in results {
            match result {
                Ok(count) => {
                    counts.push(count);
                    println!("   {:<10} {}", source.as_str(), count.to_string().green());
                }
                Err(e) => println!("   {:<10} {}", source.as_str(), e.to_string().red()),
            }
        }

        if let (Some(min), Some(max)) = (counts.iter().min(), counts.iter().max()) {
            let spread = max - min;
            let line = format!("   spread {} across {} sources", spread, counts.len());
            if spread == 0 {
                println!("{}", line.green());
            } else {
                println!("{}", line.yellow());
            }
        }
        logger::debug(
            LogTag::Tokens,
            &format!("Verified {} in {}ms", mint, started.elapsed().as_millis()),
        );
    }

    logger::flush();
    Ok(())
}
