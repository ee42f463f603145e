use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use referral_engine::config::{config_path_from_env, EngineConfig};
use referral_engine::constants::LOG_ENV;
use referral_engine::report::{commissions_workbook, global_workbook, network_summary, user_report};
use referral_engine::{integrity, CachedEngine, CommissionSource, NetworkData, SaleId, UserId};

/// Referral commission calculator
#[derive(Debug, Parser)]
#[command(name = "referral-engine", version, about)]
struct Cli {
    /// TOML engine config (default: $REFERRAL_CONFIG_PATH or config/referral.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON data set with `users` and `sales`; the built-in demo network if omitted
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Commission records for one sale
    Sale { sale_id: String },
    /// Commissions, own sales and downline of one user
    User { user_id: String },
    /// Sponsor chain of one user
    Uplines { user_id: String },
    /// Totals for every user, highest earners first
    Network,
    /// Write the export workbook as JSON
    Export {
        #[arg(long)]
        out: PathBuf,
        /// Users + Sales instead of Sales + Commissions
        #[arg(long)]
        global: bool,
    },
    /// Report dangling sponsor and maker references
    Check,
}

fn init_tracing() {
    // REFERRAL_LOG, then RUST_LOG, then info
    let filter = std::env::var(LOG_ENV)
        .unwrap_or_else(|_| std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(config_path_from_env()));
    let mut cfg = EngineConfig::load_or_default(&config_path)?;
    cfg.apply_env()?;
    let plan = cfg.plan()?;

    let data = match &cli.data {
        Some(path) => NetworkData::load(path)
            .with_context(|| format!("loading data set {}", path.display()))?,
        None => NetworkData::sample(),
    };
    let (directory, ledger) = data.into_snapshot()?;
    info!(
        users = directory.len(),
        sales = ledger.len(),
        max_levels = plan.max_levels,
        "snapshot ready"
    );

    let issues = integrity::check(&directory, &ledger);
    if cfg.strict && !issues.is_empty() && !matches!(cli.command, Command::Check) {
        for issue in &issues {
            error!("{}", issue);
        }
        bail!("strict mode: {} integrity issue(s) found", issues.len());
    }

    let engine = CachedEngine::new(&directory, &ledger);
    match cli.command {
        Command::Sale { sale_id } => {
            let sale = ledger
                .find_sale(&SaleId::new(sale_id.as_str()))
                .ok_or_else(|| anyhow!("unknown sale {}", sale_id))?;
            print_json(&engine.commissions_for_sale(sale, &plan))?;
        }
        Command::User { user_id } => {
            let id = UserId::new(user_id.as_str());
            let report = user_report(&engine, &id, &plan, cfg.tree_bounds())
                .ok_or_else(|| anyhow!("unknown user {}", user_id))?;
            print_json(&report)?;
        }
        Command::Uplines { user_id } => {
            print_json(&directory.uplines_of(&UserId::new(user_id), plan.max_levels))?;
        }
        Command::Network => {
            print_json(&network_summary(&engine, &plan))?;
        }
        Command::Export { out, global } => {
            let book = if global {
                global_workbook(&engine, &plan)?
            } else {
                commissions_workbook(&engine, &plan)?
            };
            book.save(&out)
                .with_context(|| format!("writing {}", out.display()))?;
            info!(path = %out.display(), sheets = book.sheets.len(), "workbook written");
        }
        Command::Check => {
            print_json(&issues)?;
            if !issues.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
