//! launchpad - browse launchpad campaigns and submit contributions
//!
//! - `list`: every configured launch source, deduplicated, enriched and sorted
//! - `show`: one launch with its raw account snapshot, optionally re-read
//! - `submit`: send an instruction list through the smart submitter, after
//!   checking the target launch can take it

#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{bail, Context, Result};
use base64::Engine;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use launchpad_contributor::config::Config;
use launchpad_contributor::launch::amount::{format_time_remaining, format_usd, short_address};
use launchpad_contributor::launch::contribution::{
    ensure_can_claim, ensure_can_contribute, funding_record_address, launch_address,
    ui_amount_to_raw, DEFAULT_QUOTE_DECIMALS,
};
use launchpad_contributor::launch::{
    refresh_detail, AccountSource, CampaignRecord, Catalog, CatalogFilter, ContributeFilter,
    JsonSnapshotSource, LaunchState, RefreshOutcome, SortDirection, SortField,
};
use launchpad_contributor::metadata::DasMetadataSource;
use launchpad_contributor::metrics::metrics;
use launchpad_contributor::rpc::RpcChainClient;
use launchpad_contributor::tx_builder::{SendOptions, SmartSubmitter};
use launchpad_contributor::wallet::KeypairWallet;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "launchpad", author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "LAUNCHPAD_CONFIG")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print Prometheus metrics after the command finishes
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List launches from every configured source
    List(ListArgs),
    /// Show one launch and its raw account
    Show {
        address: String,

        /// Re-read the account and its token metadata before printing
        #[arg(long)]
        refresh: bool,
    },
    /// Submit a JSON instruction list
    Submit(SubmitArgs),
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    /// Only launches in this state
    #[arg(long)]
    state: Option<LaunchState>,

    #[arg(long, conflicts_with = "non_contributable")]
    contributable: bool,

    #[arg(long)]
    non_contributable: bool,

    #[arg(long, value_enum, default_value_t = SortArg::Raised)]
    sort: SortArg,

    /// Ascending instead of descending
    #[arg(long)]
    asc: bool,

    /// Keep launches that look like test deployments
    #[arg(long)]
    include_tests: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Goal,
    Raised,
}

#[derive(ClapArgs, Debug)]
struct SubmitArgs {
    /// JSON file with the instructions to send
    #[arg(long)]
    instructions: PathBuf,

    /// Micro-lamports per compute unit
    #[arg(long)]
    priority_fee: Option<u64>,

    /// Explicit compute unit limit, skips simulation
    #[arg(long)]
    compute_units: Option<u32>,

    /// Compute unit limit margin
    #[arg(long)]
    margin: Option<f64>,

    #[arg(long = "lookup-table")]
    lookup_tables: Vec<String>,

    /// Return after submission without waiting for confirmation
    #[arg(long)]
    no_confirm: bool,

    #[arg(long)]
    label: Option<String>,

    /// Launch the instructions act on; its state is checked before sending
    #[arg(long)]
    launch: Option<String>,

    /// Contribution in quote units, e.g. 12.5
    #[arg(long, requires = "launch", conflicts_with = "claim")]
    amount: Option<String>,

    /// Claim from a completed launch instead of contributing
    #[arg(long, requires = "launch")]
    claim: bool,

    /// Raw amount this wallet committed to the launch
    #[arg(long, requires = "claim")]
    committed: Option<String>,

    /// Launch program id; the instructions must touch this wallet's funding record
    #[arg(long, requires = "launch")]
    program_id: Option<String>,

    #[arg(long, default_value_t = DEFAULT_QUOTE_DECIMALS)]
    quote_decimals: u8,
}

/// Instruction as produced by an external program client
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstructionJson {
    program_id: String,
    accounts: Vec<AccountMetaJson>,
    /// base64
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountMetaJson {
    pubkey: String,
    is_signer: bool,
    is_writable: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.json_logs)?;

    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let result = match args.command {
        Command::List(list) => run_list(&config, list).await,
        Command::Show { address, refresh } => run_show(&config, &address, refresh).await,
        Command::Submit(submit) => run_submit(&config, submit).await,
    };

    if args.metrics {
        print!("{}", metrics().render()?);
    }
    result
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let default_filter = if verbose {
        "launchpad_contributor=debug,launchpad=debug,info"
    } else {
        "launchpad_contributor=info,launchpad=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

fn launch_sources(config: &Config) -> Result<Vec<Arc<dyn AccountSource>>> {
    if config.sources.is_empty() {
        bail!("No launch sources configured; add [[sources]] entries to the config file");
    }
    Ok(config
        .sources
        .iter()
        .map(|s| Arc::new(JsonSnapshotSource::new(s.version, s.path.clone())) as Arc<dyn AccountSource>)
        .collect())
}

fn metadata_source(config: &Config) -> Result<DasMetadataSource> {
    Ok(DasMetadataSource::new(
        config.metadata.das_markers.clone(),
        std::time::Duration::from_secs(config.metadata.timeout_secs),
    )?)
}

async fn load_catalog(config: &Config) -> Result<Catalog> {
    let sources = launch_sources(config)?;
    let metadata = metadata_source(config)?;
    let now = chrono::Utc::now().timestamp();
    Ok(Catalog::load(&sources, &metadata, Some(config.das_endpoint()), now).await)
}

async fn find_launch(config: &Config, address: &str) -> Result<CampaignRecord> {
    let catalog = load_catalog(config).await?;
    catalog
        .get(address)
        .cloned()
        .with_context(|| format!("Launch {} not found in any source", address))
}

async fn run_list(config: &Config, args: ListArgs) -> Result<()> {
    let catalog = load_catalog(config).await?;

    let filter = CatalogFilter {
        state: args.state,
        contribute: if args.contributable {
            ContributeFilter::Contributable
        } else if args.non_contributable {
            ContributeFilter::NonContributable
        } else {
            ContributeFilter::All
        },
        include_tests: args.include_tests,
    };
    let field = match args.sort {
        SortArg::Goal => SortField::Goal,
        SortArg::Raised => SortField::Raised,
    };
    let direction = if args.asc { SortDirection::Asc } else { SortDirection::Desc };

    let rows = catalog.view(&filter, field, direction);
    println!(
        "{:<13} {:<5} {:<13} {:<24} {:>16} {:>16} {:<14}",
        "ADDRESS", "VER", "STATE", "TOKEN", "RAISED", "GOAL", "TIME"
    );
    for record in &rows {
        let token = match (record.display_name(), record.display_symbol()) {
            ("", "") => short_address(&record.base_mint),
            (name, "") => name.to_string(),
            ("", symbol) => symbol.to_string(),
            (name, symbol) => format!("{} ({})", name, symbol),
        };
        let time = match record.seconds_remaining {
            Some(secs) => format_time_remaining(secs),
            None => "-".to_string(),
        };
        println!(
            "{:<13} {:<5} {:<13} {:<24} {:>16} {:>16} {:<14}",
            short_address(&record.address),
            record.version.to_string(),
            record.state.as_str(),
            token,
            format_usd(record.total_committed.as_deref()),
            format_usd(record.goal_amount.as_deref()),
            time,
        );
    }
    println!(
        "{} shown · {} open for contribution",
        rows.len(),
        catalog.contributable_count()
    );
    Ok(())
}

async fn run_show(config: &Config, address: &str, refresh: bool) -> Result<()> {
    let mut record = find_launch(config, address).await?;

    if refresh {
        let sources = launch_sources(config)?;
        let source = sources
            .iter()
            .find(|s| s.version() == record.version)
            .with_context(|| format!("No {} source configured", record.version))?;
        let metadata = metadata_source(config)?;
        let now = chrono::Utc::now().timestamp();
        match refresh_detail(source.as_ref(), &metadata, Some(config.das_endpoint()), &record, now)
            .await
            .with_context(|| format!("Failed to refresh {}", address))?
        {
            RefreshOutcome::Updated(fresh) => record = fresh,
            RefreshOutcome::Vanished => {
                eprintln!("Launch account no longer exists; showing the last known state");
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn run_submit(config: &Config, args: SubmitArgs) -> Result<()> {
    let instructions = read_instructions(&args.instructions)?;

    let mut options: SendOptions = config.send.clone();
    if let Some(fee) = args.priority_fee {
        options.priority_fee = fee;
    }
    if let Some(units) = args.compute_units {
        options.compute_units = Some(units);
    }
    if let Some(margin) = args.margin {
        options.compute_unit_limit_margin = margin;
    }
    if args.no_confirm {
        options.confirmation = None;
    }
    if args.label.is_some() {
        options.label = args.label.clone();
    }
    options.lookup_tables = args
        .lookup_tables
        .iter()
        .map(|s| Pubkey::from_str(s).with_context(|| format!("Invalid lookup table address: {}", s)))
        .collect::<Result<_>>()?;

    let keypair_path = config.keypair_path();
    let wallet = KeypairWallet::from_file(&keypair_path)
        .with_context(|| format!("Failed to load wallet from {}", keypair_path.display()))?;
    info!("Wallet address: {}", wallet.pubkey());

    if let Some(address) = &args.launch {
        let record = find_launch(config, address).await?;
        check_launch(&record, &wallet.pubkey(), &args, &instructions)?;
    }

    let client = RpcChainClient::new(
        config.rpc.url.clone(),
        config.rpc.commitment,
        config.rpc.timeout(),
        config.rpc.poll_interval(),
    );
    let submitter = SmartSubmitter::new(Arc::new(client), Arc::new(wallet));

    match submitter.send(&instructions, &options).await {
        Ok(signature) => {
            println!("{}", signature);
            Ok(())
        }
        Err(e) => {
            error!(kind = e.category(), stage = %e.stage(), "Submission failed");
            if !e.outcome_is_known() {
                eprintln!("Outcome unknown: check the signature before sending again");
            }
            for line in e.logs() {
                eprintln!("  {}", line);
            }
            Err(e.into())
        }
    }
}

/// Refuse to send when the launch cannot take a contribution or claim.
fn check_launch(
    record: &CampaignRecord,
    wallet: &Pubkey,
    args: &SubmitArgs,
    instructions: &[Instruction],
) -> Result<()> {
    if args.claim {
        ensure_can_claim(record, Some(wallet), args.committed.as_deref())?;
        info!(launch = %record.address, "Claim preconditions met");
    } else {
        let amount = args
            .amount
            .as_deref()
            .context("--amount is required when contributing to a launch")?;
        let raw_amount = ui_amount_to_raw(amount, args.quote_decimals)?;
        ensure_can_contribute(record, Some(wallet), raw_amount)?;
        info!(launch = %record.address, raw_amount, "Contribution preconditions met");
    }

    if let Some(program) = &args.program_id {
        let program_id = Pubkey::from_str(program)
            .with_context(|| format!("Invalid program id: {}", program))?;
        let funding_record = funding_record_address(&program_id, &launch_address(record)?, wallet);
        let touched = instructions.iter().any(|ix| {
            ix.program_id == program_id && ix.accounts.iter().any(|meta| meta.pubkey == funding_record)
        });
        if !touched {
            bail!(
                "No {} instruction references this wallet's funding record {}",
                program_id,
                funding_record
            );
        }
    }
    Ok(())
}

fn read_instructions(path: &Path) -> Result<Vec<Instruction>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read instructions from {}", path.display()))?;
    parse_instructions(&content)
}

fn parse_instructions(content: &str) -> Result<Vec<Instruction>> {
    let raw: Vec<InstructionJson> =
        serde_json::from_str(content).context("Failed to parse instruction JSON")?;
    raw.into_iter()
        .enumerate()
        .map(|(i, ix)| {
            let program_id = Pubkey::from_str(&ix.program_id)
                .with_context(|| format!("Instruction {}: invalid programId", i))?;
            let accounts = ix
                .accounts
                .iter()
                .map(|meta| {
                    let pubkey = Pubkey::from_str(&meta.pubkey)
                        .with_context(|| format!("Instruction {}: invalid account {}", i, meta.pubkey))?;
                    Ok(if meta.is_writable {
                        AccountMeta::new(pubkey, meta.is_signer)
                    } else {
                        AccountMeta::new_readonly(pubkey, meta.is_signer)
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let data = base64::engine::general_purpose::STANDARD
                .decode(ix.data.as_bytes())
                .with_context(|| format!("Instruction {}: data is not base64", i))?;
            Ok(Instruction {
                program_id,
                accounts,
                data,
            })
        })
        .collect()
}
