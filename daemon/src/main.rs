//! classic-powtool: generate Ethash dumps and inspect epoch and difficulty
//! parameters from the command line.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;

use classic_consensus::EthashEngine;
use classic_ethash::dump::{dump_file_name, DumpKind};
use classic_ethash::{cache_size, dataset_size, seed_hash, EthashConfig, PowMode};
use classic_types::{ChainConfig, Header, EMPTY_UNCLE_HASH, U256};
use classic_utils::{format_bytes, format_duration, init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "classic-powtool", about = "Ethash cache, dataset and difficulty tool")]
struct Cli {
    /// Built-in chain preset: "classic", "mordor" or "frontier".
    /// Ignored when a config file is provided.
    #[arg(long, default_value = "classic", env = "CLASSIC_CHAIN")]
    chain: String,

    /// Path to a TOML chain configuration file.
    #[arg(long, env = "CLASSIC_CHAIN_CONFIG")]
    config: Option<PathBuf>,

    /// Use the tiny test-mode cache and dataset sizes.
    #[arg(long)]
    test: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "CLASSIC_LOG_LEVEL")]
    log_level: String,

    /// Log format: "human" or "json".
    #[arg(long, default_value = "human", env = "CLASSIC_LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Generate the verification cache for a block and dump it to disk.
    MakeCache {
        #[arg(long)]
        block: u64,
        #[arg(long)]
        dir: PathBuf,
    },

    /// Generate the full dataset for a block and dump it to disk.
    MakeDag {
        #[arg(long)]
        block: u64,
        #[arg(long)]
        dir: PathBuf,
    },

    /// Print the epoch parameters in force at a block.
    EpochInfo {
        #[arg(long)]
        block: u64,
    },

    /// Print the difficulty required of a child block.
    Difficulty {
        #[arg(long)]
        parent_number: u64,
        #[arg(long)]
        parent_time: u64,
        #[arg(long)]
        parent_difficulty: U256,
        /// The parent block included uncles.
        #[arg(long)]
        parent_has_uncles: bool,
        /// Timestamp of the child block.
        #[arg(long)]
        time: u64,
    },
}

fn load_chain(cli: &Cli) -> anyhow::Result<ChainConfig> {
    if let Some(path) = &cli.config {
        let config = ChainConfig::from_toml_file(path)
            .with_context(|| format!("loading chain config {}", path.display()))?;
        tracing::info!(path = %path.display(), chain = %config.name, "Loaded chain config");
        return Ok(config);
    }
    match cli.chain.to_ascii_lowercase().as_str() {
        "classic" => Ok(ChainConfig::classic()),
        "mordor" => Ok(ChainConfig::mordor()),
        "frontier" => Ok(ChainConfig::frontier()),
        other => anyhow::bail!("unknown chain preset: {other}"),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, &cli.log_level);

    let chain = Arc::new(load_chain(&cli)?);
    let mode = if cli.test { PowMode::Test } else { PowMode::Normal };

    match cli.command {
        Command::MakeCache { block, ref dir } => {
            let ethash_config = EthashConfig {
                cache_dir: Some(dir.clone()),
                pow_mode: mode,
                ..EthashConfig::default()
            };
            let engine = EthashEngine::new(chain, ethash_config);
            let started = Instant::now();
            let cache = engine.ethash().cache(block);
            let (epoch, length) = engine.ethash().epoch_at(block);
            let name = dump_file_name(DumpKind::Cache, epoch, &seed_hash(epoch, length));
            println!(
                "{} ({}) in {}",
                dir.join(name).display(),
                format_bytes(cache.words().map_or(0, |w| w.len() as u64 * 4)),
                format_duration(started.elapsed())
            );
            engine.close();
        }
        Command::MakeDag { block, ref dir } => {
            let ethash_config = EthashConfig {
                dataset_dir: Some(dir.clone()),
                pow_mode: mode,
                ..EthashConfig::default()
            };
            let engine = EthashEngine::new(chain, ethash_config);
            let started = Instant::now();
            let dataset = engine.ethash().dataset(block, false);
            let (epoch, length) = engine.ethash().epoch_at(block);
            let name = dump_file_name(DumpKind::Dataset, epoch, &seed_hash(epoch, length));
            println!(
                "{} ({}) in {}",
                dir.join(name).display(),
                format_bytes(dataset.words().map_or(0, |w| w.len() as u64 * 4)),
                format_duration(started.elapsed())
            );
            engine.close();
        }
        Command::EpochInfo { block } => {
            let engine = EthashEngine::new(chain, EthashConfig::fake(PowMode::Fake, None));
            let (epoch, length) = engine.ethash().epoch_at(block);
            println!("block:         {block}");
            println!("epoch:         {epoch}");
            println!("epoch length:  {length}");
            println!("seed hash:     0x{}", hex::encode(seed_hash(epoch, length)));
            println!("cache size:    {}", format_bytes(cache_size(epoch)));
            println!("dataset size:  {}", format_bytes(dataset_size(epoch)));
        }
        Command::Difficulty {
            parent_number,
            parent_time,
            parent_difficulty,
            parent_has_uncles,
            time,
        } => {
            let parent = Header {
                number: parent_number,
                time: parent_time,
                difficulty: parent_difficulty,
                uncle_hash: if parent_has_uncles {
                    Default::default()
                } else {
                    EMPTY_UNCLE_HASH
                },
                ..Header::default()
            };
            let engine = EthashEngine::new(chain, EthashConfig::fake(PowMode::Fake, None));
            println!("{}", engine.calc_difficulty(time, &parent));
        }
    }

    Ok(())
}
