use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use std::path::PathBuf;

use proof_ledger::{Chain, LedgerConfig, Transaction, Wallet};

#[derive(Parser)]
#[command(name = "proof_ledger")]
#[command(about = "Walks a few signed transfers through a proof of work ledger", long_about = None)]
struct Cli {
    /// TOML file with ledger settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the proof of work difficulty
    #[arg(short, long)]
    difficulty: Option<usize>,

    /// Print the final chain as JSON
    #[arg(long)]
    json: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<Option<LedgerConfig>> {
    if cli.config.is_none() && cli.difficulty.is_none() {
        return Ok(None);
    }

    let mut config = match &cli.config {
        Some(path) => LedgerConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LedgerConfig::default(),
    };
    if let Some(difficulty) = cli.difficulty {
        config.difficulty = difficulty;
    }

    Ok(Some(config))
}

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();

    let owned;
    let chain: &Chain = match load_config(&cli)? {
        Some(config) => {
            owned = Chain::with_config(config)?;
            &owned
        }
        None => Chain::instance(),
    };
    info!("Started ledger at difficulty {}", chain.config().difficulty);

    let satoshi = Wallet::new()?;
    let bob = Wallet::new()?;
    let alice = Wallet::new()?;

    satoshi.send_money(chain, 50.0, bob.public_key())?;
    bob.send_money(chain, 23.0, alice.public_key())?;
    alice.send_money(chain, 5.0, bob.public_key())?;
    info!("Chain holds {} blocks", chain.len());

    // Claims to spend from satoshi but carries mallory's signature
    let mallory = Wallet::new()?;
    let forged = Transaction::new(1_000_000.0, satoshi.public_key(), mallory.public_key());
    let signature = mallory.sign_transaction(&forged);
    match chain.add_block(forged, satoshi.public_key(), &signature) {
        Ok(block) => warn!("Forged transfer was admitted as {}", block.hash()),
        Err(err) => info!("Forged transfer rejected: {}", err),
    }

    chain.verify()?;
    info!("Chain of {} blocks verified", chain.len());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&chain.blocks())?);
    } else {
        for (height, block) in chain.blocks().iter().enumerate() {
            println!(
                "#{} {} amount={} nonce={}",
                height,
                block.hash(),
                block.transaction.amount,
                block.nonce
            );
        }
    }

    Ok(())
}
