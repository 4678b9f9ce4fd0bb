use std::path::{Path, PathBuf};

use alloy_primitives::U256;
use clap::{Parser, Subcommand};

use vaultbench::account::AccountKey;
use vaultbench::chain::{native, Call, Chain, Op};
use vaultbench::deploy::{self, Genesis};
use vaultbench::Result;

#[derive(Parser)]
#[command(
    name = "vaultbench",
    version,
    about = "Deployment and verification bench for the savings vault contracts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy the issuer and both vaults on a fresh chain and print their
    /// addresses.
    Deploy {
        /// Genesis JSON file; fresh accounts are generated when omitted.
        #[arg(long)]
        genesis: Option<PathBuf>,
        /// Number of generated genesis accounts.
        #[arg(long, default_value_t = 10, conflicts_with = "genesis")]
        accounts: usize,
        /// Native funding per generated account, in whole coins.
        #[arg(long, default_value_t = 10_000, conflicts_with = "genesis")]
        funding: u64,
        /// Token supply minted to the deployer, in base units.
        #[arg(long, default_value_t = 1_000_000, conflicts_with = "genesis")]
        supply: u64,
    },
    /// Generate an account keypair and write sk.hex / pk.hex / address.hex.
    Keygen {
        #[arg(long)]
        out_dir: PathBuf,
    },
    /// Deploy, drive a deposit/withdraw round-trip on both vaults, and print
    /// the resulting event log as JSON.
    Exercise {
        /// Token amount to deposit and withdraw, in base units.
        #[arg(long, default_value_t = 250)]
        amount: u64,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Deploy {
            genesis,
            accounts,
            funding,
            supply,
        } => deploy_cmd(genesis, accounts, funding, supply),
        Command::Keygen { out_dir } => keygen_cmd(&out_dir),
        Command::Exercise { amount } => exercise_cmd(amount),
    }
}

fn deploy_cmd(
    genesis_path: Option<PathBuf>,
    accounts: usize,
    funding: u64,
    supply: u64,
) -> Result<()> {
    let genesis = match genesis_path {
        Some(path) => Genesis::load(&path)?,
        None => deploy::fresh_genesis(accounts, funding, U256::from(supply)).0,
    };
    let mut chain = Chain::new();
    let contracts = deploy::deploy_contracts(&mut chain, &genesis)?;
    println!("{}", contracts.summary());
    Ok(())
}

fn keygen_cmd(out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)?;
    let key = AccountKey::generate();
    std::fs::write(out_dir.join("sk.hex"), key.secret_hex())?;
    std::fs::write(out_dir.join("pk.hex"), key.public_hex())?;
    std::fs::write(out_dir.join("address.hex"), key.address().to_string())?;
    println!("keypair written → {}", out_dir.display());
    Ok(())
}

fn exercise_cmd(amount: u64) -> Result<()> {
    let (genesis, keys) = deploy::fresh_genesis(2, 10_000, U256::from(1_000_000));
    let mut chain = Chain::new();
    let contracts = deploy::deploy_contracts(&mut chain, &genesis)?;
    println!("{}", contracts.summary());

    let saver = keys[0].address();
    let amount = U256::from(amount);
    chain.execute(Call::new(
        saver,
        contracts.token,
        Op::Approve {
            spender: contracts.token_vault,
            amount,
        },
    ))?;
    chain.execute(Call::new(saver, contracts.token_vault, Op::Deposit { amount }))?;
    log::info!(
        "token savings after deposit: {}",
        chain.saved_token_balance(contracts.token_vault, saver)?
    );
    chain.execute(Call::new(saver, contracts.token_vault, Op::Withdraw { amount }))?;
    chain.execute(Call::new(saver, contracts.native_vault, Op::SaveNative).with_value(native(1)))?;
    chain.execute(Call::new(
        saver,
        contracts.native_vault,
        Op::WithdrawNative { amount: native(1) },
    ))?;
    log::info!(
        "round-trip complete at height {}; saver native balance {}",
        chain.height(),
        chain.native_balance(saver)
    );

    println!("{}", serde_json::to_string_pretty(chain.events())?);
    Ok(())
}
