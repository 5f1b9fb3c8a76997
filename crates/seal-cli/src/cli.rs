use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "seal",
    about = "Seal Chain: proof-of-work sealed, hash-linked entry log",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file with [node] and [server] tables
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the block assembler and the ingestion endpoint
    Serve(ServeArgs),
    /// Verify hash chain integrity of a ledger file
    Verify(VerifyArgs),
    /// Print sealed blocks
    Log(LogArgs),
    /// Print the double-hash digest of a string
    Hash(HashArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args, Default)]
pub struct ServeArgs {
    #[arg(short, long)]
    pub port: Option<u16>,
    #[arg(long, value_name = "PATH")]
    pub ledger: Option<PathBuf>,
    #[arg(long)]
    pub difficulty: Option<u32>,
    #[arg(long)]
    pub block_size: Option<usize>,
    /// Start a fresh chain at the genesis seed even if the ledger has records
    #[arg(long)]
    pub no_resume: bool,
}

#[derive(Args)]
pub struct VerifyArgs {
    #[arg(long, value_name = "PATH")]
    pub ledger: Option<PathBuf>,
    /// Also re-run the nonce search for every block
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(long, value_name = "PATH")]
    pub ledger: Option<PathBuf>,
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct HashArgs {
    pub data: String,
}
