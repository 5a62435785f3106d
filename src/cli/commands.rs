use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "relay-ledger")]
pub struct Opt {
    #[arg(
        long = "config",
        global = true,
        help = "Path to the TOML configuration file"
    )]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "init", about = "Create the node's data directory layout")]
    Init,
    #[command(name = "tick", about = "Run a single pipeline pass and exit")]
    Tick,
    #[command(name = "run", about = "Run the node pipeline until stopped")]
    Run,
    #[command(name = "balance", about = "Print the balance held by an account")]
    Balance {
        #[arg(help = "Account name")]
        name: String,
    },
    #[command(
        name = "consensushash",
        about = "Print the most recent consensus hash"
    )]
    ConsensusHash,
}
