// This is my main entry point for the ledger node binary
use clap::Parser;
use log::{error, LevelFilter};
use relay_ledger::{Command, Config, Opt, TickPipeline};
use std::process;

fn main() {
    // I initialize logging so I can see what the pipeline is doing
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    // I run the actual command and handle any errors that might occur
    if let Err(e) = run_command(&opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(opt: &Opt) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(opt.config.as_deref())?;

    match &opt.command {
        // Opening the pipeline creates every directory the node needs
        Command::Init => {
            TickPipeline::open(config)?;
            println!("Done!");
        }
        Command::Tick => {
            let mut pipeline = TickPipeline::open(config)?;
            let report = pipeline.tick()?;
            match report.committed_block {
                Some(block) => println!(
                    "Committed block {block}: {} transactions, {} rejected",
                    report.admitted, report.rejected
                ),
                None => println!("No block event this tick"),
            }
        }
        Command::Run => {
            let mut pipeline = TickPipeline::open(config)?;
            pipeline.run()?;
        }
        Command::Balance { name } => {
            let pipeline = TickPipeline::open(config)?;
            match pipeline.balance_of(name)? {
                Some(balance) => {
                    println!("Balance of {name}: {balance}");
                    if let Some(wallet) = pipeline.wallet_of(name)? {
                        println!("Wallet: {wallet}");
                    }
                    if let Some(count) = pipeline.tx_count_of(name)? {
                        println!("Transactions sent: {count}");
                    }
                }
                None => return Err(format!("No account named {name}").into()),
            }
        }
        Command::ConsensusHash => {
            let pipeline = TickPipeline::open(config)?;
            match pipeline.latest_consensus_hash()? {
                Some(hash) => println!("{hash}"),
                None => println!("No blocks committed yet"),
            }
        }
    }
    Ok(())
}
