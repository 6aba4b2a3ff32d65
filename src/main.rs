use anyhow::Result;
use clap::{Parser, Subcommand};
use blastcore::algorithm::{realign, wordscan};

#[derive(Parser)]
#[command(name = "blastcore")]
#[command(version = "0.1.0")]
#[command(about = "Protein word lookup and composition-adjusted realignment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report neighborhood word hits of protein queries in protein subjects
    Scan(wordscan::ScanArgs),

    /// Protein vs protein search with composition-based realignment
    Realign(realign::RealignArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => {
            wordscan::run(args)?;
        }
        Commands::Realign(args) => {
            realign::run(args)?;
        }
    }
    Ok(())
}
