use std::error::Error;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use commands::{
    cluster::{self, ClusterArgs},
    init::{self, InitArgs},
    run::{self, ResumeArgs, RunArgs},
    shot::{self, ShotArgs},
};

mod commands;
mod logging;

#[derive(Parser, Debug)]
#[command(name = "ffs-sim", about = "Forward flux sampling of crystal nucleation")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Silence all log output.
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Also write logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a random fluid configuration to an XYZ file.
    Init(InitArgs),
    /// Run the flux stage and every interface stage.
    Run(RunArgs),
    /// Continue a run from its manifest.
    Resume(ResumeArgs),
    /// Fire a single shot from an XYZ configuration.
    Shot(ShotArgs),
    /// Report the largest crystalline cluster of an XYZ configuration.
    Cluster(ClusterArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;
    match cli.command {
        Command::Init(args) => init::run(&args),
        Command::Run(args) => run::run(&args),
        Command::Resume(args) => run::resume(&args),
        Command::Shot(args) => shot::run(&args),
        Command::Cluster(args) => cluster::run(&args),
    }
}
