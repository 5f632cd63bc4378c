use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use ffs_core::RngHandle;
use ffs_sampler::xyz::{read_xyz, write_xyz};
use ffs_sampler::{run_shot, ShotRequest};
use serde_json::json;

use super::{load_config, print_json};

#[derive(Args, Debug)]
pub struct ShotArgs {
    /// YAML configuration supplying the ladder and collaborators.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Starting configuration.
    #[arg(long = "in")]
    pub input: PathBuf,
    /// Target interface index (at least 1).
    #[arg(long)]
    pub target: usize,
    /// Shot seed (defaults to the master seed).
    #[arg(long)]
    pub seed: Option<u64>,
    /// Write the final configuration to this XYZ file.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &ShotArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(args.config.as_deref())?;
    let ladder = config.ladder()?;
    let request = ShotRequest {
        target: args.target,
        batch_size: config.sampling.batch_size,
        pruning: config.pruning_policy()?,
        max_duration: config.sampling.max_duration,
    };
    let initial = read_xyz(&args.input, config.system.periodic_z)?;
    let detector = config.detector()?;
    let runner = config.runner()?;
    let mut rng = RngHandle::from_seed(args.seed.unwrap_or(config.seed_policy.master_seed));

    let result = run_shot(initial, &request, &ladder, &detector, &runner, &mut rng)?;
    if let Some(out) = &args.out {
        write_xyz(out, &result.final_configuration)?;
    }
    print_json(&json!({
        "success": result.success(),
        "outcome": result.outcome,
        "weight": result.weight,
        "duration": result.duration,
        "batches": result.batches,
        "order_parameter": result.order_parameter,
        "energy": result.energy,
    }))
}
