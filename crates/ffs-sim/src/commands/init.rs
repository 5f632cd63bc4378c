use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use ffs_core::RngHandle;
use ffs_sampler::random_fluid;
use ffs_sampler::xyz::write_xyz;
use tracing::info;

use super::load_config;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// YAML configuration; its `system` section sets size and density.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Destination XYZ file.
    #[arg(long)]
    pub out: PathBuf,
    /// Seed for particle placement (defaults to the master seed).
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: &InitArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(args.config.as_deref())?;
    let seed = args.seed.unwrap_or(config.seed_policy.master_seed);
    let fluid = random_fluid(&config.system, &mut RngHandle::from_seed(seed))?;
    write_xyz(&args.out, &fluid)?;
    info!(particles = fluid.len(), path = %args.out.display(), "wrote initial fluid");
    Ok(())
}
