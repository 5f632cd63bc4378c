use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use ffs_sampler::xyz::read_xyz;
use serde_json::json;

use super::{load_config, print_json};

#[derive(Args, Debug)]
pub struct ClusterArgs {
    /// YAML configuration supplying classifier and cluster cutoffs.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Configuration to analyse.
    #[arg(long = "in")]
    pub input: PathBuf,
}

pub fn run(args: &ClusterArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(args.config.as_deref())?;
    let configuration = read_xyz(&args.input, config.system.periodic_z)?;
    let detector = config.detector()?;
    let partition = detector.analyse(&configuration)?;

    let mut sizes = partition.sizes().to_vec();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    let largest_members = partition
        .largest_id()
        .map(|id| partition.members(id))
        .unwrap_or_default();
    print_json(&json!({
        "particles": configuration.len(),
        "ordered": partition.membership().len(),
        "largest": partition.largest(),
        "cluster_sizes": sizes,
        "largest_members": largest_members,
    }))
}
