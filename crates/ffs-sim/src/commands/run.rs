use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use ffs_core::RngHandle;
use ffs_sampler::xyz::read_xyz;
use ffs_sampler::{random_fluid, resume as resume_run, run as run_ffs, RunManifest};

use super::{load_config, print_json};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML configuration describing the run.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Starting configuration; a random fluid is generated when omitted.
    #[arg(long)]
    pub initial: Option<PathBuf>,
    /// Run directory, overriding `output.run_directory`.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ResumeArgs {
    /// Manifest written by an earlier run.
    #[arg(long)]
    pub manifest: PathBuf,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(out) = &args.out {
        config.output.run_directory = Some(out.clone());
    }
    let initial = match &args.initial {
        Some(path) => read_xyz(path, config.system.periodic_z)?,
        None => random_fluid(
            &config.system,
            &mut RngHandle::from_seed(config.seed_policy.master_seed),
        )?,
    };
    let detector = config.detector()?;
    let runner = config.runner()?;
    let summary = run_ffs(&config, initial, &detector, &runner)?;
    print_json(&summary)
}

pub fn resume(args: &ResumeArgs) -> Result<(), Box<dyn Error>> {
    let manifest = RunManifest::load(&args.manifest)?;
    let detector = manifest.config.detector()?;
    let runner = manifest.config.runner()?;
    let summary = resume_run(&args.manifest, &detector, &runner)?;
    print_json(&summary)
}
