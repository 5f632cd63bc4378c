use std::error::Error;
use std::path::Path;

use ffs_sampler::RunConfig;

pub mod cluster;
pub mod init;
pub mod run;
pub mod shot;

/// Loads and validates a run configuration, or falls back to the defaults.
pub fn load_config(path: Option<&Path>) -> Result<RunConfig, Box<dyn Error>> {
    let config = match path {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
