use std::fs;
use std::path::Path;

use ffs_core::errors::FfsError;
use ffs_core::{Configuration, CycleRunner, OrderParameter, RngHandle, SimBox};
use ffs_sampler::{resume, run, RunConfig, RunManifest, RunStatus};
use tempfile::tempdir;

/// Order parameter equal to the number of particles.
struct Count;

impl OrderParameter for Count {
    fn evaluate(&self, config: &Configuration) -> Result<f64, FfsError> {
        Ok(config.len() as f64)
    }
}

/// Birth-death walk on the particle count: each cycle adds a particle with
/// probability `up`, otherwise removes one.
struct BirthDeath {
    up: f64,
}

impl CycleRunner for BirthDeath {
    fn energy(&self, config: &Configuration) -> Result<f64, FfsError> {
        Ok(-(config.len() as f64))
    }

    fn run_cycles(
        &self,
        mut config: Configuration,
        _energy: f64,
        cycles: usize,
        rng: &mut RngHandle,
    ) -> Result<(Configuration, f64), FfsError> {
        for _ in 0..cycles {
            if rng.uniform() < self.up {
                config.positions.push([0.0; 3]);
            } else {
                config.positions.pop();
            }
        }
        let energy = -(config.len() as f64);
        Ok((config, energy))
    }
}

fn start() -> Configuration {
    Configuration::new(vec![[0.0; 3]; 2], SimBox::cubic(4.0).unwrap()).unwrap()
}

fn walk_config() -> RunConfig {
    let mut config = RunConfig::default();
    config.ladder.basin = 2.0;
    config.ladder.interfaces = vec![3.0, 5.0, 7.0, 9.0];
    config.sampling.batch_size = 1;
    config.sampling.lambda0_hits = 8;
    config.sampling.max_flux_cycles = 100_000;
    config.sampling.shots_per_batch = 8;
    config.sampling.min_successes = 4;
    config.sampling.max_shots = 400;
    config.pruning.enabled = true;
    config.pruning.probability = 0.3;
    config.seed_policy.master_seed = 2024;
    config
}

#[test]
fn repeated_runs_with_same_seed_match() {
    let config = walk_config();
    let runner = BirthDeath { up: 0.45 };
    let summary_a = run(&config, start(), &Count, &runner).unwrap();
    let summary_b = run(&config, start(), &Count, &runner).unwrap();
    assert_eq!(summary_a, summary_b);
    assert_eq!(summary_a.status, RunStatus::Complete);
    assert_eq!(summary_a.interfaces.len(), 3);
    assert_eq!(summary_a.flux.hits, 8);
    assert!(summary_a.rate > 0.0);
    assert!(summary_a.archives.is_empty());
    assert!(summary_a.manifest_path.is_none());
}

#[test]
fn thread_count_does_not_change_results() {
    let mut config = walk_config();
    let runner = BirthDeath { up: 0.45 };
    config.parallel.threads = 1;
    let serial = run(&config, start(), &Count, &runner).unwrap();
    config.parallel.threads = 4;
    let parallel = run(&config, start(), &Count, &runner).unwrap();
    assert_eq!(serial, parallel);
}

#[test]
fn rate_is_flux_times_crossing_probabilities() {
    let config = walk_config();
    let summary = run(&config, start(), &Count, &BirthDeath { up: 0.45 }).unwrap();
    let product: f64 = summary.interfaces.iter().map(|stage| stage.probability).product();
    assert!((summary.rate - summary.flux.flux * product).abs() < 1e-15);
    assert!((summary.rate_per_volume - summary.rate / 64.0).abs() < 1e-15);
    for stage in &summary.interfaces {
        assert!(stage.successes >= 4 || stage.shots == 400);
        assert_eq!(
            stage.shots,
            stage.successes + stage.failures + stage.pruned + stage.truncated
        );
    }
}

#[test]
fn hopeless_interface_stops_with_zero_rate() {
    let mut config = walk_config();
    config.ladder.interfaces = vec![3.0, 5.0, 60.0];
    config.sampling.max_shots = 64;
    config.sampling.max_duration = Some(200);
    config.pruning.enabled = false;
    let summary = run(&config, start(), &Count, &BirthDeath { up: 0.45 }).unwrap();
    assert_eq!(summary.status, RunStatus::Exhausted);
    assert_eq!(summary.rate, 0.0);
    assert_eq!(summary.interfaces.last().unwrap().successes, 0);
}

#[test]
fn flux_stage_without_crossing_is_an_error() {
    let mut config = walk_config();
    config.sampling.max_flux_cycles = 50;
    let err = run(&config, start(), &Count, &BirthDeath { up: 0.0 }).unwrap_err();
    assert_eq!(err.info().code, "no-flux-crossing");
}

#[test]
fn invalid_config_fails_before_sampling() {
    let mut config = walk_config();
    config.ladder.interfaces = vec![3.0, 3.0];
    let err = run(&config, start(), &Count, &BirthDeath { up: 0.45 }).unwrap_err();
    assert!(matches!(err, FfsError::Ladder(_)));
}

fn run_in(root: &Path) -> RunConfig {
    let mut config = walk_config();
    config.output.run_directory = Some(root.join("run"));
    config
}

#[test]
fn run_directory_holds_archives_log_and_manifest() {
    let dir = tempdir().unwrap();
    let config = run_in(dir.path());
    let summary = run(&config, start(), &Count, &BirthDeath { up: 0.45 }).unwrap();

    let run_dir = dir.path().join("run");
    let manifest_path = summary.manifest_path.clone().unwrap();
    assert_eq!(manifest_path, run_dir.join("manifest.json"));
    let manifest = RunManifest::load(&manifest_path).unwrap();
    assert_eq!(manifest.status, RunStatus::Complete);
    assert_eq!(manifest.rate, summary.rate);
    assert_eq!(manifest.provenance.config_hash, config.hash().unwrap());
    assert_eq!(manifest.archives.len(), 4);
    for archive in &manifest.archives {
        assert!(run_dir.join(archive).exists());
    }

    let log = fs::read_to_string(run_dir.join("shots.csv")).unwrap();
    let mut lines = log.lines();
    assert_eq!(
        lines.next().unwrap(),
        "interface,shot,start,outcome,weight,duration,batches,order_parameter"
    );
    let total_shots: usize = summary.interfaces.iter().map(|stage| stage.shots).sum();
    assert_eq!(lines.count(), total_shots);
}

#[test]
fn resume_after_first_stage_reproduces_the_run() {
    let dir = tempdir().unwrap();
    let config = run_in(dir.path());
    let runner = BirthDeath { up: 0.45 };
    let full = run(&config, start(), &Count, &runner).unwrap();
    let manifest_path = full.manifest_path.clone().unwrap();

    let mut manifest = RunManifest::load(&manifest_path).unwrap();
    manifest.status = RunStatus::InProgress;
    manifest.interfaces.truncate(1);
    manifest.archives.truncate(2);
    manifest.write(&manifest_path).unwrap();

    let resumed = resume(&manifest_path, &Count, &runner).unwrap();
    assert_eq!(resumed.status, RunStatus::Complete);
    assert_eq!(resumed.interfaces, full.interfaces);
    assert_eq!(resumed.rate, full.rate);
}

#[test]
fn resume_of_finished_run_returns_recorded_summary() {
    let dir = tempdir().unwrap();
    let config = run_in(dir.path());
    let runner = BirthDeath { up: 0.45 };
    let full = run(&config, start(), &Count, &runner).unwrap();
    let again = resume(full.manifest_path.as_ref().unwrap(), &Count, &runner).unwrap();
    assert_eq!(again.interfaces, full.interfaces);
    assert_eq!(again.rate, full.rate);
}

/// Probability that the walk climbs from `start` to `target` before the
/// count drops to one, for a step-up probability `up`.
fn climb_probability(up: f64, start: f64, target: f64) -> f64 {
    let ratio = (1.0 - up) / up;
    (1.0 - ratio.powf(start - 1.0)) / (1.0 - ratio.powf(target - 1.0))
}

fn mean_crossing_product(pruning: bool) -> f64 {
    let seeds = [11u64, 12, 13];
    let mut total = 0.0;
    for seed in seeds {
        let mut config = walk_config();
        config.pruning.enabled = pruning;
        config.sampling.shots_per_batch = 64;
        config.sampling.min_successes = 100_000;
        config.sampling.max_shots = 1_200;
        config.seed_policy.master_seed = seed;
        let summary = run(&config, start(), &Count, &BirthDeath { up: 0.45 }).unwrap();
        assert_eq!(summary.status, RunStatus::Complete);
        total += summary.rate / summary.flux.flux;
    }
    total / seeds.len() as f64
}

#[test]
fn pruning_leaves_the_rate_unbiased() {
    let exact: f64 = [(3.0, 5.0), (5.0, 7.0), (7.0, 9.0)]
        .iter()
        .map(|&(from, to)| climb_probability(0.45, from, to))
        .product();
    let unpruned = mean_crossing_product(false);
    let pruned = mean_crossing_product(true);
    assert!(
        (unpruned / exact - 1.0).abs() < 0.15,
        "unpruned {unpruned} vs exact {exact}"
    );
    assert!(
        (pruned / exact - 1.0).abs() < 0.15,
        "pruned {pruned} vs exact {exact}"
    );
}
