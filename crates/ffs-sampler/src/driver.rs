use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use ffs_core::errors::{ErrorInfo, FfsError};
use ffs_core::provenance::{RunProvenance, SchemaVersion};
use ffs_core::{Configuration, CycleRunner, OrderParameter};
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::archive::{archive_path, ArchivedConfiguration, InterfaceArchive};
use crate::config::{OutputConfig, RunConfig};
use crate::ladder::InterfaceLadder;
use crate::manifest::{RunManifest, RunStatus};
use crate::metrics::{append_shot_log, FluxStats, InterfaceStats, ShotRecord};
use crate::shot::{run_shot, ShotRequest, ShotResult};

/// Summary returned to callers after a run finishes or stops early.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Final status.
    pub status: RunStatus,
    /// Flux-stage summary.
    pub flux: FluxStats,
    /// Interface stages in ladder order.
    pub interfaces: Vec<InterfaceStats>,
    /// Nucleation rate estimate in crossings per cycle.
    pub rate: f64,
    /// Rate per unit volume.
    pub rate_per_volume: f64,
    /// Manifest path, if written.
    pub manifest_path: Option<PathBuf>,
    /// Archive files relative to the run directory, starting at λ0. Empty
    /// when no run directory is configured.
    pub archives: Vec<PathBuf>,
}

/// Files of a run directory.
#[derive(Debug, Clone)]
struct OutputLayout {
    root: PathBuf,
    shots: PathBuf,
    manifest: PathBuf,
    archive_dir: PathBuf,
}

impl OutputLayout {
    fn at(root: &Path, output: &OutputConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            shots: root.join(&output.shots_file),
            manifest: root.join(&output.manifest_file),
            archive_dir: root.join(&output.archive_dir),
        }
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

/// Everything a stage needs that stays fixed for the whole run.
struct StageContext<'a, O: ?Sized, R: ?Sized> {
    config: &'a RunConfig,
    ladder: &'a InterfaceLadder,
    provenance: &'a RunProvenance,
    order: &'a O,
    runner: &'a R,
    pool: ThreadPool,
    layout: Option<OutputLayout>,
}

/// Mutable run bookkeeping, mirrored into the manifest after every stage.
struct Progress {
    flux: FluxStats,
    volume: f64,
    interfaces: Vec<InterfaceStats>,
    archives: Vec<PathBuf>,
    status: RunStatus,
}

impl Progress {
    fn rate(&self) -> f64 {
        self.interfaces
            .iter()
            .fold(self.flux.flux, |rate, stage| rate * stage.probability)
    }

    fn summary(&self, manifest_path: Option<PathBuf>) -> RunSummary {
        let rate = self.rate();
        RunSummary {
            status: self.status,
            flux: self.flux.clone(),
            interfaces: self.interfaces.clone(),
            rate,
            rate_per_volume: rate / self.volume,
            manifest_path,
            archives: self.archives.clone(),
        }
    }
}

/// Runs forward flux sampling from an initial configuration: a flux stage at
/// λ0 followed by one shooting stage per interface.
pub fn run<O, R>(
    config: &RunConfig,
    initial: Configuration,
    order: &O,
    runner: &R,
) -> Result<RunSummary, FfsError>
where
    O: OrderParameter + ?Sized,
    R: CycleRunner + ?Sized,
{
    config.validate()?;
    let ladder = config.ladder()?;
    let provenance = build_provenance(config)?;
    let layout = config
        .output
        .run_directory
        .as_deref()
        .map(|root| OutputLayout::at(root, &config.output));
    if let Some(layout) = &layout {
        fs::create_dir_all(&layout.root)
            .map_err(|err| FfsError::io("run-dir-create", err, &layout.root))?;
        if layout.shots.exists() {
            fs::remove_file(&layout.shots)
                .map_err(|err| FfsError::io("shots-reset", err, &layout.shots))?;
        }
    }
    let ctx = StageContext {
        config,
        ladder: &ladder,
        provenance: &provenance,
        order,
        runner,
        pool: build_pool(config.parallel.threads)?,
        layout,
    };

    let volume = initial.sim_box.volume();
    let (flux, lambda0) = flux_stage(&ctx, initial)?;
    let mut progress = Progress {
        flux,
        volume,
        interfaces: Vec::new(),
        archives: Vec::new(),
        status: RunStatus::InProgress,
    };
    record_archive(&ctx, &mut progress, &lambda0)?;
    write_manifest(&ctx, &progress)?;
    shoot_remaining(&ctx, &mut progress, lambda0)
}

/// Continues a run from its manifest, reusing the flux and every completed
/// interface stage.
pub fn resume<O, R>(manifest_path: &Path, order: &O, runner: &R) -> Result<RunSummary, FfsError>
where
    O: OrderParameter + ?Sized,
    R: CycleRunner + ?Sized,
{
    let manifest = RunManifest::load(manifest_path)?;
    if !SchemaVersion::CURRENT.reads(&manifest.provenance.schema_version) {
        return Err(FfsError::Serde(
            ErrorInfo::new("schema-version", "manifest was written by an incompatible build")
                .with_context("found", format!("{:?}", manifest.provenance.schema_version))
                .with_context("path", manifest_path.display()),
        ));
    }
    let config = &manifest.config;
    config.validate()?;
    let ladder = config.ladder()?;
    let root = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let mut layout = OutputLayout::at(root, &config.output);
    layout.manifest = manifest_path.to_path_buf();

    let Some(last) = manifest.archives.last() else {
        return Err(FfsError::Serde(
            ErrorInfo::new("manifest-archives", "manifest lists no interface archive")
                .with_context("path", manifest_path.display()),
        ));
    };
    let archive = InterfaceArchive::load(&layout.root.join(last))?;
    let volume = archive
        .entries
        .first()
        .map(|entry| entry.configuration.sim_box.volume())
        .unwrap_or(1.0);

    let mut progress = Progress {
        flux: manifest.flux.clone(),
        volume,
        interfaces: manifest.interfaces.clone(),
        archives: manifest.archives.clone(),
        status: manifest.status,
    };
    if progress.status != RunStatus::InProgress {
        info!(status = ?progress.status, "run already finished");
        return Ok(progress.summary(Some(layout.manifest)));
    }
    if archive.interface != progress.interfaces.len() {
        return Err(FfsError::Serde(
            ErrorInfo::new("manifest-mismatch", "last archive does not match completed stages")
                .with_context("archive_interface", archive.interface)
                .with_context("completed", progress.interfaces.len()),
        ));
    }

    info!(
        completed = progress.interfaces.len(),
        remaining = ladder.last_index().saturating_sub(progress.interfaces.len()),
        "resuming run"
    );
    let ctx = StageContext {
        config,
        ladder: &ladder,
        provenance: &manifest.provenance,
        order,
        runner,
        pool: build_pool(config.parallel.threads)?,
        layout: Some(layout),
    };
    shoot_remaining(&ctx, &mut progress, archive)
}

fn shoot_remaining<O, R>(
    ctx: &StageContext<'_, O, R>,
    progress: &mut Progress,
    mut previous: InterfaceArchive,
) -> Result<RunSummary, FfsError>
where
    O: OrderParameter + ?Sized,
    R: CycleRunner + ?Sized,
{
    for target in (progress.interfaces.len() + 1)..=ctx.ladder.last_index() {
        let (stats, records, archive) = interface_stage(ctx, target, &previous)?;
        if let Some(layout) = &ctx.layout {
            append_shot_log(&layout.shots, &records)
                .map_err(|err| FfsError::io("shots-write", err, &layout.shots))?;
        }
        let exhausted = stats.successes == 0;
        progress.interfaces.push(stats);
        if exhausted {
            warn!(interface = target, "no shot reached the interface; rate is zero");
            progress.status = RunStatus::Exhausted;
            write_manifest(ctx, progress)?;
            break;
        }
        record_archive(ctx, progress, &archive)?;
        if target == ctx.ladder.last_index() {
            progress.status = RunStatus::Complete;
        }
        write_manifest(ctx, progress)?;
        previous = archive;
    }

    let summary = progress.summary(
        ctx.layout
            .as_ref()
            .map(|layout| layout.manifest.clone()),
    );
    info!(rate = summary.rate, status = ?summary.status, "run finished");
    Ok(summary)
}

/// Free run from the initial configuration collecting λ0 crossings.
///
/// A crossing counts when the order parameter reaches λ0 after the
/// trajectory was last seen below λ_A (or below λ0 at the very start).
#[instrument(skip_all)]
fn flux_stage<O, R>(
    ctx: &StageContext<'_, O, R>,
    initial: Configuration,
) -> Result<(FluxStats, InterfaceArchive), FfsError>
where
    O: OrderParameter + ?Sized,
    R: CycleRunner + ?Sized,
{
    let sampling = &ctx.config.sampling;
    let lambda0 = ctx.ladder.first();
    let basin = ctx.ladder.basin();
    let mut rng = ctx.config.seed_policy.flux_rng();
    let volume = initial.sim_box.volume();

    let mut energy = ctx.runner.energy(&initial)?;
    let mut configuration = initial;
    let mut order_parameter = ctx.order.evaluate(&configuration)?;
    let mut armed = order_parameter < lambda0;
    let mut cycles = 0usize;
    let mut archive = InterfaceArchive::new(0, lambda0, ctx.provenance.clone());
    info!(lambda0, basin, order_parameter, "flux stage started");

    while archive.len() < sampling.lambda0_hits && cycles < sampling.max_flux_cycles {
        let (next, next_energy) =
            ctx.runner
                .run_cycles(configuration, energy, sampling.batch_size, &mut rng)?;
        configuration = next;
        energy = next_energy;
        cycles += sampling.batch_size;
        order_parameter = ctx.order.evaluate(&configuration)?;

        if armed && order_parameter >= lambda0 {
            armed = false;
            archive.entries.push(ArchivedConfiguration {
                order_parameter,
                weight: 1.0,
                duration: cycles,
                configuration: configuration.clone(),
            });
            debug!(hit = archive.len(), cycles, order_parameter, "crossed λ0");
        } else if !armed && order_parameter < basin {
            armed = true;
        }
    }

    if archive.is_empty() {
        return Err(FfsError::Config(
            ErrorInfo::new("no-flux-crossing", "flux stage never crossed λ0")
                .with_context("cycles", cycles)
                .with_context("lambda0", lambda0)
                .with_hint("raise max_flux_cycles or lower λ0"),
        ));
    }
    if archive.len() < sampling.lambda0_hits {
        warn!(
            hits = archive.len(),
            wanted = sampling.lambda0_hits,
            "flux cycle budget exhausted"
        );
    }

    let flux = archive.len() as f64 / cycles as f64;
    let stats = FluxStats {
        hits: archive.len(),
        cycles,
        flux,
        flux_per_volume: flux / volume,
    };
    info!(hits = stats.hits, cycles, flux, "flux stage finished");
    Ok((stats, archive))
}

/// Fires rounds of parallel shots from `previous` toward `target` until
/// enough successes or the shot cap.
#[instrument(skip_all, fields(interface = target))]
fn interface_stage<O, R>(
    ctx: &StageContext<'_, O, R>,
    target: usize,
    previous: &InterfaceArchive,
) -> Result<(InterfaceStats, Vec<ShotRecord>, InterfaceArchive), FfsError>
where
    O: OrderParameter + ?Sized,
    R: CycleRunner + ?Sized,
{
    let sampling = &ctx.config.sampling;
    let threshold = ctx.ladder.target(target)?;
    let request = ShotRequest {
        target,
        batch_size: sampling.batch_size,
        pruning: ctx.config.pruning_policy()?,
        max_duration: sampling.max_duration,
    };
    let mut archive = InterfaceArchive::new(target, threshold, ctx.provenance.clone());
    let mut records = Vec::new();
    let mut fired = 0usize;
    info!(
        threshold,
        starts = previous.len(),
        start_weight = previous.total_weight(),
        "interface stage started"
    );

    while archive.len() < sampling.min_successes && fired < sampling.max_shots {
        let round = sampling.shots_per_batch.min(sampling.max_shots - fired);
        let results: Result<Vec<_>, FfsError> = ctx.pool.install(|| {
            (fired..fired + round)
                .into_par_iter()
                .map(|shot| fire(ctx, &request, previous, shot))
                .collect()
        });

        for (shot, start, result) in results? {
            records.push(ShotRecord::from_result(target, shot, start, &result));
            if result.success() {
                archive.entries.push(ArchivedConfiguration {
                    order_parameter: result.order_parameter,
                    weight: result.weight,
                    duration: result.duration,
                    configuration: result.final_configuration,
                });
            }
        }
        fired += round;
        debug!(fired, successes = archive.len(), "round finished");
    }

    let stats = InterfaceStats::from_records(target, &records);
    info!(
        shots = stats.shots,
        successes = stats.successes,
        pruned = stats.pruned,
        probability = stats.probability,
        "interface stage finished"
    );
    Ok((stats, records, archive))
}

fn fire<O, R>(
    ctx: &StageContext<'_, O, R>,
    request: &ShotRequest,
    previous: &InterfaceArchive,
    shot: usize,
) -> Result<(usize, usize, ShotResult), FfsError>
where
    O: OrderParameter + ?Sized,
    R: CycleRunner + ?Sized,
{
    let mut rng = ctx.config.seed_policy.shot_rng(request.target, shot);
    let (start, entry) = previous.pick(&mut rng)?;
    let result = run_shot(
        entry.configuration.clone(),
        request,
        ctx.ladder,
        ctx.order,
        ctx.runner,
        &mut rng,
    )?;
    debug!(
        shot,
        start,
        outcome = result.outcome.as_str(),
        weight = result.weight,
        duration = result.duration,
        "shot finished"
    );
    Ok((shot, start, result))
}

fn record_archive<O: ?Sized, R: ?Sized>(
    ctx: &StageContext<'_, O, R>,
    progress: &mut Progress,
    archive: &InterfaceArchive,
) -> Result<(), FfsError> {
    if let Some(layout) = &ctx.layout {
        let path = archive_path(&layout.archive_dir, archive.interface);
        archive.store(&path)?;
        progress.archives.push(layout.relative(&path));
    }
    Ok(())
}

fn write_manifest<O: ?Sized, R: ?Sized>(
    ctx: &StageContext<'_, O, R>,
    progress: &Progress,
) -> Result<(), FfsError> {
    let Some(layout) = &ctx.layout else {
        return Ok(());
    };
    let manifest = RunManifest {
        config: ctx.config.clone(),
        provenance: ctx.provenance.clone(),
        status: progress.status,
        flux: progress.flux.clone(),
        interfaces: progress.interfaces.clone(),
        rate: progress.rate(),
        shots_file: layout.relative(&layout.shots),
        archives: progress.archives.clone(),
    };
    manifest.write(&layout.manifest)
}

fn build_pool(threads: usize) -> Result<ThreadPool, FfsError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|err| FfsError::Config(ErrorInfo::new("thread-pool", err.to_string())))
}

/// Provenance stamped on archives and manifests.
pub fn build_provenance(config: &RunConfig) -> Result<RunProvenance, FfsError> {
    let mut tool_versions = BTreeMap::new();
    tool_versions.insert(
        "ffs-sampler".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    Ok(RunProvenance {
        schema_version: SchemaVersion::CURRENT,
        config_hash: config.hash()?,
        seed: config.seed_policy.master_seed,
        created_at: Utc::now().to_rfc3339(),
        tool_versions,
    })
}
