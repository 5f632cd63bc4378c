use ffs_core::errors::{ErrorInfo, FfsError};
use ffs_core::{Configuration, CycleRunner, OrderParameter, RngHandle};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ladder::InterfaceLadder;

/// Terminal state of a shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShotOutcome {
    /// Reached the target interface.
    Success,
    /// Fell back below the basin threshold.
    Failure,
    /// Killed by a pruning trial.
    Pruned,
    /// Exceeded the maximum duration without reaching either end.
    Truncated,
}

impl ShotOutcome {
    /// Stable lowercase label used in logs and CSV files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShotOutcome::Success => "success",
            ShotOutcome::Failure => "failure",
            ShotOutcome::Pruned => "pruned",
            ShotOutcome::Truncated => "truncated",
        }
    }
}

/// Probability of killing a shot at each interface it falls back through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PruningPolicy {
    probability: f64,
}

impl PruningPolicy {
    /// Creates a policy; `probability` must lie in `[0, 1]`.
    pub fn new(probability: f64) -> Result<Self, FfsError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(FfsError::Config(
                ErrorInfo::new("prune-probability", "pruning probability must lie in [0, 1]")
                    .with_context("probability", probability),
            ));
        }
        Ok(Self { probability })
    }

    /// Kill probability per trial.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Weight factor applied to a shot surviving one trial.
    pub fn survival_factor(&self) -> f64 {
        1.0 / (1.0 - self.probability)
    }
}

/// Immutable per-shot parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotRequest {
    /// Index of the target interface, at least one.
    pub target: usize,
    /// Cycles per move batch between order-parameter evaluations.
    pub batch_size: usize,
    /// Optional pruning policy.
    #[serde(default)]
    pub pruning: Option<PruningPolicy>,
    /// Optional cap on the shot duration in cycles.
    #[serde(default)]
    pub max_duration: Option<usize>,
}

impl ShotRequest {
    /// Request without pruning or duration cap.
    pub fn new(target: usize, batch_size: usize) -> Self {
        Self {
            target,
            batch_size,
            pruning: None,
            max_duration: None,
        }
    }

    /// Enables pruning.
    pub fn with_pruning(mut self, policy: PruningPolicy) -> Self {
        self.pruning = Some(policy);
        self
    }

    /// Caps the shot duration.
    pub fn with_max_duration(mut self, cycles: usize) -> Self {
        self.max_duration = Some(cycles);
        self
    }

    /// Checks the request against a ladder and returns the target threshold.
    pub fn validate(&self, ladder: &InterfaceLadder) -> Result<f64, FfsError> {
        let target = ladder.target(self.target)?;
        if self.batch_size == 0 {
            return Err(FfsError::config("batch-size", "batch size must be positive"));
        }
        if let Some(policy) = &self.pruning {
            PruningPolicy::new(policy.probability)?;
        }
        if self.max_duration == Some(0) {
            return Err(FfsError::config(
                "max-duration",
                "maximum duration must be positive when set",
            ));
        }
        Ok(target)
    }
}

/// Result of one shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotResult {
    /// Terminal outcome.
    pub outcome: ShotOutcome,
    /// Statistical weight accumulated through surviving pruning trials.
    pub weight: f64,
    /// Elapsed cycles.
    pub duration: usize,
    /// Number of move batches run.
    pub batches: usize,
    /// Order parameter of the final configuration.
    pub order_parameter: f64,
    /// Potential energy of the final configuration.
    pub energy: f64,
    /// Configuration at termination.
    pub final_configuration: Configuration,
}

impl ShotResult {
    /// Returns true when the shot reached its target.
    pub fn success(&self) -> bool {
        self.outcome == ShotOutcome::Success
    }
}

struct ShotState {
    configuration: Configuration,
    order_parameter: f64,
    energy: f64,
    duration: usize,
    batches: usize,
    weight: f64,
    cursor: isize,
}

impl ShotState {
    /// Runs pruning trials for every threshold at or above the current order
    /// parameter, walking the cursor down. Returns true when pruned.
    fn descend(
        &mut self,
        ladder: &InterfaceLadder,
        policy: &PruningPolicy,
        rng: &mut RngHandle,
    ) -> bool {
        while self.cursor >= 0 && self.order_parameter <= ladder.threshold(self.cursor as usize) {
            if rng.uniform() < policy.probability() {
                trace!(cursor = self.cursor, weight = self.weight, "pruned");
                return true;
            }
            self.weight *= policy.survival_factor();
            self.cursor -= 1;
        }
        false
    }
}

/// Fires one shot from `initial` toward `request.target`.
///
/// The shot alternates pruning trials and move batches until the order
/// parameter reaches the target threshold, drops below the basin, a pruning
/// trial kills it, or the duration cap is hit. Failure and pruning are
/// ordinary outcomes; only collaborator and configuration problems surface
/// as errors.
pub fn run_shot<O, R>(
    initial: Configuration,
    request: &ShotRequest,
    ladder: &InterfaceLadder,
    order: &O,
    runner: &R,
    rng: &mut RngHandle,
) -> Result<ShotResult, FfsError>
where
    O: OrderParameter + ?Sized,
    R: CycleRunner + ?Sized,
{
    let target = request.validate(ladder)?;
    let basin = ladder.basin();

    let mut state = ShotState {
        order_parameter: order.evaluate(&initial)?,
        energy: runner.energy(&initial)?,
        configuration: initial,
        duration: 0,
        batches: 0,
        weight: 1.0,
        cursor: request.target as isize - 1,
    };

    let outcome = loop {
        if state.order_parameter >= target {
            break ShotOutcome::Success;
        }
        if state.order_parameter < basin {
            break ShotOutcome::Failure;
        }
        if let Some(policy) = &request.pruning {
            if state.descend(ladder, policy, rng) {
                break ShotOutcome::Pruned;
            }
        }
        if let Some(max) = request.max_duration {
            if state.duration >= max {
                break ShotOutcome::Truncated;
            }
        }

        let (configuration, energy) =
            runner.run_cycles(state.configuration, state.energy, request.batch_size, rng)?;
        state.configuration = configuration;
        state.energy = energy;
        state.duration += request.batch_size;
        state.batches += 1;
        state.order_parameter = order.evaluate(&state.configuration)?;
        trace!(
            batch = state.batches,
            order_parameter = state.order_parameter,
            "shot batch"
        );
    };

    Ok(ShotResult {
        outcome,
        weight: state.weight,
        duration: state.duration,
        batches: state.batches,
        order_parameter: state.order_parameter,
        energy: state.energy,
        final_configuration: state.configuration,
    })
}
