use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::shot::{ShotOutcome, ShotResult};

const SHOT_HEADER: &str = "interface,shot,start,outcome,weight,duration,batches,order_parameter";

/// One line of the shot log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotRecord {
    /// Target interface.
    pub interface: usize,
    /// Shot number within the stage.
    pub shot: usize,
    /// Archive index of the starting configuration.
    pub start: usize,
    /// Terminal outcome.
    pub outcome: ShotOutcome,
    /// Final weight.
    pub weight: f64,
    /// Elapsed cycles.
    pub duration: usize,
    /// Move batches run.
    pub batches: usize,
    /// Final order parameter.
    pub order_parameter: f64,
}

impl ShotRecord {
    /// Summarises a shot result.
    pub fn from_result(interface: usize, shot: usize, start: usize, result: &ShotResult) -> Self {
        Self {
            interface,
            shot,
            start,
            outcome: result.outcome,
            weight: result.weight,
            duration: result.duration,
            batches: result.batches,
            order_parameter: result.order_parameter,
        }
    }
}

/// Outcome tallies and crossing probability of one interface stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceStats {
    /// Target interface.
    pub interface: usize,
    /// Shots fired.
    pub shots: usize,
    /// Successful shots.
    pub successes: usize,
    /// Shots that fell back into the basin.
    pub failures: usize,
    /// Pruned shots.
    pub pruned: usize,
    /// Shots stopped by the duration cap.
    pub truncated: usize,
    /// Summed weight of successful shots.
    pub success_weight: f64,
    /// Estimated crossing probability from the previous interface.
    pub probability: f64,
    /// Mean duration of all shots, in cycles.
    pub mean_duration: f64,
}

impl InterfaceStats {
    /// Aggregates the records of one stage. The probability estimate is the
    /// summed weight of successes over the number of shots fired.
    pub fn from_records(interface: usize, records: &[ShotRecord]) -> Self {
        let mut stats = Self {
            interface,
            shots: records.len(),
            successes: 0,
            failures: 0,
            pruned: 0,
            truncated: 0,
            success_weight: 0.0,
            probability: 0.0,
            mean_duration: 0.0,
        };
        let mut total_duration = 0usize;
        for record in records {
            total_duration += record.duration;
            match record.outcome {
                ShotOutcome::Success => {
                    stats.successes += 1;
                    stats.success_weight += record.weight;
                }
                ShotOutcome::Failure => stats.failures += 1,
                ShotOutcome::Pruned => stats.pruned += 1,
                ShotOutcome::Truncated => stats.truncated += 1,
            }
        }
        if !records.is_empty() {
            stats.probability = stats.success_weight / records.len() as f64;
            stats.mean_duration = total_duration as f64 / records.len() as f64;
        }
        stats
    }
}

/// Flux-stage summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxStats {
    /// λ0 crossings collected.
    pub hits: usize,
    /// Cycles run.
    pub cycles: usize,
    /// Crossings per cycle.
    pub flux: f64,
    /// Crossings per cycle and unit volume.
    pub flux_per_volume: f64,
}

/// Appends records to the shot log, writing the header when the file is new.
pub fn append_shot_log<P: AsRef<Path>>(path: P, records: &[ShotRecord]) -> std::io::Result<()> {
    let path = path.as_ref();
    let fresh = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if fresh {
        writeln!(file, "{SHOT_HEADER}")?;
    }
    for record in records {
        writeln!(
            file,
            "{},{},{},{},{:.6},{},{},{}",
            record.interface,
            record.shot,
            record.start,
            record.outcome.as_str(),
            record.weight,
            record.duration,
            record.batches,
            record.order_parameter
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(outcome: ShotOutcome, weight: f64, duration: usize) -> ShotRecord {
        ShotRecord {
            interface: 1,
            shot: 0,
            start: 0,
            outcome,
            weight,
            duration,
            batches: duration,
            order_parameter: 0.0,
        }
    }

    #[test]
    fn probability_uses_success_weights() {
        let records = vec![
            record(ShotOutcome::Success, 2.0, 10),
            record(ShotOutcome::Pruned, 1.0, 4),
            record(ShotOutcome::Failure, 1.0, 2),
            record(ShotOutcome::Truncated, 1.0, 8),
        ];
        let stats = InterfaceStats::from_records(1, &records);
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.pruned, 1);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.truncated, 1);
        assert_eq!(stats.probability, 0.5);
        assert_eq!(stats.mean_duration, 6.0);
    }

    #[test]
    fn empty_stage_has_zero_probability() {
        let stats = InterfaceStats::from_records(3, &[]);
        assert_eq!(stats.probability, 0.0);
        assert_eq!(stats.shots, 0);
    }
}
