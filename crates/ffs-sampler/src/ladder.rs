use ffs_core::errors::{ErrorInfo, FfsError};
use serde::{Deserialize, Serialize};

/// Basin threshold plus the strictly increasing interface thresholds
/// `λ0 < λ1 < … < λN`.
///
/// Shots always aim at an interface with index at least one; `λ0` is only
/// reached by the free-running flux stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLadder", into = "RawLadder")]
pub struct InterfaceLadder {
    basin: f64,
    interfaces: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct RawLadder {
    basin: f64,
    interfaces: Vec<f64>,
}

impl TryFrom<RawLadder> for InterfaceLadder {
    type Error = FfsError;

    fn try_from(raw: RawLadder) -> Result<Self, Self::Error> {
        InterfaceLadder::new(raw.basin, raw.interfaces)
    }
}

impl From<InterfaceLadder> for RawLadder {
    fn from(ladder: InterfaceLadder) -> Self {
        RawLadder {
            basin: ladder.basin,
            interfaces: ladder.interfaces,
        }
    }
}

impl InterfaceLadder {
    /// Validates and builds a ladder.
    pub fn new(basin: f64, interfaces: Vec<f64>) -> Result<Self, FfsError> {
        if interfaces.len() < 2 {
            return Err(FfsError::Ladder(
                ErrorInfo::new("too-few-interfaces", "ladder needs λ0 and at least one more interface")
                    .with_context("interfaces", interfaces.len()),
            ));
        }
        if !basin.is_finite() || interfaces.iter().any(|value| !value.is_finite()) {
            return Err(FfsError::ladder(
                "non-finite-threshold",
                "ladder thresholds must be finite",
            ));
        }
        for (idx, pair) in interfaces.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(FfsError::Ladder(
                    ErrorInfo::new("not-increasing", "interfaces must be strictly increasing")
                        .with_context("index", idx + 1)
                        .with_context("previous", pair[0])
                        .with_context("value", pair[1]),
                ));
            }
        }
        if basin > interfaces[0] {
            return Err(FfsError::Ladder(
                ErrorInfo::new("basin-above-first", "basin threshold exceeds λ0")
                    .with_context("basin", basin)
                    .with_context("lambda0", interfaces[0]),
            ));
        }
        Ok(Self { basin, interfaces })
    }

    /// Basin threshold λ_A; an order parameter below it ends a shot in failure.
    pub fn basin(&self) -> f64 {
        self.basin
    }

    /// First interface λ0, the flux-stage crossing threshold.
    pub fn first(&self) -> f64 {
        self.interfaces[0]
    }

    /// All interface thresholds.
    pub fn interfaces(&self) -> &[f64] {
        &self.interfaces
    }

    /// Number of interfaces including λ0.
    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    /// Always false; a validated ladder holds at least two interfaces.
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Index of the last interface.
    pub fn last_index(&self) -> usize {
        self.interfaces.len() - 1
    }

    /// Threshold of a shot target, rejecting `0` and indices past the end.
    pub fn target(&self, index: usize) -> Result<f64, FfsError> {
        if index == 0 || index >= self.interfaces.len() {
            return Err(FfsError::Ladder(
                ErrorInfo::new("target-out-of-range", "target interface index out of range")
                    .with_context("index", index)
                    .with_context("valid", format!("1..={}", self.last_index())),
            ));
        }
        Ok(self.interfaces[index])
    }

    /// Threshold at a pruning cursor position.
    pub(crate) fn threshold(&self, cursor: usize) -> f64 {
        self.interfaces[cursor]
    }
}
