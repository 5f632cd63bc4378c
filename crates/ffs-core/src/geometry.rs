//! Simulation box, minimum-image separations and particle configurations.

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, FfsError};

/// Cartesian position of a single particle.
pub type Position = [f64; 3];

/// Orthorhombic simulation box. The x and y axes are always periodic; z is
/// periodic only when `periodic_z` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimBox {
    /// Edge lengths along x, y and z.
    pub lengths: [f64; 3],
    /// Whether the z axis wraps around.
    #[serde(default = "default_periodic_z")]
    pub periodic_z: bool,
}

fn default_periodic_z() -> bool {
    true
}

impl SimBox {
    /// Creates a box after checking that every edge length is finite and positive.
    pub fn new(lengths: [f64; 3], periodic_z: bool) -> Result<Self, FfsError> {
        let sim_box = Self {
            lengths,
            periodic_z,
        };
        sim_box.validate()?;
        Ok(sim_box)
    }

    /// Cubic, fully periodic box.
    pub fn cubic(length: f64) -> Result<Self, FfsError> {
        Self::new([length; 3], true)
    }

    /// Checks that every edge length is finite and positive.
    pub fn validate(&self) -> Result<(), FfsError> {
        for (axis, &length) in self.lengths.iter().enumerate() {
            if !(length.is_finite() && length > 0.0) {
                return Err(FfsError::Geometry(
                    ErrorInfo::new("box-length", "box edge lengths must be finite and positive")
                        .with_context("axis", axis)
                        .with_context("length", length),
                ));
            }
        }
        Ok(())
    }

    /// Returns true when the given axis wraps around.
    pub fn is_periodic(&self, axis: usize) -> bool {
        axis < 2 || self.periodic_z
    }

    /// Box volume.
    pub fn volume(&self) -> f64 {
        self.lengths.iter().product()
    }

    /// Minimum-image displacement `b - a` along a single axis.
    #[inline]
    pub fn axis_delta(&self, axis: usize, a: f64, b: f64) -> f64 {
        let delta = b - a;
        if self.is_periodic(axis) {
            let length = self.lengths[axis];
            delta - length * (delta / length).round()
        } else {
            delta
        }
    }

    /// Minimum-image displacement vector from `a` to `b`.
    pub fn delta(&self, a: &Position, b: &Position) -> Position {
        [
            self.axis_delta(0, a[0], b[0]),
            self.axis_delta(1, a[1], b[1]),
            self.axis_delta(2, a[2], b[2]),
        ]
    }

    /// Squared minimum-image distance between `a` and `b`.
    pub fn distance_sq(&self, a: &Position, b: &Position) -> f64 {
        let d = self.delta(a, b);
        d[0] * d[0] + d[1] * d[1] + d[2] * d[2]
    }

    /// Squared minimum-image distance when it is strictly below `cutoff`.
    ///
    /// Axes are tested one at a time and the pair is rejected as soon as a
    /// single component reaches the cutoff, so most distant pairs cost one
    /// subtraction and one rounding.
    #[inline]
    pub fn within_cutoff(&self, a: &Position, b: &Position, cutoff: f64) -> Option<f64> {
        let dx = self.axis_delta(0, a[0], b[0]);
        if dx.abs() >= cutoff {
            return None;
        }
        let dy = self.axis_delta(1, a[1], b[1]);
        if dy.abs() >= cutoff {
            return None;
        }
        let dz = self.axis_delta(2, a[2], b[2]);
        if dz.abs() >= cutoff {
            return None;
        }
        let r_sq = dx * dx + dy * dy + dz * dz;
        (r_sq < cutoff * cutoff).then_some(r_sq)
    }

    /// Maps a position back into the primary cell on every periodic axis.
    pub fn wrap(&self, position: &mut Position) {
        for (axis, coord) in position.iter_mut().enumerate() {
            if self.is_periodic(axis) {
                *coord = coord.rem_euclid(self.lengths[axis]);
            }
        }
    }

    /// Returns true when the position lies inside `[0, L)` along z, or z is periodic.
    pub fn contains_z(&self, position: &Position) -> bool {
        self.periodic_z || (position[2] >= 0.0 && position[2] < self.lengths[2])
    }
}

/// Particle positions together with the box they live in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Particle positions, indexed by particle number.
    pub positions: Vec<Position>,
    /// Simulation box the positions refer to.
    pub sim_box: SimBox,
}

impl Configuration {
    /// Creates a configuration after validating the box.
    pub fn new(positions: Vec<Position>, sim_box: SimBox) -> Result<Self, FfsError> {
        sim_box.validate()?;
        Ok(Self { positions, sim_box })
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true when the configuration holds no particles.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
