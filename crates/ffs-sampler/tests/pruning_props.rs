use ffs_core::errors::FfsError;
use ffs_core::{Configuration, CycleRunner, OrderParameter, RngHandle, SimBox};
use ffs_sampler::{run_shot, InterfaceLadder, PruningPolicy, ShotOutcome, ShotRequest};
use proptest::prelude::*;

struct Count;

impl OrderParameter for Count {
    fn evaluate(&self, config: &Configuration) -> Result<f64, FfsError> {
        Ok(config.len() as f64)
    }
}

/// Moves the particle count by a random amount in `-max_step..=max_step`.
struct RandomStep {
    max_step: usize,
}

impl CycleRunner for RandomStep {
    fn energy(&self, _config: &Configuration) -> Result<f64, FfsError> {
        Ok(0.0)
    }

    fn run_cycles(
        &self,
        mut config: Configuration,
        energy: f64,
        _cycles: usize,
        rng: &mut RngHandle,
    ) -> Result<(Configuration, f64), FfsError> {
        let span = 2 * self.max_step + 1;
        let step = rng.index(span) as isize - self.max_step as isize;
        if step >= 0 {
            config.positions.extend(std::iter::repeat([0.0; 3]).take(step as usize));
        } else {
            let keep = config.len().saturating_sub(step.unsigned_abs());
            config.positions.truncate(keep);
        }
        Ok((config, energy))
    }
}

proptest! {
    #[test]
    fn weight_is_a_power_of_the_survival_factor(
        seed in any::<u64>(),
        probability in 0.0f64..0.9,
        start in 4usize..30,
        max_step in 1usize..6,
    ) {
        let ladder = InterfaceLadder::new(3.0, vec![4.0, 10.0, 18.0, 30.0]).unwrap();
        let policy = PruningPolicy::new(probability).unwrap();
        let request = ShotRequest::new(3, 1).with_pruning(policy).with_max_duration(10_000);
        let initial = Configuration::new(vec![[0.0; 3]; start], SimBox::cubic(5.0).unwrap()).unwrap();
        let mut rng = RngHandle::from_seed(seed);
        let result = run_shot(initial, &request, &ladder, &Count, &RandomStep { max_step }, &mut rng).unwrap();

        prop_assert!(result.weight >= 1.0);
        let survived = (0..=3).any(|k| (result.weight - policy.survival_factor().powi(k)).abs() < 1e-9 * result.weight);
        prop_assert!(survived, "weight {} is not a survival power", result.weight);
        match result.outcome {
            ShotOutcome::Success => {
                prop_assert!(result.order_parameter >= 30.0);
            }
            ShotOutcome::Failure => {
                prop_assert!(result.order_parameter < 3.0);
            }
            ShotOutcome::Pruned => {
                prop_assert!(result.order_parameter < 30.0);
            }
            ShotOutcome::Truncated => {
                prop_assert_eq!(result.duration, 10_000);
            }
        }
    }

    #[test]
    fn increasing_ladders_validate(
        basin in -5.0f64..5.0,
        gaps in prop::collection::vec(0.01f64..10.0, 2..8),
    ) {
        let mut interfaces = Vec::with_capacity(gaps.len());
        let mut value = basin;
        for gap in gaps {
            value += gap;
            interfaces.push(value);
        }
        let ladder = InterfaceLadder::new(basin, interfaces.clone()).unwrap();
        prop_assert_eq!(ladder.interfaces(), interfaces.as_slice());
        prop_assert!(ladder.target(ladder.last_index()).is_ok());
    }
}
