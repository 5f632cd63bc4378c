use ffs_cluster::{ClusterDetector, CoordinationClassifier};
use ffs_core::errors::FfsError;
use ffs_core::{Configuration, CycleRunner, OrderParameter, RngHandle, SimBox};
use ffs_sampler::{run_shot, InterfaceLadder, PruningPolicy, ShotOutcome, ShotRequest};

/// Order parameter equal to the number of particles.
struct Count;

impl OrderParameter for Count {
    fn evaluate(&self, config: &Configuration) -> Result<f64, FfsError> {
        Ok(config.len() as f64)
    }
}

/// Adds or removes a fixed number of particles per batch.
struct Drift(isize);

impl CycleRunner for Drift {
    fn energy(&self, _config: &Configuration) -> Result<f64, FfsError> {
        Ok(0.0)
    }

    fn run_cycles(
        &self,
        mut config: Configuration,
        energy: f64,
        _cycles: usize,
        _rng: &mut RngHandle,
    ) -> Result<(Configuration, f64), FfsError> {
        if self.0 >= 0 {
            config.positions.extend(std::iter::repeat([0.0; 3]).take(self.0 as usize));
        } else {
            let keep = config.len().saturating_sub(self.0.unsigned_abs());
            config.positions.truncate(keep);
        }
        Ok((config, energy))
    }
}

/// Grows a straight chain of particles one unit apart.
struct GrowChain;

impl CycleRunner for GrowChain {
    fn energy(&self, _config: &Configuration) -> Result<f64, FfsError> {
        Ok(0.0)
    }

    fn run_cycles(
        &self,
        mut config: Configuration,
        energy: f64,
        _cycles: usize,
        _rng: &mut RngHandle,
    ) -> Result<(Configuration, f64), FfsError> {
        let next = config.positions.last().map(|p| [p[0] + 1.0, p[1], p[2]]).unwrap_or([1.0; 3]);
        config.positions.push(next);
        Ok((config, energy - 1.0))
    }
}

fn particles(count: usize) -> Configuration {
    Configuration::new(vec![[0.0; 3]; count], SimBox::cubic(10.0).unwrap()).unwrap()
}

fn ladder() -> InterfaceLadder {
    InterfaceLadder::new(5.0, vec![5.0, 10.0, 15.0]).unwrap()
}

#[test]
fn rising_order_parameter_succeeds_after_four_batches() {
    let mut rng = RngHandle::from_seed(1);
    let result =
        run_shot(particles(6), &ShotRequest::new(1, 25), &ladder(), &Count, &Drift(1), &mut rng)
            .unwrap();
    assert_eq!(result.outcome, ShotOutcome::Success);
    assert!(result.success());
    assert_eq!(result.batches, 4);
    assert_eq!(result.duration, 100);
    assert_eq!(result.weight, 1.0);
    assert_eq!(result.final_configuration.len(), 10);
}

#[test]
fn falling_order_parameter_fails_after_two_batches() {
    let mut rng = RngHandle::from_seed(1);
    let result =
        run_shot(particles(6), &ShotRequest::new(1, 25), &ladder(), &Count, &Drift(-1), &mut rng)
            .unwrap();
    assert_eq!(result.outcome, ShotOutcome::Failure);
    assert_eq!(result.batches, 2);
    assert_eq!(result.duration, 50);
    assert_eq!(result.order_parameter, 4.0);
}

#[test]
fn zero_prune_probability_never_prunes() {
    let policy = PruningPolicy::new(0.0).unwrap();
    let ladder = InterfaceLadder::new(1.0, vec![2.0, 5.0, 10.0, 15.0, 20.0]).unwrap();
    for seed in 0..50 {
        let mut rng = RngHandle::from_seed(seed);
        let request = ShotRequest::new(4, 1).with_pruning(policy);
        let result = run_shot(particles(16), &request, &ladder, &Count, &Drift(-3), &mut rng).unwrap();
        assert_eq!(result.outcome, ShotOutcome::Failure);
        assert_eq!(result.weight, 1.0);
    }
}

#[test]
fn certain_pruning_kills_at_first_crossing() {
    let policy = PruningPolicy::new(1.0).unwrap();
    let ladder = InterfaceLadder::new(0.0, vec![2.0, 5.0, 10.0, 15.0]).unwrap();
    let mut rng = RngHandle::from_seed(3);
    let request = ShotRequest::new(3, 1).with_pruning(policy);
    let result = run_shot(particles(11), &request, &ladder, &Count, &Drift(-1), &mut rng).unwrap();
    assert_eq!(result.outcome, ShotOutcome::Pruned);
    assert_eq!(result.batches, 1);
    assert_eq!(result.order_parameter, 10.0);
    assert_eq!(result.weight, 1.0);
}

#[test]
fn start_on_the_pruning_threshold_gets_a_trial() {
    let policy = PruningPolicy::new(1.0).unwrap();
    let mut rng = RngHandle::from_seed(3);
    let request = ShotRequest::new(2, 1).with_pruning(policy);
    let result = run_shot(particles(10), &request, &ladder(), &Count, &Drift(1), &mut rng).unwrap();
    assert_eq!(result.outcome, ShotOutcome::Pruned);
    assert_eq!(result.batches, 0);
}

#[test]
fn one_batch_through_several_thresholds_compounds_weight() {
    let policy = PruningPolicy::new(0.5).unwrap();
    let ladder = InterfaceLadder::new(1.0, vec![2.0, 5.0, 10.0, 15.0, 20.0]).unwrap();
    let request = ShotRequest::new(4, 1).with_pruning(policy);

    let mut survivors = 0usize;
    let mut weighted = 0.0;
    let trials = 4_000;
    for seed in 0..trials {
        let mut rng = RngHandle::from_seed(seed);
        let result = run_shot(particles(16), &request, &ladder, &Count, &Drift(-6), &mut rng).unwrap();
        match result.outcome {
            ShotOutcome::Pruned => assert!(result.weight <= 8.0),
            ShotOutcome::Failure => {
                // 16 -> 10 crosses 15 and 10, 10 -> 4 crosses 5.
                assert_eq!(result.weight, 8.0);
                assert_eq!(result.batches, 3);
                survivors += 1;
                weighted += result.weight;
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    assert!(survivors > 0);
    let mean = weighted / trials as f64;
    assert!((mean - 1.0).abs() < 0.2, "mean surviving weight {mean}");
}

#[test]
fn largest_cluster_drives_the_shot() {
    let mut positions: Vec<_> = (0..6).map(|i| [1.0 + i as f64, 5.0, 5.0]).collect();
    positions.push([30.0, 30.0, 30.0]);
    let config = Configuration::new(positions, SimBox::cubic(50.0).unwrap()).unwrap();
    let detector = ClusterDetector::new(CoordinationClassifier::new(1.1, 1).unwrap(), 1.1).unwrap();
    assert_eq!(detector.evaluate(&config).unwrap(), 6.0);

    let mut rng = RngHandle::from_seed(0);
    let mut chain = config.clone();
    chain.positions.pop();
    let result = run_shot(chain, &ShotRequest::new(1, 5), &ladder(), &detector, &GrowChain, &mut rng).unwrap();
    assert_eq!(result.outcome, ShotOutcome::Success);
    assert_eq!(result.batches, 4);
    assert_eq!(result.energy, -4.0);
}

#[test]
fn collaborator_errors_propagate() {
    struct Failing;

    impl CycleRunner for Failing {
        fn energy(&self, _config: &Configuration) -> Result<f64, FfsError> {
            Ok(0.0)
        }

        fn run_cycles(
            &self,
            _config: Configuration,
            _energy: f64,
            _cycles: usize,
            _rng: &mut RngHandle,
        ) -> Result<(Configuration, f64), FfsError> {
            Err(FfsError::Collaborator(ffs_core::ErrorInfo::new("runner-down", "runner failed")))
        }
    }

    let mut rng = RngHandle::from_seed(0);
    let err = run_shot(particles(6), &ShotRequest::new(1, 1), &ladder(), &Count, &Failing, &mut rng)
        .unwrap_err();
    assert!(matches!(err, FfsError::Collaborator(info) if info.code == "runner-down"));
}
