// Monte Carlo batch of closed-loop runs
// author: rust_mpc2d team
//
// Perturbs the initial pose with Gaussian noise and runs the independent
// simulations in parallel, then reports how close each run ends to the
// final reference.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, NormalError};

use log::{info, warn};
use rust_mpc2d::control::run_batch;
use rust_mpc2d::cost::{CostWeights, PoseTrackingCost};
use rust_mpc2d::models::KinematicBicycle;
use rust_mpc2d::optimizer::{OptimizerSettings, PanocOptimizer};
use rust_mpc2d::{MpcConfig, State};

const NUM_RUNS: usize = 8;
const SEED: u64 = 42;
const POS_STD: f64 = 1.0; // initial position noise [m]
const YAW_STD: f64 = 0.3; // initial heading noise [rad]

fn main() -> Result<(), NormalError> {
    env_logger::init();
    println!("mpc_batch start!");

    let mut rng = StdRng::seed_from_u64(SEED);
    let pos_noise = Normal::new(0.0, POS_STD)?;
    let yaw_noise = Normal::new(0.0, YAW_STD)?;

    let base = MpcConfig::default();
    let configs: Vec<MpcConfig> = (0..NUM_RUNS)
        .map(|_| {
            let state = State::new(
                pos_noise.sample(&mut rng),
                pos_noise.sample(&mut rng),
                yaw_noise.sample(&mut rng),
                0.0,
            );
            base.clone().with_initial_state(state)
        })
        .collect();

    let results = run_batch(configs, |config| {
        let plant = KinematicBicycle::default();
        let cost = PoseTrackingCost::from_config(plant, config, CostWeights::default());
        let optimizer = PanocOptimizer::new(OptimizerSettings::default().with_max_iterations(100));
        (plant, cost, optimizer)
    });

    let goal = base.second_reference.position();
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(run) => {
                let start = run.history.seed().state;
                let end = run.history.last().state;
                info!(
                    "run {}: start ({:.2}, {:.2}, {:.2}) -> end ({:.2}, {:.2}), goal distance {:.3}, {} unconverged ticks",
                    i,
                    start.x,
                    start.y,
                    start.yaw,
                    end.x,
                    end.y,
                    end.position().distance(&goal),
                    run.summary.non_converged_ticks
                );
                if let Some(e) = run.error() {
                    warn!("run {} aborted: {}", i, e);
                }
            }
            Err(e) => warn!("run {} rejected: {}", i, e),
        }
    }

    println!("mpc_batch done!");
    Ok(())
}
