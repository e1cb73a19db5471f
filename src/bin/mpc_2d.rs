// Model predictive control of a 2D vehicle toward a switching reference pose
// author: rust_mpc2d team
//
// Runs the full closed loop with PANOC, logs every tick and writes the
// trajectory plot to ./img/mpc_2d.svg and the control plot to
// ./img/mpc_2d_controls.svg. Set RUST_LOG=info to see the per-tick log.

use std::process::ExitCode;

use log::{error, info, warn};
use rust_mpc2d::cost::{CostWeights, PoseTrackingCost};
use rust_mpc2d::models::KinematicBicycle;
use rust_mpc2d::optimizer::PanocOptimizer;
use rust_mpc2d::utils::visualization::plot_controls;
use rust_mpc2d::utils::Visualizer;
use rust_mpc2d::{MpcConfig, MpcResult, RecedingHorizonLoop, SimulationRun};

const SHOW_ANIMATION: bool = false;

fn simulate(config: MpcConfig) -> MpcResult<SimulationRun> {
    let plant = KinematicBicycle::default();
    let cost = PoseTrackingCost::from_config(plant, &config, CostWeights::default());
    let optimizer = PanocOptimizer::default();

    let mut mpc = RecedingHorizonLoop::new(config, plant, cost, optimizer)?;
    Ok(mpc.run())
}

fn plot(run: &SimulationRun, dt: f64) -> MpcResult<()> {
    let mut vis = Visualizer::new();
    vis.set_title("MPC 2D").plot_history(&run.history, 10);
    vis.save_svg("./img/mpc_2d.svg", 640, 640)?;
    if SHOW_ANIMATION {
        vis.show()?;
    }

    let mut controls = plot_controls(&run.history, dt);
    controls
        .save_to_svg("./img/mpc_2d_controls.svg", 640, 480)
        .map_err(|e| rust_mpc2d::MpcError::Visualization(e.to_string()))?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    println!("mpc_2d start!");

    let config = MpcConfig::default();
    let dt = config.dt;

    let run = match simulate(config) {
        Ok(run) => run,
        Err(e) => {
            error!("invalid setup: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let last = run.history.last().state;
    info!(
        "final state: x {:.3}, y {:.3}, yaw {:.3}, v {:.3}",
        last.x, last.y, last.yaw, last.v
    );
    if let Err(e) = run.require_converged() {
        warn!("{}", e);
    }

    if let Err(e) = plot(&run, dt) {
        warn!("plot skipped: {}", e);
    }

    match run.error() {
        Some(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
        None => {
            println!("mpc_2d done!");
            ExitCode::SUCCESS
        }
    }
}
