//! Independent closed-loop runs in parallel
//!
//! Each run builds its own plant, cost and optimizer from the factory, so no
//! state is shared between runs; ticks inside one run stay sequential.

use rayon::prelude::*;

use crate::common::{ControlOptimizer, CostFunction, MpcResult, PlantModel};
use crate::control::{MpcConfig, RecedingHorizonLoop, SimulationRun};

/// Run every configuration to completion; results keep the input order.
pub fn run_batch<F, P, C, O>(configs: Vec<MpcConfig>, factory: F) -> Vec<MpcResult<SimulationRun>>
where
    F: Fn(&MpcConfig) -> (P, C, O) + Sync,
    P: PlantModel,
    C: CostFunction,
    O: ControlOptimizer,
{
    configs
        .into_par_iter()
        .map(|config| {
            let (plant, cost, optimizer) = factory(&config);
            let mut mpc = RecedingHorizonLoop::new(config, plant, cost, optimizer)?;
            Ok(mpc.run())
        })
        .collect()
}
