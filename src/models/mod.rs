//! Vehicle plant models
//!
//! A plant model maps a state and a control over one time step to the
//! successor state. The same model drives the cost function's internal
//! prediction and the simulated vehicle.

pub mod kinematic_bicycle;

pub use kinematic_bicycle::*;

use crate::common::{Control, PlantModel, State};

/// Roll `plant` forward from `state0`, one step per control.
///
/// The returned states exclude `state0`: the i-th entry is the state after
/// applying the i-th control.
pub fn rollout<P, I>(plant: &P, state0: &State, dt: f64, controls: I) -> Vec<State>
where
    P: PlantModel + ?Sized,
    I: IntoIterator<Item = Control>,
{
    let mut state = *state0;
    controls
        .into_iter()
        .map(|control| {
            state = plant.step(&state, dt, &control);
            state
        })
        .collect()
}
