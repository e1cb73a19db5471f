//! Common traits defining the plant/cost/optimizer seams of the controller

use crate::common::types::*;
use crate::optimizer::OptimizationResult;

/// Trait for vehicle motion models used both for prediction and as the simulated plant
pub trait PlantModel {
    /// Propagate `state` forward by `dt` under `control`.
    ///
    /// Must be pure: identical arguments always give an identical successor.
    /// Only called with controls inside the configured bound box.
    fn step(&self, state: &State, dt: f64, control: &Control) -> State;
}

impl<P: PlantModel + ?Sized> PlantModel for &P {
    fn step(&self, state: &State, dt: f64, control: &Control) -> State {
        (**self).step(state, dt, control)
    }
}

/// Trait for the scalar objective minimized at every tick
pub trait CostFunction {
    /// Cost of applying the flattened sequence `u` for `horizon` steps from `state0`
    /// while tracking `reference`.
    fn evaluate(&self, u: &[f64], horizon: usize, state0: &State, reference: &Reference) -> f64;

    /// Time step of the internal rollout, if the cost simulates the plant
    fn dt(&self) -> Option<f64> {
        None
    }
}

impl<C: CostFunction + ?Sized> CostFunction for &C {
    fn evaluate(&self, u: &[f64], horizon: usize, state0: &State, reference: &Reference) -> f64 {
        (**self).evaluate(u, horizon, state0, reference)
    }

    fn dt(&self) -> Option<f64> {
        (**self).dt()
    }
}

/// Trait for bounded local minimizers over a control sequence
pub trait ControlOptimizer {
    /// Minimize `objective` starting at `initial_guess`.
    ///
    /// The returned sequence always lies inside `bounds`, also when
    /// `converged` is false; it is then the best point found.
    ///
    /// `tolerance` is the solver's own stopping threshold. For
    /// `ProjectedGradientOptimizer` it bounds the cost improvement of an
    /// accepted step; for `PanocOptimizer` it bounds PANOC's fixed-point
    /// residual, which vanishes exactly where the cost stops improving
    /// inside the box.
    fn minimize(
        &mut self,
        objective: &dyn Fn(&[f64]) -> f64,
        initial_guess: &ControlSequence,
        bounds: &ControlBounds,
        tolerance: f64,
    ) -> OptimizationResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that traits compile correctly
    struct Hold;

    impl PlantModel for Hold {
        fn step(&self, state: &State, _dt: f64, _control: &Control) -> State {
            *state
        }
    }

    #[test]
    fn test_plant_model_by_reference() {
        let plant = Hold;
        let by_ref: &dyn PlantModel = &plant;
        let s = State::new(1.0, 2.0, 0.3, 4.0);
        assert_eq!(by_ref.step(&s, 0.1, &Control::zero()), s);
        assert_eq!((&plant).step(&s, 0.1, &Control::zero()), s);
    }
}
