//! Bounded local optimizers over a flattened control sequence
//!
//! Both optimizers work on black-box objectives: gradients are taken by
//! finite differences that never step outside the bound box.

pub mod panoc;
pub mod projected_gradient;

pub use panoc::*;
pub use projected_gradient::*;

use std::time::Duration;

use crate::common::{ControlBounds, ControlSequence};

/// Outcome of one bounded minimization
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// Best point found, always inside the bound box
    pub x: ControlSequence,
    pub converged: bool,
    pub iterations: usize,
    /// Objective value at `x`
    pub cost: f64,
}

/// Iteration budget and numerical settings shared by the optimizers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerSettings {
    pub max_iterations: usize,
    /// L-BFGS memory length (PANOC only)
    pub lbfgs_memory: usize,
    /// Wall-clock cap per call; hitting it counts as non-convergence
    pub max_duration: Option<Duration>,
    /// Finite difference step
    pub gradient_step: f64,
}

impl OptimizerSettings {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        OptimizerSettings {
            max_iterations: 200,
            lbfgs_memory: 10,
            max_duration: None,
            gradient_step: 1e-6,
        }
    }
}

/// Central difference gradient of `objective` at `u`.
///
/// Near a bound the probe on that side is replaced by `u` itself, giving a
/// one-sided difference, so the objective is never sampled further outside
/// the box than `u` already is.
pub fn numerical_gradient(
    objective: &dyn Fn(&[f64]) -> f64,
    u: &[f64],
    bounds: &ControlBounds,
    step: f64,
    grad: &mut [f64],
) {
    let mut probe = u.to_vec();
    for (i, g) in grad.iter_mut().enumerate() {
        let center = u[i];
        let (up, down) = match bounds.intervals().get(i) {
            Some(bound) => (
                if center + step <= bound.high { center + step } else { center },
                if center - step >= bound.low { center - step } else { center },
            ),
            None => (center + step, center - step),
        };
        if up <= down {
            *g = 0.0;
            continue;
        }

        probe[i] = up;
        let f_up = objective(&probe);
        probe[i] = down;
        let f_down = objective(&probe);
        probe[i] = center;

        *g = (f_up - f_down) / (up - down);
    }
}
