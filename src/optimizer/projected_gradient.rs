// Projected gradient descent with Armijo backtracking
// author: rust_mpc2d team
//
// Every iterate is projected onto the bound box, so the current point is
// always feasible and always the best point seen so far. Stops once the cost
// improvement of an accepted step falls below the tolerance.

use std::time::Instant;

use log::trace;

use crate::common::{ControlBounds, ControlOptimizer, ControlSequence};
use crate::optimizer::{numerical_gradient, OptimizationResult, OptimizerSettings};

const SIGMA: f64 = 1e-4; // sufficient decrease constant
const SHRINK: f64 = 0.5; // backtracking factor
const MAX_BACKTRACKS: usize = 40;

/// Bounded first-order optimizer, derivative free from the caller's point of view
pub struct ProjectedGradientOptimizer {
    pub settings: OptimizerSettings,
    /// Step length tried first on the first iteration
    pub initial_step: f64,
    pub max_step: f64,
}

impl ProjectedGradientOptimizer {
    pub fn new(settings: OptimizerSettings) -> Self {
        ProjectedGradientOptimizer {
            settings,
            initial_step: 1.0,
            max_step: 100.0,
        }
    }
}

impl Default for ProjectedGradientOptimizer {
    fn default() -> Self {
        Self::new(OptimizerSettings::default())
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

impl ControlOptimizer for ProjectedGradientOptimizer {
    fn minimize(
        &mut self,
        objective: &dyn Fn(&[f64]) -> f64,
        initial_guess: &ControlSequence,
        bounds: &ControlBounds,
        tolerance: f64,
    ) -> OptimizationResult {
        let start = Instant::now();
        let mut u = initial_guess.as_slice().to_vec();
        bounds.project(&mut u);
        let mut f = objective(&u);

        let mut converged = false;
        let mut iterations = 0;
        let mut step = self.initial_step;
        let mut grad = vec![0.0; u.len()];

        if f.is_finite() {
            while iterations < self.settings.max_iterations {
                if let Some(limit) = self.settings.max_duration {
                    if start.elapsed() >= limit {
                        break;
                    }
                }
                iterations += 1;

                numerical_gradient(objective, &u, bounds, self.settings.gradient_step, &mut grad);
                if grad.iter().any(|g| !g.is_finite()) {
                    break;
                }

                // projected gradient of unit length measures stationarity
                let mut unit: Vec<f64> = u.iter().zip(grad.iter()).map(|(x, g)| x - g).collect();
                bounds.project(&mut unit);
                if squared_distance(&u, &unit).sqrt() <= tolerance {
                    converged = true;
                    break;
                }

                let mut alpha = step;
                let mut accepted = None;
                for _ in 0..MAX_BACKTRACKS {
                    let mut candidate: Vec<f64> =
                        u.iter().zip(grad.iter()).map(|(x, g)| x - alpha * g).collect();
                    bounds.project(&mut candidate);
                    let fc = objective(&candidate);
                    let dist2 = squared_distance(&u, &candidate);
                    if fc.is_finite() && f - fc >= SIGMA / alpha * dist2 {
                        accepted = Some((candidate, fc));
                        break;
                    }
                    alpha *= SHRINK;
                }

                match accepted {
                    Some((candidate, fc)) => {
                        let improvement = f - fc;
                        trace!("iter {}: alpha {:e}, cost {:.6} -> {:.6}", iterations, alpha, f, fc);
                        u = candidate;
                        f = fc;
                        step = (alpha * 2.0).min(self.max_step);
                        if improvement < tolerance {
                            converged = true;
                            break;
                        }
                    }
                    None => break,
                }
            }
        }

        OptimizationResult {
            x: ControlSequence::from_vec(u),
            converged,
            iterations,
            cost: f,
        }
    }
}
