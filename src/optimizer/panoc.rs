// PANOC (proximal averaged Newton-type method for optimal control)
// author: rust_mpc2d team
//
// Thin adapter over optimization_engine: the bound box becomes a Rectangle
// constraint, the objective is wrapped as a cost callback and its gradient
// is taken by finite differences. The cache is kept between calls while the
// problem size and tolerance do not change.

use log::{debug, warn};
use optimization_engine::{
    constraints::Rectangle,
    panoc::{PANOCCache, PANOCOptimizer},
    Optimizer, Problem, SolverError,
};

use crate::common::{ControlBounds, ControlOptimizer, ControlSequence};
use crate::optimizer::{numerical_gradient, OptimizationResult, OptimizerSettings};

struct CachedWorkspace {
    size: usize,
    tolerance: f64,
    cache: PANOCCache,
}

/// Bounded optimizer backed by PANOC
pub struct PanocOptimizer {
    pub settings: OptimizerSettings,
    workspace: Option<CachedWorkspace>,
}

impl PanocOptimizer {
    pub fn new(settings: OptimizerSettings) -> Self {
        PanocOptimizer {
            settings,
            workspace: None,
        }
    }

    fn cache_for(&mut self, size: usize, tolerance: f64) -> &mut PANOCCache {
        let stale = match &self.workspace {
            Some(ws) => ws.size != size || ws.tolerance != tolerance,
            None => true,
        };
        if stale {
            debug!("allocating PANOC cache: n = {}, tol = {:e}", size, tolerance);
            self.workspace = None;
        }
        let memory = self.settings.lbfgs_memory;
        &mut self
            .workspace
            .get_or_insert_with(|| CachedWorkspace {
                size,
                tolerance,
                cache: PANOCCache::new(size, tolerance, memory),
            })
            .cache
    }
}

impl Default for PanocOptimizer {
    fn default() -> Self {
        Self::new(OptimizerSettings::default())
    }
}

impl ControlOptimizer for PanocOptimizer {
    fn minimize(
        &mut self,
        objective: &dyn Fn(&[f64]) -> f64,
        initial_guess: &ControlSequence,
        bounds: &ControlBounds,
        tolerance: f64,
    ) -> OptimizationResult {
        let lower = bounds.lower();
        let upper = bounds.upper();
        let rectangle = Rectangle::new(Some(lower.as_slice()), Some(upper.as_slice()));

        let step = self.settings.gradient_step;
        let cost = |u: &[f64], c: &mut f64| -> Result<(), SolverError> {
            *c = objective(u);
            if c.is_finite() {
                Ok(())
            } else {
                Err(SolverError::Cost)
            }
        };
        let gradient = |u: &[f64], grad: &mut [f64]| -> Result<(), SolverError> {
            numerical_gradient(objective, u, bounds, step, grad);
            if grad.iter().all(|g| g.is_finite()) {
                Ok(())
            } else {
                Err(SolverError::Cost)
            }
        };
        let problem = Problem::new(&rectangle, gradient, cost);

        let max_iterations = self.settings.max_iterations;
        let max_duration = self.settings.max_duration;
        let cache = self.cache_for(initial_guess.len(), tolerance);
        let mut panoc = PANOCOptimizer::new(problem, cache).with_max_iter(max_iterations);
        if let Some(duration) = max_duration {
            panoc = panoc.with_max_duration(duration);
        }

        let mut u = initial_guess.as_slice().to_vec();
        bounds.project(&mut u);

        match panoc.solve(&mut u) {
            Ok(status) => {
                bounds.project(&mut u);
                debug!(
                    "PANOC exit {:?} after {} iterations, cost {:.6}",
                    status.exit_status(),
                    status.iterations(),
                    status.cost_value()
                );
                let cost = objective(&u);
                OptimizationResult {
                    x: ControlSequence::from_vec(u),
                    converged: status.has_converged(),
                    iterations: status.iterations(),
                    cost,
                }
            }
            Err(e) => {
                warn!("PANOC failed ({:?}), falling back to the initial guess", e);
                let mut x = initial_guess.as_slice().to_vec();
                bounds.project(&mut x);
                let cost = objective(&x);
                OptimizationResult {
                    x: ControlSequence::from_vec(x),
                    converged: false,
                    iterations: 0,
                    cost,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Interval;

    fn bounds(horizon: usize) -> ControlBounds {
        ControlBounds::uniform(horizon, Interval::new(-5.0, 5.0), Interval::new(-0.8, 0.8))
    }

    #[test]
    fn test_unconstrained_minimum_inside_box() {
        let target = [1.0, 0.2, -2.0, -0.3];
        let objective = move |u: &[f64]| u.iter().zip(target.iter()).map(|(a, b)| (a - b).powi(2)).sum::<f64>();
        let mut optimizer = PanocOptimizer::default();
        let result = optimizer.minimize(&objective, &ControlSequence::zeros(2), &bounds(2), 1e-5);
        assert!(result.converged);
        for (x, t) in result.x.as_slice().iter().zip(target.iter()) {
            assert!((x - t).abs() < 1e-3);
        }
    }

    #[test]
    fn test_minimum_outside_box_is_clipped_to_bound() {
        let objective = |u: &[f64]| (u[0] - 10.0).powi(2) + (u[1] + 3.0).powi(2);
        let mut optimizer = PanocOptimizer::default();
        let b = bounds(1);
        let result = optimizer.minimize(&objective, &ControlSequence::zeros(1), &b, 1e-5);
        assert!(b.check(result.x.as_slice()).is_ok());
        assert!((result.x.as_slice()[0] - 5.0).abs() < 1e-6);
        assert!((result.x.as_slice()[1] + 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_objective_reports_non_convergence() {
        let objective = |_u: &[f64]| f64::NAN;
        let mut optimizer = PanocOptimizer::default();
        let b = bounds(3);
        let guess = ControlSequence::from_vec(vec![1.0, 0.1, 2.0, 0.2, 3.0, 0.3]);
        let result = optimizer.minimize(&objective, &guess, &b, 1e-5);
        assert!(!result.converged);
        assert_eq!(result.x, guess);
    }

    #[test]
    fn test_iteration_cap_keeps_result_in_bounds() {
        let objective = |u: &[f64]| {
            u.windows(2).map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (1.0 - w[0]).powi(2)).sum::<f64>()
        };
        let mut optimizer = PanocOptimizer::new(OptimizerSettings::default().with_max_iterations(2));
        let b = bounds(4);
        let result = optimizer.minimize(&objective, &ControlSequence::zeros(4), &b, 1e-12);
        assert!(!result.converged);
        assert!(result.iterations <= 2);
        assert!(b.check(result.x.as_slice()).is_ok());
    }

    #[test]
    fn test_cache_is_rebuilt_for_new_size() {
        let objective = |u: &[f64]| u.iter().map(|x| x * x).sum::<f64>();
        let mut optimizer = PanocOptimizer::default();
        let r1 = optimizer.minimize(&objective, &ControlSequence::zeros(2), &bounds(2), 1e-5);
        let r2 = optimizer.minimize(&objective, &ControlSequence::zeros(5), &bounds(5), 1e-5);
        assert_eq!(r1.x.len(), 4);
        assert_eq!(r2.x.len(), 10);
    }
}
