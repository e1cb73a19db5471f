// Receding-horizon control loop
// author: rust_mpc2d team
//
// Every tick re-plans a full control sequence from the current applied
// state, applies only its first pair, and keeps the rest of the plan solely
// as a displayed prediction and as the next tick's warm start.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::common::{
    ControlOptimizer, ControlSequence, CostFunction, MpcError, MpcResult, PlantModel,
    PredictedTrajectory, State,
};
use crate::control::{History, HistoryEntry, MpcConfig, ReferenceSchedule, SolveReport};
use crate::models::rollout;

/// Cooperative cancellation flag, checked once per tick boundary
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Completed,
    /// Stopped on request before `at_tick` started
    Cancelled { at_tick: usize },
    /// Fatal error during `tick`; the history ends at the previous tick
    Aborted { tick: usize, error: MpcError },
}

/// Run-level aggregate of per-tick diagnostics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub ticks_completed: usize,
    pub non_converged_ticks: usize,
    pub first_non_converged_tick: Option<usize>,
    pub total_iterations: usize,
    pub total_solve_time: Duration,
}

impl RunSummary {
    fn record(&mut self, entry: &HistoryEntry) {
        self.ticks_completed += 1;
        if let Some(solve) = entry.solve {
            self.total_iterations += solve.iterations;
            self.total_solve_time += solve.duration;
            if !solve.converged {
                self.non_converged_ticks += 1;
                self.first_non_converged_tick.get_or_insert(entry.tick);
            }
        }
    }
}

/// Result of a closed-loop run: always carries the history recorded so far
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRun {
    pub history: History,
    pub status: RunStatus,
    pub summary: RunSummary,
}

impl SimulationRun {
    /// False when the run was cancelled or aborted
    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn error(&self) -> Option<&MpcError> {
        match &self.status {
            RunStatus::Aborted { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Turns absorbed non-convergence into an error for strict callers
    pub fn require_converged(&self) -> MpcResult<()> {
        match self.summary.first_non_converged_tick {
            Some(first_tick) => Err(MpcError::OptimizationNonConvergence {
                ticks: self.summary.non_converged_ticks,
                first_tick,
            }),
            None => Ok(()),
        }
    }
}

/// Output of a single tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub entry: HistoryEntry,
    /// Full optimized sequence, the next tick's warm start source
    pub solution: ControlSequence,
}

/// Closed-loop MPC simulator over a plant, a cost and an optimizer
pub struct RecedingHorizonLoop<P, C, O> {
    config: MpcConfig,
    schedule: ReferenceSchedule,
    plant: P,
    cost: C,
    optimizer: O,
    cancel: Option<CancelToken>,
}

impl<P, C, O> RecedingHorizonLoop<P, C, O>
where
    P: PlantModel,
    C: CostFunction,
    O: ControlOptimizer,
{
    /// Validates the configuration, the cost's time step and the zero
    /// initial guess against the bounds
    pub fn new(config: MpcConfig, plant: P, cost: C, optimizer: O) -> MpcResult<Self> {
        config.validate()?;
        if let Some(cost_dt) = cost.dt() {
            if cost_dt != config.dt {
                return Err(MpcError::Configuration(format!(
                    "cost function rolls out with dt {}, run uses dt {}",
                    cost_dt, config.dt
                )));
            }
        }
        config.bounds.check(ControlSequence::zeros(config.horizon).as_slice())?;

        let schedule = config.schedule();
        Ok(RecedingHorizonLoop {
            config,
            schedule,
            plant,
            cost,
            optimizer,
            cancel: None,
        })
    }

    pub fn with_cancellation(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, |c| c.is_cancelled())
    }

    pub fn run(&mut self) -> SimulationRun {
        self.run_with(|_| {})
    }

    /// Runs all ticks, handing every recorded entry (seed first) to `observer`
    pub fn run_with<F>(&mut self, mut observer: F) -> SimulationRun
    where
        F: FnMut(&HistoryEntry),
    {
        let total = self.config.total_ticks;
        let seed = HistoryEntry::seed(self.config.initial_state, self.schedule.reference_for(0));
        let mut history = History::new(seed);
        observer(history.last());

        let mut state = self.config.initial_state;
        let mut solution = ControlSequence::zeros(self.config.horizon);
        let mut summary = RunSummary::default();
        let mut status = RunStatus::Completed;

        info!(
            "MPC start: {} ticks, horizon {}, dt {}",
            total, self.config.horizon, self.config.dt
        );

        for tick in 1..=total {
            if self.is_cancelled() {
                warn!("run cancelled before tick {}", tick);
                status = RunStatus::Cancelled { at_tick: tick };
                break;
            }
            if tick == self.schedule.switch_tick + 1 {
                info!("tick {}: switching reference to {:?}", tick, self.schedule.second);
            }

            match self.advance(tick, &state, solution.clone()) {
                Ok(outcome) => {
                    state = outcome.entry.state;
                    solution = outcome.solution;
                    summary.record(&outcome.entry);
                    history.push(outcome.entry);
                    observer(history.last());
                }
                Err(error) => {
                    warn!("run aborted at tick {}: {}", tick, error);
                    status = RunStatus::Aborted { tick, error };
                    break;
                }
            }
        }

        info!(
            "MPC finished: {} of {} ticks, {} unconverged, solve time {:.3} s",
            summary.ticks_completed,
            total,
            summary.non_converged_ticks,
            summary.total_solve_time.as_secs_f64()
        );

        SimulationRun { history, status, summary }
    }

    /// One tick: warm start, optimize, apply the first pair, roll the prediction.
    pub fn advance(
        &mut self,
        tick: usize,
        state: &State,
        previous: ControlSequence,
    ) -> MpcResult<TickOutcome> {
        let horizon = self.config.horizon;
        let dt = self.config.dt;
        let reference = self.schedule.reference_for(tick);

        let guess = previous.shifted();

        let cost = &self.cost;
        let objective = |u: &[f64]| cost.evaluate(u, horizon, state, &reference);
        let started = Instant::now();
        let result = self
            .optimizer
            .minimize(&objective, &guess, &self.config.bounds, self.config.tolerance);
        let duration = started.elapsed();

        info!(
            "Step {} of {}   Time {:.5}",
            tick,
            self.config.total_ticks,
            duration.as_secs_f64()
        );

        if result.x.len() != guess.len() {
            return Err(MpcError::OptimizerOutput {
                tick,
                expected: guess.len(),
                actual: result.x.len(),
            });
        }
        self.config.bounds.check(result.x.as_slice())?;
        if !result.converged {
            warn!(
                "tick {}: no convergence after {} iterations, applying best-found controls",
                tick, result.iterations
            );
        }

        let control = result.x.first();
        let next = self.plant.step(state, dt, &control);
        if !next.is_finite() {
            return Err(MpcError::PlantModelDomain {
                tick,
                message: format!("non-finite state {:?} from {:?} under {:?}", next, state, control),
            });
        }

        let mut predicted = Vec::with_capacity(horizon);
        predicted.push(next);
        predicted.extend(rollout(&self.plant, &next, dt, result.x.controls().skip(1)));
        if let Some(step) = predicted.iter().position(|s| !s.is_finite()) {
            return Err(MpcError::PlantModelDomain {
                tick,
                message: format!("prediction step {} is not finite", step),
            });
        }
        debug!("tick {}: applied {:?}, state {:?}", tick, control, next);

        let entry = HistoryEntry {
            tick,
            state: next,
            control,
            reference,
            prediction: PredictedTrajectory::new(predicted),
            solve: Some(SolveReport {
                converged: result.converged,
                iterations: result.iterations,
                cost: result.cost,
                duration,
            }),
        };

        Ok(TickOutcome {
            entry,
            solution: result.x,
        })
    }
}
