//! Static configuration of a closed-loop run

use std::f64::consts::PI;

use crate::common::{ControlBounds, Interval, MpcError, MpcResult, Reference, State, NUM_INPUTS};

// Reference scenario
const HORIZON: usize = 20; // prediction horizon
const DT: f64 = 0.1; // time tick [s]
const SIM_TOTAL: usize = 250; // number of ticks
const SWITCH_TICK: usize = 130; // last tick tracking the first reference
const TOLERANCE: f64 = 1e-5;

// Actuator limits
const MAX_ACCEL: f64 = 5.0; // [m/ss]
const MAX_STEER: f64 = 0.8; // [rad]

/// Everything the loop needs before the first tick
#[derive(Debug, Clone, PartialEq)]
pub struct MpcConfig {
    pub horizon: usize,
    pub dt: f64,
    pub total_ticks: usize,
    pub switch_tick: usize,
    pub first_reference: Reference,
    pub second_reference: Reference,
    /// One interval per element of the flattened control sequence
    pub bounds: ControlBounds,
    pub tolerance: f64,
    pub initial_state: State,
}

impl MpcConfig {
    pub fn default_bounds(horizon: usize) -> ControlBounds {
        ControlBounds::uniform(
            horizon,
            Interval::new(-MAX_ACCEL, MAX_ACCEL),
            Interval::new(-MAX_STEER, MAX_STEER),
        )
    }

    /// Sets the horizon and rebuilds the default actuator bounds for it
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self.bounds = Self::default_bounds(horizon);
        self
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_total_ticks(mut self, total_ticks: usize) -> Self {
        self.total_ticks = total_ticks;
        self
    }

    pub fn with_switch_tick(mut self, switch_tick: usize) -> Self {
        self.switch_tick = switch_tick;
        self
    }

    pub fn with_references(mut self, first: Reference, second: Reference) -> Self {
        self.first_reference = first;
        self.second_reference = second;
        self
    }

    pub fn with_bounds(mut self, bounds: ControlBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Same (accel, steer) limits for every step of the current horizon
    pub fn with_uniform_bounds(mut self, accel: Interval, steer: Interval) -> Self {
        self.bounds = ControlBounds::uniform(self.horizon, accel, steer);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_initial_state(mut self, state: State) -> Self {
        self.initial_state = state;
        self
    }

    pub fn schedule(&self) -> ReferenceSchedule {
        ReferenceSchedule::new(self.first_reference, self.second_reference, self.switch_tick)
    }

    /// Rejects configurations the loop cannot run
    pub fn validate(&self) -> MpcResult<()> {
        if self.horizon == 0 {
            return Err(MpcError::Configuration("horizon must be positive".to_string()));
        }
        if self.total_ticks == 0 {
            return Err(MpcError::Configuration("total_ticks must be positive".to_string()));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(MpcError::Configuration(format!("dt must be positive, got {}", self.dt)));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(MpcError::Configuration(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        let expected = self.horizon * NUM_INPUTS;
        if self.bounds.len() != expected {
            return Err(MpcError::Configuration(format!(
                "expected {} bound intervals for horizon {}, got {}",
                expected,
                self.horizon,
                self.bounds.len()
            )));
        }
        if let Some(index) = self.bounds.intervals().iter().position(|b| !b.is_valid()) {
            let b = self.bounds.intervals()[index];
            return Err(MpcError::Configuration(format!(
                "bound interval {} is invalid: [{}, {}]",
                index, b.low, b.high
            )));
        }
        if !self.initial_state.is_finite() {
            return Err(MpcError::Configuration(format!(
                "initial state is not finite: {:?}",
                self.initial_state
            )));
        }
        let references = [self.first_reference, self.second_reference];
        if references.iter().any(|r| !r.to_vector().iter().all(|c| c.is_finite())) {
            return Err(MpcError::Configuration("references must be finite".to_string()));
        }
        Ok(())
    }
}

impl Default for MpcConfig {
    fn default() -> Self {
        MpcConfig {
            horizon: HORIZON,
            dt: DT,
            total_ticks: SIM_TOTAL,
            switch_tick: SWITCH_TICK,
            first_reference: Reference::new(10.0, 10.0, 0.0),
            second_reference: Reference::new(10.0, 2.0, PI / 2.0),
            bounds: Self::default_bounds(HORIZON),
            tolerance: TOLERANCE,
            initial_state: State::origin(),
        }
    }
}

/// One-time step change between two reference poses
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceSchedule {
    pub first: Reference,
    pub second: Reference,
    pub switch_tick: usize,
}

impl ReferenceSchedule {
    pub fn new(first: Reference, second: Reference, switch_tick: usize) -> Self {
        ReferenceSchedule { first, second, switch_tick }
    }

    /// Ticks up to and including `switch_tick` track the first reference
    pub fn reference_for(&self, tick: usize) -> Reference {
        if tick > self.switch_tick {
            self.second
        } else {
            self.first
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_reference_scenario() {
        let config = MpcConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.horizon, 20);
        assert_eq!(config.bounds.len(), 40);
        assert_eq!(config.total_ticks, 250);
        assert_eq!(config.switch_tick, 130);
        assert_eq!(config.initial_state, State::origin());
        assert_eq!(config.tolerance, 1e-5);
    }

    #[test]
    fn test_rejects_zero_horizon() {
        let config = MpcConfig::default().with_horizon(0);
        assert!(matches!(config.validate(), Err(MpcError::Configuration(_))));
    }

    #[test]
    fn test_rejects_mismatched_bounds() {
        let config = MpcConfig::default().with_bounds(MpcConfig::default_bounds(19));
        assert!(matches!(config.validate(), Err(MpcError::Configuration(_))));
    }

    #[test]
    fn test_rejects_non_positive_dt() {
        for dt in [0.0, -0.1, f64::NAN] {
            let config = MpcConfig::default().with_dt(dt);
            assert!(matches!(config.validate(), Err(MpcError::Configuration(_))));
        }
    }

    #[test]
    fn test_rejects_inverted_interval() {
        let config = MpcConfig::default()
            .with_uniform_bounds(Interval::new(5.0, -5.0), Interval::new(-0.8, 0.8));
        assert!(matches!(config.validate(), Err(MpcError::Configuration(_))));
    }

    #[test]
    fn test_rejects_non_finite_initial_state() {
        let config = MpcConfig::default().with_initial_state(State::new(f64::NAN, 0.0, 0.0, 0.0));
        assert!(matches!(config.validate(), Err(MpcError::Configuration(_))));
    }

    #[test]
    fn test_with_horizon_rebuilds_bounds() {
        let config = MpcConfig::default().with_horizon(7);
        assert_eq!(config.bounds.len(), 14);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reference_schedule_switches_once() {
        let schedule = MpcConfig::default().schedule();
        let first = Reference::new(10.0, 10.0, 0.0);
        let second = Reference::new(10.0, 2.0, PI / 2.0);
        for tick in 1..=130 {
            assert_eq!(schedule.reference_for(tick), first);
        }
        for tick in 131..=250 {
            assert_eq!(schedule.reference_for(tick), second);
        }
    }
}
