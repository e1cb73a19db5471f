// Pose tracking cost
// author: rust_mpc2d team
//
// Rolls the plant over the horizon and accumulates a weighted squared pose
// error against a fixed reference, plus control effort and control rate
// penalties.

use std::f64::consts::PI;

use nalgebra::{Vector2, Vector3};

use crate::common::{Control, CostFunction, PlantModel, Reference, State, NUM_INPUTS};
use crate::control::MpcConfig;
use crate::models::rollout;

/// Named weights for every error and effort term
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostWeights {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
    pub accel: f64,
    pub steer: f64,
    pub accel_rate: f64,
    pub steer_rate: f64,
}

impl CostWeights {
    /// Pose error only, no effort or rate terms
    pub fn pose_only() -> Self {
        CostWeights {
            x: 1.0,
            y: 1.0,
            yaw: 1.0,
            accel: 0.0,
            steer: 0.0,
            accel_rate: 0.0,
            steer_rate: 0.0,
        }
    }

    pub fn with_effort(mut self, accel: f64, steer: f64) -> Self {
        self.accel = accel;
        self.steer = steer;
        self
    }

    pub fn with_rate(mut self, accel_rate: f64, steer_rate: f64) -> Self {
        self.accel_rate = accel_rate;
        self.steer_rate = steer_rate;
        self
    }

    fn pose(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.yaw)
    }

    fn effort(&self) -> Vector2<f64> {
        Vector2::new(self.accel, self.steer)
    }

    fn rate(&self) -> Vector2<f64> {
        Vector2::new(self.accel_rate, self.steer_rate)
    }
}

impl Default for CostWeights {
    fn default() -> Self {
        Self::pose_only()
    }
}

/// Normalize angle to [-pi, pi]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// Weighted pose tracking cost over a plant rollout
#[derive(Debug, Clone)]
pub struct PoseTrackingCost<P> {
    pub plant: P,
    pub dt: f64,
    pub weights: CostWeights,
}

impl<P: PlantModel> PoseTrackingCost<P> {
    pub fn new(plant: P, dt: f64, weights: CostWeights) -> Self {
        PoseTrackingCost { plant, dt, weights }
    }

    /// Rollout step taken from the run configuration
    pub fn from_config(plant: P, config: &MpcConfig, weights: CostWeights) -> Self {
        Self::new(plant, config.dt, weights)
    }

    fn stage_cost(&self, state: &State, reference: &Reference) -> f64 {
        let error = Vector3::new(
            state.x - reference.x,
            state.y - reference.y,
            normalize_angle(state.yaw - reference.yaw),
        );
        error.component_mul(&error).dot(&self.weights.pose())
    }
}

impl<P: PlantModel> CostFunction for PoseTrackingCost<P> {
    fn evaluate(&self, u: &[f64], horizon: usize, state0: &State, reference: &Reference) -> f64 {
        let steps = horizon.min(u.len() / NUM_INPUTS);
        let controls: Vec<Vector2<f64>> = u
            .chunks_exact(NUM_INPUTS)
            .take(steps)
            .map(|c| Vector2::new(c[0], c[1]))
            .collect();

        let states = rollout(&self.plant, state0, self.dt, controls.iter().map(|&c| Control::from(c)));

        let tracking: f64 = states.iter().map(|s| self.stage_cost(s, reference)).sum();

        let effort_w = self.weights.effort();
        let effort: f64 = controls
            .iter()
            .map(|c| c.component_mul(c).dot(&effort_w))
            .sum();

        let rate_w = self.weights.rate();
        let rate: f64 = controls
            .windows(2)
            .map(|w| {
                let d = w[1] - w[0];
                d.component_mul(&d).dot(&rate_w)
            })
            .sum();

        tracking + effort + rate
    }

    fn dt(&self) -> Option<f64> {
        Some(self.dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ControlSequence;
    use crate::models::KinematicBicycle;

    fn cost(weights: CostWeights) -> PoseTrackingCost<KinematicBicycle> {
        PoseTrackingCost::new(KinematicBicycle::default(), 0.1, weights)
    }

    #[test]
    fn test_from_config_uses_run_time_step() {
        let config = MpcConfig::default().with_dt(0.05);
        let c = PoseTrackingCost::from_config(KinematicBicycle::default(), &config, CostWeights::default());
        assert_eq!(c.dt(), Some(0.05));
        assert_eq!((&c).dt(), Some(0.05));
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(2.0 * PI + 1.0) - 1.0).abs() < 1e-12);
        assert!((normalize_angle(-2.0 * PI - 1.0) + 1.0).abs() < 1e-12);
        assert!((normalize_angle(3.5) - (3.5 - 2.0 * PI)).abs() < 1e-12);
        assert!((normalize_angle(-0.5) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_cost_at_reference_when_resting() {
        let c = cost(CostWeights::default());
        let s0 = State::new(10.0, 10.0, 0.0, 0.0);
        let u = ControlSequence::zeros(20);
        let value = c.evaluate(u.as_slice(), 20, &s0, &Reference::new(10.0, 10.0, 0.0));
        assert!(value.abs() < 1e-12);
    }

    #[test]
    fn test_resting_cost_is_horizon_times_squared_distance() {
        let c = cost(CostWeights::default());
        let u = ControlSequence::zeros(5);
        let value = c.evaluate(u.as_slice(), 5, &State::origin(), &Reference::new(3.0, 4.0, 0.0));
        assert!((value - 5.0 * 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_driving_toward_reference_lowers_cost() {
        let c = cost(CostWeights::default());
        let reference = Reference::new(10.0, 0.0, 0.0);
        let idle = ControlSequence::zeros(20);
        let forward = ControlSequence::from_controls(&[Control::new(2.0, 0.0); 20]);
        let idle_cost = c.evaluate(idle.as_slice(), 20, &State::origin(), &reference);
        let forward_cost = c.evaluate(forward.as_slice(), 20, &State::origin(), &reference);
        assert!(forward_cost < idle_cost);
    }

    #[test]
    fn test_effort_and_rate_terms() {
        let reference = Reference::new(0.0, 0.0, 0.0);
        let u = ControlSequence::from_controls(&[Control::new(0.0, 0.5), Control::new(0.0, -0.5)]);

        let effort_only = CostWeights {
            x: 0.0,
            y: 0.0,
            yaw: 0.0,
            ..CostWeights::default()
        }
        .with_effort(0.0, 2.0);
        let value = cost(effort_only).evaluate(u.as_slice(), 2, &State::origin(), &reference);
        assert!((value - 2.0 * (0.25 + 0.25)).abs() < 1e-12);

        let rate_only = CostWeights {
            x: 0.0,
            y: 0.0,
            yaw: 0.0,
            ..CostWeights::default()
        }
        .with_rate(0.0, 1.0);
        let value = cost(rate_only).evaluate(u.as_slice(), 2, &State::origin(), &reference);
        assert!((value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_heading_error_wraps() {
        let c = cost(CostWeights { x: 0.0, y: 0.0, ..CostWeights::default() });
        let s0 = State::new(0.0, 0.0, PI - 0.05, 0.0);
        let u = ControlSequence::zeros(1);
        let value = c.evaluate(u.as_slice(), 1, &s0, &Reference::new(0.0, 0.0, -PI + 0.05));
        assert!((value - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_finite_at_bound_box_corners() {
        let c = cost(CostWeights::default().with_effort(0.1, 0.1).with_rate(0.1, 1.0));
        let reference = Reference::new(10.0, 2.0, PI / 2.0);
        for &a in &[-5.0, 5.0] {
            for &d in &[-0.8, 0.8] {
                let u = ControlSequence::from_controls(&[Control::new(a, d); 20]);
                assert!(c.evaluate(u.as_slice(), 20, &State::origin(), &reference).is_finite());
            }
        }
    }
}
