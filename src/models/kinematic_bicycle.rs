// Kinematic bicycle model with linear speed drag
// author: rust_mpc2d team
//
// Forward Euler discretization. Speed is updated before heading, so the
// steering input acts through the new speed within the same step.

use crate::common::{Control, PlantModel, State};

// Vehicle parameters
const WB: f64 = 2.5; // wheelbase [m]
const DRAG: f64 = 0.4; // speed loss rate [1/s], v/25 per 0.1 s step

/// Rear-axle referenced bicycle model, state `[x, y, yaw, v]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicBicycle {
    pub wheelbase: f64,
    pub drag: f64,
}

impl KinematicBicycle {
    pub fn new(wheelbase: f64, drag: f64) -> Self {
        KinematicBicycle { wheelbase, drag }
    }

    /// Frictionless variant
    pub fn without_drag(wheelbase: f64) -> Self {
        KinematicBicycle { wheelbase, drag: 0.0 }
    }
}

impl Default for KinematicBicycle {
    fn default() -> Self {
        KinematicBicycle::new(WB, DRAG)
    }
}

impl PlantModel for KinematicBicycle {
    fn step(&self, state: &State, dt: f64, control: &Control) -> State {
        let x = state.x + state.v * state.yaw.cos() * dt;
        let y = state.y + state.v * state.yaw.sin() * dt;
        let v = state.v + (control.accel - self.drag * state.v) * dt;
        let yaw = state.yaw + v * control.steer.tan() / self.wheelbase * dt;

        State::new(x, y, yaw, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_is_deterministic() {
        let plant = KinematicBicycle::default();
        let s = State::new(1.0, 2.0, 0.3, 4.0);
        let u = Control::new(2.5, -0.6);
        let a = plant.step(&s, 0.1, &u);
        let b = plant.step(&s, 0.1, &u);
        assert_eq!(a.to_vector(), b.to_vector());
    }

    #[test]
    fn test_straight_line_motion() {
        let plant = KinematicBicycle::without_drag(2.5);
        let s = State::new(0.0, 0.0, 0.0, 2.0);
        let next = plant.step(&s, 0.1, &Control::zero());
        assert!((next.x - 0.2).abs() < 1e-12);
        assert!(next.y.abs() < 1e-12);
        assert!(next.yaw.abs() < 1e-12);
        assert!((next.v - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_drag_matches_per_step_loss() {
        let plant = KinematicBicycle::default();
        let s = State::new(0.0, 0.0, 0.0, 5.0);
        let next = plant.step(&s, 0.1, &Control::zero());
        assert!((next.v - (5.0 - 5.0 / 25.0)).abs() < 1e-12);
    }

    #[test]
    fn test_positive_steer_turns_left_when_moving_forward() {
        let plant = KinematicBicycle::default();
        let s = State::new(0.0, 0.0, 0.0, 3.0);
        let next = plant.step(&s, 0.1, &Control::new(0.0, 0.5));
        assert!(next.yaw > 0.0);

        let reversing = State::new(0.0, 0.0, 0.0, -3.0);
        let next = plant.step(&reversing, 0.1, &Control::new(0.0, 0.5));
        assert!(next.yaw < 0.0);
    }

    #[test]
    fn test_stationary_vehicle_accelerates_without_moving() {
        let plant = KinematicBicycle::default();
        let next = plant.step(&State::origin(), 0.1, &Control::new(5.0, 0.8));
        assert_eq!(next.x, 0.0);
        assert_eq!(next.y, 0.0);
        assert!((next.v - 0.5).abs() < 1e-12);
        assert!(next.yaw > 0.0);
    }

    #[test]
    fn test_finite_over_bound_box_corners() {
        let plant = KinematicBicycle::default();
        let s = State::new(3.0, -1.0, 2.0, 12.0);
        for &a in &[-5.0, 5.0] {
            for &d in &[-0.8, 0.8] {
                assert!(plant.step(&s, 0.1, &Control::new(a, d)).is_finite());
            }
        }
    }
}
