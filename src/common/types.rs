//! Common types used throughout rust_mpc2d

use nalgebra::{Vector2, Vector3, Vector4};

use crate::common::error::{MpcError, MpcResult};

/// Number of control inputs per horizon step (accel, steer)
pub const NUM_INPUTS: usize = 2;

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

/// 2D pose (position + orientation)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.yaw)
    }
}

impl From<Vector3<f64>> for Pose2D {
    fn from(v: Vector3<f64>) -> Self {
        Self { x: v[0], y: v[1], yaw: v[2] }
    }
}

/// Target pose the controller drives toward
pub type Reference = Pose2D;

/// Vehicle state: position, heading and longitudinal speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
    pub v: f64,
}

impl State {
    pub fn new(x: f64, y: f64, yaw: f64, v: f64) -> Self {
        Self { x, y, yaw, v }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0, v: 0.0 }
    }

    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.yaw)
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    pub fn to_vector(&self) -> Vector4<f64> {
        Vector4::new(self.x, self.y, self.yaw, self.v)
    }

    pub fn is_finite(&self) -> bool {
        self.to_vector().iter().all(|c| c.is_finite())
    }
}

impl From<Vector4<f64>> for State {
    fn from(v: Vector4<f64>) -> Self {
        Self { x: v[0], y: v[1], yaw: v[2], v: v[3] }
    }
}

/// Control input for the vehicle: throttle/brake and steering angle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Control {
    pub accel: f64,  // [m/s^2], negative is reverse
    pub steer: f64,  // [rad]
}

impl Control {
    pub fn new(accel: f64, steer: f64) -> Self {
        Self { accel, steer }
    }

    pub fn zero() -> Self {
        Self { accel: 0.0, steer: 0.0 }
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.accel, self.steer)
    }
}

impl From<Vector2<f64>> for Control {
    fn from(v: Vector2<f64>) -> Self {
        Self { accel: v[0], steer: v[1] }
    }
}

/// Closed interval `[low, high]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub low: f64,
    pub high: f64,
}

impl Interval {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.low).min(self.high)
    }

    pub fn is_valid(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low <= self.high
    }
}

impl From<(f64, f64)> for Interval {
    fn from(tuple: (f64, f64)) -> Self {
        Self { low: tuple.0, high: tuple.1 }
    }
}

/// Per-element bound box over a flattened control sequence
#[derive(Debug, Clone, PartialEq)]
pub struct ControlBounds {
    intervals: Vec<Interval>,
}

impl ControlBounds {
    pub fn new(intervals: Vec<Interval>) -> Self {
        Self { intervals }
    }

    /// Same (accel, steer) limits repeated for every horizon step
    pub fn uniform(horizon: usize, accel: Interval, steer: Interval) -> Self {
        let intervals = (0..horizon).flat_map(|_| [accel, steer]).collect();
        Self { intervals }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn lower(&self) -> Vec<f64> {
        self.intervals.iter().map(|b| b.low).collect()
    }

    pub fn upper(&self) -> Vec<f64> {
        self.intervals.iter().map(|b| b.high).collect()
    }

    /// Reports the first element of `u` outside its interval
    pub fn check(&self, u: &[f64]) -> MpcResult<()> {
        for (index, (value, bound)) in u.iter().zip(self.intervals.iter()).enumerate() {
            if !bound.contains(*value) {
                return Err(MpcError::BoundsViolation {
                    index,
                    value: *value,
                    low: bound.low,
                    high: bound.high,
                });
            }
        }
        Ok(())
    }

    /// Clamp every element of `u` into its interval
    pub fn project(&self, u: &mut [f64]) {
        for (value, bound) in u.iter_mut().zip(self.intervals.iter()) {
            *value = bound.clamp(*value);
        }
    }
}

/// Flattened `[accel_0, steer_0, accel_1, steer_1, ...]` decision vector
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSequence(Vec<f64>);

impl ControlSequence {
    pub fn zeros(horizon: usize) -> Self {
        Self(vec![0.0; horizon * NUM_INPUTS])
    }

    /// Panics if `values` does not hold whole (accel, steer) pairs
    pub fn from_vec(values: Vec<f64>) -> Self {
        assert_eq!(values.len() % NUM_INPUTS, 0, "control sequence must hold whole pairs");
        Self(values)
    }

    pub fn from_controls(controls: &[Control]) -> Self {
        Self(controls.iter().flat_map(|c| [c.accel, c.steer]).collect())
    }

    pub fn horizon(&self) -> usize {
        self.0.len() / NUM_INPUTS
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn control(&self, step: usize) -> Control {
        Control::new(self.0[NUM_INPUTS * step], self.0[NUM_INPUTS * step + 1])
    }

    pub fn first(&self) -> Control {
        self.control(0)
    }

    pub fn controls(&self) -> impl Iterator<Item = Control> + '_ {
        self.0.chunks_exact(NUM_INPUTS).map(|c| Control::new(c[0], c[1]))
    }

    /// Warm start for the next tick: drop the first pair, hold the last one.
    pub fn shifted(self) -> Self {
        let mut values = self.0;
        if values.len() <= NUM_INPUTS {
            // horizon 1: nothing to shift, the only pair is held
            return Self(values);
        }
        values.drain(..NUM_INPUTS);
        let n = values.len();
        let hold = [values[n - 2], values[n - 1]];
        values.extend_from_slice(&hold);
        Self(values)
    }
}

/// Predicted states over the horizon, for display only
#[derive(Debug, Clone, PartialEq)]
pub struct PredictedTrajectory {
    pub states: Vec<State>,
}

impl PredictedTrajectory {
    pub fn new(states: Vec<State>) -> Self {
        Self { states }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.states.iter().map(|s| s.y).collect()
    }
}
