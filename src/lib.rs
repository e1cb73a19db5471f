//! rust_mpc2d - receding-horizon model predictive control for a 2D vehicle
//!
//! This crate drives a kinematic vehicle toward a reference pose by solving
//! a bounded nonlinear program at every tick and applying only the first
//! control of the optimized sequence.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod models;
pub mod cost;
pub mod optimizer;
pub mod control;

// Re-export common types for convenience
pub use common::{Control, ControlBounds, ControlSequence, Interval, Point2D, Pose2D, PredictedTrajectory, Reference, State};
pub use common::{ControlOptimizer, CostFunction, PlantModel};
pub use common::{MpcError, MpcResult};
pub use control::{History, HistoryEntry, MpcConfig, RecedingHorizonLoop, RunStatus, SimulationRun};
