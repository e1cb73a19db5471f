//! Utility modules for rust_mpc2d

pub mod visualization;

pub use visualization::{Visualizer, PathStyle, PointStyle, colors};
