//! Cost functions for the receding-horizon optimizer

pub mod pose_tracking;

pub use pose_tracking::*;
