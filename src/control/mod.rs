//! Closed-loop receding-horizon control
//!
//! Configuration, the tick loop itself, the history it records and a
//! parallel runner for independent simulations.

pub mod config;
pub mod history;
pub mod receding_horizon;
pub mod batch;

pub use config::*;
pub use history::*;
pub use receding_horizon::*;
pub use batch::*;
