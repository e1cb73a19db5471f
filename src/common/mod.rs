//! Common types, traits, and error definitions for rust_mpc2d
//!
//! This module provides the foundational building blocks shared by the
//! plant models, cost functions, optimizers and the control loop.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
