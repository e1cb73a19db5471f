//! Error types for rust_mpc2d

use thiserror::Error;

/// Main error type for the receding-horizon simulator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MpcError {
    /// Invalid static configuration, rejected before the first tick
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A control element lies outside its declared interval
    #[error("Bounds violation: element {index} = {value} outside [{low}, {high}]")]
    BoundsViolation {
        index: usize,
        value: f64,
        low: f64,
        high: f64,
    },
    /// The optimizer returned a sequence of the wrong length
    #[error("Optimizer output error at tick {tick}: {actual} elements, expected {expected}")]
    OptimizerOutput {
        tick: usize,
        expected: usize,
        actual: usize,
    },
    /// The plant model produced a state it cannot represent (NaN, inf)
    #[error("Plant model domain error at tick {tick}: {message}")]
    PlantModelDomain { tick: usize, message: String },
    /// One or more ticks ran on a best-found, unconverged solution
    #[error("Optimization did not converge on {ticks} tick(s), first at tick {first_tick}")]
    OptimizationNonConvergence { ticks: usize, first_tick: usize },
    /// Visualization error
    #[error("Visualization error: {0}")]
    Visualization(String),
}

/// Result type alias for simulator operations
pub type MpcResult<T> = Result<T, MpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MpcError::Configuration("horizon must be positive".to_string());
        assert_eq!(format!("{}", err), "Configuration error: horizon must be positive");

        let err = MpcError::BoundsViolation { index: 3, value: 1.5, low: -0.8, high: 0.8 };
        assert_eq!(
            format!("{}", err),
            "Bounds violation: element 3 = 1.5 outside [-0.8, 0.8]"
        );
    }

    #[test]
    fn test_tick_error_display() {
        let err = MpcError::OptimizerOutput { tick: 4, expected: 40, actual: 38 };
        assert_eq!(
            format!("{}", err),
            "Optimizer output error at tick 4: 38 elements, expected 40"
        );
        let err = MpcError::OptimizationNonConvergence { ticks: 2, first_tick: 7 };
        assert_eq!(
            format!("{}", err),
            "Optimization did not converge on 2 tick(s), first at tick 7"
        );
    }
}
