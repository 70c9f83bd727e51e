use thiserror::Error;

/// Errors raised at the boundary of the diagnostics operations.
///
/// A zero-variance parameter is not an error: the diagnostics report it
/// as `f64::NAN` so callers can render it as undefined.
#[derive(Debug, Clone, Error)]
pub enum DiagnosticError {
    #[error("parameter index {index} is out of range (expected 0 <= index < {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("chain index {index} is out of range (expected 0 <= index < {count})")]
    ChainOutOfRange { index: usize, count: usize },

    #[error("insufficient data: at least {required} draws per chain are required, found {found}")]
    InsufficientData { required: usize, found: usize },

    #[error("draw {draw} of chain {chain} is not finite ({value})")]
    NonFiniteDraw { chain: usize, draw: usize, value: f64 },

    #[error("invalid chain layout: {0}")]
    InvalidLayout(String),

    #[error("invalid permutation for chain {chain}: {reason}")]
    InvalidPermutation { chain: usize, reason: String },

    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("could not compute the autocovariance of chain {chain}")]
    Autocovariance { chain: usize },
}
