//! Convergence diagnostics for the output of an MCMC sampler: effective
//! sample size (ESS) and split potential scale reduction (split R hat),
//! computed per parameter over the chains stored in a [`ChainSet`].
//!
//! ```
//! use mcmc_chains::{effective_sample_size, split_potential_scale_reduction, ChainSet};
//!
//! // two chains of one parameter, 100 draws each
//! let chains: Vec<Vec<Vec<f64>>> = (0..2)
//!     .map(|c| vec![(0..100).map(|i| ((i * i) as f64 * 0.7 + c as f64).sin()).collect()])
//!     .collect();
//! let set = ChainSet::from_draws(vec!["theta"], chains).unwrap();
//! let theta = set.parameter_index("theta").unwrap();
//! let ess = effective_sample_size(&set, theta).unwrap();
//! let rhat = split_potential_scale_reduction(&set, theta).unwrap();
//! assert!(ess > 0.0 && rhat > 0.0);
//! ```
//!
//! Both diagnostics are pure functions of a borrowed `ChainSet`.  Invalid
//! input is reported through [`DiagnosticError`]; a parameter with zero
//! variance is not an error and yields `f64::NAN`.
//!
//! Diagnostic events are emitted through `tracing`; install a subscriber
//! (globally, or scoped with `tracing::subscriber::with_default`) to
//! receive them.
#[macro_use]
extern crate approx;

/// Per-chain, per-parameter draw storage
pub mod chains;
/// Options shared by the diagnostics
pub mod config;
/// Error type of the diagnostics
pub mod error;
/// Effective Sample Size (ESS) and Monte Carlo standard error
pub mod ess;
/// Gelman-Rubin potential scale reduction (Rhat), plain and split
pub mod rhat;
/// Fit summaries combining the diagnostics with basic statistics
pub mod summary;
/// Summary statistics, chain splitting and CSV reading shared by the
/// other modules
pub mod utils;

pub use chains::ChainSet;
pub use config::{DiagnosticOptions, EssCap};
pub use error::DiagnosticError;

/// One-dimensional vector of numeric values
pub type Array1 = Vec<f64>;
/// Two dimensional vector of vectors of numeric values
pub type Array2 = Vec<Array1>;

/// Effective sample size of parameter `parameter_index` across all chains
/// of `chain_set`, with default options.
///
/// Fails with [`DiagnosticError::IndexOutOfRange`] when the index is not
/// below `chain_set.parameter_count()`.  Returns `NaN` when every chain is
/// constant or the estimated autocorrelation time is not positive.
/// See [`ess::compute_effective_sample_size`].
pub fn effective_sample_size(
    chain_set: &ChainSet,
    parameter_index: usize,
) -> Result<f64, DiagnosticError> {
    effective_sample_size_with(chain_set, parameter_index, &DiagnosticOptions::default())
}

/// [`effective_sample_size`] with explicit options.
pub fn effective_sample_size_with(
    chain_set: &ChainSet,
    parameter_index: usize,
    options: &DiagnosticOptions,
) -> Result<f64, DiagnosticError> {
    let chains = chain_set.parameter_draws(parameter_index)?;
    ess::compute_effective_sample_size(&chains, options)
}

/// Split potential scale reduction of parameter `parameter_index` across
/// all chains of `chain_set`, with default options.
///
/// Fails with [`DiagnosticError::IndexOutOfRange`] for a bad index and
/// with [`DiagnosticError::InsufficientData`] when a chain holds fewer
/// than two post-warmup draws.  Returns `NaN` when every half-chain is
/// constant.  See [`rhat::split_potential_scale_reduction_factor`].
pub fn split_potential_scale_reduction(
    chain_set: &ChainSet,
    parameter_index: usize,
) -> Result<f64, DiagnosticError> {
    split_potential_scale_reduction_with(chain_set, parameter_index, &DiagnosticOptions::default())
}

/// [`split_potential_scale_reduction`] with explicit options.
pub fn split_potential_scale_reduction_with(
    chain_set: &ChainSet,
    parameter_index: usize,
    options: &DiagnosticOptions,
) -> Result<f64, DiagnosticError> {
    let chains = chain_set.parameter_draws(parameter_index)?;
    rhat::split_potential_scale_reduction_factor(&chains, options)
}
