use crate::config::DiagnosticOptions;
use crate::error::DiagnosticError;
use crate::utils::{check_finite, is_constant, mean, sample_variance, split_chains, trim_chains};
use crate::Array1;

/// Computes the potential scale reduction (Rhat) for one parameter,
/// treating each slice as a separate chain.  Chains are trimmed from the
/// back to match the length of the shortest chain.
///
/// Returns `NaN` when the within-chain variance is zero.  Chains that are
/// constant within `options.constant_tolerance` contribute zero variance.
///
/// See more details in Stan reference manual section
/// ["Potential Scale Reduction"](https://mc-stan.org/docs/2_24/reference-manual/notation-for-samples-chains-and-draws.html#potential-scale-reduction).
pub fn potential_scale_reduction_factor(
    chains: &[&[f64]],
    options: &DiagnosticOptions,
) -> Result<f64, DiagnosticError> {
    let chains = trim_chains(chains)?;
    let num_draws = chains[0].len();
    if num_draws < 1 {
        return Err(DiagnosticError::InsufficientData {
            required: 1,
            found: num_draws,
        });
    }
    check_finite(&chains)?;

    let mut chain_mean: Array1 = Vec::with_capacity(chains.len());
    let mut chain_var: Array1 = Vec::with_capacity(chains.len());
    for chain in chains.iter() {
        chain_mean.push(mean(chain)?);
        chain_var.push(if is_constant(chain, options.constant_tolerance) {
            0.0
        } else {
            sample_variance(chain)?
        });
    }

    let n = num_draws as f64;
    let var_between = n * sample_variance(&chain_mean)?;
    let var_within = mean(&chain_var)?;
    if var_within == 0.0 {
        tracing::debug!(
            num_chains = chains.len(),
            num_draws,
            "within-chain variance is zero; Rhat is undefined"
        );
        return Ok(f64::NAN);
    }
    let var_hat = (n - 1.0) / n * var_within + var_between / n;
    Ok((var_hat / var_within).sqrt())
}

/// Computes the split potential scale reduction (split Rhat) for one
/// parameter.  Each chain is cut into a first and second half and the
/// halves are compared as independent chains, which also exposes drift
/// within a single chain.
///
/// Chains are trimmed from the back to match the length of the shortest
/// chain.  When that length is odd the last draw of every chain is
/// dropped before splitting.  At least two draws per chain are required.
///
/// See more details in Stan reference manual section
/// ["Potential Scale Reduction"](https://mc-stan.org/docs/2_24/reference-manual/notation-for-samples-chains-and-draws.html#potential-scale-reduction)
pub fn split_potential_scale_reduction_factor(
    chains: &[&[f64]],
    options: &DiagnosticOptions,
) -> Result<f64, DiagnosticError> {
    let trimmed = trim_chains(chains)?;
    check_finite(&trimmed)?;
    let split = split_chains(&trimmed)?;
    potential_scale_reduction_factor(&split, options)
}
