use crate::config::DiagnosticOptions;
use crate::error::DiagnosticError;
use crate::utils::{check_finite, flatten, is_constant, mean, sample_variance, trim_chains};
use crate::{Array1, Array2};
use arima::acf;

/// Fewest draws per chain the autocorrelation sum is defined for.
pub const MIN_ESS_DRAWS: usize = 4;

/// Autocovariance of a single chain at every lag `0..chain.len()`,
/// normalised by the chain length.
pub fn autocovariance(chain: &[f64]) -> Option<Array1> {
    acf::acf(chain, None, true).ok()
}

/// Computes the effective sample size (ESS) for one parameter across
/// all chains, correcting for autocorrelation.
///
/// Chains are trimmed from the back to match the length of the
/// shortest chain.  The effective sample size can not be estimated with
/// fewer than four draws per chain.  The estimate is undefined, and
/// `NaN` is returned, when every chain is constant or when the truncated
/// autocorrelation sum is not positive, which happens on short chains.
///
/// The estimate is capped according to `options.ess_cap`; by default it
/// is left unclamped, so anti-correlated chains can report more
/// effective draws than were taken.
///
/// See more details in Stan reference manual section
/// ["Effective Sample Size"](http://mc-stan.org/users/documentation)
///
/// # Arguments
/// * `chains` - Draws of the same parameter, one slice per chain
/// * `options` - Cap policy and constant-chain tolerance
pub fn compute_effective_sample_size(
    chains: &[&[f64]],
    options: &DiagnosticOptions,
) -> Result<f64, DiagnosticError> {
    let chains = trim_chains(chains)?;
    let num_chains = chains.len();
    let num_draws = chains[0].len();

    if num_draws < MIN_ESS_DRAWS {
        return Err(DiagnosticError::InsufficientData {
            required: MIN_ESS_DRAWS,
            found: num_draws,
        });
    }
    check_finite(&chains)?;

    if chains
        .iter()
        .all(|c| is_constant(c, options.constant_tolerance))
    {
        tracing::debug!(num_chains, num_draws, "all chains are constant; ESS is undefined");
        return Ok(f64::NAN);
    }

    let mut chain_acov: Array2 = Vec::with_capacity(num_chains);
    let mut chain_mean: Array1 = Vec::with_capacity(num_chains);
    let mut chain_var: Array1 = Vec::with_capacity(num_chains);
    for (c, chain) in chains.iter().enumerate() {
        let acov = autocovariance(chain).ok_or(DiagnosticError::Autocovariance { chain: c })?;
        chain_mean.push(mean(chain)?);
        chain_var.push(acov[0] * num_draws as f64 / (num_draws as f64 - 1.0));
        chain_acov.push(acov);
    }

    let mean_var = mean(&chain_var)?;
    let mut var_plus = mean_var * (num_draws as f64 - 1.0) / num_draws as f64;
    if num_chains > 1 {
        var_plus += sample_variance(&chain_mean)?;
    }

    // Combined autocorrelation at every lag, from the chain-averaged
    // autocovariance.  Lag 0 is 1 by definition.
    let mut rho: Array1 = (0..num_draws)
        .map(|lag| -> Result<f64, DiagnosticError> {
            let acov_lag: Array1 = chain_acov.iter().map(|acov| acov[lag]).collect();
            Ok(1.0 - (mean_var - mean(&acov_lag)?) / var_plus)
        })
        .collect::<Result<_, _>>()?;
    rho[0] = 1.0;

    // Geyer's initial positive sequence over the pairs (rho[2k], rho[2k + 1]).
    // Pairs stop before num_draws - 3 so the last even autocorrelation
    // remains as a bias term that reduces variance for antithetic chains.
    let mut kept: Array1 = vec![0.0; num_draws];
    kept[0] = rho[0];
    kept[1] = rho[1];
    let mut pair = rho[0] + rho[1];
    let mut last_even = rho[0];
    let mut lag = 2;
    while lag + 3 < num_draws && pair > 0.0 {
        last_even = rho[lag];
        pair = rho[lag] + rho[lag + 1];
        if pair >= 0.0 {
            kept[lag] = rho[lag];
            kept[lag + 1] = rho[lag + 1];
        }
        lag += 2;
    }
    if last_even > 0.0 {
        kept[lag] = last_even;
    }

    // Initial monotone sequence: pair sums may not grow with the lag.
    let mut even = 0;
    while even + 6 <= lag {
        let previous = kept[even] + kept[even + 1];
        if kept[even + 2] + kept[even + 3] > previous {
            kept[even + 2] = previous / 2.0;
            kept[even + 3] = previous / 2.0;
        }
        even += 2;
    }

    let num_total_draws = num_chains as f64 * num_draws as f64;
    let tau_hat = -1.0 + 2.0 * kept[..lag - 1].iter().sum::<f64>() + kept[lag];
    if !(tau_hat.is_finite() && tau_hat > 0.0) {
        tracing::debug!(
            num_chains,
            num_draws,
            tau_hat,
            "autocorrelation time is not positive; ESS is undefined"
        );
        return Ok(f64::NAN);
    }
    let ess = num_total_draws / tau_hat;
    tracing::trace!(num_chains, num_draws, tau_hat, ess, "effective sample size");
    Ok(options.ess_cap.apply(ess, num_total_draws))
}

/// Computes the Monte Carlo Standard Error (MCSE): the standard
/// deviation of all draws over the square root of the effective sample
/// size.  `NaN` whenever the effective sample size is undefined.
///
/// See the Stan reference manual section
/// ["Estimation of MCMC Standard Error"](https://mc-stan.org/docs/2_24/reference-manual/effective-sample-size-section.html#estimation-of-mcmc-standard-error)
pub fn compute_estimated_mcse(
    chains: &[&[f64]],
    options: &DiagnosticOptions,
) -> Result<f64, DiagnosticError> {
    let ess = compute_effective_sample_size(chains, options)?;
    let var = sample_variance(&flatten(&trim_chains(chains)?))?;
    Ok((var / ess).sqrt())
}
