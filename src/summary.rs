use crate::chains::ChainSet;
use crate::config::DiagnosticOptions;
use crate::error::DiagnosticError;
use crate::ess::compute_effective_sample_size;
use crate::rhat::split_potential_scale_reduction_factor;
use crate::utils::{flatten, trim_chains};
use average::{Estimate, Variance};
use std::fmt;

/// Quantiles reported when none are requested explicitly.
pub const DEFAULT_PROBS: [f64; 5] = [0.025, 0.25, 0.5, 0.75, 0.975];

/// One row of a fit summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSummary {
    pub name: String,
    pub mean: f64,
    /// Monte Carlo standard error of the mean.
    pub se_mean: f64,
    pub sd: f64,
    /// `(probability, quantile)` pairs.
    pub quantiles: Vec<(f64, f64)>,
    pub n_eff: f64,
    pub rhat: f64,
}

/// Summaries of several parameters, displayed as a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub parameters: Vec<ParameterSummary>,
}

/// Linear interpolation between order statistics of sorted draws.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Summarizes one parameter over the post-warmup draws of every chain.
pub fn summarize(
    chain_set: &ChainSet,
    parameter_index: usize,
    probs: &[f64],
    options: &DiagnosticOptions,
) -> Result<ParameterSummary, DiagnosticError> {
    if let Some(&p) = probs.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(DiagnosticError::InvalidProbability(p));
    }
    let chains = chain_set.parameter_draws(parameter_index)?;
    let n_eff = compute_effective_sample_size(&chains, options)?;
    let rhat = split_potential_scale_reduction_factor(&chains, options)?;

    let mut draws = flatten(&trim_chains(&chains)?);
    let mut moments = Variance::new();
    for &x in &draws {
        moments.add(x);
    }
    let sd = moments.sample_variance().sqrt();

    draws.sort_by(|a, b| a.total_cmp(b));
    let quantiles = probs.iter().map(|&p| (p, quantile(&draws, p))).collect();

    Ok(ParameterSummary {
        name: chain_set.names()[parameter_index].clone(),
        mean: moments.mean(),
        se_mean: sd / n_eff.sqrt(),
        sd,
        quantiles,
        n_eff,
        rhat,
    })
}

/// Summarizes every monitored quantity with the default quantiles.
pub fn summarize_all(
    chain_set: &ChainSet,
    options: &DiagnosticOptions,
) -> Result<Summary, DiagnosticError> {
    let parameters = (0..chain_set.parameter_count())
        .map(|i| summarize(chain_set, i, &DEFAULT_PROBS, options))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Summary { parameters })
}

struct Stat(f64, usize);

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = f.width().unwrap_or(0);
        if self.0.is_nan() {
            write!(f, "{:>width$}", "nan", width = width)
        } else {
            write!(f, "{:>width$.prec$}", self.0, width = width, prec = self.1)
        }
    }
}

impl fmt::Display for ParameterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<12}{:>9}{:>9}{:>9}",
            self.name,
            Stat(self.mean, 2),
            Stat(self.se_mean, 2),
            Stat(self.sd, 2)
        )?;
        for &(_, q) in &self.quantiles {
            write!(f, "{:>9}", Stat(q, 2))?;
        }
        write!(f, "{:>9}{:>9}", Stat(self.n_eff, 0), Stat(self.rhat, 2))
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<12}{:>9}{:>9}{:>9}", "", "mean", "se_mean", "sd")?;
        if let Some(first) = self.parameters.first() {
            for &(p, _) in &first.quantiles {
                write!(f, "{:>9}", format!("{}%", (p * 1000.0).round() / 10.0))?;
            }
        }
        writeln!(f, "{:>9}{:>9}", "n_eff", "Rhat")?;
        for parameter in &self.parameters {
            writeln!(f, "{}", parameter)?;
        }
        Ok(())
    }
}
