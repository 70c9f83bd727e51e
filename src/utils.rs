use crate::error::DiagnosticError;
use crate::{Array1, Array2};
use anyhow::{anyhow, Context};
use average::{Estimate, Mean, Variance};
use std::path::Path;

/// Compute the arithmetic mean of an array.
pub fn mean(arr: &[f64]) -> Result<f64, DiagnosticError> {
    if arr.is_empty() {
        return Err(DiagnosticError::InsufficientData {
            required: 1,
            found: 0,
        });
    }
    let mut m = Mean::new();
    for &x in arr {
        m.add(x);
    }
    Ok(m.mean())
}

/// Compute the sample variance of an array using Bessel's correction.
/// A single value has no sample variance and yields `NaN`.
pub fn sample_variance(arr: &[f64]) -> Result<f64, DiagnosticError> {
    if arr.is_empty() {
        return Err(DiagnosticError::InsufficientData {
            required: 1,
            found: 0,
        });
    }
    if arr.len() == 1 {
        return Ok(f64::NAN);
    }
    let mut v = Variance::new();
    for &x in arr {
        v.add(x);
    }
    Ok(v.sample_variance())
}

/// Length of the shortest chain.  Fails when there are no chains at all.
pub fn shortest_chain_len(chains: &[&[f64]]) -> Result<usize, DiagnosticError> {
    chains
        .iter()
        .map(|c| c.len())
        .min()
        .ok_or(DiagnosticError::InsufficientData {
            required: 1,
            found: 0,
        })
}

/// Trims every chain from the back to the length of the shortest one.
pub fn trim_chains<'a>(chains: &[&'a [f64]]) -> Result<Vec<&'a [f64]>, DiagnosticError> {
    let num_draws = shortest_chain_len(chains)?;
    if chains.iter().any(|c| c.len() != num_draws) {
        tracing::warn!(
            num_draws,
            num_chains = chains.len(),
            "chains have unequal lengths; trimming to the shortest chain"
        );
    }
    Ok(chains.iter().map(|c| &c[..num_draws]).collect())
}

/// Fails on the first NaN or infinite draw.
pub fn check_finite(chains: &[&[f64]]) -> Result<(), DiagnosticError> {
    for (chain, draws) in chains.iter().enumerate() {
        if let Some((draw, &value)) = draws.iter().enumerate().find(|(_, x)| !x.is_finite()) {
            return Err(DiagnosticError::NonFiniteDraw { chain, draw, value });
        }
    }
    Ok(())
}

/// Whether every draw equals the chain's first draw, up to a relative
/// `tolerance`.  A tolerance of zero asks for exact equality, so draws
/// varying on any scale never count as constant.
pub fn is_constant(chain: &[f64], tolerance: f64) -> bool {
    match chain.first() {
        Some(&first) => chain
            .iter()
            .all(|&x| relative_eq!(x, first, epsilon = 0.0, max_relative = tolerance)),
        None => true,
    }
}

/// Splits each chain into two chains of equal length.  Chains are
/// trimmed to the shortest chain and then to the largest even length by
/// dropping their last draw, so `[1, 2, 3, 4, 5]` becomes `[1, 2]` and
/// `[3, 4]`.
pub fn split_chains<'a>(chains: &[&'a [f64]]) -> Result<Vec<&'a [f64]>, DiagnosticError> {
    let num_draws = shortest_chain_len(chains)?;
    if num_draws < 2 {
        return Err(DiagnosticError::InsufficientData {
            required: 2,
            found: num_draws,
        });
    }
    let half = num_draws / 2;
    let mut split_draws = Vec::with_capacity(2 * chains.len());
    for chain in chains {
        split_draws.push(&chain[..half]);
        split_draws.push(&chain[half..2 * half]);
    }
    Ok(split_draws)
}

/// Concatenates chains into a single array.
pub fn flatten(chains: &[&[f64]]) -> Array1 {
    chains.iter().flat_map(|c| c.iter().copied()).collect()
}

/// Reads a Stan-style CSV file: lines starting with `#` are comments, the
/// first remaining line holds the column names and every following line
/// one iteration.  Returns the names and one array per column.
pub fn read_csv(path: &Path) -> anyhow::Result<(Vec<String>, Array2)> {
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let names: Vec<String> = reader
        .headers()
        .with_context(|| format!("{}: reading header", path.display()))?
        .iter()
        .map(String::from)
        .collect();
    if names.is_empty() || names.iter().all(|n| n.is_empty()) {
        return Err(anyhow!("{}: no header line", path.display()));
    }

    let mut columns: Array2 = vec![Vec::new(); names.len()];
    for record in reader.records() {
        // ragged rows are rejected by the reader itself
        let record = record.with_context(|| format!("reading {}", path.display()))?;
        let line = record.position().map_or(0, |p| p.line());
        for (idx, (column, value)) in columns.iter_mut().zip(record.iter()).enumerate() {
            let value = value.parse::<f64>().with_context(|| {
                format!("{}:{}: column {}", path.display(), line, idx + 1)
            })?;
            column.push(value);
        }
    }
    Ok((names, columns))
}
