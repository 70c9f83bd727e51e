use crate::error::DiagnosticError;
use crate::utils::read_csv;
use crate::{Array1, Array2};
use anyhow::{anyhow, Context};
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;

/// Every saved iteration of one chain, one column per parameter.  The
/// first `warmup` iterations of each column are warmup draws.
#[derive(Debug, Clone, PartialEq)]
struct Chain {
    warmup: usize,
    samples: Array2,
}

impl Chain {
    fn len(&self) -> usize {
        self.samples.first().map_or(0, |s| s.len())
    }

    fn kept(&self, parameter: usize) -> &[f64] {
        &self.samples[parameter][self.warmup..]
    }
}

/// Draws of a completed sampling run: for each chain, the saved
/// iterations of every monitored quantity (parameters, derived
/// quantities and sampler quantities such as `lp__`).
///
/// Diagnostics only ever borrow a `ChainSet`, so one set can be shared
/// across threads for concurrent reads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChainSet {
    names: Vec<String>,
    chains: Vec<Chain>,
    permutation: Option<Vec<Vec<usize>>>,
}

impl ChainSet {
    /// Creates an empty set monitoring the given flat parameter names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ChainSet {
            names: names.into_iter().map(Into::into).collect(),
            chains: Vec::new(),
            permutation: None,
        }
    }

    /// Builds a set from chains that hold post-warmup draws only.
    pub fn from_draws<I, S>(names: I, chains: Vec<Array2>) -> Result<Self, DiagnosticError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = ChainSet::new(names);
        for samples in chains {
            set.push_chain(0, samples)?;
        }
        Ok(set)
    }

    /// Loads one chain per Stan CSV file.  Every file must carry the same
    /// header; the first `warmup` rows of each file are warmup draws.
    pub fn read_stan_csv<P: AsRef<Path>>(paths: &[P], warmup: usize) -> anyhow::Result<Self> {
        let mut set: Option<ChainSet> = None;
        for path in paths {
            let path = path.as_ref();
            let (names, columns) = read_csv(path)?;
            let set = set.get_or_insert_with(|| ChainSet::new(names.iter().cloned()));
            if set.names != names {
                return Err(anyhow!(
                    "{}: header does not match the first chain",
                    path.display()
                ));
            }
            set.push_chain(warmup, columns)
                .with_context(|| format!("adding chain from {}", path.display()))?;
        }
        set.ok_or_else(|| anyhow!("no chain files given"))
    }

    /// Appends a chain.  `samples` holds one column per parameter, all of
    /// the same length, whose first `warmup` entries are warmup draws.
    /// Any permutation set earlier is cleared.
    pub fn push_chain(&mut self, warmup: usize, samples: Array2) -> Result<(), DiagnosticError> {
        if samples.len() != self.names.len() {
            return Err(DiagnosticError::InvalidLayout(format!(
                "chain {} has {} columns but {} parameters are monitored",
                self.chains.len(),
                samples.len(),
                self.names.len()
            )));
        }
        let len = samples.first().map_or(0, |s| s.len());
        if let Some((p, column)) = samples.iter().enumerate().find(|(_, s)| s.len() != len) {
            return Err(DiagnosticError::InvalidLayout(format!(
                "chain {}: column {} ({}) has {} draws, expected {}",
                self.chains.len(),
                p,
                self.names[p],
                column.len(),
                len
            )));
        }
        if warmup > len {
            return Err(DiagnosticError::InvalidLayout(format!(
                "chain {}: warmup of {} exceeds the {} saved draws",
                self.chains.len(),
                warmup,
                len
            )));
        }
        self.chains.push(Chain { warmup, samples });
        self.permutation = None;
        Ok(())
    }

    pub fn n_chains(&self) -> usize {
        self.chains.len()
    }

    pub fn parameter_count(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Index of the parameter called `name`, if it is monitored.
    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Post-warmup draw count shared by all chains, i.e. the length of
    /// the shortest chain.  Zero for an empty set.
    pub fn n_samples_per_chain(&self) -> usize {
        (0..self.chains.len())
            .map(|c| self.kept_len(c))
            .min()
            .unwrap_or(0)
    }

    /// Number of warmup draws stored for `chain`.
    pub fn warmup(&self, chain: usize) -> Result<usize, DiagnosticError> {
        Ok(self.chain(chain)?.warmup)
    }

    /// Post-warmup draws of one parameter in one chain.
    pub fn draws(&self, parameter: usize, chain: usize) -> Result<&[f64], DiagnosticError> {
        self.check_parameter(parameter)?;
        Ok(self.chain(chain)?.kept(parameter))
    }

    /// Every saved draw of one parameter in one chain, warmup included.
    pub fn draws_with_warmup(
        &self,
        parameter: usize,
        chain: usize,
    ) -> Result<&[f64], DiagnosticError> {
        self.check_parameter(parameter)?;
        Ok(&self.chain(chain)?.samples[parameter])
    }

    /// Post-warmup draws of one parameter, one slice per chain.
    pub fn parameter_draws(&self, parameter: usize) -> Result<Vec<&[f64]>, DiagnosticError> {
        self.check_parameter(parameter)?;
        Ok(self.chains.iter().map(|c| c.kept(parameter)).collect())
    }

    /// Sets the per-chain permutation used by [`ChainSet::permuted_draws`].
    /// Each entry must reorder exactly the post-warmup draws of its chain.
    pub fn set_permutation(&mut self, permutation: Vec<Vec<usize>>) -> Result<(), DiagnosticError> {
        if permutation.len() != self.chains.len() {
            return Err(DiagnosticError::InvalidLayout(format!(
                "{} permutations given for {} chains",
                permutation.len(),
                self.chains.len()
            )));
        }
        for (chain, perm) in permutation.iter().enumerate() {
            let len = self.kept_len(chain);
            if perm.len() != len {
                return Err(DiagnosticError::InvalidPermutation {
                    chain,
                    reason: format!("has {} entries for {} draws", perm.len(), len),
                });
            }
            let mut seen = vec![false; len];
            for &i in perm {
                if i >= len {
                    return Err(DiagnosticError::InvalidPermutation {
                        chain,
                        reason: format!("index {} is out of range for {} draws", i, len),
                    });
                }
                if seen[i] {
                    return Err(DiagnosticError::InvalidPermutation {
                        chain,
                        reason: format!("index {} appears twice", i),
                    });
                }
                seen[i] = true;
            }
        }
        self.permutation = Some(permutation);
        Ok(())
    }

    /// Draws a fresh random permutation for every chain.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let permutation = (0..self.chains.len())
            .map(|c| {
                let mut perm: Vec<usize> = (0..self.kept_len(c)).collect();
                perm.shuffle(rng);
                perm
            })
            .collect();
        self.permutation = Some(permutation);
    }

    pub fn permutation(&self) -> Option<&[Vec<usize>]> {
        self.permutation.as_deref()
    }

    /// Post-warmup draws of one parameter from all chains concatenated,
    /// each chain reordered by its permutation when one is set.
    pub fn permuted_draws(&self, parameter: usize) -> Result<Array1, DiagnosticError> {
        self.check_parameter(parameter)?;
        let mut out = Vec::with_capacity(self.chains.iter().map(|c| c.len() - c.warmup).sum());
        for (c, chain) in self.chains.iter().enumerate() {
            let kept = chain.kept(parameter);
            match &self.permutation {
                Some(perms) => out.extend(perms[c].iter().map(|&i| kept[i])),
                None => out.extend_from_slice(kept),
            }
        }
        Ok(out)
    }

    fn kept_len(&self, chain: usize) -> usize {
        let c = &self.chains[chain];
        c.len() - c.warmup
    }

    fn chain(&self, chain: usize) -> Result<&Chain, DiagnosticError> {
        self.chains.get(chain).ok_or(DiagnosticError::ChainOutOfRange {
            index: chain,
            count: self.chains.len(),
        })
    }

    pub(crate) fn check_parameter(&self, parameter: usize) -> Result<(), DiagnosticError> {
        if parameter >= self.names.len() {
            return Err(DiagnosticError::IndexOutOfRange {
                index: parameter,
                count: self.names.len(),
            });
        }
        Ok(())
    }
}
