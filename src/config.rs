/// Upper bound applied to an effective sample size estimate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EssCap {
    /// Report the estimate as computed; anti-correlated chains may exceed
    /// the total number of draws.
    #[default]
    Unclamped,
    /// Cap at the total number of draws `M * N`.
    NominalDraws,
    /// Cap at `M * N * log10(M * N)`, as Stan 2.24 does.
    LogScaled,
}

impl EssCap {
    /// Applies the cap to `ess` given the total number of draws.
    pub fn apply(self, ess: f64, num_total_draws: f64) -> f64 {
        match self {
            EssCap::Unclamped => ess,
            EssCap::NominalDraws => ess.min(num_total_draws),
            EssCap::LogScaled => ess.min(num_total_draws * num_total_draws.log10()),
        }
    }
}

/// Knobs shared by the diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticOptions {
    /// Cap applied to every effective sample size; unclamped by default.
    pub ess_cap: EssCap,
    /// Relative tolerance for deciding that a chain is constant: a draw
    /// counts as equal to the chain's first draw when they differ by at
    /// most this fraction of the larger magnitude.  Zero, the default,
    /// means exact equality.
    pub constant_tolerance: f64,
}

impl DiagnosticOptions {
    pub fn ess_cap(mut self, cap: EssCap) -> Self {
        self.ess_cap = cap;
        self
    }

    pub fn constant_tolerance(mut self, tolerance: f64) -> Self {
        self.constant_tolerance = tolerance;
        self
    }
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        DiagnosticOptions {
            ess_cap: EssCap::default(),
            constant_tolerance: 0.0,
        }
    }
}
