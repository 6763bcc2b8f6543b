use crate::array_stats::mean_variance;

use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Stored walker positions of the cold chain
#[derive(Clone, Debug)]
pub struct Chain {
    /// `(n_walkers, n_params)` per stored step
    samples: Vec<Array2<f64>>,
    /// `(n_walkers,)` per stored step
    ln_likes: Vec<Array1<f64>>,
    n_params: usize,
    thin: usize,
    total_steps: usize,
}

impl Chain {
    /// `thin` of zero is treated as one
    pub fn new(n_params: usize, thin: usize) -> Self {
        Self {
            samples: vec![],
            ln_likes: vec![],
            n_params,
            thin: thin.max(1),
            total_steps: 0,
        }
    }

    /// Record a step, returns `true` if it was stored and `false` if it was thinned out
    pub fn push(&mut self, positions: Array2<f64>, ln_likes: Array1<f64>) -> bool {
        self.total_steps += 1;
        if self.total_steps.is_multiple_of(self.thin) {
            self.samples.push(positions);
            self.ln_likes.push(ln_likes);
            true
        } else {
            false
        }
    }

    /// Number of stored steps
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn thin(&self) -> usize {
        self.thin
    }

    /// All stored positions, step-major, `(n_stored * n_walkers, n_params)`
    pub fn flat_samples(&self) -> Array2<f64> {
        let n_walkers = self.samples.first().map_or(0, |sample| sample.nrows());
        let mut flat = Array2::zeros((self.len() * n_walkers, self.n_params));
        for (step, sample) in self.samples.iter().enumerate() {
            for (walker, position) in sample.axis_iter(Axis(0)).enumerate() {
                flat.row_mut(step * n_walkers + walker).assign(&position);
            }
        }
        flat
    }

    /// Log-likelihoods in the order of [Chain::flat_samples]
    pub fn flat_ln_likes(&self) -> Array1<f64> {
        self.ln_likes
            .iter()
            .flat_map(|ln_like| ln_like.iter().copied())
            .collect()
    }

    /// Split-chain Gelman-Rubin statistic of every parameter
    ///
    /// Every walker's chain is split in halves, which are treated as separate chains. Returns
    /// `None` with fewer than four stored steps. Parameters constant over the whole chain get
    /// one.
    pub fn r_hat(&self) -> Option<Vec<f64>> {
        let n_stored = self.len();
        if n_stored < 4 {
            return None;
        }
        let n_split = n_stored / 2;
        let n_walkers = self.samples[0].nrows();
        let n_chains = 2 * n_walkers;

        let r_hat = (0..self.n_params)
            .map(|param| {
                let mut means = Vec::with_capacity(n_chains);
                let mut variances = Vec::with_capacity(n_chains);
                for walker in 0..n_walkers {
                    for half in 0..2 {
                        let chain: Array1<f64> = self.samples[half * n_split..(half + 1) * n_split]
                            .iter()
                            .map(|sample| sample[[walker, param]])
                            .collect();
                        // n_split is at least two
                        let (mean, variance) =
                            mean_variance(chain.view()).unwrap_or((f64::NAN, f64::NAN));
                        means.push(mean);
                        variances.push(variance);
                    }
                }
                let n = n_split as f64;
                let w = variances.iter().sum::<f64>() / n_chains as f64;
                let b = match mean_variance(ArrayView1::from(&means)) {
                    Some((_, variance)) => n * variance,
                    None => 0.0,
                };
                if w == 0.0 {
                    return if b == 0.0 { 1.0 } else { f64::INFINITY };
                }
                let var_plus = ((n - 1.0) * w + b) / n;
                (var_plus / w).sqrt()
            })
            .collect();
        Some(r_hat)
    }

    /// Every parameter's R-hat is finite and below `threshold`
    pub fn is_converged(&self, threshold: f64) -> bool {
        match self.r_hat() {
            Some(r_hat) => r_hat.iter().all(|&x| x.is_finite() && x < threshold),
            None => false,
        }
    }
}
