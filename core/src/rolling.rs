use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Running mean and sum of squared deviations (Welford).
#[derive(Clone, Copy, Debug, Default)]
struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

impl Accumulator {
    fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    fn remove(&mut self, val: f64) {
        self.n_vals -= 1;
        if self.n_vals == 0 {
            *self = Self::default();
            return;
        }

        let diff_a = val - self.mean;
        self.mean -= diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum = (self.diff_2_sum - diff_a * diff_b).max(0.0);
    }

    fn mean(&self) -> Option<f64> {
        (self.n_vals > 0).then_some(self.mean)
    }

    /// Sample standard deviation; needs at least two values.
    fn std_dev(&self) -> Option<f64> {
        (self.n_vals > 1).then(|| (self.diff_2_sum / (self.n_vals - 1) as f64).sqrt())
    }
}

/// Centered rolling mean and sample standard deviation, one entry per input position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RollingStats {
    pub window: usize,
    pub mean: Vec<Option<f64>>,
    pub std: Vec<Option<f64>>,
}

impl RollingStats {
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Number of positions with a defined mean.
    pub fn defined(&self) -> usize {
        self.mean.iter().filter(|value| value.is_some()).count()
    }

    /// `(index, mean - std, mean + std)` for every position where both are defined.
    pub fn band(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.mean
            .iter()
            .zip(&self.std)
            .enumerate()
            .filter_map(|(i, pair)| match pair {
                (Some(mean), Some(std)) => Some((i, mean - std, mean + std)),
                _ => None,
            })
    }
}

/// Compute the centered rolling mean and sample standard deviation of `values`.
///
/// Positions whose window does not fully fit inside the sequence are `None`,
/// which leaves every position undefined when `window` exceeds the length.
pub fn centered_rolling(values: &[f64], window: usize) -> Result<RollingStats> {
    if window == 0 {
        bail!("rolling window must be positive");
    }

    let mut mean = vec![None; values.len()];
    let mut std = vec![None; values.len()];

    // The window ending at `hi` is centered on `hi - (window - 1) / 2`.
    let right = (window - 1) / 2;
    let mut acc = Accumulator::default();
    for (hi, &value) in values.iter().enumerate() {
        acc.add(value);
        if hi >= window {
            acc.remove(values[hi - window]);
        }
        if hi + 1 >= window {
            let center = hi - right;
            mean[center] = acc.mean();
            std[center] = acc.std_dev();
        }
    }

    let stats = RollingStats { window, mean, std };
    debug!(
        len = values.len(),
        window,
        defined = stats.defined(),
        "computed centered rolling statistics"
    );
    Ok(stats)
}
