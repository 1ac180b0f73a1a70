//! Accumulator for a channel's observation-distribution parameters
//! (lognormal `mu`/`sigma` for attached dyes, `bg_sigma` for background).

/// Weighted sufficient statistics for the lognormal/background fit. Kept as
/// running sums rather than raw samples so the fitter stays associative
/// under `+=` without unbounded memory.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DistributionFitter {
    sum_w_zero: f64,
    sum_w_zero_x2: f64,
    sum_w: f64,
    sum_wz: f64,
    sum_wz2: f64,
}

impl DistributionFitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one weighted observation: intensity `x` attributed to `dye_count`
    /// attached dyes, with posterior weight `weight`.
    pub fn add_sample(&mut self, x: f64, dye_count: u32, weight: f64) {
        if dye_count == 0 {
            self.sum_w_zero += weight;
            self.sum_w_zero_x2 += weight * x * x;
        } else {
            let z = x.ln() - f64::from(dye_count).ln();
            self.sum_w += weight;
            self.sum_wz += weight * z;
            self.sum_wz2 += weight * z * z;
        }
    }

    pub fn combine(&mut self, other: &DistributionFitter) {
        self.sum_w_zero += other.sum_w_zero;
        self.sum_w_zero_x2 += other.sum_w_zero_x2;
        self.sum_w += other.sum_w;
        self.sum_wz += other.sum_wz;
        self.sum_wz2 += other.sum_wz2;
    }

    pub fn scale(&mut self, weight: f64) {
        self.sum_w_zero *= weight;
        self.sum_w_zero_x2 *= weight;
        self.sum_w *= weight;
        self.sum_wz *= weight;
        self.sum_wz2 *= weight;
    }

    /// `(mu, sigma, bg_sigma)`, falling back to `prev`'s value for any
    /// parameter with no supporting evidence.
    #[must_use]
    pub fn get(&self, prev_mu: f64, prev_sigma: f64, prev_bg_sigma: f64) -> (f64, f64, f64) {
        let bg_sigma = if self.sum_w_zero > 0.0 {
            (self.sum_w_zero_x2 / self.sum_w_zero).sqrt()
        } else {
            prev_bg_sigma
        };
        if self.sum_w > 0.0 {
            let mean_z = self.sum_wz / self.sum_w;
            let var_z = (self.sum_wz2 / self.sum_w - mean_z * mean_z).max(0.0);
            (mean_z.exp(), var_z.sqrt(), bg_sigma)
        } else {
            (prev_mu, prev_sigma, bg_sigma)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_mu_from_exact_samples() {
        let mut fitter = DistributionFitter::new();
        // x = mu * d exactly, for several d, sigma should come out ~0.
        for d in 1..=5u32 {
            fitter.add_sample(2.0 * f64::from(d), d, 1.0);
        }
        let (mu, sigma, _bg) = fitter.get(1.0, 1.0, 1.0);
        assert!((mu - 2.0).abs() < 1e-9);
        assert!(sigma < 1e-9);
    }

    #[test]
    fn background_uses_zero_mean_variance() {
        let mut fitter = DistributionFitter::new();
        fitter.add_sample(0.1, 0, 1.0);
        fitter.add_sample(-0.1, 0, 1.0);
        let (_, _, bg_sigma) = fitter.get(0.0, 0.0, 0.0);
        assert!((bg_sigma - 0.1).abs() < 1e-9);
    }

    #[test]
    fn no_evidence_falls_back_to_previous_values() {
        let fitter = DistributionFitter::new();
        assert_eq!(fitter.get(3.0, 4.0, 5.0), (3.0, 4.0, 5.0));
    }
}
