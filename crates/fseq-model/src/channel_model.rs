//! Per-channel dye-loss rates and observation distribution.

use crate::distribution::{lognormal_pdf, normal_pdf};
use serde::{Deserialize, Serialize};

/// Error rates and observation model for one fluorescence channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelModel {
    pub p_dud: f64,
    pub p_initial_bleach: f64,
    pub p_cyclic_bleach: f64,
    pub p_stuck_dye_loss: f64,
    pub stuck_dye_ratio: f64,
    /// Mean intensity contributed by a single attached dye.
    pub mu: f64,
    /// Spread of the lognormal observation distribution for `d > 0` dyes.
    pub sigma: f64,
    /// Spread of the background-only observation distribution for `d == 0`.
    pub bg_sigma: f64,
}

impl ChannelModel {
    /// Density of observing intensity `x` given `d` attached dyes.
    ///
    /// `d == 0` (no dye) is modeled as background noise, `N(0, bg_sigma)`;
    /// `d > 0` is a lognormal whose underlying mean is `ln(mu * d)`.
    #[must_use]
    pub fn pdf(&self, x: f64, d: u32) -> f64 {
        if d == 0 {
            normal_pdf(x, 0.0, self.bg_sigma)
        } else {
            lognormal_pdf(x, (self.mu * f64::from(d)).ln(), self.sigma)
        }
    }

    /// Spread used by the emission step's pruning band around `d * mu`.
    ///
    /// Model-specific by contract; this implementation uses a constant
    /// per-channel spread (`bg_sigma` at `d == 0`, `sigma` otherwise).
    #[must_use]
    pub fn sigma(&self, d: u32) -> f64 {
        if d == 0 {
            self.bg_sigma
        } else {
            self.sigma
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ChannelModel {
        ChannelModel {
            p_dud: 0.05,
            p_initial_bleach: 0.05,
            p_cyclic_bleach: 0.05,
            p_stuck_dye_loss: 0.08,
            stuck_dye_ratio: 0.5,
            mu: 1.0,
            sigma: 0.16,
            bg_sigma: 0.05,
        }
    }

    #[test]
    fn pdf_zero_dyes_uses_background_distribution() {
        let m = model();
        assert!(m.pdf(0.0, 0) > m.pdf(1.0, 0));
    }

    #[test]
    fn pdf_nonzero_dyes_peaks_near_mu_times_d() {
        let m = model();
        let near_peak = m.pdf(2.0 * m.mu, 2);
        let far = m.pdf(0.1, 2);
        assert!(near_peak > far);
    }
}
