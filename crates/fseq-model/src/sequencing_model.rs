//! The full parameterization of a sequencing run: global rates plus one
//! [`ChannelModel`] per fluorescence channel.

use crate::channel_model::ChannelModel;
use serde::{Deserialize, Serialize};

/// A detach (or break-N) rate that decays across Edman cycles:
/// `rate(i) = base + initial * exp(-i * initial_decay)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecayingRateModel {
    pub base: f64,
    pub initial: f64,
    pub initial_decay: f64,
}

impl DecayingRateModel {
    #[must_use]
    pub fn constant(rate: f64) -> Self {
        Self {
            base: rate,
            initial: 0.0,
            initial_decay: 0.0,
        }
    }

    /// Rate at Edman-cycle index `i`.
    #[must_use]
    pub fn rate_at(&self, i: usize) -> f64 {
        self.base + self.initial * (-(i as f64) * self.initial_decay).exp()
    }

    /// Largest absolute difference between any of the three parameters of
    /// `self` and `other`; used to detect fit convergence.
    #[must_use]
    pub fn distance(&self, other: &DecayingRateModel) -> f64 {
        (self.base - other.base)
            .abs()
            .max((self.initial - other.initial).abs())
            .max((self.initial_decay - other.initial_decay).abs())
    }
}

/// Probabilistic model of one sequencing run: global per-cycle rates plus
/// one [`ChannelModel`] per channel.
///
/// `p_initial_detach`/`p_cyclic_detach` are exposed both as plain scalars
/// (via [`SequencingModel::initial_detach_rate`]/`cyclic_detach_rate`) and
/// as [`DecayingRateModel`]s, so a fitter may hold the decay terms at zero
/// to recover the simple constant-rate behavior spec.md describes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequencingModel {
    pub p_edman_failure: f64,
    pub initial_detach: DecayingRateModel,
    pub cyclic_detach: DecayingRateModel,
    pub p_initial_break_n: f64,
    pub p_cyclic_break_n: f64,
    pub channel_models: Vec<ChannelModel>,
    /// Optional cap on tracked consecutive Edman-failure cycles; beyond
    /// this many failures in a row the remaining probability mass is
    /// treated as negligible and the active range is not widened further.
    #[serde(default)]
    pub max_failed_edmans: Option<usize>,
}

impl SequencingModel {
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.channel_models.len()
    }

    #[must_use]
    pub fn initial_detach_rate(&self, num_edmans: usize) -> f64 {
        self.initial_detach.rate_at(num_edmans)
    }

    #[must_use]
    pub fn cyclic_detach_rate(&self, num_edmans: usize) -> f64 {
        self.cyclic_detach.rate_at(num_edmans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decaying_rate_collapses_to_constant_when_initial_is_zero() {
        let r = DecayingRateModel::constant(0.1);
        assert_eq!(r.rate_at(0), 0.1);
        assert_eq!(r.rate_at(100), 0.1);
    }

    #[test]
    fn decaying_rate_decays_toward_base() {
        let r = DecayingRateModel {
            base: 0.1,
            initial: 0.5,
            initial_decay: 1.0,
        };
        assert!(r.rate_at(0) > r.rate_at(5));
        assert!(r.rate_at(50) - r.base < 1e-6);
    }
}
