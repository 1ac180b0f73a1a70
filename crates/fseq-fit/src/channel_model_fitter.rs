//! Per-channel bundle of rate and distribution accumulators.

use crate::distribution::DistributionFitter;
use crate::ratio::RatioFitter;
use fseq_model::ChannelModel;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChannelModelFitter {
    pub p_dud_fit: RatioFitter,
    pub p_initial_bleach_fit: RatioFitter,
    pub p_cyclic_bleach_fit: RatioFitter,
    pub p_stuck_dye_loss_fit: RatioFitter,
    pub distribution_fit: DistributionFitter,
}

impl ChannelModelFitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn combine(&mut self, other: &ChannelModelFitter) {
        self.p_dud_fit += other.p_dud_fit;
        self.p_initial_bleach_fit += other.p_initial_bleach_fit;
        self.p_cyclic_bleach_fit += other.p_cyclic_bleach_fit;
        self.p_stuck_dye_loss_fit += other.p_stuck_dye_loss_fit;
        self.distribution_fit.combine(&other.distribution_fit);
    }

    pub fn scale(&mut self, weight: f64) {
        self.p_dud_fit *= weight;
        self.p_initial_bleach_fit *= weight;
        self.p_cyclic_bleach_fit *= weight;
        self.p_stuck_dye_loss_fit *= weight;
        self.distribution_fit.scale(weight);
    }

    /// `stuck_dye_ratio` has no fitter of its own (spec.md names no update
    /// rule for it); it is carried forward unchanged from `prev`.
    #[must_use]
    pub fn get(&self, prev: &ChannelModel, hold_dud: bool, hold_bleach: bool) -> ChannelModel {
        let (mu, sigma, bg_sigma) = self.distribution_fit.get(prev.mu, prev.sigma, prev.bg_sigma);
        ChannelModel {
            p_dud: if hold_dud {
                prev.p_dud
            } else {
                self.p_dud_fit.get()
            },
            p_initial_bleach: if hold_bleach {
                prev.p_initial_bleach
            } else {
                self.p_initial_bleach_fit.get()
            },
            p_cyclic_bleach: if hold_bleach {
                prev.p_cyclic_bleach
            } else {
                self.p_cyclic_bleach_fit.get()
            },
            p_stuck_dye_loss: self.p_stuck_dye_loss_fit.get(),
            stuck_dye_ratio: prev.stuck_dye_ratio,
            mu,
            sigma,
            bg_sigma,
        }
    }
}
