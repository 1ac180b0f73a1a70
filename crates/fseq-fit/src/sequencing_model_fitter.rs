//! Bundles every per-parameter accumulator needed to re-estimate a whole
//! [`SequencingModel`] from accumulated `improve_fit` statistics.

use crate::channel_model_fitter::ChannelModelFitter;
use crate::decaying::DecayingParameterFitter;
use crate::ratio::RatioFitter;
use fseq_model::{FitSettings, SequencingModel};

#[derive(Clone, Debug)]
pub struct SequencingModelFitter {
    pub p_edman_failure_fit: RatioFitter,
    pub initial_detach_fit: DecayingParameterFitter,
    pub cyclic_detach_fit: DecayingParameterFitter,
    pub p_initial_break_n_fit: RatioFitter,
    pub p_cyclic_break_n_fit: RatioFitter,
    pub channel_fits: Vec<ChannelModelFitter>,
}

impl SequencingModelFitter {
    #[must_use]
    pub fn new(num_channels: usize, num_timesteps: usize) -> Self {
        Self {
            p_edman_failure_fit: RatioFitter::new(),
            initial_detach_fit: DecayingParameterFitter::new(num_timesteps),
            cyclic_detach_fit: DecayingParameterFitter::new(num_timesteps),
            p_initial_break_n_fit: RatioFitter::new(),
            p_cyclic_break_n_fit: RatioFitter::new(),
            channel_fits: (0..num_channels).map(|_| ChannelModelFitter::new()).collect(),
        }
    }

    pub fn combine(&mut self, other: &SequencingModelFitter) {
        self.p_edman_failure_fit += other.p_edman_failure_fit;
        self.initial_detach_fit.combine(&other.initial_detach_fit);
        self.cyclic_detach_fit.combine(&other.cyclic_detach_fit);
        self.p_initial_break_n_fit += other.p_initial_break_n_fit;
        self.p_cyclic_break_n_fit += other.p_cyclic_break_n_fit;
        for (mine, theirs) in self.channel_fits.iter_mut().zip(&other.channel_fits) {
            mine.combine(theirs);
        }
    }

    pub fn scale(&mut self, weight: f64) {
        self.p_edman_failure_fit *= weight;
        self.initial_detach_fit.scale(weight);
        self.cyclic_detach_fit.scale(weight);
        self.p_initial_break_n_fit *= weight;
        self.p_cyclic_break_n_fit *= weight;
        for c in &mut self.channel_fits {
            c.scale(weight);
        }
    }

    #[must_use]
    pub fn get(&self, prev: &SequencingModel, settings: &FitSettings) -> SequencingModel {
        let p_edman_failure = if settings.hold_p_edman_failure {
            prev.p_edman_failure
        } else {
            self.p_edman_failure_fit.get()
        };
        let initial_detach = self.initial_detach_fit.get(
            prev.initial_detach,
            [
                settings.hold_p_detach || settings.hold_p_initial_detach,
                settings.hold_p_detach || settings.hold_p_initial_detach,
                settings.hold_p_initial_detach_decay,
            ],
        );
        let cyclic_detach = self.cyclic_detach_fit.get(
            prev.cyclic_detach,
            [
                settings.hold_p_detach,
                settings.hold_p_detach,
                true, // cyclic detach rate has no modeled decay term
            ],
        );
        let p_initial_break_n = if settings.hold_p_initial_block {
            prev.p_initial_break_n
        } else {
            self.p_initial_break_n_fit.get()
        };
        let p_cyclic_break_n = if settings.hold_p_cyclic_block {
            prev.p_cyclic_break_n
        } else {
            self.p_cyclic_break_n_fit.get()
        };
        let channel_models = self
            .channel_fits
            .iter()
            .zip(&prev.channel_models)
            .enumerate()
            .map(|(c, (fit, prev_channel))| {
                fit.get(prev_channel, settings.hold_dud(c), settings.hold_bleach(c))
            })
            .collect();
        SequencingModel {
            p_edman_failure,
            initial_detach,
            cyclic_detach,
            p_initial_break_n,
            p_cyclic_break_n,
            channel_models,
            max_failed_edmans: prev.max_failed_edmans,
        }
    }
}
