//! The auxiliary single-channel "stuck dye" HMM: a two-state (`dye`,
//! `no_dye`) chain explaining artifacts where one dye never leaves across
//! every cycle, independent of the main peptide HMM's tensor.

use crate::state_vector::StuckDyeStateVector;
use crate::step::StuckDyeStep;
use fseq_fit::SequencingModelFitter;
use fseq_model::ChannelModel;

/// Multiplies `dye` by `pdf(obs | 1)` and `no_dye` by `pdf(obs | 0)` on the
/// modeled channel, and both states by `pdf(obs | 0)` on every other
/// channel (a stuck dye says nothing about other channels' counts).
#[derive(Debug)]
pub struct StuckDyeEmission {
    channel: usize,
    channels: Vec<ChannelModel>,
    observation: Vec<f64>,
}

impl StuckDyeEmission {
    #[must_use]
    pub fn new(channel: usize, channels: Vec<ChannelModel>, observation: Vec<f64>) -> Self {
        Self {
            channel,
            channels,
            observation,
        }
    }

    fn other_channels_weight(&self) -> f64 {
        self.channels
            .iter()
            .enumerate()
            .filter(|(c, _)| *c != self.channel)
            .map(|(c, ch)| ch.pdf(self.observation[c], 0))
            .product()
    }
}

impl StuckDyeStep for StuckDyeEmission {
    fn forward(&self, sv: &mut StuckDyeStateVector) {
        let ch = &self.channels[self.channel];
        let x = self.observation[self.channel];
        let others = self.other_channels_weight();
        sv.dye *= ch.pdf(x, 1) * others;
        sv.no_dye *= ch.pdf(x, 0) * others;
    }

    fn backward(&self, input: &StuckDyeStateVector, output: &mut StuckDyeStateVector) {
        let ch = &self.channels[self.channel];
        let x = self.observation[self.channel];
        let others = self.other_channels_weight();
        output.dye = input.dye * ch.pdf(x, 1) * others;
        output.no_dye = input.no_dye * ch.pdf(x, 0) * others;
    }

    fn improve_fit(
        &self,
        _forward_sv: &StuckDyeStateVector,
        _backward_sv: &StuckDyeStateVector,
        _next_backward_sv: &StuckDyeStateVector,
        _total_probability: f64,
        _fitter: &mut SequencingModelFitter,
    ) {
        // Emission contributes no rate evidence; distribution parameters
        // are fit from the main peptide HMM's emission steps only.
    }
}

/// `no_dye += dye * loss_rate; dye *= (1 - loss_rate)`.
#[derive(Debug)]
pub struct StuckDyeTransition {
    channel: usize,
    loss_rate: f64,
}

impl StuckDyeTransition {
    #[must_use]
    pub fn new(channel: usize, loss_rate: f64) -> Self {
        Self { channel, loss_rate }
    }
}

impl StuckDyeStep for StuckDyeTransition {
    fn forward(&self, sv: &mut StuckDyeStateVector) {
        let lost = sv.dye * self.loss_rate;
        sv.dye -= lost;
        sv.no_dye += lost;
    }

    fn backward(&self, input: &StuckDyeStateVector, output: &mut StuckDyeStateVector) {
        output.no_dye = input.no_dye;
        output.dye = (1.0 - self.loss_rate) * input.dye + self.loss_rate * input.no_dye;
    }

    fn improve_fit(
        &self,
        forward_sv: &StuckDyeStateVector,
        backward_sv: &StuckDyeStateVector,
        next_backward_sv: &StuckDyeStateVector,
        total_probability: f64,
        fitter: &mut SequencingModelFitter,
    ) {
        if total_probability == 0.0 {
            return;
        }
        let numerator = forward_sv.dye * self.loss_rate * next_backward_sv.no_dye / total_probability;
        let denominator = forward_sv.dye * backward_sv.dye / total_probability;
        fitter.channel_fits[self.channel]
            .p_stuck_dye_loss_fit
            .add(numerator, denominator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(mu: f64) -> ChannelModel {
        ChannelModel {
            p_dud: 0.0,
            p_initial_bleach: 0.0,
            p_cyclic_bleach: 0.0,
            p_stuck_dye_loss: 0.08,
            stuck_dye_ratio: 0.5,
            mu,
            sigma: 0.05,
            bg_sigma: 0.05,
        }
    }

    #[test]
    fn transition_moves_mass_proportional_to_loss_rate() {
        let step = StuckDyeTransition::new(0, 0.25);
        let mut sv = StuckDyeStateVector { dye: 1.0, no_dye: 0.0 };
        step.forward(&mut sv);
        assert!((sv.dye - 0.75).abs() < 1e-12);
        assert!((sv.no_dye - 0.25).abs() < 1e-12);
    }

    #[test]
    fn emission_weights_dye_and_no_dye_branches_differently() {
        let step = StuckDyeEmission::new(0, vec![channel(1.0), channel(1.0)], vec![1.0, 0.0]);
        let mut sv = StuckDyeStateVector { dye: 1.0, no_dye: 1.0 };
        step.forward(&mut sv);
        assert!(sv.dye > sv.no_dye);
    }
}
