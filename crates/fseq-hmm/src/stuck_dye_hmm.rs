//! The auxiliary two-state HMM explaining a single channel's stuck-dye
//! artifact, built and scored independently of the main peptide HMM.

use crate::state_vector::StuckDyeStateVector;
use crate::step::stuck_dye::{StuckDyeEmission, StuckDyeTransition};
use crate::step::StuckDyeStep;
use fseq_fit::SequencingModelFitter;
use fseq_model::{Radiometry, SequencingModel};

pub struct StuckDyeHmm {
    steps: Vec<Box<dyn StuckDyeStep>>,
}

impl StuckDyeHmm {
    /// Assembles an emission at `t=0` followed by, for every subsequent
    /// cycle, a transition and then that cycle's emission.
    #[must_use]
    pub fn build(model: &SequencingModel, channel: usize, radiometry: &Radiometry) -> Self {
        let channels = model.channel_models.clone();
        let loss_rate = channels[channel].p_stuck_dye_loss;
        let mut steps: Vec<Box<dyn StuckDyeStep>> = Vec::new();
        steps.push(Box::new(StuckDyeEmission::new(
            channel,
            channels.clone(),
            radiometry.row(0).to_vec(),
        )));
        for t in 1..radiometry.num_timesteps() {
            steps.push(Box::new(StuckDyeTransition::new(channel, loss_rate)));
            steps.push(Box::new(StuckDyeEmission::new(
                channel,
                channels.clone(),
                radiometry.row(t).to_vec(),
            )));
        }
        Self { steps }
    }

    fn run_forward(&self) -> StuckDyeStateVector {
        let mut sv = StuckDyeStateVector::new();
        sv.initialize_from_start();
        for step in &self.steps {
            step.forward(&mut sv);
        }
        sv
    }

    #[must_use]
    pub fn probability(&self) -> f64 {
        self.run_forward().sum()
    }

    pub fn improve_fit(&self, fitter: &mut SequencingModelFitter) {
        let total_probability = self.probability();
        if total_probability == 0.0 {
            return;
        }

        let mut finish = StuckDyeStateVector::new();
        finish.initialize_from_finish();
        let mut backward_states = Vec::with_capacity(self.steps.len() + 1);
        backward_states.push(finish);
        for step in self.steps.iter().rev() {
            let input = *backward_states.last().expect("just pushed");
            let mut output = StuckDyeStateVector::new();
            step.backward(&input, &mut output);
            backward_states.push(output);
        }
        backward_states.reverse();

        let mut forward_sv = StuckDyeStateVector::new();
        forward_sv.initialize_from_start();
        for (i, step) in self.steps.iter().enumerate() {
            step.improve_fit(
                &forward_sv,
                &backward_states[i],
                &backward_states[i + 1],
                total_probability,
                fitter,
            );
            step.forward(&mut forward_sv);
        }
    }
}
