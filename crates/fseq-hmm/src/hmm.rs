//! Assembles one ordered chain of [`PeptideStep`]s for a (dye sequence,
//! radiometry) pair and drives it through pruning, scoring, and fitting.

use crate::precomputation::{
    PerDyeSeqPrecomputation, PerRadiometryPrecomputation, UniversalPrecomputation,
};
use crate::state_vector::PeptideStateVector;
use crate::step::binomial::{BinomialKind, BinomialTransition};
use crate::step::broken_n::{BrokenNKind, BrokenNTransition};
use crate::step::detach::{DetachKind, DetachTransition};
use crate::step::edman::EdmanTransition;
use crate::step::emission::{DistributionCutoff, PeptideEmission};
use crate::step::PeptideStep;
use fseq_fit::SequencingModelFitter;
use fseq_model::{Radiometry, SequencingModel};
use fseq_tensor::KDRange;
use std::sync::Arc;

/// One fully assembled peptide HMM, ready to be scored or used to
/// accumulate Baum-Welch statistics.
pub struct PeptideHmm {
    steps: Vec<Box<dyn PeptideStep>>,
    /// `boundary_edmans[i]` is the successful-Edman count entering step `i`;
    /// has `steps.len() + 1` entries, the last being the count after the
    /// whole chain.
    boundary_edmans: Vec<usize>,
    tensor_shape: Vec<usize>,
    start_loc: Vec<usize>,
    empty: bool,
    final_allow_detached: bool,
}

impl PeptideHmm {
    /// Assembles the step chain per the construction order: initial
    /// broken-N, per-channel dud, emission at `t=0`, then (if more than one
    /// cycle) initial detach and per-channel initial bleach, then for every
    /// subsequent cycle: cyclic broken-N, cyclic detach, per-channel cyclic
    /// bleach, Edman, emission.
    #[must_use]
    pub fn build(
        model: &SequencingModel,
        universal: &UniversalPrecomputation,
        dye_seq_pc: &PerDyeSeqPrecomputation,
        radiometry: &Radiometry,
        radiometry_pc: &PerRadiometryPrecomputation,
        cutoff: DistributionCutoff,
    ) -> Self {
        let num_channels = model.num_channels();
        let num_timesteps = radiometry.num_timesteps();
        let tensor_shape = dye_seq_pc.tensor_shape.clone();

        let mut steps: Vec<Box<dyn PeptideStep>> = Vec::new();
        let mut boundary_edmans: Vec<usize> = Vec::new();
        let mut cycle: usize = 0;

        macro_rules! push_step {
            ($step:expr) => {{
                boundary_edmans.push(cycle);
                steps.push(Box::new($step));
            }};
        }

        push_step!(BrokenNTransition::new(
            BrokenNKind::Initial,
            model.p_initial_break_n
        ));
        for c in 0..num_channels {
            push_step!(BinomialTransition::new(
                BinomialKind::Dud,
                c,
                Arc::clone(&universal.dud[c])
            ));
        }
        push_step!(PeptideEmission::new(
            radiometry_pc.tables[0].clone(),
            model.channel_models.clone(),
            radiometry.row(0).to_vec(),
            cutoff,
        ));
        if num_timesteps > 1 {
            push_step!(DetachTransition::new(
                DetachKind::Initial,
                model.initial_detach
            ));
            for c in 0..num_channels {
                push_step!(BinomialTransition::new(
                    BinomialKind::InitialBleach,
                    c,
                    Arc::clone(&universal.initial_bleach[c])
                ));
            }
        }
        for t in 1..num_timesteps {
            push_step!(BrokenNTransition::new(
                BrokenNKind::Cyclic,
                model.p_cyclic_break_n
            ));
            push_step!(DetachTransition::new(
                DetachKind::Cyclic,
                model.cyclic_detach
            ));
            for c in 0..num_channels {
                push_step!(BinomialTransition::new(
                    BinomialKind::CyclicBleach,
                    c,
                    Arc::clone(&universal.cyclic_bleach[c])
                ));
            }
            push_step!(EdmanTransition::new(
                Arc::clone(&dye_seq_pc.dye_seq),
                Arc::clone(&dye_seq_pc.dye_track),
                model.p_edman_failure,
                num_channels,
                cycle,
                model.max_failed_edmans,
            ));
            cycle += 1;
            push_step!(PeptideEmission::new(
                radiometry_pc.tables[t].clone(),
                model.channel_models.clone(),
                radiometry.row(t).to_vec(),
                cutoff,
            ));
        }
        boundary_edmans.push(cycle);

        let shape_u32: Vec<u32> = tensor_shape.iter().map(|&s| s as u32).collect();
        let mut range = KDRange::full(&shape_u32);
        let mut allow_detached = false;
        let mut empty = false;
        for step in &mut steps {
            step.prune_forward(&mut range, &mut allow_detached);
            if range.is_empty() {
                empty = true;
                break;
            }
        }
        let final_allow_detached = allow_detached;

        if !empty {
            let mut range = steps
                .last()
                .expect("an HMM always has at least one step")
                .backward_range()
                .clone();
            let mut allow_detached = final_allow_detached;
            for step in steps.iter_mut().rev() {
                step.prune_backward(&mut range, &mut allow_detached);
                if range.is_empty() {
                    empty = true;
                    break;
                }
            }
        }

        let mut start_loc = vec![0usize; tensor_shape.len()];
        for c in 0..num_channels {
            start_loc[1 + c] = dye_seq_pc.dye_track.get(0, c) as usize;
        }

        Self {
            steps,
            boundary_edmans,
            tensor_shape,
            start_loc,
            empty,
            final_allow_detached,
        }
    }

    fn run_forward(&self) -> PeptideStateVector {
        let mut psv = PeptideStateVector::new(&self.tensor_shape);
        psv.initialize_from_start(&self.start_loc);
        let mut num_edmans = 0usize;
        for step in &self.steps {
            step.forward(&mut num_edmans, &mut psv);
        }
        psv
    }

    /// Total probability of the observed radiometry under this dye
    /// sequence, marginalizing over every hidden path.
    #[must_use]
    pub fn probability(&self) -> f64 {
        if self.empty {
            return 0.0;
        }
        self.run_forward().sum()
    }

    /// Accumulates Baum-Welch sufficient statistics from this HMM into
    /// `fitter`. A no-op (rather than a 0/0 blowup) when the total
    /// probability is zero.
    pub fn improve_fit(&self, fitter: &mut SequencingModelFitter) {
        if self.empty {
            return;
        }
        let total_probability = self.probability();
        if total_probability == 0.0 {
            return;
        }

        let last_step = self.steps.last().expect("non-empty step chain");
        let mut finish = PeptideStateVector::new(&self.tensor_shape);
        finish.range = last_step.backward_range().clone();
        finish.allow_detached = self.final_allow_detached;
        finish.initialize_from_finish();

        let mut backward_states = Vec::with_capacity(self.steps.len() + 1);
        backward_states.push(finish);
        let mut num_edmans = *self.boundary_edmans.last().unwrap_or(&0);
        for step in self.steps.iter().rev() {
            let input = backward_states.last().expect("just pushed");
            let mut output = PeptideStateVector::new(&self.tensor_shape);
            step.backward(input, &mut num_edmans, &mut output);
            backward_states.push(output);
        }
        backward_states.reverse();

        let mut forward_psv = PeptideStateVector::new(&self.tensor_shape);
        forward_psv.initialize_from_start(&self.start_loc);
        let mut num_edmans = 0usize;
        for (i, step) in self.steps.iter().enumerate() {
            step.improve_fit(
                &forward_psv,
                &backward_states[i],
                &backward_states[i + 1],
                self.boundary_edmans[i],
                total_probability,
                fitter,
            );
            step.forward(&mut num_edmans, &mut forward_psv);
        }
    }
}
