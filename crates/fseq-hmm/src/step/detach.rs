//! Moves probability mass from the attached tensors to the scalar
//! `p_detached` state, at a rate that may itself decay across cycles.
//!
//! [`DetachKind::Initial`] is the very first detach opportunity in a
//! pipeline (no incoming detached scalar to carry forward); every
//! subsequent cycle uses [`DetachKind::Cyclic`], which additionally
//! threads `p_detached` through unchanged aside from the new contribution.

use crate::state_vector::PeptideStateVector;
use crate::step::PeptideStep;
use fseq_fit::SequencingModelFitter;
use fseq_model::DecayingRateModel;
use fseq_tensor::KDRange;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetachKind {
    Initial,
    Cyclic,
}

#[derive(Debug)]
pub struct DetachTransition {
    kind: DetachKind,
    rate_model: DecayingRateModel,
    forward_range: KDRange,
    backward_range: KDRange,
}

impl DetachTransition {
    #[must_use]
    pub fn new(kind: DetachKind, rate_model: DecayingRateModel) -> Self {
        Self {
            kind,
            rate_model,
            forward_range: KDRange::new(vec![], vec![]),
            backward_range: KDRange::new(vec![], vec![]),
        }
    }
}

impl PeptideStep for DetachTransition {
    fn prune_forward(&mut self, range: &mut KDRange, allow_detached: &mut bool) {
        self.forward_range = range.clone();
        self.backward_range = range.clone();
        *allow_detached = true;
    }

    fn prune_backward(&mut self, range: &mut KDRange, allow_detached: &mut bool) {
        self.backward_range = self.backward_range.intersect(range);
        self.forward_range = self.forward_range.intersect(&self.backward_range);
        *range = self.forward_range.clone();
        *allow_detached = self.kind == DetachKind::Cyclic;
    }

    fn forward_range(&self) -> &KDRange {
        &self.forward_range
    }

    fn backward_range(&self) -> &KDRange {
        &self.backward_range
    }

    fn forward(&self, num_edmans: &mut usize, psv: &mut PeptideStateVector) {
        if self.forward_range.is_empty() {
            return;
        }
        let rate = self.rate_model.rate_at(*num_edmans);
        let mass = psv.main.sum(&self.forward_range) + psv.broken_n.sum(&self.forward_range);
        psv.main.scale(&self.forward_range, 1.0 - rate);
        psv.broken_n.scale(&self.forward_range, 1.0 - rate);
        let carried = if self.kind == DetachKind::Cyclic {
            psv.p_detached
        } else {
            0.0
        };
        psv.p_detached = carried + rate * mass;
        psv.range = self.backward_range.clone();
    }

    fn backward(
        &self,
        input: &PeptideStateVector,
        num_edmans: &mut usize,
        output: &mut PeptideStateVector,
    ) {
        let rate = self.rate_model.rate_at(*num_edmans);
        if self.forward_range.is_empty() {
            output.p_detached = input.p_detached;
            return;
        }
        // Walk `input`'s coordinates (read-only), writing into `output`: a
        // cursor and a mutation of the same tensor cannot be live together.
        let mut it_main = input.main.cursor(&self.forward_range);
        while !it_main.done() {
            let loc = it_main.loc().to_vec();
            let v = (1.0 - rate) * input.main.get(&loc) + rate * input.p_detached;
            output.main.set(&loc, v);
            it_main.advance();
        }
        let mut it_broken = input.broken_n.cursor(&self.forward_range);
        while !it_broken.done() {
            let loc = it_broken.loc().to_vec();
            let v = (1.0 - rate) * input.broken_n.get(&loc) + rate * input.p_detached;
            output.broken_n.set(&loc, v);
            it_broken.advance();
        }
        output.p_detached = if self.kind == DetachKind::Cyclic {
            input.p_detached
        } else {
            0.0
        };
        output.range = self.forward_range.clone();
    }

    fn improve_fit(
        &self,
        forward_psv: &PeptideStateVector,
        backward_psv: &PeptideStateVector,
        next_backward_psv: &PeptideStateVector,
        num_edmans: usize,
        total_probability: f64,
        fitter: &mut SequencingModelFitter,
    ) {
        if self.forward_range.is_empty() || total_probability == 0.0 {
            return;
        }
        let rate = self.rate_model.rate_at(num_edmans);
        let mut zero_cell = vec![0usize; forward_psv.main.order()];
        zero_cell[0] = num_edmans;
        let next_bwd_zero = next_backward_psv.main.get(&zero_cell);
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        let mut cursor = forward_psv.main.cursor(&self.forward_range);
        while !cursor.done() {
            let loc = cursor.loc().to_vec();
            if loc[1..].iter().any(|&x| x != 0) {
                let from = forward_psv.main.values()[cursor.index()];
                let bwd = backward_psv.main.get(&loc);
                numerator += from * rate * next_bwd_zero / total_probability;
                denominator += from * bwd / total_probability;
            }
            cursor.advance();
        }
        let slot = match self.kind {
            DetachKind::Initial => &mut fitter.initial_detach_fit,
            DetachKind::Cyclic => &mut fitter.cyclic_detach_fit,
        };
        slot.add_timestep(num_edmans, numerator, denominator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_identity() {
        let mut step = DetachTransition::new(DetachKind::Initial, DecayingRateModel::constant(0.0));
        let mut range = KDRange::new(vec![0], vec![3]);
        let mut allow = false;
        step.prune_forward(&mut range, &mut allow);

        let mut psv = PeptideStateVector::new(&[3]);
        psv.main.set(&[0], 1.0);
        psv.range = KDRange::new(vec![0], vec![3]);
        let mut num_edmans = 0;
        step.forward(&mut num_edmans, &mut psv);
        assert_eq!(psv.p_detached, 0.0);
        assert_eq!(psv.main.get(&[0]), 1.0);
    }

    #[test]
    fn full_rate_moves_all_mass_to_detached() {
        let mut step = DetachTransition::new(DetachKind::Initial, DecayingRateModel::constant(1.0));
        let mut range = KDRange::new(vec![0], vec![3]);
        let mut allow = false;
        step.prune_forward(&mut range, &mut allow);

        let mut psv = PeptideStateVector::new(&[3]);
        psv.main.set(&[0], 1.0);
        psv.range = KDRange::new(vec![0], vec![3]);
        let mut num_edmans = 0;
        step.forward(&mut num_edmans, &mut psv);
        assert_eq!(psv.p_detached, 1.0);
        assert_eq!(psv.main.sum(&psv.range.clone()), 0.0);
    }
}
