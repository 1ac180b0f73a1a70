//! Moves probability mass from the main tensor into the parallel broken-N
//! tensor, at the same coordinate; broken-N can never return and future
//! Edman steps skip it (the main tensor alone feeds `EdmanTransition`).

use crate::state_vector::PeptideStateVector;
use crate::step::PeptideStep;
use fseq_fit::SequencingModelFitter;
use fseq_tensor::KDRange;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrokenNKind {
    Initial,
    Cyclic,
}

#[derive(Debug)]
pub struct BrokenNTransition {
    kind: BrokenNKind,
    p_break_n: f64,
    forward_range: KDRange,
    backward_range: KDRange,
}

impl BrokenNTransition {
    #[must_use]
    pub fn new(kind: BrokenNKind, p_break_n: f64) -> Self {
        Self {
            kind,
            p_break_n,
            forward_range: KDRange::new(vec![], vec![]),
            backward_range: KDRange::new(vec![], vec![]),
        }
    }
}

impl PeptideStep for BrokenNTransition {
    fn prune_forward(&mut self, range: &mut KDRange, _allow_detached: &mut bool) {
        self.forward_range = range.clone();
        self.backward_range = range.clone();
    }

    fn prune_backward(&mut self, range: &mut KDRange, _allow_detached: &mut bool) {
        self.backward_range = self.backward_range.intersect(range);
        self.forward_range = self.forward_range.intersect(&self.backward_range);
        *range = self.forward_range.clone();
    }

    fn forward_range(&self) -> &KDRange {
        &self.forward_range
    }

    fn backward_range(&self) -> &KDRange {
        &self.backward_range
    }

    fn forward(&self, _num_edmans: &mut usize, psv: &mut PeptideStateVector) {
        if self.forward_range.is_empty() {
            return;
        }
        let mut cursor = psv.main.cursor(&self.forward_range);
        let mut moved = Vec::new();
        while !cursor.done() {
            let loc = cursor.loc().to_vec();
            let main_v = psv.main.get(&loc);
            moved.push((loc, self.p_break_n * main_v, (1.0 - self.p_break_n) * main_v));
            cursor.advance();
        }
        for (loc, into_broken, stays_main) in moved {
            let existing_broken = psv.broken_n.get(&loc);
            psv.broken_n.set(&loc, existing_broken + into_broken);
            psv.main.set(&loc, stays_main);
        }
        psv.range = self.backward_range.clone();
    }

    fn backward(
        &self,
        input: &PeptideStateVector,
        _num_edmans: &mut usize,
        output: &mut PeptideStateVector,
    ) {
        output.p_detached = input.p_detached;
        if self.forward_range.is_empty() {
            return;
        }
        let mut cursor = input.main.cursor(&self.forward_range);
        while !cursor.done() {
            let loc = cursor.loc().to_vec();
            let broken_here = input.broken_n.get(&loc);
            let main_here = input.main.get(&loc);
            let v = self.p_break_n * broken_here + (1.0 - self.p_break_n) * main_here;
            output.main.set(&loc, v);
            output.broken_n.set(&loc, broken_here);
            cursor.advance();
        }
        output.range = self.forward_range.clone();
    }

    fn improve_fit(
        &self,
        forward_psv: &PeptideStateVector,
        backward_psv: &PeptideStateVector,
        next_backward_psv: &PeptideStateVector,
        _num_edmans: usize,
        total_probability: f64,
        fitter: &mut SequencingModelFitter,
    ) {
        if self.forward_range.is_empty() || total_probability == 0.0 {
            return;
        }
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        let mut cursor = forward_psv.main.cursor(&self.forward_range);
        while !cursor.done() {
            let loc = cursor.loc().to_vec();
            let from_main = forward_psv.main.values()[cursor.index()];
            let next_bwd_broken = next_backward_psv.broken_n.get(&loc);
            let bwd_main = backward_psv.main.get(&loc);
            numerator += from_main * self.p_break_n * next_bwd_broken / total_probability;
            denominator += from_main * bwd_main / total_probability;
            cursor.advance();
        }
        let slot = match self.kind {
            BrokenNKind::Initial => &mut fitter.p_initial_break_n_fit,
            BrokenNKind::Cyclic => &mut fitter.p_cyclic_break_n_fit,
        };
        slot.add(numerator, denominator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_identity() {
        let mut step = BrokenNTransition::new(BrokenNKind::Initial, 0.0);
        let mut range = KDRange::new(vec![0], vec![2]);
        let mut allow = false;
        step.prune_forward(&mut range, &mut allow);

        let mut psv = PeptideStateVector::new(&[2]);
        psv.main.set(&[0], 1.0);
        psv.range = KDRange::new(vec![0], vec![2]);
        let mut num_edmans = 0;
        step.forward(&mut num_edmans, &mut psv);
        assert_eq!(psv.main.get(&[0]), 1.0);
        assert_eq!(psv.broken_n.get(&[0]), 0.0);
    }

    #[test]
    fn full_rate_moves_everything_to_broken() {
        let mut step = BrokenNTransition::new(BrokenNKind::Initial, 1.0);
        let mut range = KDRange::new(vec![0], vec![2]);
        let mut allow = false;
        step.prune_forward(&mut range, &mut allow);

        let mut psv = PeptideStateVector::new(&[2]);
        psv.main.set(&[0], 1.0);
        psv.range = KDRange::new(vec![0], vec![2]);
        let mut num_edmans = 0;
        step.forward(&mut num_edmans, &mut psv);
        assert_eq!(psv.main.get(&[0]), 0.0);
        assert_eq!(psv.broken_n.get(&[0]), 1.0);
    }
}
