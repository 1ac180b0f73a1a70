//! Removes one residue from the N-terminus, advancing the
//! successful-Edman-count axis and, on success, possibly shifting one dye
//! off the residue's channel.
//!
//! The only step that moves mass along axis 0, so it is also the only step
//! that cannot compute its output in place: `forward`/`backward` build a
//! fresh output [`Tensor`] and swap it into the state vector rather than
//! writing through scratch vectors the way the binomial steps do.

use crate::state_vector::PeptideStateVector;
use crate::step::PeptideStep;
use fseq_fit::SequencingModelFitter;
use fseq_model::{DyeSeq, DyeTrack};
use fseq_tensor::{KDRange, Tensor};
use std::sync::Arc;

/// One Edman cycle: succeeds with probability `1 - p_edman_failure`.
#[derive(Debug)]
pub struct EdmanTransition {
    dye_seq: Arc<DyeSeq>,
    dye_track: Arc<DyeTrack>,
    p_edman_failure: f64,
    num_channels: usize,
    /// Index of this step among every Edman step in the chain (0 for the
    /// first cycle's Edman, 1 for the second, …); deterministic at
    /// construction time since every Edman step runs exactly once per
    /// cycle regardless of data.
    cycle_index: usize,
    /// Optional cap on tracked consecutive Edman-failure cycles (spec's
    /// `ApproximationModel`): a cell needing more than this many failures
    /// since its last success to reach `cycle_index` is treated as
    /// negligible and pruned away.
    max_failed_edmans: Option<usize>,
    forward_range: KDRange,
    backward_range: KDRange,
}

impl EdmanTransition {
    #[must_use]
    pub fn new(
        dye_seq: Arc<DyeSeq>,
        dye_track: Arc<DyeTrack>,
        p_edman_failure: f64,
        num_channels: usize,
        cycle_index: usize,
        max_failed_edmans: Option<usize>,
    ) -> Self {
        Self {
            dye_seq,
            dye_track,
            p_edman_failure,
            num_channels,
            cycle_index,
            max_failed_edmans,
            forward_range: KDRange::new(vec![], vec![]),
            backward_range: KDRange::new(vec![], vec![]),
        }
    }

    /// Destination cell for a residue removal starting at `loc`, shifted one
    /// forward on axis 0 and (if a dye is lost) down by one on `channel`'s axis.
    fn dest(loc: &[usize], channel: Option<(usize, u32)>) -> Vec<usize> {
        let mut dest = loc.to_vec();
        dest[0] += 1;
        if let Some((c, new_count)) = channel {
            dest[1 + c] = new_count as usize;
        }
        dest
    }
}

impl PeptideStep for EdmanTransition {
    fn prune_forward(&mut self, range: &mut KDRange, _allow_detached: &mut bool) {
        if let Some(cap) = self.max_failed_edmans {
            let floor = u32::try_from(self.cycle_index.saturating_sub(cap)).unwrap_or(u32::MAX);
            range.min[0] = range.min[0].max(floor);
        }
        self.forward_range = range.clone();
        let mut backward = range.clone();
        backward.max[0] += 1;
        for c in 0..self.num_channels {
            let axis = 1 + c;
            backward.widen_min(axis, backward.min[axis].saturating_sub(1));
        }
        self.backward_range = backward.clone();
        *range = backward;
    }

    fn prune_backward(&mut self, range: &mut KDRange, _allow_detached: &mut bool) {
        self.backward_range = self.backward_range.intersect(range);
        let mut forward_requirement = self.backward_range.clone();
        if forward_requirement.max[0] > 0 {
            forward_requirement.max[0] -= 1;
        }
        for c in 0..self.num_channels {
            let axis = 1 + c;
            forward_requirement.max[axis] = u32::MAX.min(forward_requirement.max[axis] + 1);
        }
        self.forward_range = self.forward_range.intersect(&forward_requirement);
        *range = self.forward_range.clone();
    }

    fn forward_range(&self) -> &KDRange {
        &self.forward_range
    }

    fn backward_range(&self) -> &KDRange {
        &self.backward_range
    }

    fn forward(&self, num_edmans: &mut usize, psv: &mut PeptideStateVector) {
        *num_edmans += 1;
        if self.forward_range.is_empty() {
            psv.range = self.backward_range.clone();
            return;
        }
        let mut out = Tensor::zeros(psv.main.shape());
        let mut cursor = psv.main.cursor(&self.forward_range);
        while !cursor.done() {
            let loc = cursor.loc().to_vec();
            let src = psv.main.values()[cursor.index()];
            if src != 0.0 {
                out.add(&loc, self.p_edman_failure * src);
                let success = 1.0 - self.p_edman_failure;
                let se = loc[0];
                let residue = self.dye_seq.get(se);
                if residue < 0 {
                    out.add(&Self::dest(&loc, None), success * src);
                } else {
                    let c = residue as usize;
                    let c_idx = loc[1 + c] as u32;
                    let c_total = self.dye_track.get(se, c);
                    if c_total > 0 {
                        if c_idx != c_total {
                            out.add(&Self::dest(&loc, None), success * src * f64::from(c_total - c_idx) / f64::from(c_total));
                        }
                        if c_idx != 0 {
                            out.add(
                                &Self::dest(&loc, Some((c, c_idx - 1))),
                                success * src * f64::from(c_idx) / f64::from(c_total),
                            );
                        }
                    }
                }
            }
            cursor.advance();
        }
        psv.main = out;
        psv.range = self.backward_range.clone();
    }

    fn backward(
        &self,
        input: &PeptideStateVector,
        num_edmans: &mut usize,
        output: &mut PeptideStateVector,
    ) {
        if *num_edmans > 0 {
            *num_edmans -= 1;
        }
        output.broken_n = input.broken_n.clone();
        output.p_detached = input.p_detached;
        if self.forward_range.is_empty() {
            output.range = self.forward_range.clone();
            return;
        }
        let mut out = Tensor::zeros(input.main.shape());
        // Walk `input.main`'s coordinates (read-only) rather than `out`'s: a
        // cursor and a mutation of the same tensor cannot be live together.
        let mut cursor = input.main.cursor(&self.forward_range);
        while !cursor.done() {
            let loc = cursor.loc().to_vec();
            let se = loc[0];
            let mut acc = self.p_edman_failure * input.main.get(&loc);
            let success = 1.0 - self.p_edman_failure;
            let residue = self.dye_seq.get(se);
            if residue < 0 {
                acc += success * input.main.get(&Self::dest(&loc, None));
            } else {
                let c = residue as usize;
                let c_idx = loc[1 + c] as u32;
                let c_total = self.dye_track.get(se, c);
                if c_total > 0 {
                    if c_idx != c_total {
                        acc += success * f64::from(c_total - c_idx) / f64::from(c_total)
                            * input.main.get(&Self::dest(&loc, None));
                    }
                    if c_idx != 0 {
                        acc += success * f64::from(c_idx) / f64::from(c_total)
                            * input.main.get(&Self::dest(&loc, Some((c, c_idx - 1))));
                    }
                }
            }
            out.set(&loc, acc);
            cursor.advance();
        }
        output.main = out;
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
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        let mut cursor = forward_psv.main.cursor(&self.forward_range);
        while !cursor.done() {
            let loc = cursor.loc().to_vec();
            if loc[1..].iter().any(|&x| x != 0) {
                let se = loc[0];
                let from = forward_psv.main.values()[cursor.index()];
                let bwd = backward_psv.main.get(&loc);
                let mut zero_cell = vec![0usize; loc.len()];
                zero_cell[0] = se;
                let next_bwd_zero = next_backward_psv.main.get(&zero_cell);
                numerator += from * self.p_edman_failure * next_bwd_zero / total_probability;
                denominator += from * bwd / total_probability;
            }
            cursor.advance();
        }
        let _ = num_edmans;
        fitter.p_edman_failure_fit.add(numerator, denominator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fseq_model::DyeSeq;

    fn seq_track(s: &str, channels: u32, t: usize) -> (Arc<DyeSeq>, Arc<DyeTrack>) {
        let seq = DyeSeq::new(s, channels).unwrap();
        let track = DyeTrack::from_dye_seq(&seq, t);
        (Arc::new(seq), Arc::new(track))
    }

    #[test]
    fn failure_probability_keeps_mass_at_same_edman_count() {
        let (seq, track) = seq_track("0", 1, 2);
        let mut step = EdmanTransition::new(seq, track, 1.0, 1, 0, None);
        let mut range = KDRange::new(vec![0, 0], vec![1, 2]);
        let mut allow = false;
        step.prune_forward(&mut range, &mut allow);

        let mut psv = PeptideStateVector::new(&[2, 2]);
        psv.main.set(&[0, 1], 1.0);
        psv.range = KDRange::new(vec![0, 0], vec![1, 2]);
        let mut num_edmans = 0;
        step.forward(&mut num_edmans, &mut psv);
        // p_edman_failure = 1.0, so all mass stays at edman-count 0.
        assert_eq!(psv.main.get(&[0, 1]), 1.0);
        assert_eq!(psv.main.get(&[1, 1]), 0.0);
    }

    #[test]
    fn success_moves_mass_forward_and_may_drop_a_dye() {
        let (seq, track) = seq_track("0", 1, 2);
        let mut step = EdmanTransition::new(seq, track, 0.0, 1, 0, None);
        let mut range = KDRange::new(vec![0, 0], vec![1, 2]);
        let mut allow = false;
        step.prune_forward(&mut range, &mut allow);

        let mut psv = PeptideStateVector::new(&[2, 2]);
        psv.main.set(&[0, 1], 1.0);
        psv.range = KDRange::new(vec![0, 0], vec![1, 2]);
        let mut num_edmans = 0;
        step.forward(&mut num_edmans, &mut psv);
        assert_eq!(num_edmans, 1);
        // c_idx=1, c_total=1 (dye_track at t=0,c=0 is 1): certain loss.
        assert_eq!(psv.main.get(&[1, 0]), 1.0);
        assert_eq!(psv.main.get(&[1, 1]), 0.0);
    }
}
