//! Per-dye independent loss on one channel: duds, initial bleach, cyclic
//! bleach all reduce to the same binomial transition, differing only in
//! which rate they read and which fitter slot `improve_fit` writes to.

use crate::step::PeptideStep;
use crate::state_vector::PeptideStateVector;
use fseq_fit::SequencingModelFitter;
use fseq_tensor::KDRange;
use std::sync::Arc;

/// Precomputed lower-triangular binomial table `P[n,k] = C(n,k) p^k q^(n-k)`
/// for a single per-dye loss rate `q`, extended lazily up to `max_n`.
#[derive(Debug)]
pub struct BinomialTable {
    rate: f64,
    rows: Vec<Vec<f64>>,
}

impl BinomialTable {
    #[must_use]
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Extends the table (if needed) so that `get(n, k)` is valid for every
    /// `n <= max_n`.
    pub fn reserve(&mut self, max_n: usize) {
        let p = 1.0 - self.rate;
        let q = self.rate;
        while self.rows.len() <= max_n {
            let n = self.rows.len();
            let mut row = vec![0.0; n + 1];
            if n == 0 {
                row[0] = 1.0;
            } else {
                let prev = &self.rows[n - 1];
                for (k, slot) in row.iter_mut().enumerate() {
                    let from_survivor = if k >= 1 { prev[k - 1] * p } else { 0.0 };
                    let from_loss = if k < n { prev[k] * q } else { 0.0 };
                    *slot = from_survivor + from_loss;
                }
            }
            self.rows.push(row);
        }
    }

    #[must_use]
    pub fn get(&self, n: usize, k: usize) -> f64 {
        self.rows[n][k]
    }

    #[must_use]
    pub fn max_n(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }
}

/// Which of `SequencingModelFitter`'s channel-level accumulators an
/// `improve_fit` call should add its evidence to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinomialKind {
    Dud,
    InitialBleach,
    CyclicBleach,
}

/// One step applying `BinomialTable` along one channel axis of the tensor.
#[derive(Debug)]
pub struct BinomialTransition {
    kind: BinomialKind,
    channel: usize,
    axis: usize,
    table: Arc<BinomialTable>,
    forward_range: KDRange,
    backward_range: KDRange,
}

impl BinomialTransition {
    #[must_use]
    pub fn new(kind: BinomialKind, channel: usize, table: Arc<BinomialTable>) -> Self {
        Self {
            kind,
            channel,
            axis: 1 + channel,
            table,
            forward_range: KDRange::new(vec![], vec![]),
            backward_range: KDRange::new(vec![], vec![]),
        }
    }
}

impl PeptideStep for BinomialTransition {
    fn prune_forward(&mut self, range: &mut KDRange, _allow_detached: &mut bool) {
        self.forward_range = range.clone();
        let mut backward = range.clone();
        backward.widen_min(self.axis, 0);
        self.backward_range = backward.clone();
        *range = backward;
    }

    fn prune_backward(&mut self, range: &mut KDRange, _allow_detached: &mut bool) {
        self.backward_range = self.backward_range.intersect(range);
        let mut forward_requirement = self.backward_range.clone();
        forward_requirement.widen_max(self.axis, u32::MAX);
        self.forward_range = self.forward_range.intersect(&forward_requirement);
        *range = forward_requirement;
    }

    fn forward_range(&self) -> &KDRange {
        &self.forward_range
    }

    fn backward_range(&self) -> &KDRange {
        &self.backward_range
    }

    fn forward(&self, _num_edmans: &mut usize, psv: &mut PeptideStateVector) {
        if self.forward_range.is_empty() || self.backward_range.is_empty() {
            return;
        }
        let axis = self.axis;
        let in_len = (self.forward_range.max[axis] - self.forward_range.min[axis]) as usize;
        let out_len = (self.backward_range.max[axis] - self.backward_range.min[axis]) as usize;
        let stride = psv.main.stride(axis);
        let count = psv.main.vector_count(&self.forward_range, axis);
        let mut scratch = vec![0.0; out_len];
        for combo in 0..count {
            let in_base = psv.main.vector_base(&self.forward_range, axis, combo);
            let out_base = psv.main.vector_base(&self.backward_range, axis, combo);
            scratch.iter_mut().for_each(|v| *v = 0.0);
            for (k_rel, slot) in scratch.iter_mut().enumerate() {
                let k = self.backward_range.min[axis] as usize + k_rel;
                let mut acc = 0.0;
                for n_rel in 0..in_len {
                    let n = self.forward_range.min[axis] as usize + n_rel;
                    if n < k {
                        continue;
                    }
                    acc += self.table.get(n, k) * psv.main.values()[in_base + n_rel * stride];
                }
                *slot = acc;
            }
            for (k_rel, &value) in scratch.iter().enumerate() {
                psv.main.values_mut()[out_base + k_rel * stride] = value;
            }
        }
        // Broken-N tensor undergoes the same loss process independently.
        let mut scratch_broken = vec![0.0; out_len];
        for combo in 0..count {
            let in_base = psv.broken_n.vector_base(&self.forward_range, axis, combo);
            let out_base = psv.broken_n.vector_base(&self.backward_range, axis, combo);
            scratch_broken.iter_mut().for_each(|v| *v = 0.0);
            for (k_rel, slot) in scratch_broken.iter_mut().enumerate() {
                let k = self.backward_range.min[axis] as usize + k_rel;
                let mut acc = 0.0;
                for n_rel in 0..in_len {
                    let n = self.forward_range.min[axis] as usize + n_rel;
                    if n < k {
                        continue;
                    }
                    acc += self.table.get(n, k) * psv.broken_n.values()[in_base + n_rel * stride];
                }
                *slot = acc;
            }
            for (k_rel, &value) in scratch_broken.iter().enumerate() {
                psv.broken_n.values_mut()[out_base + k_rel * stride] = value;
            }
        }
    }

    fn backward(
        &self,
        input: &PeptideStateVector,
        _num_edmans: &mut usize,
        output: &mut PeptideStateVector,
    ) {
        if self.forward_range.is_empty() || self.backward_range.is_empty() {
            output.p_detached = input.p_detached;
            return;
        }
        let axis = self.axis;
        let in_len = (self.backward_range.max[axis] - self.backward_range.min[axis]) as usize;
        let out_len = (self.forward_range.max[axis] - self.forward_range.min[axis]) as usize;
        let stride = input.main.stride(axis);
        let count = input.main.vector_count(&self.backward_range, axis);
        let mut scratch = vec![0.0; out_len];
        for combo in 0..count {
            let in_base = input.main.vector_base(&self.backward_range, axis, combo);
            let out_base = output.main.vector_base(&self.forward_range, axis, combo);
            scratch.iter_mut().for_each(|v| *v = 0.0);
            for (n_rel, slot) in scratch.iter_mut().enumerate() {
                let n = self.forward_range.min[axis] as usize + n_rel;
                let mut acc = 0.0;
                for k_rel in 0..in_len {
                    let k = self.backward_range.min[axis] as usize + k_rel;
                    if k > n {
                        continue;
                    }
                    acc += self.table.get(n, k) * input.main.values()[in_base + k_rel * stride];
                }
                *slot = acc;
            }
            for (n_rel, &value) in scratch.iter().enumerate() {
                output.main.values_mut()[out_base + n_rel * stride] = value;
            }
        }
        let mut scratch_broken = vec![0.0; out_len];
        for combo in 0..count {
            let in_base = input.broken_n.vector_base(&self.backward_range, axis, combo);
            let out_base = output.broken_n.vector_base(&self.forward_range, axis, combo);
            scratch_broken.iter_mut().for_each(|v| *v = 0.0);
            for (n_rel, slot) in scratch_broken.iter_mut().enumerate() {
                let n = self.forward_range.min[axis] as usize + n_rel;
                let mut acc = 0.0;
                for k_rel in 0..in_len {
                    let k = self.backward_range.min[axis] as usize + k_rel;
                    if k > n {
                        continue;
                    }
                    acc += self.table.get(n, k) * input.broken_n.values()[in_base + k_rel * stride];
                }
                *slot = acc;
            }
            for (n_rel, &value) in scratch_broken.iter().enumerate() {
                output.broken_n.values_mut()[out_base + n_rel * stride] = value;
            }
        }
        output.p_detached = input.p_detached;
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
        if self.forward_range.is_empty() || self.backward_range.is_empty() {
            return;
        }
        let axis = self.axis;
        let in_len = (self.forward_range.max[axis] - self.forward_range.min[axis]) as usize;
        let stride = forward_psv.main.stride(axis);
        let count = forward_psv.main.vector_count(&self.forward_range, axis);
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for combo in 0..count {
            let fwd_base = forward_psv.main.vector_base(&self.forward_range, axis, combo);
            let next_base = next_backward_psv
                .main
                .vector_base(&self.backward_range, axis, combo);
            let bwd_base = backward_psv.main.vector_base(&self.forward_range, axis, combo);
            for n_rel in 0..in_len {
                let n = self.forward_range.min[axis] as usize + n_rel;
                if n == 0 {
                    continue;
                }
                let from = forward_psv.main.values()[fwd_base + n_rel * stride];
                let bwd_at_n = backward_psv.main.values()[bwd_base + n_rel * stride];
                denominator += from * bwd_at_n / total_probability * n as f64;
                for k in 0..n {
                    if k < self.backward_range.min[axis] as usize
                        || k >= self.backward_range.max[axis] as usize
                    {
                        continue;
                    }
                    let k_rel = k - self.backward_range.min[axis] as usize;
                    let next_bwd = next_backward_psv.main.values()[next_base + k_rel * stride];
                    numerator +=
                        from * self.table.get(n, k) * next_bwd / total_probability * (n - k) as f64;
                }
            }
        }
        let slot = match self.kind {
            BinomialKind::Dud => &mut fitter.channel_fits[self.channel].p_dud_fit,
            BinomialKind::InitialBleach => {
                &mut fitter.channel_fits[self.channel].p_initial_bleach_fit
            }
            BinomialKind::CyclicBleach => {
                &mut fitter.channel_fits[self.channel].p_cyclic_bleach_fit
            }
        };
        slot.add(numerator, denominator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_sum_to_one() {
        let mut t = BinomialTable::new(0.3);
        t.reserve(5);
        for n in 0..=5 {
            let total: f64 = (0..=n).map(|k| t.get(n, k)).sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_rate_is_identity() {
        let mut t = BinomialTable::new(0.0);
        t.reserve(4);
        for n in 0..=4 {
            assert!((t.get(n, n) - 1.0).abs() < 1e-12);
            for k in 0..n {
                assert!(t.get(n, k).abs() < 1e-12);
            }
        }
    }
}
