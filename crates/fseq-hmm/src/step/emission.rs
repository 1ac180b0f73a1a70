//! Multiplies tensor cells (and the detached scalar) by the per-channel
//! observation density of one cycle's measured radiometry row, and prunes
//! each channel axis down to the band of dye counts the observation could
//! plausibly have come from.

use crate::state_vector::PeptideStateVector;
use crate::step::PeptideStep;
use fseq_fit::SequencingModelFitter;
use fseq_model::ChannelModel;
use fseq_tensor::KDRange;

/// Per-timestep cache of `prob(c, d) = pdf_c(radiometry[t, c] | d)` for
/// `d in [0, max_num_dyes]`, built once per (model, radiometry, timestep)
/// and shared across every candidate dye sequence evaluated against that
/// radiometry (spec §4.8's "emission precomputation").
#[derive(Clone, Debug)]
pub struct EmissionTable {
    /// `probs[c][d]`.
    probs: Vec<Vec<f64>>,
}

impl EmissionTable {
    #[must_use]
    pub fn build(channels: &[ChannelModel], observation: &[f64], max_num_dyes: usize) -> Self {
        let probs = channels
            .iter()
            .zip(observation)
            .map(|(ch, &x)| (0..=max_num_dyes).map(|d| ch.pdf(x, d as u32)).collect())
            .collect();
        Self { probs }
    }

    #[must_use]
    pub fn get(&self, channel: usize, d: u32) -> f64 {
        self.probs[channel]
            .get(d as usize)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Cutoff controlling how aggressively [`PeptideEmission`] prunes each
/// channel axis: `k = None` disables pruning entirely.
#[derive(Clone, Copy, Debug)]
pub struct DistributionCutoff(pub Option<f64>);

#[derive(Debug)]
pub struct PeptideEmission {
    table: EmissionTable,
    channels: Vec<ChannelModel>,
    observation: Vec<f64>,
    cutoff: DistributionCutoff,
    forward_range: KDRange,
    backward_range: KDRange,
    /// Whether the zero-dye-count cell survives pruning on every channel;
    /// if so the detached scalar may still receive emission evidence.
    detached_reachable: bool,
}

impl PeptideEmission {
    #[must_use]
    pub fn new(
        table: EmissionTable,
        channels: Vec<ChannelModel>,
        observation: Vec<f64>,
        cutoff: DistributionCutoff,
    ) -> Self {
        Self {
            table,
            channels,
            observation,
            cutoff,
            forward_range: KDRange::new(vec![], vec![]),
            backward_range: KDRange::new(vec![], vec![]),
            detached_reachable: true,
        }
    }

    /// Smallest `d_min <= d_max` band (per §4.8) on channel `c`, searched
    /// within `[lo, hi)`.
    fn band(&self, c: usize, lo: u32, hi: u32) -> (u32, u32) {
        let Some(k) = self.cutoff.0 else {
            return (lo, hi);
        };
        let ch = &self.channels[c];
        let x = self.observation[c];
        let mut d_min = lo;
        while d_min < hi && f64::from(d_min) * ch.mu + k * ch.sigma(d_min) <= x {
            d_min += 1;
        }
        let mut d_max = d_min;
        while d_max < hi && f64::from(d_max) * ch.mu - k * ch.sigma(d_max) <= x {
            d_max += 1;
        }
        (d_min, d_max)
    }
}

impl PeptideStep for PeptideEmission {
    fn prune_forward(&mut self, range: &mut KDRange, allow_detached: &mut bool) {
        let mut out = range.clone();
        let mut reachable = true;
        for c in 0..self.channels.len() {
            let axis = 1 + c;
            let (d_min, d_max) = self.band(c, range.min[axis], range.max[axis]);
            out.min[axis] = d_min;
            out.max[axis] = d_max;
            if d_min != 0 {
                reachable = false;
            }
        }
        self.detached_reachable = reachable && *allow_detached;
        *allow_detached = self.detached_reachable;
        self.forward_range = range.clone();
        self.backward_range = out.clone();
        *range = out;
    }

    fn prune_backward(&mut self, range: &mut KDRange, allow_detached: &mut bool) {
        self.backward_range = self.backward_range.intersect(range);
        self.forward_range = self.forward_range.intersect(&self.backward_range);
        self.detached_reachable = self.detached_reachable && *allow_detached;
        *range = self.forward_range.clone();
        *allow_detached = self.detached_reachable;
    }

    fn forward_range(&self) -> &KDRange {
        &self.forward_range
    }

    fn backward_range(&self) -> &KDRange {
        &self.backward_range
    }

    fn forward(&self, _num_edmans: &mut usize, psv: &mut PeptideStateVector) {
        if self.backward_range.is_empty() {
            psv.range = self.backward_range.clone();
            psv.p_detached = 0.0;
            return;
        }
        let weight = |loc: &[usize]| -> f64 {
            (0..self.channels.len())
                .map(|c| self.table.get(c, loc[1 + c] as u32))
                .product()
        };
        let mut cursor = psv.main.cursor(&self.backward_range);
        let mut updates = Vec::new();
        while !cursor.done() {
            let loc = cursor.loc().to_vec();
            let w = weight(&loc);
            updates.push((loc.clone(), psv.main.get(&loc) * w, psv.broken_n.get(&loc) * w));
            cursor.advance();
        }
        for (loc, m, b) in updates {
            psv.main.set(&loc, m);
            psv.broken_n.set(&loc, b);
        }
        if self.detached_reachable {
            let zero_weight: f64 = (0..self.channels.len()).map(|c| self.table.get(c, 0)).product();
            psv.p_detached *= zero_weight;
        } else {
            psv.p_detached = 0.0;
        }
        psv.range = self.backward_range.clone();
    }

    fn backward(
        &self,
        input: &PeptideStateVector,
        _num_edmans: &mut usize,
        output: &mut PeptideStateVector,
    ) {
        if self.backward_range.is_empty() {
            output.p_detached = 0.0;
            return;
        }
        let weight = |loc: &[usize]| -> f64 {
            (0..self.channels.len())
                .map(|c| self.table.get(c, loc[1 + c] as u32))
                .product()
        };
        let mut cursor = input.main.cursor(&self.backward_range);
        while !cursor.done() {
            let loc = cursor.loc().to_vec();
            let w = weight(&loc);
            output.main.set(&loc, input.main.get(&loc) * w);
            output.broken_n.set(&loc, input.broken_n.get(&loc) * w);
            cursor.advance();
        }
        if self.detached_reachable {
            let zero_weight: f64 = (0..self.channels.len()).map(|c| self.table.get(c, 0)).product();
            output.p_detached = input.p_detached * zero_weight;
        } else {
            output.p_detached = 0.0;
        }
        output.range = self.backward_range.clone();
    }

    fn improve_fit(
        &self,
        forward_psv: &PeptideStateVector,
        backward_psv: &PeptideStateVector,
        _next_backward_psv: &PeptideStateVector,
        _num_edmans: usize,
        total_probability: f64,
        fitter: &mut SequencingModelFitter,
    ) {
        if self.backward_range.is_empty() || total_probability == 0.0 {
            return;
        }
        let mut cursor = forward_psv.main.cursor(&self.backward_range);
        while !cursor.done() {
            let loc = cursor.loc().to_vec();
            let fwd = forward_psv.main.values()[cursor.index()] + forward_psv.broken_n.get(&loc);
            let bwd = backward_psv.main.get(&loc);
            let weight = fwd * bwd / total_probability;
            if weight > 0.0 {
                for c in 0..self.channels.len() {
                    fitter.channel_fits[c]
                        .distribution_fit
                        .add_sample(self.observation[c], loc[1 + c] as u32, weight);
                }
            }
            cursor.advance();
        }
        if self.detached_reachable {
            let weight = forward_psv.p_detached * backward_psv.p_detached / total_probability;
            if weight > 0.0 {
                for c in 0..self.channels.len() {
                    fitter.channel_fits[c]
                        .distribution_fit
                        .add_sample(self.observation[c], 0, weight);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> ChannelModel {
        ChannelModel {
            p_dud: 0.0,
            p_initial_bleach: 0.0,
            p_cyclic_bleach: 0.0,
            p_stuck_dye_loss: 0.0,
            stuck_dye_ratio: 0.0,
            mu: 1.0,
            sigma: 0.05,
            bg_sigma: 0.05,
        }
    }

    #[test]
    fn multiplies_cells_by_emission_density() {
        let table = EmissionTable::build(&[channel()], &[1.0], 2);
        let step = PeptideEmission::new(table, vec![channel()], vec![1.0], DistributionCutoff(None));
        let mut psv = PeptideStateVector::new(&[1, 3]);
        psv.main.set(&[0, 1], 1.0);
        psv.range = KDRange::full(&[1, 3]);
        let mut num_edmans = 0;
        // forward_range/backward_range default to empty; exercise via prune first.
        let mut step = step;
        let mut range = KDRange::full(&[1, 3]);
        let mut allow = true;
        step.prune_forward(&mut range, &mut allow);
        step.forward(&mut num_edmans, &mut psv);
        assert!(psv.main.get(&[0, 1]) > 0.0);
    }
}
