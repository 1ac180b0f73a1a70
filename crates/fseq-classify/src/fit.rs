//! Parallel reduction of Baum-Welch sufficient statistics across many
//! (dye sequence, radiometry) pairs (spec §5, §4.12): each pair is scored
//! independently via its own [`PeptideHmm`], and the resulting
//! [`SequencingModelFitter`]s are combined associatively via rayon's
//! fold/reduce, mirroring [`crate::classifier::Classifier::classify_all`]'s
//! partitioning of independent HMM work across threads.

use fseq_fit::SequencingModelFitter;
use fseq_hmm::{
    DistributionCutoff, PeptideHmm, PerDyeSeqPrecomputation, PerRadiometryPrecomputation,
    UniversalPrecomputation,
};
use fseq_model::{Radiometry, SequencingModel};
use rayon::prelude::*;

/// One training example: a radiometry paired with the dye sequence's
/// precomputation it is assumed to have come from. Building this pairing
/// (e.g. from a classifier's chosen candidate, or from simulated-data
/// ground truth) is the caller's responsibility; this module only runs the
/// HMMs and reduces their statistics.
pub struct FitPair<'a> {
    pub dye_seq_pc: &'a PerDyeSeqPrecomputation,
    pub radiometry: &'a Radiometry,
}

/// Runs one Baum-Welch accumulation epoch across every pair and returns the
/// combined fitter. `num_timesteps` sizes the per-cycle decaying-rate
/// accumulators and should be the longest radiometry length in `pairs`.
#[must_use]
pub fn accumulate_fit(
    model: &SequencingModel,
    universal: &UniversalPrecomputation,
    pairs: &[FitPair<'_>],
    max_num_dyes: usize,
    num_timesteps: usize,
    cutoff: DistributionCutoff,
) -> SequencingModelFitter {
    let num_channels = model.num_channels();
    pairs
        .par_iter()
        .fold(
            || SequencingModelFitter::new(num_channels, num_timesteps),
            |mut acc, pair| {
                let radiometry_pc =
                    PerRadiometryPrecomputation::build(model, pair.radiometry, max_num_dyes);
                let hmm = PeptideHmm::build(
                    model,
                    universal,
                    pair.dye_seq_pc,
                    pair.radiometry,
                    &radiometry_pc,
                    cutoff,
                );
                hmm.improve_fit(&mut acc);
                acc
            },
        )
        .reduce(
            || SequencingModelFitter::new(num_channels, num_timesteps),
            |mut a, b| {
                a.combine(&b);
                a
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fseq_model::{ChannelModel, DecayingRateModel, DyeSeq};
    use std::sync::Arc;

    fn model() -> SequencingModel {
        SequencingModel {
            p_edman_failure: 0.1,
            initial_detach: DecayingRateModel::constant(0.05),
            cyclic_detach: DecayingRateModel::constant(0.05),
            p_initial_break_n: 0.0,
            p_cyclic_break_n: 0.0,
            channel_models: vec![ChannelModel {
                p_dud: 0.05,
                p_initial_bleach: 0.05,
                p_cyclic_bleach: 0.05,
                p_stuck_dye_loss: 0.0,
                stuck_dye_ratio: 0.0,
                mu: 1.0,
                sigma: 0.16,
                bg_sigma: 0.05,
            }],
            max_failed_edmans: None,
        }
    }

    #[test]
    fn accumulates_evidence_across_several_pairs() {
        let model = model();
        let universal = UniversalPrecomputation::build(&model, 2);
        let seq = Arc::new(DyeSeq::new("0", 1).unwrap());
        let dye_seq_pc = PerDyeSeqPrecomputation::build(seq, 2);
        let radiometries = vec![
            Radiometry::new(2, 1, vec![1.0, 0.0]),
            Radiometry::new(2, 1, vec![1.0, 1.0]),
        ];
        let pairs: Vec<FitPair<'_>> = radiometries
            .iter()
            .map(|r| FitPair {
                dye_seq_pc: &dye_seq_pc,
                radiometry: r,
            })
            .collect();
        let fitter = accumulate_fit(&model, &universal, &pairs, 2, 2, DistributionCutoff(None));
        assert!(fitter.p_edman_failure_fit.denominator > 0.0);
    }
}
