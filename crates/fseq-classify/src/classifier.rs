//! Scores a radiometry against a library of candidate dye sequences,
//! optionally narrowed by a [`PreFilter`], and reduces a whole batch in
//! parallel via rayon.

use crate::prefilter::PreFilter;
use fseq_hmm::{
    DistributionCutoff, PeptideHmm, PerDyeSeqPrecomputation, PerRadiometryPrecomputation,
    UniversalPrecomputation,
};
use fseq_model::{Radiometry, SequencingModel};
use rayon::prelude::*;
use tracing::debug;

/// One entry in a classifier's candidate library: a dye sequence's
/// precomputation, the library id it reports under, and its multiplicity
/// (how many physical peptides share this dye sequence).
pub struct LibraryEntry {
    pub dye_seq_pc: PerDyeSeqPrecomputation,
    pub library_id: i64,
    pub count: u32,
}

/// The outcome of classifying one radiometry: the winning library id
/// (`-1` if none), its raw HMM score, and the total probability mass
/// summed across every candidate considered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredClassification {
    pub id: i64,
    pub score: f64,
    pub total: f64,
}

impl ScoredClassification {
    /// `score / total`, or `0.0` when `total` is zero (no candidate
    /// produced any probability mass).
    #[must_use]
    pub fn adjusted_score(&self) -> f64 {
        if self.total > 0.0 {
            self.score / self.total
        } else {
            0.0
        }
    }
}

pub struct Classifier<'a> {
    model: &'a SequencingModel,
    universal: &'a UniversalPrecomputation,
    library: &'a [LibraryEntry],
    cutoff: DistributionCutoff,
}

impl<'a> Classifier<'a> {
    #[must_use]
    pub fn new(
        model: &'a SequencingModel,
        universal: &'a UniversalPrecomputation,
        library: &'a [LibraryEntry],
        cutoff: DistributionCutoff,
    ) -> Self {
        Self {
            model,
            universal,
            library,
            cutoff,
        }
    }

    /// Classifies one radiometry, per spec §4.11.
    pub fn classify(
        &self,
        radiometry: &Radiometry,
        prefilter: Option<&dyn PreFilter>,
    ) -> ScoredClassification {
        let max_num_dyes = self
            .library
            .iter()
            .flat_map(|entry| {
                (0..radiometry.num_channels()).map(move |c| {
                    (0..radiometry.num_timesteps())
                        .map(|t| entry.dye_seq_pc.dye_track.get(t, c))
                        .max()
                        .unwrap_or(0)
                })
            })
            .max()
            .unwrap_or(0) as usize;
        let radiometry_pc = PerRadiometryPrecomputation::build(self.model, radiometry, max_num_dyes);

        let prefilter_result = prefilter.map(|pf| pf.filter(radiometry));
        let (indices, pre_total, pre_subtotal): (Vec<usize>, f64, f64) =
            match &prefilter_result {
                Some(result) => {
                    let pre_subtotal: f64 =
                        result.candidates.iter().map(|c| c.weighted_score).sum();
                    (
                        result.candidates.iter().map(|c| c.index).collect(),
                        result.total,
                        pre_subtotal,
                    )
                }
                None => ((0..self.library.len()).collect(), 0.0, 0.0),
            };

        let mut best_score = 0.0_f64;
        let mut best_id = -1_i64;
        let mut total_mass = 0.0_f64;
        let mut positive_found = false;

        for index in indices {
            let entry = &self.library[index];
            let hmm = PeptideHmm::build(
                self.model,
                self.universal,
                &entry.dye_seq_pc,
                radiometry,
                &radiometry_pc,
                self.cutoff,
            );
            let p = hmm.probability() * f64::from(entry.count);
            if p == 0.0 {
                debug!(library_id = entry.library_id, "empty-range HMM, skipping");
            }
            total_mass += p;
            if p > best_score {
                best_score = p;
                best_id = entry.library_id;
                positive_found = true;
            }
        }

        if prefilter_result.is_some() && pre_subtotal > 0.0 {
            total_mass *= pre_total / pre_subtotal;
        }

        if !positive_found {
            if let Some(result) = &prefilter_result {
                if let Some(top) = result
                    .candidates
                    .iter()
                    .max_by(|a, b| a.weighted_score.total_cmp(&b.weighted_score))
                {
                    best_id = self.library[top.index].library_id;
                }
            }
        }

        ScoredClassification {
            id: best_id,
            score: best_score,
            total: total_mass,
        }
    }

    /// Classifies a whole batch, partitioning radiometries across threads
    /// via rayon (spec §5's classifier-boundary parallelism).
    pub fn classify_all(
        &self,
        radiometries: &[Radiometry],
        prefilter: Option<&(dyn PreFilter + Sync)>,
    ) -> Vec<ScoredClassification>
    where
        Self: Sync,
    {
        radiometries
            .par_iter()
            .map(|radiometry| {
                self.classify(radiometry, prefilter.map(|pf| pf as &dyn PreFilter))
            })
            .collect()
    }
}
