//! The pre-filter contract (§4.11's external collaborator) and a brute-force
//! k-NN reference implementation over dye-track feature vectors.

use fseq_model::{DyeTrack, Radiometry};
use std::sync::Arc;

/// One short-listed candidate: an index into the classifier's library, and
/// a coarse `score · library_count`-style weight (not the HMM's own score).
#[derive(Clone, Copy, Debug)]
pub struct PreFilterCandidate {
    pub index: usize,
    pub weighted_score: f64,
}

/// A pre-filter's verdict for one radiometry: up to `h` candidates plus a
/// `total` scalar summarizing the weight examined across the whole library,
/// used downstream to re-expand the pruned probability-mass denominator.
#[derive(Clone, Debug)]
pub struct PreFilterResult {
    pub candidates: Vec<PreFilterCandidate>,
    pub total: f64,
}

/// External collaborator narrowing a classifier's candidate library before
/// the (expensive) HMM is ever built. Determinism is not required.
pub trait PreFilter {
    fn filter(&self, radiometry: &Radiometry) -> PreFilterResult;
}

/// Brute-force k-NN: ranks the whole library by squared distance between
/// each dye track's expected intensity (`count · mu_c`) and the observed
/// radiometry, keeps the `k` nearest, and returns up to `h` of those as
/// candidates.
#[derive(Debug)]
pub struct KnnPreFilter {
    tracks: Vec<Arc<DyeTrack>>,
    channel_mus: Vec<f64>,
    k: usize,
    h: usize,
}

impl KnnPreFilter {
    #[must_use]
    pub fn new(tracks: Vec<Arc<DyeTrack>>, channel_mus: Vec<f64>, k: usize, h: usize) -> Self {
        Self {
            tracks,
            channel_mus,
            k,
            h,
        }
    }

    fn distance(&self, track: &DyeTrack, radiometry: &Radiometry) -> f64 {
        let mut acc = 0.0;
        for t in 0..radiometry.num_timesteps() {
            for c in 0..radiometry.num_channels() {
                let expected = f64::from(track.get(t, c)) * self.channel_mus[c];
                let diff = expected - radiometry.get(t, c);
                acc += diff * diff;
            }
        }
        acc
    }
}

impl PreFilter for KnnPreFilter {
    fn filter(&self, radiometry: &Radiometry) -> PreFilterResult {
        let mut scored: Vec<(usize, f64)> = self
            .tracks
            .iter()
            .enumerate()
            .map(|(index, track)| (index, (-self.distance(track, radiometry)).exp()))
            .collect();
        let total: f64 = scored.iter().map(|(_, score)| *score).sum();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(self.k.min(scored.len()));
        scored.truncate(self.h);
        let candidates = scored
            .into_iter()
            .map(|(index, weighted_score)| PreFilterCandidate {
                index,
                weighted_score,
            })
            .collect();
        PreFilterResult { candidates, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fseq_model::DyeSeq;

    fn track(s: &str) -> Arc<DyeTrack> {
        let seq = DyeSeq::new(s, 1).unwrap();
        Arc::new(DyeTrack::from_dye_seq(&seq, 2))
    }

    #[test]
    fn ranks_closest_track_first() {
        let filter = KnnPreFilter::new(vec![track("0"), track("")], vec![1.0], 5, 5);
        let radiometry = Radiometry::new(2, 1, vec![1.0, 0.0]);
        let result = filter.filter(&radiometry);
        assert_eq!(result.candidates[0].index, 0);
    }

    #[test]
    fn h_truncates_the_short_list() {
        let filter = KnnPreFilter::new(vec![track("0"), track(""), track("0")], vec![1.0], 5, 1);
        let radiometry = Radiometry::new(2, 1, vec![1.0, 0.0]);
        let result = filter.filter(&radiometry);
        assert_eq!(result.candidates.len(), 1);
    }
}
