//! The HMM's state: a tensor over (Edman-count x per-channel dye-count),
//! plus the scalar auxiliary states the main tensor can leak into.

use fseq_tensor::{KDRange, Tensor};

/// State at one point in the peptide HMM pipeline: a `main` tensor, a
/// parallel `broken_n` tensor of identical shape, and the scalar
/// `p_detached`. `allow_detached` tracks whether the detached scalar is
/// live at this point in the pipeline (it is pruned away, alongside the
/// tensors' range, when a step's pruning shows it cannot matter).
#[derive(Clone, Debug)]
pub struct PeptideStateVector {
    pub main: Tensor,
    pub broken_n: Tensor,
    pub range: KDRange,
    pub p_detached: f64,
    pub allow_detached: bool,
}

impl PeptideStateVector {
    #[must_use]
    pub fn new(shape: &[usize]) -> Self {
        Self {
            main: Tensor::zeros(shape),
            broken_n: Tensor::zeros(shape),
            range: KDRange::full(&shape.iter().map(|&s| s as u32).collect::<Vec<_>>()),
            p_detached: 0.0,
            allow_detached: true,
        }
    }

    #[must_use]
    pub fn with_range(range: KDRange) -> Self {
        Self {
            main: Tensor::with_range(range.clone()),
            broken_n: Tensor::with_range(range.clone()),
            range,
            p_detached: 0.0,
            allow_detached: true,
        }
    }

    /// Puts unit probability mass at the starting cell
    /// `(0, dye_track_row_0...)` and zeroes everything else.
    pub fn initialize_from_start(&mut self, start_loc: &[usize]) {
        self.main.values_mut().iter_mut().for_each(|v| *v = 0.0);
        self.broken_n.values_mut().iter_mut().for_each(|v| *v = 0.0);
        self.main.set(start_loc, 1.0);
        self.p_detached = 0.0;
    }

    /// Boundary condition for the backward recursion: every live state
    /// trivially has probability 1 of explaining "the rest of nothing".
    pub fn initialize_from_finish(&mut self) {
        self.main.fill_range(&self.range, 1.0);
        self.broken_n.fill_range(&self.range, 1.0);
        if self.allow_detached {
            self.p_detached = 1.0;
        }
    }

    /// Total probability mass currently held by this state.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.main.sum(&self.range)
            + self.broken_n.sum(&self.range)
            + if self.allow_detached { self.p_detached } else { 0.0 }
    }

    /// Value at the designated start cell; used at the end of a full
    /// backward pass to recover the total probability.
    #[must_use]
    pub fn source(&self, start_loc: &[usize]) -> f64 {
        self.main.get(start_loc)
    }
}

/// Two-state (`dye`, `no_dye`) state vector for the auxiliary stuck-dye HMM.
#[derive(Clone, Copy, Debug, Default)]
pub struct StuckDyeStateVector {
    pub dye: f64,
    pub no_dye: f64,
}

impl StuckDyeStateVector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize_from_start(&mut self) {
        self.dye = 1.0;
        self.no_dye = 0.0;
    }

    pub fn initialize_from_finish(&mut self) {
        self.dye = 1.0;
        self.no_dye = 1.0;
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.dye + self.no_dye
    }

    #[must_use]
    pub fn source(&self) -> f64 {
        self.dye
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_state_is_unit_mass_at_designated_cell() {
        let mut sv = PeptideStateVector::new(&[2, 3]);
        sv.initialize_from_start(&[0, 0]);
        assert_eq!(sv.sum(), 1.0);
        assert_eq!(sv.main.get(&[0, 0]), 1.0);
    }

    #[test]
    fn finish_state_sums_to_range_volume_plus_detached() {
        let mut sv = PeptideStateVector::new(&[2, 2]);
        sv.initialize_from_finish();
        // 4 cells in main + 4 in broken_n + 1 detached
        assert_eq!(sv.sum(), 9.0);
    }

    #[test]
    fn stuck_dye_source_is_the_dye_branch() {
        let mut sv = StuckDyeStateVector::new();
        sv.initialize_from_start();
        assert_eq!(sv.source(), 1.0);
    }
}
