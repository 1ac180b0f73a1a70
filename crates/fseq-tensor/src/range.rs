//! Axis-aligned active region of a [`crate::Tensor`].

/// Half-open-per-axis box in ℕᵈ: `min[i] <= coord[i] < max[i]`.
///
/// The single source of truth for "which tensor entries currently matter".
/// Every step reads a range from its neighbor during pruning and writes one
/// back; ranges are only ever narrowed, never widened, as they pass through
/// a pipeline of steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KDRange {
    pub min: Vec<u32>,
    pub max: Vec<u32>,
}

impl KDRange {
    #[must_use]
    pub fn new(min: Vec<u32>, max: Vec<u32>) -> Self {
        assert_eq!(min.len(), max.len(), "KDRange min/max must share order");
        Self { min, max }
    }

    /// The full range covering `shape`, i.e. `min = 0`, `max = shape`.
    #[must_use]
    pub fn full(shape: &[u32]) -> Self {
        Self {
            min: vec![0; shape.len()],
            max: shape.to_vec(),
        }
    }

    #[must_use]
    pub fn order(&self) -> usize {
        self.min.len()
    }

    /// Elementwise max of mins, min of maxes. May produce an empty range.
    #[must_use]
    pub fn intersect(&self, other: &KDRange) -> KDRange {
        debug_assert_eq!(self.order(), other.order());
        let min = self
            .min
            .iter()
            .zip(&other.min)
            .map(|(a, b)| *a.max(b))
            .collect();
        let max = self
            .max
            .iter()
            .zip(&other.max)
            .map(|(a, b)| *a.min(b))
            .collect();
        KDRange { min, max }
    }

    /// True iff any axis has collapsed (`min >= max`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.iter().zip(&self.max).any(|(mn, mx)| mn >= mx)
    }

    /// True iff every axis starts at zero, i.e. the origin cell is included.
    #[must_use]
    pub fn includes_zero(&self) -> bool {
        self.min.iter().all(|&m| m == 0)
    }

    /// Shape this range would imply if used as a whole-tensor extent.
    #[must_use]
    pub fn shape(&self) -> Vec<u32> {
        self.max.clone()
    }

    /// Widen axis `axis`'s `min` down to `new_min` (never raises it).
    pub fn widen_min(&mut self, axis: usize, new_min: u32) {
        self.min[axis] = self.min[axis].min(new_min);
    }

    /// Widen axis `axis`'s `max` up to `new_max` (never lowers it).
    pub fn widen_max(&mut self, axis: usize, new_max: u32) {
        self.max[axis] = self.max[axis].max(new_max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn intersect_is_commutative_on_emptiness() {
        let a = KDRange::new(vec![0, 2], vec![5, 5]);
        let b = KDRange::new(vec![1, 0], vec![3, 3]);
        assert_eq!(a.intersect(&b), b.intersect(&a));
    }

    #[test]
    fn full_includes_zero() {
        let r = KDRange::full(&[3, 4]);
        assert!(r.includes_zero());
        assert!(!r.is_empty());
    }

    #[test]
    fn disjoint_ranges_intersect_to_empty() {
        let a = KDRange::new(vec![0], vec![2]);
        let b = KDRange::new(vec![5], vec![9]);
        assert!(a.intersect(&b).is_empty());
    }

    proptest! {
        #[test]
        fn intersect_never_widens(
            amin in 0u32..10, amax in 0u32..20,
            bmin in 0u32..10, bmax in 0u32..20,
        ) {
            let a = KDRange::new(vec![amin], vec![amax]);
            let b = KDRange::new(vec![bmin], vec![bmax]);
            let i = a.intersect(&b);
            prop_assert!(i.min[0] >= a.min[0] && i.min[0] >= b.min[0]);
            prop_assert!(i.max[0] <= a.max[0] && i.max[0] <= b.max[0]);
        }
    }
}
