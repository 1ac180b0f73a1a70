//! Dense row-major d-dimensional array of `f64`, restricted to an active
//! [`KDRange`] sub-box.

use crate::iter::RangeIter;
use crate::range::KDRange;
use crate::vector::{Vector, VectorMut};

/// Owns a contiguous value buffer of length `shape.iter().product()`, plus
/// the [`KDRange`] describing which of those entries currently hold
/// meaningful data. Entries outside the range are left over from a previous
/// use and must not be read.
#[derive(Clone, Debug)]
pub struct Tensor {
    shape: Vec<usize>,
    strides: Vec<usize>,
    data: Vec<f64>,
    range: KDRange,
}

fn strides_for(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    for o in (0..shape.len().saturating_sub(1)).rev() {
        strides[o] = strides[o + 1] * shape[o + 1];
    }
    strides
}

impl Tensor {
    /// Zero-filled buffer covering the whole `shape`; initial range is full.
    #[must_use]
    pub fn zeros(shape: &[usize]) -> Self {
        let size: usize = shape.iter().product();
        Self {
            strides: strides_for(shape),
            shape: shape.to_vec(),
            data: vec![0.0; size],
            range: KDRange::full(&shape.iter().map(|&s| s as u32).collect::<Vec<_>>()),
        }
    }

    /// Zero-filled buffer whose shape is `range.max`; initial valid sub-box
    /// is `range` itself.
    #[must_use]
    pub fn with_range(range: KDRange) -> Self {
        let shape: Vec<usize> = range.max.iter().map(|&m| m as usize).collect();
        let size: usize = shape.iter().product();
        Self {
            strides: strides_for(&shape),
            shape,
            data: vec![0.0; size],
            range,
        }
    }

    #[must_use]
    pub fn order(&self) -> usize {
        self.shape.len()
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn range(&self) -> &KDRange {
        &self.range
    }

    pub fn set_range(&mut self, range: KDRange) {
        self.range = range;
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    fn flat_index(&self, loc: &[usize]) -> usize {
        loc.iter().zip(&self.strides).map(|(l, s)| l * s).sum()
    }

    #[must_use]
    pub fn get(&self, loc: &[usize]) -> f64 {
        self.data[self.flat_index(loc)]
    }

    pub fn set(&mut self, loc: &[usize], value: f64) {
        let idx = self.flat_index(loc);
        self.data[idx] = value;
    }

    pub fn add(&mut self, loc: &[usize], value: f64) {
        let idx = self.flat_index(loc);
        self.data[idx] += value;
    }

    /// Sum of every entry within `range`.
    #[must_use]
    pub fn sum(&self, range: &KDRange) -> f64 {
        let mut it = RangeIter::new(range, &self.shape);
        let mut total = 0.0;
        while !it.done() {
            total += self.data[it.index()];
            it.advance();
        }
        total
    }

    /// Row-major cursor over every coordinate in `range`.
    #[must_use]
    pub fn cursor<'a>(&self, range: &'a KDRange) -> RangeIter<'a> {
        RangeIter::new(range, &self.shape)
    }

    /// Row-major stride of `axis` in this tensor's backing buffer.
    #[must_use]
    pub fn stride(&self, axis: usize) -> usize {
        self.strides[axis]
    }

    /// Number of strided vectors along `axis` implied by `range`'s
    /// projection onto the other axes.
    ///
    /// Public because some steps (e.g. the binomial transitions) need to
    /// pair up same-shaped vectors from two different tensors and so must
    /// drive the combo loop themselves rather than going through
    /// [`Tensor::for_each_vector`].
    #[must_use]
    pub fn vector_count(&self, range: &KDRange, axis: usize) -> usize {
        (0..self.order())
            .filter(|&o| o != axis)
            .map(|o| (range.max[o] - range.min[o]) as usize)
            .product()
    }

    /// Flat index of the first cell (`axis` coordinate = `range.min[axis]`)
    /// of the `combo`-th vector along `axis` within `range`.
    #[must_use]
    pub fn vector_base(&self, range: &KDRange, axis: usize, combo: usize) -> usize {
        let other_axes: Vec<usize> = (0..self.order()).filter(|&o| o != axis).collect();
        let dims: Vec<usize> = other_axes
            .iter()
            .map(|&o| (range.max[o] - range.min[o]) as usize)
            .collect();
        let mut rem = combo;
        let mut base = range.min[axis] as usize * self.strides[axis];
        for k in (0..other_axes.len()).rev() {
            let d = dims[k];
            let coord = if d == 0 { 0 } else { rem % d };
            if d != 0 {
                rem /= d;
            }
            let o = other_axes[k];
            base += (range.min[o] as usize + coord) * self.strides[o];
        }
        base
    }

    /// Invoke `f` once per strided vector along `axis` within `range`,
    /// read-only. Each vector has length `range.max[axis] - range.min[axis]`.
    pub fn for_each_vector(&self, range: &KDRange, axis: usize, mut f: impl FnMut(Vector<'_>)) {
        if range.is_empty() {
            return;
        }
        let len = (range.max[axis] - range.min[axis]) as usize;
        let stride = self.strides[axis];
        let count = self.vector_count(range, axis);
        for combo in 0..count {
            let base = self.vector_base(range, axis, combo);
            f(Vector {
                data: &self.data,
                base,
                stride,
                len,
            });
        }
    }

    /// Mutable counterpart of [`Tensor::for_each_vector`].
    pub fn for_each_vector_mut(
        &mut self,
        range: &KDRange,
        axis: usize,
        mut f: impl FnMut(VectorMut<'_>),
    ) {
        if range.is_empty() {
            return;
        }
        let len = (range.max[axis] - range.min[axis]) as usize;
        let stride = self.strides[axis];
        let count = self.vector_count(range, axis);
        for combo in 0..count {
            let base = self.vector_base(range, axis, combo);
            f(VectorMut {
                data: &mut self.data,
                base,
                stride,
                len,
            });
        }
    }

    /// Multiply every entry in `range` by `factor`.
    pub fn scale(&mut self, range: &KDRange, factor: f64) {
        let mut it = RangeIter::new(range, &self.shape);
        while !it.done() {
            self.data[it.index()] *= factor;
            it.advance();
        }
    }

    /// Copy every entry in `range` from `other` (same shape) into `self`.
    pub fn copy_from(&mut self, other: &Tensor, range: &KDRange) {
        let mut it = RangeIter::new(range, &self.shape);
        while !it.done() {
            self.data[it.index()] = other.data[it.index()];
            it.advance();
        }
    }

    /// Zero every entry in `range`.
    pub fn zero_range(&mut self, range: &KDRange) {
        let mut it = RangeIter::new(range, &self.shape);
        while !it.done() {
            self.data[it.index()] = 0.0;
            it.advance();
        }
    }

    /// Set every entry in `range` to `value`.
    pub fn fill_range(&mut self, range: &KDRange, value: f64) {
        let mut it = RangeIter::new(range, &self.shape);
        while !it.done() {
            self.data[it.index()] = value;
            it.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_then_set_get_roundtrip() {
        let mut t = Tensor::zeros(&[2, 3]);
        t.set(&[1, 2], 4.5);
        assert_eq!(t.get(&[1, 2]), 4.5);
        assert_eq!(t.get(&[0, 0]), 0.0);
    }

    #[test]
    fn sum_restricted_to_range_ignores_outside_cells() {
        let mut t = Tensor::zeros(&[3, 3]);
        for r in 0..3 {
            for c in 0..3 {
                t.set(&[r, c], 1.0);
            }
        }
        let sub = KDRange::new(vec![1, 1], vec![2, 2]);
        assert_eq!(t.sum(&sub), 1.0);
    }

    #[test]
    fn vector_iteration_covers_every_projection() {
        let mut t = Tensor::zeros(&[2, 3]);
        let full = KDRange::full(&[2, 3]);
        t.for_each_vector_mut(&full, 1, |mut v| {
            for k in 0..v.len() {
                v.set(k, k as f64);
            }
        });
        assert_eq!(t.get(&[0, 0]), 0.0);
        assert_eq!(t.get(&[0, 2]), 2.0);
        assert_eq!(t.get(&[1, 1]), 1.0);
    }

    #[test]
    fn single_axis_tensor_has_one_vector() {
        let mut t = Tensor::zeros(&[4]);
        let full = KDRange::full(&[4]);
        let mut seen = 0;
        t.for_each_vector_mut(&full, 0, |v| {
            seen += 1;
            assert_eq!(v.len(), 4);
        });
        assert_eq!(seen, 1);
    }
}
