//! Dense tensors and axis-aligned range algebra underlying the
//! fluorosequencing HMM engine.
//!
//! This crate has no notion of dye sequences, radiometries, or probability
//! models; it is pure numeric plumbing: [`KDRange`] describes "where in the
//! tensor is there anything nonzero", [`Tensor`] is the dense row-major
//! buffer, and [`Vector`]/[`VectorMut`] are strided 1-D slices through one
//! tensor axis.

mod iter;
mod range;
mod tensor;
mod vector;

pub use iter::RangeIter;
pub use range::KDRange;
pub use tensor::Tensor;
pub use vector::{Vector, VectorMut};
