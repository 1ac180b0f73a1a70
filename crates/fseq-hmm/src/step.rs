//! The narrow capability interface every HMM link implements.
//!
//! One trait per state-vector kind, each with five small phases: prune the
//! active range forward and backward, then do the numerical work (forward,
//! backward, improve_fit). The set of concrete steps is closed and known at
//! compile time, so the HMM engine holds `Vec<Box<dyn PeptideStep>>` rather
//! than anything more dynamic.

pub mod binomial;
pub mod broken_n;
pub mod detach;
pub mod edman;
pub mod emission;
pub mod stuck_dye;

use crate::state_vector::{PeptideStateVector, StuckDyeStateVector};
use fseq_fit::SequencingModelFitter;
use fseq_tensor::KDRange;

/// One link in the peptide HMM's chain.
///
/// `prune_forward`/`prune_backward` are called once per HMM evaluation,
/// before any numerical work, and may only narrow the range/allow_detached
/// flag they are handed — never widen it. Implementations store both
/// computed ranges so `forward`/`backward`/`improve_fit` can use them
/// without recomputation.
pub trait PeptideStep {
    fn prune_forward(&mut self, range: &mut KDRange, allow_detached: &mut bool);
    fn prune_backward(&mut self, range: &mut KDRange, allow_detached: &mut bool);

    /// The range this step promises to produce for its successor, as
    /// computed by the most recent `prune_forward` call.
    fn forward_range(&self) -> &KDRange;
    /// The range this step requires from its predecessor, as computed by
    /// the most recent `prune_backward` call.
    fn backward_range(&self) -> &KDRange;

    fn forward(&self, num_edmans: &mut usize, psv: &mut PeptideStateVector);
    fn backward(
        &self,
        input: &PeptideStateVector,
        num_edmans: &mut usize,
        output: &mut PeptideStateVector,
    );

    #[allow(clippy::too_many_arguments)]
    fn improve_fit(
        &self,
        forward_psv: &PeptideStateVector,
        backward_psv: &PeptideStateVector,
        next_backward_psv: &PeptideStateVector,
        num_edmans: usize,
        total_probability: f64,
        fitter: &mut SequencingModelFitter,
    );
}

/// One link in the auxiliary stuck-dye HMM's chain. No pruning phase: the
/// state space is two scalars, always fully live.
pub trait StuckDyeStep {
    fn forward(&self, sv: &mut StuckDyeStateVector);
    fn backward(&self, input: &StuckDyeStateVector, output: &mut StuckDyeStateVector);
    fn improve_fit(
        &self,
        forward_sv: &StuckDyeStateVector,
        backward_sv: &StuckDyeStateVector,
        next_backward_sv: &StuckDyeStateVector,
        total_probability: f64,
        fitter: &mut SequencingModelFitter,
    );
}
