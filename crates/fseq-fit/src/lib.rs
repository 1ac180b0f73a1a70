//! Baum-Welch sufficient-statistics accumulators.
//!
//! Every type here is a pure accumulator: associative under `combine`
//! (mirroring `+=` in the source material), scalable under `scale`
//! (mirroring `*=`), and produces a new parameter value via `get`. None of
//! them know anything about tensors or HMM steps; `fseq-hmm`'s `improve_fit`
//! implementations are the only callers.

mod channel_model_fitter;
mod decaying;
mod distribution;
mod ratio;
mod sequencing_model_fitter;

pub use channel_model_fitter::ChannelModelFitter;
pub use decaying::DecayingParameterFitter;
pub use distribution::DistributionFitter;
pub use ratio::RatioFitter;
pub use sequencing_model_fitter::SequencingModelFitter;
