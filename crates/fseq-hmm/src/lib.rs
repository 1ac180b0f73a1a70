//! HMM engine: assembles per-(dye-sequence, radiometry) step chains over
//! the tensor state spaces defined in `fseq-tensor`/`fseq-model`, scores
//! them, and accumulates Baum-Welch statistics into `fseq-fit`'s fitters.

pub mod hmm;
pub mod precomputation;
pub mod state_vector;
pub mod step;
pub mod stuck_dye_hmm;

pub use hmm::PeptideHmm;
pub use precomputation::{
    PerDyeSeqPrecomputation, PerRadiometryPrecomputation, UniversalPrecomputation,
};
pub use state_vector::{PeptideStateVector, StuckDyeStateVector};
pub use step::emission::DistributionCutoff;
pub use step::{PeptideStep, StuckDyeStep};
pub use stuck_dye_hmm::StuckDyeHmm;
