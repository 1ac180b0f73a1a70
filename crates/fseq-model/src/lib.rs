//! Dye sequences, radiometries, and the sequencing probability model.
//!
//! This crate carries no HMM machinery; it is the value-type vocabulary
//! shared by `fseq-hmm`, `fseq-fit`, `fseq-classify`, and `fseq-io`.

mod channel_model;
mod distribution;
mod dye_seq;
mod dye_track;
mod fit_settings;
mod radiometry;
mod sequencing_model;

pub use channel_model::ChannelModel;
pub use distribution::{lognormal_pdf, normal_pdf};
pub use dye_seq::DyeSeq;
pub use dye_track::DyeTrack;
pub use fit_settings::FitSettings;
pub use radiometry::Radiometry;
pub use sequencing_model::{DecayingRateModel, SequencingModel};
