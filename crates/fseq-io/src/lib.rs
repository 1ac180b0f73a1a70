//! Text/JSON/CSV file formats for the fluorosequencing classification
//! workspace (spec §6). Depends only on `fseq-model`'s value types; knows
//! nothing of the HMM or classifier layers.

pub mod csv_writer;
pub mod dye_seq_file;
pub mod dye_track_file;
pub mod fit_settings;
pub mod radiometry_file;
mod tokens;

pub use csv_writer::write_classifications;
pub use dye_seq_file::{read_dye_seqs, DyeSeqRecord, DyeSeqsFile};
pub use dye_track_file::{dedupe_by_track, read_dye_tracks, DyeTrackRecord, DyeTracksFile, SourceCountHits};
pub use fit_settings::read_fit_settings;
pub use radiometry_file::{read_radiometries, write_radiometries, RadiometriesFile};
