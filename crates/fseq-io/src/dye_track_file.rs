//! Reader for the pre-filter's dye-tracks library file: `T C M` header,
//! then `M` records of `T·C` counts followed by
//! `num_sources, (id, count, hits)*num_sources`.

use crate::tokens::Tokens;
use anyhow::Result;
use fseq_model::DyeTrack;
use std::collections::HashMap;
use std::path::Path;

/// One `(library id, peptide count, pre-filter hit count)` triple recorded
/// against a dye track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceCountHits {
    pub id: i64,
    pub count: u32,
    pub hits: u32,
}

#[derive(Clone, Debug)]
pub struct DyeTrackRecord {
    pub dye_track: DyeTrack,
    pub sources: Vec<SourceCountHits>,
}

#[derive(Clone, Debug)]
pub struct DyeTracksFile {
    pub num_timesteps: usize,
    pub num_channels: usize,
    pub records: Vec<DyeTrackRecord>,
}

pub fn read_dye_tracks<P: AsRef<Path>>(path: P) -> Result<DyeTracksFile> {
    let mut tokens = Tokens::open(path)?;
    let num_timesteps = tokens.next_usize()?;
    let num_channels = tokens.next_usize()?;
    let num_dye_tracks = tokens.next_usize()?;
    let mut records = Vec::with_capacity(num_dye_tracks);
    for _ in 0..num_dye_tracks {
        let mut counts = Vec::with_capacity(num_timesteps * num_channels);
        for _ in 0..num_timesteps * num_channels {
            counts.push(tokens.next_u32()?);
        }
        let dye_track = DyeTrack::from_counts(num_timesteps, num_channels, counts);
        let num_sources = tokens.next_usize()?;
        let mut sources = Vec::with_capacity(num_sources);
        for _ in 0..num_sources {
            sources.push(SourceCountHits {
                id: tokens.next_i64()?,
                count: tokens.next_u32()?,
                hits: tokens.next_u32()?,
            });
        }
        records.push(DyeTrackRecord {
            dye_track,
            sources,
        });
    }
    Ok(DyeTracksFile {
        num_timesteps,
        num_channels,
        records,
    })
}

/// Deduplicates the file's records by dye-track value, merging the source
/// lists of any tracks that collide. Used when building pre-filter training
/// data, per the original's value-hashed deduplication.
#[must_use]
pub fn dedupe_by_track(file: &DyeTracksFile) -> HashMap<DyeTrack, Vec<SourceCountHits>> {
    let mut by_track: HashMap<DyeTrack, Vec<SourceCountHits>> = HashMap::new();
    for record in &file.records {
        by_track
            .entry(record.dye_track.clone())
            .or_default()
            .extend(record.sources.iter().copied());
    }
    by_track
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_counts_and_sources() {
        let path = std::env::temp_dir().join("fseq_io_dye_tracks_test");
        fs::write(&path, "2 1 1\n3 1\n2 100 7 5\n").unwrap();
        let file = read_dye_tracks(&path).unwrap();
        assert_eq!(file.records.len(), 1);
        let record = &file.records[0];
        assert_eq!(record.dye_track.get(0, 0), 3);
        assert_eq!(record.dye_track.get(1, 0), 1);
        assert_eq!(record.sources.len(), 2);
        assert_eq!(record.sources[0].id, 100);
        assert_eq!(record.sources[1].hits, 5);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn dedupes_identical_tracks() {
        let path = std::env::temp_dir().join("fseq_io_dye_tracks_dedupe_test");
        fs::write(&path, "1 1 2\n1 1 10 20 0\n1 1 11 21 0\n").unwrap();
        let file = read_dye_tracks(&path).unwrap();
        let deduped = dedupe_by_track(&file);
        assert_eq!(deduped.len(), 1);
        let sources = deduped.values().next().unwrap();
        assert_eq!(sources.len(), 2);
        fs::remove_file(&path).ok();
    }
}
