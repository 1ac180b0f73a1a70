//! `classify hmm|ann|hybrid` — score radiometries against a candidate
//! library, either by running the full HMM, by a pure weighted-k-NN vote
//! over a dye-tracks corpus, or by using the k-NN vote to short-list
//! candidates before running the HMM on just those.

use anyhow::Result;
use fseq_classify::{Classifier, KnnPreFilter, LibraryEntry, ScoredClassification};
use fseq_hmm::{DistributionCutoff, PerDyeSeqPrecomputation, UniversalPrecomputation};
use fseq_io::dye_track_file::DyeTracksFile;
use fseq_model::{ChannelModel, DyeTrack, Radiometry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

fn max_num_dyes(library: &[LibraryEntry], num_channels: usize) -> usize {
    library
        .iter()
        .flat_map(|entry| {
            let track = &entry.dye_seq_pc.dye_track;
            (0..num_channels).map(move |c| {
                (0..track.num_timesteps())
                    .map(|t| track.get(t, c))
                    .max()
                    .unwrap_or(0)
            })
        })
        .max()
        .map_or(0, |m| m as usize)
}

fn build_library(
    dye_seqs: &fseq_io::DyeSeqsFile,
    num_timesteps: usize,
) -> Vec<LibraryEntry> {
    dye_seqs
        .records
        .iter()
        .map(|record| LibraryEntry {
            dye_seq_pc: PerDyeSeqPrecomputation::build(
                Arc::new(record.dye_seq.clone()),
                num_timesteps,
            ),
            library_id: record.library_id,
            count: record.multiplicity,
        })
        .collect()
}

pub fn classify_hmm(
    dye_seqs_path: PathBuf,
    radiometries_path: PathBuf,
    out_path: PathBuf,
    model_args: &crate::model_args::ModelArgs,
    sig: Option<f64>,
) -> Result<()> {
    let dye_seqs = fseq_io::read_dye_seqs(&dye_seqs_path)?;
    let radiometries = fseq_io::read_radiometries(&radiometries_path)?;
    let model = model_args.build(dye_seqs.num_channels as usize)?;

    info!(
        num_dye_seqs = dye_seqs.records.len(),
        num_radiometries = radiometries.radiometries.len(),
        "classifying via the full HMM"
    );

    let library = build_library(&dye_seqs, radiometries.num_timesteps);
    let universal = UniversalPrecomputation::build(
        &model,
        max_num_dyes(&library, radiometries.num_channels),
    );
    let classifier = Classifier::new(&model, &universal, &library, DistributionCutoff(sig));
    let results = classifier.classify_all(&radiometries.radiometries, None);
    write_results(&out_path, &results)
}

pub fn classify_hybrid(
    dye_seqs_path: PathBuf,
    radiometries_path: PathBuf,
    out_path: PathBuf,
    model_args: &crate::model_args::ModelArgs,
    k: usize,
    h: usize,
    sig: Option<f64>,
) -> Result<()> {
    let dye_seqs = fseq_io::read_dye_seqs(&dye_seqs_path)?;
    let radiometries = fseq_io::read_radiometries(&radiometries_path)?;
    let model = model_args.build(dye_seqs.num_channels as usize)?;

    info!(
        num_dye_seqs = dye_seqs.records.len(),
        num_radiometries = radiometries.radiometries.len(),
        k,
        h,
        "classifying via k-NN short-list then HMM"
    );

    let library = build_library(&dye_seqs, radiometries.num_timesteps);
    let universal = UniversalPrecomputation::build(
        &model,
        max_num_dyes(&library, radiometries.num_channels),
    );
    let tracks: Vec<Arc<DyeTrack>> = library
        .iter()
        .map(|entry| Arc::clone(&entry.dye_seq_pc.dye_track))
        .collect();
    let channel_mus: Vec<f64> = model.channel_models.iter().map(|c| c.mu).collect();
    let prefilter = KnnPreFilter::new(tracks, channel_mus, k, h);

    let classifier = Classifier::new(&model, &universal, &library, DistributionCutoff(sig));
    let results = classifier.classify_all(&radiometries.radiometries, Some(&prefilter));
    write_results(&out_path, &results)
}

pub fn classify_ann(
    dye_tracks_path: PathBuf,
    radiometries_path: PathBuf,
    out_path: PathBuf,
    model_args: &crate::model_args::ModelArgs,
    k: usize,
) -> Result<()> {
    let dye_tracks = fseq_io::read_dye_tracks(&dye_tracks_path)?;
    let radiometries = fseq_io::read_radiometries(&radiometries_path)?;
    let model = model_args.build(dye_tracks.num_channels)?;

    info!(
        num_dye_tracks = dye_tracks.records.len(),
        num_radiometries = radiometries.radiometries.len(),
        k,
        "classifying via weighted k-NN vote"
    );

    let results: Vec<ScoredClassification> = radiometries
        .radiometries
        .iter()
        .map(|radiometry| classify_ann_one(&dye_tracks, &model.channel_models, k, radiometry))
        .collect();
    write_results(&out_path, &results)
}

/// Weighted k-NN vote (per the original `KWANNClassifier`): find the `k`
/// dye tracks closest to the observed radiometry by squared distance
/// against each channel's expected intensity, weight each by the exact
/// observation density product across every cycle and channel, and let
/// each neighbor's sources vote `weight * count` toward their library id.
fn classify_ann_one(
    dye_tracks: &DyeTracksFile,
    channel_models: &[ChannelModel],
    k: usize,
    radiometry: &Radiometry,
) -> ScoredClassification {
    let mut scored: Vec<(usize, f64)> = dye_tracks
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let mut distance = 0.0;
            for t in 0..radiometry.num_timesteps() {
                for c in 0..radiometry.num_channels() {
                    let expected =
                        f64::from(record.dye_track.get(t, c)) * channel_models[c].mu;
                    let diff = expected - radiometry.get(t, c);
                    distance += diff * diff;
                }
            }
            (index, distance)
        })
        .collect();
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));
    scored.truncate(k.min(scored.len()));

    let mut id_scores: HashMap<i64, f64> = HashMap::new();
    for (index, _) in scored {
        let record = &dye_tracks.records[index];
        let mut weight = 1.0;
        for t in 0..radiometry.num_timesteps() {
            for c in 0..radiometry.num_channels() {
                weight *= channel_models[c].pdf(radiometry.get(t, c), record.dye_track.get(t, c));
            }
        }
        for source in &record.sources {
            *id_scores.entry(source.id).or_insert(0.0) += weight * f64::from(source.count);
        }
    }

    let mut best_id = -1_i64;
    let mut best_score = -1.0_f64;
    let mut total = 0.0_f64;
    for (id, score) in id_scores {
        total += score;
        if score > best_score {
            best_score = score;
            best_id = id;
        }
    }
    ScoredClassification {
        id: best_id,
        score: best_score.max(0.0),
        total,
    }
}

fn write_results(out_path: &Path, results: &[ScoredClassification]) -> Result<()> {
    fseq_io::write_classifications(
        out_path,
        results.iter().map(|r| (r.id, r.adjusted_score())),
    )?;
    println!(
        "Classified {} radiometries -> {}",
        results.len(),
        out_path.display()
    );
    Ok(())
}
