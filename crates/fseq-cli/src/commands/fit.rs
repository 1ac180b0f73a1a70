//! `fit` — Baum-Welch parameter re-estimation: iteratively improves a
//! [`SequencingModel`] against a paired (dye-sequences, radiometries)
//! training set.
//!
//! Radiometries are assigned back to the dye sequence that produced them by
//! replicate position, mirroring `simulate rad`'s own output order: the
//! first `multiplicity` radiometries belong to the first dye-sequence
//! record, the next `multiplicity` to the second, and so on. This matches
//! the `simulate rad` -> `fit` workflow directly; fitting against a
//! radiometries file whose candidate assignment is otherwise unknown
//! requires running `classify` first and feeding its winners back in (not
//! yet wired up as a CLI shortcut — spec §4.12 only requires the fitter
//! contract, not this convenience).

use anyhow::Result;
use fseq_classify::{accumulate_fit, FitPair};
use fseq_hmm::{DistributionCutoff, PerDyeSeqPrecomputation, UniversalPrecomputation};
use fseq_io::DyeSeqsFile;
use fseq_model::{FitSettings, SequencingModel};
use std::path::PathBuf;
use tracing::info;

/// Maps each radiometry index to the dye-sequence record index that
/// produced it, by contiguous multiplicity blocks.
fn assign_by_replicate_blocks(dye_seqs: &DyeSeqsFile, num_radiometries: usize) -> Vec<usize> {
    let mut assignment = Vec::with_capacity(num_radiometries);
    for (record_index, record) in dye_seqs.records.iter().enumerate() {
        for _ in 0..record.multiplicity {
            assignment.push(record_index);
        }
    }
    assignment.truncate(num_radiometries);
    assignment
}

fn max_num_dyes(pcs: &[PerDyeSeqPrecomputation], num_channels: usize) -> usize {
    pcs.iter()
        .flat_map(|pc| {
            (0..num_channels).map(move |c| {
                (0..pc.dye_track.num_timesteps())
                    .map(|t| pc.dye_track.get(t, c))
                    .max()
                    .unwrap_or(0)
            })
        })
        .max()
        .map_or(0, |m| m as usize)
}

#[allow(clippy::too_many_arguments)]
pub fn fit(
    dye_seqs_path: PathBuf,
    radiometries_path: PathBuf,
    fit_settings_path: Option<PathBuf>,
    model_args: &crate::model_args::ModelArgs,
    iterations: usize,
    sig: Option<f64>,
    out_path: PathBuf,
) -> Result<()> {
    let dye_seqs = fseq_io::read_dye_seqs(&dye_seqs_path)?;
    let radiometries_file = fseq_io::read_radiometries(&radiometries_path)?;
    let settings: FitSettings = match &fit_settings_path {
        Some(path) => fseq_io::read_fit_settings(path)?,
        None => FitSettings::default(),
    };
    let mut model = model_args.build(dye_seqs.num_channels as usize)?;

    let assignment =
        assign_by_replicate_blocks(&dye_seqs, radiometries_file.radiometries.len());
    anyhow::ensure!(
        assignment.len() == radiometries_file.radiometries.len(),
        "dye-sequences library's total multiplicity ({}) is smaller than the radiometries file ({})",
        assignment.len(),
        radiometries_file.radiometries.len()
    );

    let dye_seq_pcs: Vec<PerDyeSeqPrecomputation> = dye_seqs
        .records
        .iter()
        .map(|record| {
            PerDyeSeqPrecomputation::build(
                std::sync::Arc::new(record.dye_seq.clone()),
                radiometries_file.num_timesteps,
            )
        })
        .collect();
    let max_num_dyes = max_num_dyes(&dye_seq_pcs, radiometries_file.num_channels);
    let cutoff = DistributionCutoff(sig);

    info!(
        num_dye_seqs = dye_seqs.records.len(),
        num_radiometries = radiometries_file.radiometries.len(),
        iterations,
        "fitting sequencing model"
    );

    for iteration in 0..iterations {
        let universal = UniversalPrecomputation::build(&model, max_num_dyes);
        let pairs: Vec<FitPair<'_>> = assignment
            .iter()
            .zip(&radiometries_file.radiometries)
            .map(|(&record_index, radiometry)| FitPair {
                dye_seq_pc: &dye_seq_pcs[record_index],
                radiometry,
            })
            .collect();
        let fitter = accumulate_fit(
            &model,
            &universal,
            &pairs,
            max_num_dyes,
            radiometries_file.num_timesteps,
            cutoff,
        );
        let next_model = fitter.get(&model, &settings);
        info!(
            iteration,
            p_edman_failure = next_model.p_edman_failure,
            "completed fit iteration"
        );
        model = next_model;
    }

    write_model(&out_path, &model)?;
    println!(
        "Fit {} iterations over {} radiometries -> {}",
        iterations,
        radiometries_file.radiometries.len(),
        out_path.display()
    );
    Ok(())
}

fn write_model(path: &std::path::Path, model: &SequencingModel) -> Result<()> {
    let text = serde_json::to_string_pretty(model)?;
    std::fs::write(path, text)?;
    Ok(())
}
