//! `simulate rad` — Monte Carlo generation of radiometries from a
//! dye-sequences library, for exercising `classify`/`fit` without real
//! instrument data.
//!
//! Per replicate: each residue's dye is independently dudded once up
//! front; then, cycle by cycle, the whole peptide may detach, every
//! surviving dye may bleach, and (from cycle 1 on) an Edman attempt may
//! remove the next N-terminal residue. Each cycle's surviving per-channel
//! counts are imaged through the channel's own observation distribution.
//! N-terminal breakage (`p_initial_break_n`/`p_cyclic_break_n`) is a
//! distinct failure mode the HMM accounts for during inference but that
//! this simulator does not generate; a run fit against simulated data
//! should hold those two rates at zero.

use anyhow::Result;
use fseq_model::{DyeSeq, Radiometry, SequencingModel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tracing::info;

/// One standard-normal sample via the Box-Muller transform.
fn sample_standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.random_range(f64::EPSILON..1.0);
    let u2: f64 = rng.random_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Draws an observed intensity for `d` dyes still present on a channel,
/// matching [`fseq_model::ChannelModel::pdf`]'s own parameterization.
fn sample_intensity(rng: &mut StdRng, channel: &fseq_model::ChannelModel, d: u32) -> f64 {
    let z = sample_standard_normal(rng);
    if d == 0 {
        z * channel.bg_sigma
    } else {
        ((f64::from(d) * channel.mu).ln() + z * channel.sigma).exp()
    }
}

struct Residue {
    channel: usize,
    dudded: bool,
    bleached: bool,
}

/// Simulates one physical peptide copy of `dye_seq` through `num_timesteps`
/// imaging cycles and returns its observed radiometry rows, row-major by
/// timestep.
fn simulate_one(
    rng: &mut StdRng,
    model: &SequencingModel,
    dye_seq: &DyeSeq,
    num_timesteps: usize,
) -> Vec<f64> {
    let num_channels = model.num_channels();
    let mut residues: Vec<Residue> = (0..dye_seq.len())
        .filter_map(|pos| {
            let c = dye_seq.get(pos);
            (c >= 0).then(|| Residue {
                channel: c as usize,
                dudded: rng.random_bool(model.channel_models[c as usize].p_dud),
                bleached: false,
            })
        })
        .collect();

    let mut removed = 0usize;
    let mut detached = false;
    let mut out = Vec::with_capacity(num_timesteps * num_channels);

    for t in 0..num_timesteps {
        if t == 0 {
            if !detached && rng.random_bool(model.initial_detach_rate(0).clamp(0.0, 1.0)) {
                detached = true;
            }
            if !detached {
                for residue in &mut residues {
                    if !residue.bleached
                        && rng.random_bool(
                            model.channel_models[residue.channel]
                                .p_initial_bleach
                                .clamp(0.0, 1.0),
                        )
                    {
                        residue.bleached = true;
                    }
                }
            }
        } else {
            let num_edmans = t - 1;
            if !detached && removed < residues.len() && !rng.random_bool(model.p_edman_failure) {
                removed += 1;
            }
            if !detached
                && rng.random_bool(model.cyclic_detach_rate(num_edmans).clamp(0.0, 1.0))
            {
                detached = true;
            }
            if !detached {
                for residue in residues.iter_mut().skip(removed) {
                    if !residue.bleached
                        && rng.random_bool(
                            model.channel_models[residue.channel]
                                .p_cyclic_bleach
                                .clamp(0.0, 1.0),
                        )
                    {
                        residue.bleached = true;
                    }
                }
            }
        }

        let mut counts = vec![0u32; num_channels];
        if !detached {
            for residue in residues.iter().skip(removed) {
                if !residue.dudded && !residue.bleached {
                    counts[residue.channel] += 1;
                }
            }
        }
        for (c, &d) in counts.iter().enumerate() {
            out.push(sample_intensity(rng, &model.channel_models[c], d));
        }
    }
    out
}

pub fn simulate_rad(
    dye_seqs_path: PathBuf,
    out_path: PathBuf,
    model_args: &crate::model_args::ModelArgs,
    num_timesteps: usize,
    seed: u64,
) -> Result<()> {
    let dye_seqs = fseq_io::read_dye_seqs(&dye_seqs_path)?;
    let model = model_args.build(dye_seqs.num_channels as usize)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let total_replicates: u64 = dye_seqs.records.iter().map(|r| u64::from(r.multiplicity)).sum();
    info!(
        num_dye_seqs = dye_seqs.records.len(),
        total_replicates, num_timesteps, seed, "simulating radiometries"
    );

    let mut radiometries = Vec::with_capacity(total_replicates as usize);
    for record in &dye_seqs.records {
        for _ in 0..record.multiplicity {
            let rows = simulate_one(&mut rng, &model, &record.dye_seq, num_timesteps);
            radiometries.push(Radiometry::new(num_timesteps, dye_seqs.num_channels as usize, rows));
        }
    }

    fseq_io::write_radiometries(
        &out_path,
        num_timesteps,
        dye_seqs.num_channels as usize,
        &radiometries,
    )?;
    println!(
        "Simulated {} radiometries -> {}",
        radiometries.len(),
        out_path.display()
    );
    Ok(())
}
