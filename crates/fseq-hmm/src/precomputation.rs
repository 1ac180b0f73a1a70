//! Caches shared across many HMM evaluations so that per-classification work
//! touches only what is specific to that (dye sequence, radiometry) pair.
//!
//! Three tiers, from least to most specific:
//!
//! - [`UniversalPrecomputation`]: depends only on the [`SequencingModel`];
//!   reused for every dye sequence and every radiometry.
//! - [`PerDyeSeqPrecomputation`]: depends on one [`DyeSeq`]; reused across
//!   every radiometry scored against that sequence.
//! - [`PerRadiometryPrecomputation`]: depends on one [`Radiometry`]; reused
//!   across every dye sequence scored against that radiometry.

use crate::step::binomial::BinomialTable;
use crate::step::emission::EmissionTable;
use fseq_model::{ChannelModel, DyeSeq, DyeTrack, Radiometry, SequencingModel};
use std::sync::Arc;

/// Per-channel binomial tables for the three independent per-dye loss
/// processes, reserved up to `max_num_dyes` once and shared by `Arc` with
/// every [`crate::step::binomial::BinomialTransition`] built against this
/// model.
#[derive(Debug)]
pub struct UniversalPrecomputation {
    pub dud: Vec<Arc<BinomialTable>>,
    pub initial_bleach: Vec<Arc<BinomialTable>>,
    pub cyclic_bleach: Vec<Arc<BinomialTable>>,
}

impl UniversalPrecomputation {
    #[must_use]
    pub fn build(model: &SequencingModel, max_num_dyes: usize) -> Self {
        let build_for = |rate_of: fn(&ChannelModel) -> f64| -> Vec<Arc<BinomialTable>> {
            model
                .channel_models
                .iter()
                .map(|ch| {
                    let mut table = BinomialTable::new(rate_of(ch));
                    table.reserve(max_num_dyes);
                    Arc::new(table)
                })
                .collect()
        };
        Self {
            dud: build_for(|ch| ch.p_dud),
            initial_bleach: build_for(|ch| ch.p_initial_bleach),
            cyclic_bleach: build_for(|ch| ch.p_cyclic_bleach),
        }
    }
}

/// Everything derived from a single candidate dye sequence: the sequence
/// itself, its per-cycle dye track, and the tensor shape it implies.
#[derive(Debug)]
pub struct PerDyeSeqPrecomputation {
    pub dye_seq: Arc<DyeSeq>,
    pub dye_track: Arc<DyeTrack>,
    /// `[num_timesteps + 1, max_count[0] + 1, .., max_count[C-1] + 1]`.
    pub tensor_shape: Vec<usize>,
}

impl PerDyeSeqPrecomputation {
    #[must_use]
    pub fn build(dye_seq: Arc<DyeSeq>, num_timesteps: usize) -> Self {
        let dye_track = DyeTrack::from_dye_seq(&dye_seq, num_timesteps);
        let num_channels = dye_track.num_channels();
        let mut tensor_shape = Vec::with_capacity(1 + num_channels);
        tensor_shape.push(num_timesteps + 1);
        for c in 0..num_channels {
            let max_count = (0..num_timesteps)
                .map(|t| dye_track.get(t, c))
                .max()
                .unwrap_or(0);
            tensor_shape.push(max_count as usize + 1);
        }
        Self {
            dye_seq,
            dye_track: Arc::new(dye_track),
            tensor_shape,
        }
    }
}

/// Per-timestep emission density caches for one radiometry, independent of
/// any candidate dye sequence.
#[derive(Debug)]
pub struct PerRadiometryPrecomputation {
    pub tables: Vec<EmissionTable>,
}

impl PerRadiometryPrecomputation {
    #[must_use]
    pub fn build(model: &SequencingModel, radiometry: &Radiometry, max_num_dyes: usize) -> Self {
        let tables = (0..radiometry.num_timesteps())
            .map(|t| EmissionTable::build(&model.channel_models, radiometry.row(t), max_num_dyes))
            .collect();
        Self { tables }
    }
}
