//! Flags that assemble a [`SequencingModel`], shared across the `classify`
//! subcommands. `--model` loads a full per-channel JSON model (as written by
//! `fit`); otherwise every channel gets the same scalar rates from the
//! individual flags, matching the uniform `ErrorModel` the original
//! constructs inline at each entry point.

use anyhow::{Context, Result};
use clap::Args;
use fseq_model::{ChannelModel, DecayingRateModel, SequencingModel};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Load a full model from JSON instead of the scalar flags below.
    #[arg(long)]
    pub model: Option<PathBuf>,

    #[arg(long, default_value_t = 0.06)]
    pub p_edman_failure: f64,
    #[arg(long, default_value_t = 0.05)]
    pub p_detach: f64,
    #[arg(long, default_value_t = 0.0)]
    pub p_initial_block: f64,
    #[arg(long, default_value_t = 0.0)]
    pub p_cyclic_block: f64,
    #[arg(long, default_value_t = 0.05)]
    pub p_bleach: f64,
    #[arg(long, default_value_t = 0.07)]
    pub p_dud: f64,
    #[arg(long, default_value_t = 0.0)]
    pub stuck_dye_loss: f64,
    #[arg(long, default_value_t = 0.0)]
    pub stuck_dye_ratio: f64,
    #[arg(long, default_value_t = 1.0)]
    pub mu: f64,
    #[arg(long, default_value_t = 0.16)]
    pub sigma: f64,
    #[arg(long, default_value_t = 0.05)]
    pub bg_sigma: f64,
    /// Cap on tracked consecutive Edman-failure cycles (0 disables the cap).
    #[arg(long, default_value_t = 16)]
    pub max_failed_edmans: usize,
}

impl ModelArgs {
    pub fn build(&self, num_channels: usize) -> Result<SequencingModel> {
        if let Some(path) = &self.model {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("open {}", path.display()))?;
            return serde_json::from_str(&text).with_context(|| "deserialize model JSON");
        }
        let channel_models = (0..num_channels)
            .map(|_| ChannelModel {
                p_dud: self.p_dud,
                p_initial_bleach: self.p_bleach,
                p_cyclic_bleach: self.p_bleach,
                p_stuck_dye_loss: self.stuck_dye_loss,
                stuck_dye_ratio: self.stuck_dye_ratio,
                mu: self.mu,
                sigma: self.sigma,
                bg_sigma: self.bg_sigma,
            })
            .collect();
        let max_failed_edmans = if self.max_failed_edmans == 0 {
            None
        } else {
            Some(self.max_failed_edmans)
        };
        Ok(SequencingModel {
            p_edman_failure: self.p_edman_failure,
            initial_detach: DecayingRateModel::constant(self.p_detach),
            cyclic_detach: DecayingRateModel::constant(self.p_detach),
            p_initial_break_n: self.p_initial_block,
            p_cyclic_break_n: self.p_cyclic_block,
            channel_models,
            max_failed_edmans,
        })
    }
}
