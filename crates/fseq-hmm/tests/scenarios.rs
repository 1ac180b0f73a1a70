//! End-to-end scenarios against the assembled [`PeptideHmm`], exercising
//! the handful of closed-form cases a hand derivation can check exactly.

use fseq_hmm::{
    DistributionCutoff, PeptideHmm, PerDyeSeqPrecomputation, PerRadiometryPrecomputation,
    UniversalPrecomputation,
};
use fseq_model::{
    ChannelModel, DecayingRateModel, DyeSeq, Radiometry, SequencingModel,
};
use std::sync::Arc;

fn quiet_channel(mu: f64, sigma: f64, bg_sigma: f64) -> ChannelModel {
    ChannelModel {
        p_dud: 0.0,
        p_initial_bleach: 0.0,
        p_cyclic_bleach: 0.0,
        p_stuck_dye_loss: 0.0,
        stuck_dye_ratio: 0.0,
        mu,
        sigma,
        bg_sigma,
    }
}

fn all_zero_model(channels: Vec<ChannelModel>) -> SequencingModel {
    SequencingModel {
        p_edman_failure: 0.0,
        initial_detach: DecayingRateModel::constant(0.0),
        cyclic_detach: DecayingRateModel::constant(0.0),
        p_initial_break_n: 0.0,
        p_cyclic_break_n: 0.0,
        channel_models: channels,
        max_failed_edmans: None,
    }
}

fn build_hmm<'a>(
    model: &'a SequencingModel,
    universal: &'a UniversalPrecomputation,
    dye_seq_pc: &'a PerDyeSeqPrecomputation,
    radiometry: &'a Radiometry,
    radiometry_pc: &'a PerRadiometryPrecomputation,
) -> PeptideHmm {
    PeptideHmm::build(
        model,
        universal,
        dye_seq_pc,
        radiometry,
        radiometry_pc,
        DistributionCutoff(None),
    )
}

/// Spec §8 scenario 1: a single cycle, single channel, one dye, all rates
/// zero. The HMM does nothing but emit once against the known dye count,
/// so `probability()` must equal that single pdf evaluation exactly.
#[test]
fn trivial_single_cycle_hmm_matches_the_raw_emission_density() {
    let channel = quiet_channel(1.0, 0.05, 0.05);
    let model = all_zero_model(vec![channel]);
    let universal = UniversalPrecomputation::build(&model, 1);

    let dye_seq = Arc::new(DyeSeq::new("0", 1).unwrap());
    let dye_seq_pc = PerDyeSeqPrecomputation::build(dye_seq, 1);
    let radiometry = Radiometry::new(1, 1, vec![1.0]);
    let radiometry_pc = PerRadiometryPrecomputation::build(&model, &radiometry, 1);

    let hmm = build_hmm(&model, &universal, &dye_seq_pc, &radiometry, &radiometry_pc);
    let expected = channel.pdf(1.0, 1);
    assert!((hmm.probability() - expected).abs() < 1e-9);
    // pdf peak of a tight lognormal right at its mean is close to the
    // spec's worked value of ~7.978.
    assert!((expected - 7.978_845_608).abs() < 1e-6);
}

/// Spec §8 scenario 3: certain initial bleach plus an Edman that never
/// succeeds collapses the whole HMM to the product of two independent
/// emissions, exactly.
#[test]
fn certain_initial_bleach_and_failing_edman_collapses_to_emission_product() {
    let channel = quiet_channel(1.0, 0.16, 0.05);
    let mut model = all_zero_model(vec![channel]);
    model.channel_models[0].p_initial_bleach = 1.0;
    model.p_edman_failure = 1.0;
    let universal = UniversalPrecomputation::build(&model, 1);

    let dye_seq = Arc::new(DyeSeq::new("0", 1).unwrap());
    let dye_seq_pc = PerDyeSeqPrecomputation::build(dye_seq, 2);
    let radiometry = Radiometry::new(2, 1, vec![1.0, 0.0]);
    let radiometry_pc = PerRadiometryPrecomputation::build(&model, &radiometry, 1);

    let hmm = build_hmm(&model, &universal, &dye_seq_pc, &radiometry, &radiometry_pc);
    let expected = channel.pdf(1.0, 1) * channel.pdf(0.0, 0);
    assert!((hmm.probability() - expected).abs() < 1e-12);
}

/// A successful Edman cycle with every other rate zero collapses the HMM
/// to the product of the two per-cycle emissions, exactly: the one dye
/// moves off its channel with certainty (`c_idx == c_total`) rather than
/// being bled or detached away.
#[test]
fn guaranteed_edman_success_collapses_to_emission_product() {
    let channel = quiet_channel(1.0, 0.16, 0.05);
    let model = all_zero_model(vec![channel]);
    let universal = UniversalPrecomputation::build(&model, 1);

    let dye_seq = Arc::new(DyeSeq::new("0", 1).unwrap());
    let dye_seq_pc = PerDyeSeqPrecomputation::build(dye_seq, 2);
    let radiometry = Radiometry::new(2, 1, vec![1.0, 0.0]);
    let radiometry_pc = PerRadiometryPrecomputation::build(&model, &radiometry, 1);

    let hmm = build_hmm(&model, &universal, &dye_seq_pc, &radiometry, &radiometry_pc);
    let expected = channel.pdf(1.0, 1) * channel.pdf(0.0, 0);
    assert!((hmm.probability() - expected).abs() < 1e-12);
}

/// Spec §8's probability-sum invariant, exercised end to end:
/// `improve_fit` must not panic and must leave the fitter in a usable
/// state when the HMM has positive probability.
#[test]
fn improve_fit_runs_without_panicking_on_a_reachable_hmm() {
    let channel = quiet_channel(1.0, 0.16, 0.05);
    let mut model = all_zero_model(vec![channel]);
    model.channel_models[0].p_dud = 0.05;
    model.channel_models[0].p_initial_bleach = 0.05;
    model.channel_models[0].p_cyclic_bleach = 0.05;
    model.p_edman_failure = 0.1;
    let universal = UniversalPrecomputation::build(&model, 2);

    let dye_seq = Arc::new(DyeSeq::new("00", 1).unwrap());
    let dye_seq_pc = PerDyeSeqPrecomputation::build(dye_seq, 2);
    let radiometry = Radiometry::new(2, 1, vec![2.0, 1.0]);
    let radiometry_pc = PerRadiometryPrecomputation::build(&model, &radiometry, 2);

    let hmm = build_hmm(&model, &universal, &dye_seq_pc, &radiometry, &radiometry_pc);
    assert!(hmm.probability() > 0.0);

    let mut fitter = fseq_fit::SequencingModelFitter::new(1, 2);
    hmm.improve_fit(&mut fitter);
    let fitted = fitter.get(&model, &fseq_model::FitSettings::default());
    assert!(fitted.p_edman_failure.is_finite());
}
