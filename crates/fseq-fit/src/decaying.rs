//! Accumulator and solver for a per-Edman-cycle decaying rate:
//! `rate(t) = base + initial * exp(-t * initial_decay)`.

use fseq_model::DecayingRateModel;
use nalgebra::{Matrix3, Vector3};

const MAX_ITERATIONS: usize = 50;
const CONVERGENCE_TOLERANCE: f64 = 1e-12;

/// Per-timestep `(x, n)` accumulators; the fitted rate at timestep `t` is
/// `x[t] / n[t]`, and `get` fits the three-parameter decay curve to those
/// ratios by weighted nonlinear least squares (weights `n[t]`).
#[derive(Clone, Debug)]
pub struct DecayingParameterFitter {
    x: Vec<f64>,
    n: Vec<f64>,
}

impl DecayingParameterFitter {
    #[must_use]
    pub fn new(num_timesteps: usize) -> Self {
        Self {
            x: vec![0.0; num_timesteps],
            n: vec![0.0; num_timesteps],
        }
    }

    pub fn add_timestep(&mut self, t: usize, numerator: f64, denominator: f64) {
        self.x[t] += numerator;
        self.n[t] += denominator;
    }

    pub fn combine(&mut self, other: &DecayingParameterFitter) {
        debug_assert_eq!(self.x.len(), other.x.len());
        for t in 0..self.x.len() {
            self.x[t] += other.x[t];
            self.n[t] += other.n[t];
        }
    }

    pub fn scale(&mut self, weight: f64) {
        for v in &mut self.x {
            *v *= weight;
        }
        for v in &mut self.n {
            *v *= weight;
        }
    }

    /// Fit the decay curve, starting the search from `prev` and holding any
    /// of the three parameters fixed at `prev`'s value per `hold`.
    #[must_use]
    pub fn get(&self, prev: DecayingRateModel, hold: [bool; 3]) -> DecayingRateModel {
        let data: Vec<(f64, f64, f64)> = (0..self.x.len())
            .filter(|&t| self.n[t] > 0.0)
            .map(|t| (t as f64, self.x[t] / self.n[t], self.n[t]))
            .collect();
        if data.is_empty() {
            return prev;
        }
        gauss_newton_fit(&data, prev, hold)
    }
}

fn gauss_newton_fit(
    data: &[(f64, f64, f64)],
    start: DecayingRateModel,
    hold: [bool; 3],
) -> DecayingRateModel {
    let mut params = [start.base, start.initial, start.initial_decay];
    for _ in 0..MAX_ITERATIONS {
        let mut jtj = Matrix3::zeros();
        let mut jtr = Vector3::zeros();
        for &(t, y, w) in data {
            let (base, initial, decay) = (params[0], params[1], params[2]);
            let e = (-decay * t).exp();
            let residual = y - (base + initial * e);
            let grad = Vector3::new(1.0, e, -initial * t * e);
            for a in 0..3 {
                if hold[a] {
                    continue;
                }
                jtr[a] += w * grad[a] * residual;
                for c in 0..3 {
                    if hold[c] {
                        continue;
                    }
                    jtj[(a, c)] += w * grad[a] * grad[c];
                }
            }
        }
        for a in 0..3 {
            if hold[a] {
                jtj[(a, a)] = 1.0;
                jtr[a] = 0.0;
            }
        }
        let Some(inv) = jtj.try_inverse() else {
            break;
        };
        let delta = inv * jtr;
        for a in 0..3 {
            params[a] += delta[a];
        }
        if delta.norm() < CONVERGENCE_TOLERANCE {
            break;
        }
    }
    DecayingRateModel {
        base: params[0],
        initial: params[1],
        initial_decay: params[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_a_known_decay_curve() {
        let truth = DecayingRateModel {
            base: 0.02,
            initial: 0.3,
            initial_decay: 0.5,
        };
        let mut fitter = DecayingParameterFitter::new(10);
        for t in 0..10 {
            let rate = truth.rate_at(t);
            // synthesize (numerator, denominator) so that numerator/denominator == rate
            fitter.add_timestep(t, rate * 100.0, 100.0);
        }
        let start = DecayingRateModel {
            base: 0.0,
            initial: 0.0,
            initial_decay: 1.0,
        };
        let fit = fitter.get(start, [false, false, false]);
        assert!(fit.distance(&truth) < 1e-6);
    }

    #[test]
    fn held_parameters_stay_fixed() {
        let mut fitter = DecayingParameterFitter::new(5);
        for t in 0..5 {
            fitter.add_timestep(t, 0.1 * 50.0, 50.0);
        }
        let prev = DecayingRateModel {
            base: 0.1,
            initial: 0.4,
            initial_decay: 2.0,
        };
        let fit = fitter.get(prev, [false, true, true]);
        assert_eq!(fit.initial, prev.initial);
        assert_eq!(fit.initial_decay, prev.initial_decay);
    }

    #[test]
    fn no_evidence_returns_previous_model_unchanged() {
        let fitter = DecayingParameterFitter::new(3);
        let prev = DecayingRateModel::constant(0.05);
        assert_eq!(fitter.get(prev, [false, false, false]), prev);
    }
}
