//! Observation-density helpers shared by every channel's emission model.

use std::f64::consts::PI;

/// Normal density `N(mean, sigma)` evaluated at `x`.
#[must_use]
pub fn normal_pdf(x: f64, mean: f64, sigma: f64) -> f64 {
    let z = (x - mean) / sigma;
    (-0.5 * z * z).exp() / (sigma * (2.0 * PI).sqrt())
}

/// Lognormal density evaluated at `x > 0`, parameterized by the mean and
/// stddev of the underlying normal (`ln(x) ~ N(log_mean, sigma)`).
///
/// Returns `0.0` for `x <= 0`, matching the distribution's support.
#[must_use]
pub fn lognormal_pdf(x: f64, log_mean: f64, sigma: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let z = (x.ln() - log_mean) / sigma;
    (-0.5 * z * z).exp() / (x * sigma * (2.0 * PI).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_peaks_at_mean() {
        let at_mean = normal_pdf(0.0, 0.0, 1.0);
        let off_mean = normal_pdf(1.0, 0.0, 1.0);
        assert!(at_mean > off_mean);
    }

    #[test]
    fn lognormal_is_zero_outside_support() {
        assert_eq!(lognormal_pdf(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(lognormal_pdf(0.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn lognormal_peak_matches_known_value() {
        // pdf of lognormal(mu=ln(1), sigma=0.05) at x=1 is 1/(sigma*sqrt(2*pi)).
        let p = lognormal_pdf(1.0, 0.0, 0.05);
        let expected = 1.0 / (0.05 * (2.0 * PI).sqrt());
        assert!((p - expected).abs() < 1e-9);
    }
}
