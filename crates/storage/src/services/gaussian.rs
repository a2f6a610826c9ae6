//! Normal distribution helpers used by the skill rating update.

use std::f64::consts::{PI, SQRT_2};
use std::ops::{Div, Mul};

/// Complementary error function (Chebyshev fit, fractional error below 1.2e-7).
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + z / 2.0);
    let r = t * (-z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77)))))))))
        .exp();
    if x < 0.0 { 2.0 - r } else { r }
}

/// Inverse of [`erfc`], refined with two Newton steps.
pub fn erfcinv(y: f64) -> f64 {
    if y >= 2.0 {
        return -100.0;
    }
    if y <= 0.0 {
        return 100.0;
    }

    let lower_half = y < 1.0;
    let y = if lower_half { y } else { 2.0 - y };
    let t = (-2.0 * (y / 2.0).ln()).sqrt();
    let mut x = -0.707_11 * ((2.307_53 + t * 0.270_61) / (1.0 + t * (0.992_29 + t * 0.044_81)) - t);

    for _ in 0..2 {
        let err = erfc(x) - y;
        x += err / (1.128_379_167_095_512_57 * (-(x * x)).exp() - x * err);
    }

    if lower_half { x } else { -x }
}

/// Standard normal cumulative distribution.
pub fn cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal density.
pub fn pdf(x: f64) -> f64 {
    (-(x * x) / 2.0).exp() / (2.0 * PI).sqrt()
}

/// Standard normal quantile.
pub fn ppf(p: f64) -> f64 {
    -SQRT_2 * erfcinv(2.0 * p)
}

/// A normal distribution in natural parameters: precision `pi` and
/// precision-adjusted mean `tau`. `Gaussian::default()` is the uniform
/// (zero precision) message.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Gaussian {
    pub pi: f64,
    pub tau: f64,
}

impl Gaussian {
    pub fn new(pi: f64, tau: f64) -> Self {
        Self { pi, tau }
    }

    pub fn from_mu_sigma(mu: f64, sigma: f64) -> Self {
        let pi = sigma.powi(-2);
        Self { pi, tau: pi * mu }
    }

    pub fn mu(&self) -> f64 {
        if self.pi == 0.0 { 0.0 } else { self.tau / self.pi }
    }

    pub fn sigma(&self) -> f64 {
        if self.pi == 0.0 {
            f64::INFINITY
        } else {
            (1.0 / self.pi).sqrt()
        }
    }

    /// How far `other` moved from `self`; drives the convergence check.
    pub fn delta(&self, other: &Gaussian) -> f64 {
        let pi_delta = (self.pi - other.pi).abs();
        if pi_delta.is_infinite() {
            return 0.0;
        }
        (self.tau - other.tau).abs().max(pi_delta.sqrt())
    }
}

impl Mul for Gaussian {
    type Output = Gaussian;

    fn mul(self, rhs: Gaussian) -> Gaussian {
        Gaussian::new(self.pi + rhs.pi, self.tau + rhs.tau)
    }
}

impl Div for Gaussian {
    type Output = Gaussian;

    fn div(self, rhs: Gaussian) -> Gaussian {
        Gaussian::new(self.pi - rhs.pi, self.tau - rhs.tau)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    #[test]
    fn test_cdf_known_values() {
        assert!(close(cdf(0.0), 0.5, 1e-7));
        assert!(close(cdf(1.0), 0.841_344_7, 1e-6));
        assert!(close(cdf(-1.96), 0.024_997_9, 1e-6));
    }

    #[test]
    fn test_pdf_peak() {
        assert!(close(pdf(0.0), 0.398_942_28, 1e-8));
        assert!(close(pdf(1.0), pdf(-1.0), 1e-12));
    }

    #[test]
    fn test_ppf_inverts_cdf() {
        for p in [0.05, 0.25, 0.55, 0.9] {
            assert!(close(cdf(ppf(p)), p, 1e-6), "p = {p}");
        }
        assert!(close(ppf(0.55), 0.125_661_3, 1e-5));
    }

    #[test]
    fn test_erfcinv_limits() {
        assert_eq!(erfcinv(2.0), -100.0);
        assert_eq!(erfcinv(0.0), 100.0);
    }

    #[test]
    fn test_gaussian_round_trip_and_product() {
        let g = Gaussian::from_mu_sigma(25.0, 25.0 / 3.0);
        assert!(close(g.mu(), 25.0, 1e-9));
        assert!(close(g.sigma(), 25.0 / 3.0, 1e-9));

        let product = g * g;
        assert!(close(product.mu(), 25.0, 1e-9));
        assert!(product.sigma() < g.sigma());
        assert_eq!(product / g, g);
    }

    #[test]
    fn test_uniform_message() {
        let uniform = Gaussian::default();
        assert_eq!(uniform.mu(), 0.0);
        assert!(uniform.sigma().is_infinite());
    }
}
