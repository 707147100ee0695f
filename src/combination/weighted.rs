//! Inverse-variance weighted least-squares combination.
//!
//! # Algorithm
//!
//! For participating measurements (μᵢ, σᵢ), i = 1..n:
//!
//! ```text
//! wᵢ = 1 / σᵢ²
//! μ  = Σ wᵢ μᵢ / Σ wᵢ
//! σ  = (Σ wᵢ)^(-1/2)
//! χ² = Σ wᵢ (μᵢ - μ)²,   df = n - 1
//! ```
//!
//! When χ²/df > 1 the inputs are over-dispersed and the PDG scale factor is
//! computed from the measurements with σᵢ < δ₀ = 3 √n σ:
//!
//! ```text
//! S = √( Σ' wᵢ (μᵢ - μ)² / (n' - 1) )
//! ```
//!
//! otherwise S = 1.
//!
//! # References
//!
//! - Particle Data Group, "Review of Particle Physics", Introduction §5.2.2
//!   (unconstrained averaging and the scale factor S).
//! - Taylor, J.R. (1997). *An Introduction to Error Analysis*, 2nd ed., §7.2.

use std::fmt;

use tracing::debug;
use u_numflow::special;

use crate::error::{Error, Result};
use crate::measurement::Measurements;

/// Multiple of √n σ beyond which a measurement is too imprecise to enter the
/// scale factor.
const SCALE_FACTOR_TOLERANCE: f64 = 3.0;

/// Combined estimate and goodness-of-fit diagnostics.
///
/// `sigma` is the unscaled uncertainty; multiply by `scale_factor` (or call
/// [`inflated_sigma`](Self::inflated_sigma)) for the PDG-inflated value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinationResult {
    /// Weighted mean μ.
    pub mu: f64,
    /// Uncertainty of the weighted mean, (Σ wᵢ)^(-1/2).
    pub sigma: f64,
    /// Degrees of freedom, n - 1.
    pub df: usize,
    /// χ² = Σ wᵢ (μᵢ - μ)².
    pub chi_squared: f64,
    /// χ² / df.
    pub reduced: f64,
    /// Upper-tail probability of χ² with `df` degrees of freedom.
    pub p_value: f64,
    /// One-sided normal quantile of `p_value` (+∞ for p = 0, −∞ for p = 1).
    pub significance: f64,
    /// PDG scale factor S ≥ 1.
    pub scale_factor: f64,
}

impl CombinationResult {
    /// S · σ.
    pub fn inflated_sigma(&self) -> f64 {
        self.scale_factor * self.sigma
    }
}

impl fmt::Display for CombinationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mu = {}", self.mu)?;
        writeln!(f, "sigma = {}", self.sigma)?;
        writeln!(f, "chi_squared = {}", self.chi_squared)?;
        writeln!(f, "df = {}", self.df)?;
        writeln!(f, "reduced = {}", self.reduced)?;
        writeln!(f, "p_value = {}", self.p_value)?;
        writeln!(f, "significance = {}", self.significance)?;
        write!(f, "S = {}", self.scale_factor)
    }
}

/// Combines the participating measurements (`combine == true`).
///
/// # Errors
///
/// - [`Error::InvalidMeasurement`] if a participant lacks `mu`, or its
///   `sigma` is missing, non-positive or NaN.
/// - [`Error::InsufficientData`] if fewer than 2 measurements participate,
///   or if the scale factor is needed but fewer than 2 measurements pass
///   the δ₀ cut.
///
/// # Examples
///
/// ```
/// use u_combine::combination::combine;
/// use u_combine::measurement::{Measurement, Measurements};
///
/// let mut data = Measurements::new();
/// data.insert("a", Measurement::new(80350.0, 15.0));
/// data.insert("b", Measurement::new(80400.0, 20.0));
///
/// let r = combine(&data).unwrap();
/// assert!((r.mu - 80368.0).abs() < 1e-9);
/// assert!((r.sigma - 12.0).abs() < 1e-12);
/// assert_eq!(r.df, 1);
/// assert!((r.scale_factor - 2.0).abs() < 1e-9);
/// ```
pub fn combine(data: &Measurements) -> Result<CombinationResult> {
    let mut x = Vec::new();
    let mut w = Vec::new();
    for (name, m) in data.participants() {
        let mu = m.mu.ok_or_else(|| Error::invalid(name, "missing mu"))?;
        let sigma = m.sigma.ok_or_else(|| Error::invalid(name, "missing sigma"))?;
        // also rejects NaN
        if !(sigma > 0.0) {
            return Err(Error::invalid(
                name,
                format!("sigma must be positive, got {sigma}"),
            ));
        }
        x.push(mu);
        w.push(1.0 / (sigma * sigma));
    }

    let n = x.len();
    if n < 2 {
        return Err(Error::InsufficientData {
            context: "combination",
            needed: 2,
            found: n,
        });
    }

    let w_sum: f64 = w.iter().sum();
    let mu = dot(&w, &x) / w_sum;
    let sigma = w_sum.powf(-0.5);

    let df = n - 1;
    let chi_squared: f64 = w
        .iter()
        .zip(x.iter())
        .map(|(&wi, &xi)| wi * (xi - mu).powi(2))
        .sum();
    let reduced = chi_squared / df as f64;

    let scale_factor = if reduced > 1.0 {
        scale_factor(&w, &x, mu, sigma)?
    } else {
        1.0
    };

    let p_value = chi_squared_sf(chi_squared, df as f64);
    let significance = normal_isf(p_value);

    debug!(
        n,
        mu, sigma, chi_squared, reduced, p_value, scale_factor, "combined measurements"
    );

    Ok(CombinationResult {
        mu,
        sigma,
        df,
        chi_squared,
        reduced,
        p_value,
        significance,
        scale_factor,
    })
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(&p, &q)| p * q).sum()
}

/// PDG scale factor over the measurements with σᵢ < 3 √n σ, never below 1.
fn scale_factor(w: &[f64], x: &[f64], mu: f64, sigma: f64) -> Result<f64> {
    let delta0 = SCALE_FACTOR_TOLERANCE * (x.len() as f64).sqrt() * sigma;

    let (count, chi_squared) = w
        .iter()
        .zip(x.iter())
        .filter(|&(&wi, _)| wi.powf(-0.5) < delta0)
        .fold((0usize, 0.0), |(c, s), (&wi, &xi)| {
            (c + 1, s + wi * (xi - mu).powi(2))
        });

    if count < 2 {
        return Err(Error::InsufficientData {
            context: "scale factor",
            needed: 2,
            found: count,
        });
    }

    let reduced_df = (count - 1) as f64;
    debug!(delta0, kept = count, dropped = x.len() - count, "scale factor subset");
    Ok((chi_squared / reduced_df).sqrt().max(1.0))
}

/// Upper-tail χ² probability, exactly 1 at χ² = 0.
///
/// Evaluated as the upper regularized gamma Q(df/2, χ²/2) so that far-tail
/// probabilities keep their relative precision instead of cancelling in
/// `1 - cdf`.
fn chi_squared_sf(chi_squared: f64, df: f64) -> f64 {
    if chi_squared.is_nan() || df.is_nan() {
        return f64::NAN;
    }
    if chi_squared <= 0.0 {
        return 1.0;
    }
    let (a, x) = (df / 2.0, chi_squared / 2.0);
    if x < a + 1.0 {
        // Q is not small here; the lower series is the stable side.
        (1.0 - special::regularized_lower_gamma(a, x)).clamp(0.0, 1.0)
    } else {
        upper_gamma_cf(a, x).clamp(0.0, 1.0)
    }
}

/// Q(a, x) by the modified Lentz continued fraction, for x >= a + 1.
fn upper_gamma_cf(a: f64, x: f64) -> f64 {
    const TINY: f64 = 1e-300;
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=300 {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < TINY {
            d = TINY;
        }
        c = b + an / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < 1e-15 {
            break;
        }
    }
    (-x + a * x.ln() - special::ln_gamma(a)).exp() * h
}

/// z such that P(Z > z) = p for standard normal Z.
fn normal_isf(p: f64) -> f64 {
    if p.is_nan() {
        f64::NAN
    } else if p <= 0.0 {
        f64::INFINITY
    } else if p >= 1.0 {
        f64::NEG_INFINITY
    } else {
        special::inverse_normal_sf(p)
    }
}
