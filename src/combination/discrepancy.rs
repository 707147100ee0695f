//! Discrepancy between a combination and a reference value.
//!
//! # Algorithm
//!
//! ```text
//! Z   = (μ - μ_ref) / √(σ_ref² + σ²)
//! Z_S = (μ - μ_ref) / √(σ_ref² + (S σ)²)
//! ```
//!
//! `Z_S` uses the PDG-inflated uncertainty of the combination and is never
//! larger in magnitude than `Z`.

use crate::error::{Error, Result};
use crate::measurement::Measurement;

use super::CombinationResult;

/// Pull of a combination against a reference, in standard deviations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discrepancy {
    /// Using the unscaled combined uncertainty.
    pub z: f64,
    /// Using the scale-factor-inflated combined uncertainty.
    pub z_inflated: f64,
}

/// Discrepancy of `result` with respect to `mu_ref ± sigma_ref`.
///
/// # Errors
///
/// [`Error::ZeroVariance`] if either total variance is zero.
///
/// # Examples
///
/// ```
/// use u_combine::combination::{discrepancy, CombinationResult};
///
/// let c = CombinationResult {
///     mu: 80370.0,
///     sigma: 12.0,
///     df: 4,
///     chi_squared: 2.0,
///     reduced: 0.5,
///     p_value: 0.74,
///     significance: -0.64,
///     scale_factor: 1.0,
/// };
/// let d = discrepancy(&c, 80357.0, 6.0).unwrap();
/// assert!((d.z - 0.969).abs() < 1e-3);
/// ```
pub fn discrepancy(result: &CombinationResult, mu_ref: f64, sigma_ref: f64) -> Result<Discrepancy> {
    let diff = result.mu - mu_ref;
    let ref_var = sigma_ref * sigma_ref;

    let var = ref_var + result.sigma * result.sigma;
    let inflated = result.inflated_sigma();
    let var_inflated = ref_var + inflated * inflated;
    if var == 0.0 || var_inflated == 0.0 {
        return Err(Error::ZeroVariance);
    }

    Ok(Discrepancy {
        z: diff / var.sqrt(),
        z_inflated: diff / var_inflated.sqrt(),
    })
}

/// [`discrepancy`] against a loaded reference entry.
///
/// # Errors
///
/// [`Error::InvalidMeasurement`] if the reference lacks `mu` or `sigma`,
/// otherwise as [`discrepancy`].
pub fn discrepancy_with(
    result: &CombinationResult,
    name: &str,
    reference: &Measurement,
) -> Result<Discrepancy> {
    let (mu, sigma) = reference
        .value()
        .ok_or_else(|| Error::invalid(name, "reference needs both mu and sigma"))?;
    discrepancy(result, mu, sigma)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combination(mu: f64, sigma: f64, scale_factor: f64) -> CombinationResult {
        CombinationResult {
            mu,
            sigma,
            df: 1,
            chi_squared: 0.0,
            reduced: 0.0,
            p_value: 1.0,
            significance: f64::NEG_INFINITY,
            scale_factor,
        }
    }

    #[test]
    fn standard_model_scenario() {
        let d = discrepancy(&combination(80370.0, 12.0, 1.0), 80357.0, 6.0).expect("should compute");
        let expected = 13.0 / 180.0_f64.sqrt();
        assert!((d.z - expected).abs() < 1e-12, "Z = {}", d.z);
        assert!((d.z - 0.969).abs() < 1e-3);
        assert_eq!(d.z, d.z_inflated);
    }

    #[test]
    fn scale_factor_applied_only_to_inflated() {
        let d = discrepancy(&combination(80370.0, 12.0, 2.0), 80357.0, 6.0).expect("should compute");
        assert!((d.z - 13.0 / 180.0_f64.sqrt()).abs() < 1e-12);
        assert!((d.z_inflated - 13.0 / (36.0_f64 + 576.0).sqrt()).abs() < 1e-12);
        assert!(d.z_inflated.abs() < d.z.abs());
    }

    #[test]
    fn sign_follows_difference() {
        let d = discrepancy(&combination(1.0, 1.0, 1.0), 3.0, 1.0).expect("should compute");
        assert!(d.z < 0.0);
    }

    #[test]
    fn zero_variance_rejected() {
        assert!(matches!(
            discrepancy(&combination(1.0, 0.0, 1.0), 1.0, 0.0),
            Err(Error::ZeroVariance)
        ));
    }

    #[test]
    fn reference_entry_needs_values() {
        let c = combination(80370.0, 12.0, 1.0);
        let ok = discrepancy_with(&c, "sm", &Measurement::new(80357.0, 6.0)).expect("should compute");
        assert!((ok.z - 0.969).abs() < 1e-3);

        let missing = discrepancy_with(&c, "sm", &Measurement::default());
        assert!(matches!(missing, Err(Error::InvalidMeasurement { ref name, .. }) if name == "sm"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn inflation_never_increases_pull(
            mu in -1e3_f64..1e3,
            sigma in 0.01_f64..100.0,
            s in 1.0_f64..10.0,
            mu_ref in -1e3_f64..1e3,
            sigma_ref in 0.0_f64..100.0,
        ) {
            let c = CombinationResult {
                mu, sigma, df: 1, chi_squared: 0.0, reduced: 0.0,
                p_value: 1.0, significance: f64::NEG_INFINITY, scale_factor: s,
            };
            let d = discrepancy(&c, mu_ref, sigma_ref).expect("positive variance");
            prop_assert!(d.z_inflated.abs() <= d.z.abs() + 1e-12,
                "Z_S = {}, Z = {}", d.z_inflated, d.z);
        }
    }
}
