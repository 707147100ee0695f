//! Combination of independent measurements.
//!
//! # Functions
//!
//! - [`combine`] — Inverse-variance weighted mean, χ² goodness of fit and
//!   PDG scale factor
//! - [`discrepancy`] — Pull of a combination against a reference value, raw
//!   and scale-factor inflated
//!
//! # References
//!
//! - Particle Data Group, "Review of Particle Physics", Introduction §5.2.

mod discrepancy;
mod weighted;

pub use discrepancy::{discrepancy, discrepancy_with, Discrepancy};
pub use weighted::{combine, CombinationResult};
