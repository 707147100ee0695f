//! # u-combine
//!
//! Combination of independent measurements of one quantity: inverse-variance
//! weighted mean, χ² goodness of fit, PDG scale factor, discrepancy against
//! a reference value, and a publication-style comparison figure.
//!
//! The statistics are domain-agnostic and operate on plain `f64` values; the
//! bundled `mw-combine` binary applies them to W-boson mass measurements.
//!
//! ## Modules
//!
//! - [`measurement`] — Named measurements with presentation options, in order
//! - [`combination`] — Weighted combination, scale factor, discrepancy
//! - [`loader`] — YAML measurement files
//! - [`render`] — SVG comparison figure
//! - [`error`] — Error taxonomy
//!
//! ## Example
//!
//! ```
//! use u_combine::combination::{combine, discrepancy_with};
//! use u_combine::loader::load_str;
//!
//! let data = load_str(
//!     "a: {mu: 80350, sigma: 15}\n\
//!      b: {mu: 80400, sigma: 20}\n\
//!      sm: {mu: 80357, sigma: 6, combine: false}\n",
//! )
//! .unwrap();
//!
//! let result = combine(&data).unwrap();
//! assert_eq!(result.df, 1);
//!
//! let pull = discrepancy_with(&result, "sm", data.get("sm").unwrap()).unwrap();
//! assert!(pull.z_inflated.abs() <= pull.z.abs());
//! ```
//!
//! ## Design Philosophy
//!
//! - **Explicit failure**: too few measurements or a degenerate scale-factor
//!   subset is an error, never a silent NaN
//! - **Caller-applied inflation**: the combined `sigma` is never scaled; the
//!   scale factor is reported separately
//! - **Research-backed**: follows the Particle Data Group averaging procedure

pub mod combination;
pub mod error;
pub mod loader;
pub mod measurement;
pub mod render;

pub use error::{Error, Result};
