//! Publication-style comparison figure.
//!
//! - [`render`] / [`render_to_string`] — Two-panel SVG with labels, error
//!   bars and a `mu ± sigma` column
//! - [`RenderConfig`] — Axis range, ticks, labels and canvas size
//! - [`TextStyle`] — Serif typesetting when available, plain text otherwise

mod config;
mod svg;

pub use config::{RenderConfig, TextStyle};
pub use svg::{render, render_to_string};
