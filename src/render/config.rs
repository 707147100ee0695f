//! Figure options.

use std::ffi::OsStr;

use tracing::info;

/// Executable whose presence selects [`TextStyle::Typeset`].
const TYPESETTING_ENGINE: &str = "pdflatex";

/// Text appearance of the figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextStyle {
    /// Serif text at publication size.
    Typeset,
    /// Sans-serif text at screen size.
    #[default]
    Plain,
}

impl TextStyle {
    /// Picks [`TextStyle::Typeset`] when a `pdflatex` executable is on
    /// `PATH`, and falls back to [`TextStyle::Plain`] otherwise.
    pub fn detect() -> Self {
        let found = std::env::var_os("PATH")
            .map(|paths| find_executable(&paths, TYPESETTING_ENGINE))
            .unwrap_or(false);
        if found {
            Self::Typeset
        } else {
            info!(
                engine = TYPESETTING_ENGINE,
                "typesetting engine not found, using plain text style"
            );
            Self::Plain
        }
    }

    pub(crate) fn font_family(self) -> &'static str {
        match self {
            Self::Typeset => "serif",
            Self::Plain => "sans-serif",
        }
    }

    /// Size of axis text (ticks, axis label).
    pub(crate) fn axis_font_size(self) -> f64 {
        match self {
            Self::Typeset => 18.0,
            Self::Plain => 12.0,
        }
    }
}

fn find_executable(paths: &OsStr, name: &str) -> bool {
    std::env::split_paths(paths).any(|dir| {
        dir.join(name).is_file() || (cfg!(windows) && dir.join(format!("{name}.exe")).is_file())
    })
}

/// Layout and style of the comparison figure.
///
/// # Examples
///
/// ```
/// use u_combine::render::{RenderConfig, TextStyle};
///
/// let config = RenderConfig::default()
///     .with_x_range(80300.0, 80600.0)
///     .with_x_ticks(vec![80300.0, 80400.0, 80500.0, 80600.0])
///     .with_x_label("M_W [MeV]")
///     .with_text_style(TextStyle::Plain);
/// assert_eq!(config.x_range, Some((80300.0, 80600.0)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Visible x interval; derived from the data when `None`.
    pub x_range: Option<(f64, f64)>,
    /// Tick positions; evenly spaced round values when `None`. The first and
    /// last tick labels are left blank.
    pub x_ticks: Option<Vec<f64>>,
    /// Text under the x axis.
    pub x_label: String,
    /// Small print under the label column.
    pub footnote: Option<String>,
    /// Font selection.
    pub text_style: TextStyle,
    /// Canvas width in pixels.
    pub width: f64,
    /// Canvas height in pixels.
    pub height: f64,
    /// Decimals in the `mu ± sigma` column.
    pub value_decimals: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            x_range: None,
            x_ticks: None,
            x_label: String::new(),
            footnote: None,
            text_style: TextStyle::Plain,
            width: 700.0,
            height: 700.0,
            value_decimals: 0,
        }
    }
}

impl RenderConfig {
    /// Fixes the visible x interval.
    pub fn with_x_range(mut self, min: f64, max: f64) -> Self {
        self.x_range = Some((min, max));
        self
    }

    /// Fixes the tick positions.
    pub fn with_x_ticks(mut self, ticks: Vec<f64>) -> Self {
        self.x_ticks = Some(ticks);
        self
    }

    /// Sets the x-axis label.
    pub fn with_x_label(mut self, label: impl Into<String>) -> Self {
        self.x_label = label.into();
        self
    }

    /// Sets the footnote.
    pub fn with_footnote(mut self, footnote: impl Into<String>) -> Self {
        self.footnote = Some(footnote.into());
        self
    }

    /// Sets the text style.
    pub fn with_text_style(mut self, style: TextStyle) -> Self {
        self.text_style = style;
        self
    }

    /// Sets the canvas size.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the number of decimals in the value column.
    pub fn with_value_decimals(mut self, decimals: usize) -> Self {
        self.value_decimals = decimals;
        self
    }
}
