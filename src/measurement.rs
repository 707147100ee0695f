//! Measurement data model.
//!
//! A [`Measurement`] is one named entry of the input: a point estimate `mu`,
//! a standard uncertainty `sigma`, and the presentation options that control
//! how the entry is drawn. [`Measurements`] keeps the entries in insertion
//! order, which is the plotting order; the combination itself does not depend
//! on order.
//!
//! # Examples
//!
//! ```
//! use u_combine::measurement::{Measurement, Measurements};
//!
//! let mut data = Measurements::new();
//! data.insert("atlas", Measurement::new(80370.0, 19.0));
//! data.insert("lhcb", Measurement::new(80354.0, 32.0));
//! assert_eq!(data.participants().count(), 2);
//! ```

use crate::combination::CombinationResult;

/// One named measurement with its presentation options.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Point estimate. `None` for display placeholders.
    pub mu: Option<f64>,
    /// Standard uncertainty, already reduced to a scalar.
    pub sigma: Option<f64>,
    /// Whether the entry takes part in the combination.
    pub combine: bool,
    /// Whether the entry is drawn.
    pub plot: bool,
    /// Highlight band, guide line and bold text.
    pub emphasize: bool,
    /// Any SVG colour string.
    pub color: String,
    /// Text shown in the label column.
    pub label: String,
}

impl Default for Measurement {
    fn default() -> Self {
        Self {
            mu: None,
            sigma: None,
            combine: true,
            plot: true,
            emphasize: false,
            color: "black".to_string(),
            label: String::new(),
        }
    }
}

impl Measurement {
    /// Creates a participating measurement with default presentation.
    pub fn new(mu: f64, sigma: f64) -> Self {
        Self {
            mu: Some(mu),
            sigma: Some(sigma),
            ..Self::default()
        }
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the colour.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Includes or excludes the entry from the combination.
    pub fn with_combine(mut self, combine: bool) -> Self {
        self.combine = combine;
        self
    }

    /// Shows or hides the entry in the figure.
    pub fn with_plot(mut self, plot: bool) -> Self {
        self.plot = plot;
        self
    }

    /// Highlights the entry in the figure.
    pub fn with_emphasize(mut self, emphasize: bool) -> Self {
        self.emphasize = emphasize;
        self
    }

    /// `(mu, sigma)` when both are present.
    pub fn value(&self) -> Option<(f64, f64)> {
        Some((self.mu?, self.sigma?))
    }
}

/// Uncertainty as written in an input file: a single standard deviation or
/// a list of independent components (statistical, systematic, ...).
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum Uncertainty {
    /// One standard deviation.
    Scalar(f64),
    /// Independent components added in quadrature.
    Components(Vec<f64>),
}

impl Uncertainty {
    /// Total standard uncertainty.
    ///
    /// Components are combined as the Euclidean norm √(Σ σₖ²). An empty
    /// component list gives 0, which the combiner later rejects.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_combine::measurement::Uncertainty;
    ///
    /// assert_eq!(Uncertainty::Scalar(12.0).total(), 12.0);
    /// assert_eq!(Uncertainty::Components(vec![3.0, 4.0]).total(), 5.0);
    /// ```
    pub fn total(&self) -> f64 {
        match self {
            Self::Scalar(s) => *s,
            Self::Components(parts) => parts.iter().map(|s| s * s).sum::<f64>().sqrt(),
        }
    }
}

/// Measurements keyed by unique name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measurements {
    entries: Vec<(String, Measurement)>,
}

impl Measurements {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry. An existing entry with the same name is replaced in
    /// place, keeping its position.
    ///
    /// Returns the replaced entry, if any.
    pub fn insert(&mut self, name: impl Into<String>, measurement: Measurement) -> Option<Measurement> {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, measurement)),
            None => {
                self.entries.push((name, measurement));
                None
            }
        }
    }

    /// Looks up an entry by name.
    pub fn get(&self, name: &str) -> Option<&Measurement> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &Measurement)> + ExactSizeIterator {
        self.entries.iter().map(|(n, m)| (n.as_str(), m))
    }

    /// Entries with `combine == true`.
    pub fn participants(&self) -> impl Iterator<Item = (&str, &Measurement)> {
        self.iter().filter(|(_, m)| m.combine)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes a combination into the display entry `name`.
    ///
    /// An existing entry keeps its presentation options and receives the
    /// combined `mu` and unscaled `sigma`. A missing entry is appended,
    /// emphasized, labelled "Combination". Either way the entry is marked
    /// `combine = false` so a second combination cannot count it.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_combine::combination::combine;
    /// use u_combine::measurement::{Measurement, Measurements};
    ///
    /// let mut data = Measurements::new();
    /// data.insert("a", Measurement::new(10.0, 1.0));
    /// data.insert("b", Measurement::new(12.0, 1.0));
    /// let result = combine(&data).unwrap();
    ///
    /// data.merge_combination("ours", &result);
    /// assert_eq!(data.get("ours").unwrap().mu, Some(11.0));
    /// assert!(!data.get("ours").unwrap().combine);
    /// ```
    pub fn merge_combination(&mut self, name: &str, result: &CombinationResult) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, entry)) => {
                entry.mu = Some(result.mu);
                entry.sigma = Some(result.sigma);
                entry.combine = false;
            }
            None => {
                let entry = Measurement::new(result.mu, result.sigma)
                    .with_label("Combination")
                    .with_combine(false)
                    .with_emphasize(true);
                self.entries.push((name.to_string(), entry));
            }
        }
    }
}

impl<N: Into<String>> FromIterator<(N, Measurement)> for Measurements {
    fn from_iter<I: IntoIterator<Item = (N, Measurement)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (name, m) in iter {
            out.insert(name, m);
        }
        out
    }
}
