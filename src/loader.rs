//! YAML measurement files.
//!
//! The document is a mapping from entry name to entry options:
//!
//! ```yaml
//! atlas:
//!   label: ATLAS 2017
//!   mu: 80370
//!   sigma: [7, 11, 14]   # stat, exp. syst, model syst
//!   color: steelblue
//! sm:
//!   label: SM prediction
//!   mu: 80357
//!   sigma: 6
//!   combine: false
//! ```
//!
//! `sigma` is either a number or a list of independent components, which is
//! reduced to its Euclidean norm. Entry order is preserved.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::measurement::{Measurement, Measurements, Uncertainty};

#[derive(Debug, Deserialize)]
struct RawEntry {
    mu: Option<f64>,
    sigma: Option<Uncertainty>,
    #[serde(default = "default_true")]
    combine: bool,
    #[serde(default = "default_true")]
    plot: bool,
    #[serde(default)]
    emphasize: bool,
    #[serde(default = "default_color")]
    color: String,
    label: Option<String>,
    #[serde(flatten)]
    unknown: BTreeMap<String, serde_yaml::Value>,
}

fn default_true() -> bool {
    true
}

fn default_color() -> String {
    "black".to_string()
}

impl RawEntry {
    fn into_measurement(self, name: &str) -> Measurement {
        for key in self.unknown.keys() {
            warn!(entry = name, key = key.as_str(), "ignoring unrecognized key");
        }
        Measurement {
            mu: self.mu,
            sigma: self.sigma.map(|u| u.total()),
            combine: self.combine,
            plot: self.plot,
            emphasize: self.emphasize,
            color: self.color,
            label: self.label.unwrap_or_else(|| name.to_string()),
        }
    }
}

/// Reads measurements from a YAML file.
///
/// # Errors
///
/// [`Error::Io`] if the file cannot be read, [`Error::Parse`] if its content
/// is malformed (see [`load_str`]).
pub fn load(path: impl AsRef<Path>) -> Result<Measurements> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let data = load_str(&text)?;
    debug!(path = %path.display(), entries = data.len(), "loaded measurements");
    Ok(data)
}

/// Parses measurements from YAML text.
///
/// An empty document gives an empty collection.
///
/// # Errors
///
/// [`Error::Parse`] if the text is not valid YAML, the document is not a
/// mapping, a name is not a string, or an entry is not a mapping of
/// correctly typed options.
///
/// # Examples
///
/// ```
/// use u_combine::loader::load_str;
///
/// let data = load_str("cdf: {mu: 80433.5, sigma: [6.4, 6.9]}\n").unwrap();
/// let cdf = data.get("cdf").unwrap();
/// assert!((cdf.sigma.unwrap() - 9.41).abs() < 0.01);
/// assert_eq!(cdf.label, "cdf");
/// ```
pub fn load_str(text: &str) -> Result<Measurements> {
    if text.trim().is_empty() {
        return Ok(Measurements::new());
    }
    let document: serde_yaml::Value = serde_yaml::from_str(text)?;
    let mapping = match document {
        serde_yaml::Value::Null => return Ok(Measurements::new()),
        serde_yaml::Value::Mapping(m) => m,
        other => {
            return Err(Error::Parse(format!(
                "expected a mapping of measurements, found {}",
                kind(&other)
            )))
        }
    };

    let mut data = Measurements::new();
    for (key, value) in mapping {
        let name = match key {
            serde_yaml::Value::String(s) => s,
            other => {
                return Err(Error::Parse(format!(
                    "measurement names must be strings, found {}",
                    kind(&other)
                )))
            }
        };
        if !value.is_mapping() {
            return Err(Error::Parse(format!(
                "entry '{name}': expected a mapping, found {}",
                kind(&value)
            )));
        }
        let raw: RawEntry = serde_yaml::from_value(value)
            .map_err(|e| Error::Parse(format!("entry '{name}': {e}")))?;
        let measurement = raw.into_measurement(&name);
        data.insert(name, measurement);
    }
    Ok(data)
}

fn kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}
