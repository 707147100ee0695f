//! Error taxonomy shared by the loader, combiner and renderer.

use thiserror::Error;

/// Errors produced while loading, combining or rendering measurements.
#[derive(Debug, Error)]
pub enum Error {
    /// A measurement cannot enter the arithmetic (missing `mu`, missing or
    /// non-positive `sigma`).
    #[error("invalid measurement '{name}': {reason}")]
    InvalidMeasurement {
        /// Entry name in the measurement collection.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Too few measurements for a defined number of degrees of freedom.
    #[error("insufficient data: {context} needs at least {needed} measurements, found {found}")]
    InsufficientData {
        /// Which stage ran out of measurements.
        context: &'static str,
        /// Minimum count required.
        needed: usize,
        /// Count actually available.
        found: usize,
    },

    /// Total variance of a discrepancy is zero.
    #[error("zero total variance in discrepancy")]
    ZeroVariance,

    /// Malformed measurement file.
    #[error("parse error: {0}")]
    Parse(String),

    /// The figure cannot be laid out.
    #[error("render error: {0}")]
    Render(String),

    /// File system failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidMeasurement {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entry() {
        let e = Error::invalid("lep", "sigma must be positive");
        assert_eq!(
            e.to_string(),
            "invalid measurement 'lep': sigma must be positive"
        );
    }

    #[test]
    fn insufficient_data_message() {
        let e = Error::InsufficientData {
            context: "combination",
            needed: 2,
            found: 1,
        };
        assert!(e.to_string().contains("at least 2"), "{e}");
        assert!(e.to_string().contains("found 1"), "{e}");
    }

    #[test]
    fn yaml_errors_become_parse_errors() {
        let err = serde_yaml::from_str::<serde_yaml::Value>("a: [1, 2").unwrap_err();
        assert!(matches!(Error::from(err), Error::Parse(_)));
    }
}
