//! Errors reported by the strategy engine.

use thiserror::Error;

use crate::dddmp::DddmpError;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad domain value or inconsistent proposition configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("malformed strategy file: {reason}")]
    MalformedStrategyFile {
        reason: String,
        #[source]
        source: Option<DddmpError>,
    },

    #[error("justice index {jx} does not fit in {width} justice bits")]
    InvalidJusticeIndex { jx: u64, width: usize },

    #[error("invalid strategy phase {0:?}, expected \"Y\" or \"Z\"")]
    InvalidPhase(String),

    #[error("cannot build a disjunction of zero states")]
    EmptyInput,

    #[error("unknown variable name {0:?}")]
    UnknownVariableName(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedStrategyFile {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        Error::Configuration(reason.into())
    }
}

impl From<DddmpError> for Error {
    fn from(e: DddmpError) -> Self {
        Error::MalformedStrategyFile {
            reason: "cannot decode the function body".to_string(),
            source: Some(e),
        }
    }
}
