use std::error::Error;
use std::fmt;

/// Errors surfaced by the layout engine's mutating operations.
///
/// Both variants are fatal to the call, never to the engine: a rejected
/// topology or configuration leaves the previous state fully intact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed topology: duplicate node id, dangling link endpoint, or an
    /// invalid link weight.
    Integrity { reason: String },
    /// Out-of-range configuration parameter.
    Config {
        parameter: &'static str,
        reason: String,
    },
}

impl EngineError {
    pub(crate) fn integrity(reason: impl Into<String>) -> Self {
        Self::Integrity {
            reason: reason.into(),
        }
    }

    pub(crate) fn config(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::Config {
            parameter,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integrity { reason } => write!(f, "topology integrity violation: {reason}"),
            Self::Config { parameter, reason } => {
                write!(f, "invalid configuration `{parameter}`: {reason}")
            }
        }
    }
}

impl Error for EngineError {}
