//! Sequence-optimization job relay domain logic.
//!
//! A job moves through fixed stages: the request is validated
//! ([`request`]), a workspace is allocated and the input written
//! ([`workspace`]), the external engine runs ([`engine`]), and its output
//! file is interpreted ([`result`]). Subprocess management is pure (no HTTP
//! types) and lives here for isolation and testability.

pub mod engine;
pub mod request;
pub mod result;
pub mod subprocess;
pub mod workspace;

use std::fmt;

/// Stage a job is in. A job only ever moves forward, and reaches
/// [`RelayStage::Done`] exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RelayStage {
    Validating,
    Allocating,
    Serializing,
    Invoking,
    Reading,
    Done,
}

impl RelayStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Allocating => "allocating",
            Self::Serializing => "serializing",
            Self::Invoking => "invoking",
            Self::Reading => "reading",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RelayStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered() {
        let stages = [
            RelayStage::Validating,
            RelayStage::Allocating,
            RelayStage::Serializing,
            RelayStage::Invoking,
            RelayStage::Reading,
            RelayStage::Done,
        ];
        assert!(stages.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn display_uses_lowercase_names() {
        assert_eq!(RelayStage::Invoking.to_string(), "invoking");
    }
}
