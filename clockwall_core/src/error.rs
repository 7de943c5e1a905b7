use thiserror::Error;

/// Why a single time source produced no sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFailureKind {
    Timeout,
    Network,
    Malformed,
    MissingTimestamp,
}

impl SourceFailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceFailureKind::Timeout => "timeout",
            SourceFailureKind::Network => "network",
            SourceFailureKind::Malformed => "malformed",
            SourceFailureKind::MissingTimestamp => "missing_timestamp",
        }
    }
}

impl std::fmt::Display for SourceFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone)]
pub enum ClockError {
    #[error("time source {source_id} unavailable ({kind}): {detail}")]
    SourceUnavailable {
        source_id: String,
        kind: SourceFailureKind,
        detail: String,
    },
    #[error("calibration degraded: no time source answered")]
    CalibrationDegraded,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("display error: {0}")]
    Display(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing display")]
    MissingDisplay,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
