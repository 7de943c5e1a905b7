//! Maps `Box<dyn Error>` from the `TimeSource` boundary to a typed failure kind.
//!
//! `clockwall_traits::TimeSource` returns boxed errors so any transport can
//! plug in; this module recovers a `SourceFailureKind`, with an optional
//! feature-gated path for `clockwall_net::NetError` downcasting.

use crate::error::{ClockError, SourceFailureKind};

/// Classify a trait-boundary error.
///
/// Attempts to downcast known transport error types first, then falls back
/// to string-based heuristics.
pub fn classify(e: &(dyn std::error::Error + 'static)) -> SourceFailureKind {
    #[cfg(feature = "net-errors")]
    {
        use clockwall_net::error::NetError;
        if let Some(ne) = e.downcast_ref::<NetError>() {
            return match ne {
                NetError::Timeout => SourceFailureKind::Timeout,
                NetError::MissingTimestamp(_) => SourceFailureKind::MissingTimestamp,
                NetError::Malformed(_) => SourceFailureKind::Malformed,
                NetError::Http(_) | NetError::Status(_) | NetError::Io(_) => {
                    SourceFailureKind::Network
                }
            };
        }
    }

    let s = e.to_string().to_lowercase();
    if s.contains("timeout") || s.contains("timed out") {
        SourceFailureKind::Timeout
    } else if s.contains("missing") || (s.contains("no ") && s.contains("timestamp")) {
        SourceFailureKind::MissingTimestamp
    } else if s.contains("malformed") || s.contains("invalid") || s.contains("parse") {
        SourceFailureKind::Malformed
    } else {
        SourceFailureKind::Network
    }
}

/// Wrap a trait-boundary error as `ClockError::SourceUnavailable`.
pub fn map_source_error(source_id: &str, e: &(dyn std::error::Error + 'static)) -> ClockError {
    ClockError::SourceUnavailable {
        source_id: source_id.to_string(),
        kind: classify(e),
        detail: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristics_cover_plain_errors() {
        let timeout = std::io::Error::other("operation timed out");
        assert_eq!(classify(&timeout), SourceFailureKind::Timeout);
        let bad = std::io::Error::other("could not parse date");
        assert_eq!(classify(&bad), SourceFailureKind::Malformed);
        let refused = std::io::Error::other("connection refused");
        assert_eq!(classify(&refused), SourceFailureKind::Network);
    }

    #[test]
    fn mapped_error_names_the_source() {
        let e = std::io::Error::other("connection reset");
        let ce = map_source_error("head:https://x/", &e);
        assert!(ce.to_string().contains("head:https://x/"));
    }

    #[cfg(feature = "net-errors")]
    #[test]
    fn net_errors_downcast_precisely() {
        use clockwall_net::error::NetError;
        let e = NetError::MissingTimestamp("Date header");
        assert_eq!(classify(&e), SourceFailureKind::MissingTimestamp);
        let e = NetError::Status(503);
        assert_eq!(classify(&e), SourceFailureKind::Network);
    }
}
