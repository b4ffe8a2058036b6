//! Error types for flowgate-core
//!
//! Centralized error handling using `thiserror` for ergonomic error definitions.
//!
//! Rule validation failures are deliberately per-rule (`RuleParseError`): one
//! malformed rule is reported and excluded, it never aborts a whole load. The
//! engine runs in a traffic-critical context where discarding the entire rule
//! set would fail open or closed for all flows at once.

use thiserror::Error;

/// A single rule definition is structurally invalid.
///
/// Carried inside [`crate::manager::LoadResult`] next to the index of the
/// offending definition so callers can report exactly which record was
/// dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleParseError {
    /// Direction string is not `in`/`inbound` or `out`/`outbound`
    #[error("unknown direction: '{0}'")]
    UnknownDirection(String),

    /// Protocol name outside the closed tcp/udp/icmp set
    #[error("unknown protocol: '{0}'")]
    UnknownProtocol(String),

    /// Action string is not `allow` or `block`
    #[error("unknown action: '{0}'")]
    UnknownAction(String),

    /// Port specifier failed to parse as a 1-65535 integer
    #[error("invalid port specifier: '{spec}'")]
    InvalidPort {
        /// The specifier as written in the rule definition
        spec: String,
    },

    /// Port range with low > high
    #[error("invalid port range: {low}-{high} (low must not exceed high)")]
    InvalidPortRange {
        /// Lower bound as written
        low: u16,
        /// Upper bound as written
        high: u16,
    },

    /// IP literal or CIDR block failed to parse
    #[error("invalid IP address or CIDR block: '{0}'")]
    InvalidCidr(String),

    /// Host pattern is empty or a bare wildcard with no label
    #[error("invalid host pattern: '{0}'")]
    InvalidHostPattern(String),

    /// A rule with no tuples can never match and is rejected outright
    #[error("rule has an empty tuple list")]
    EmptyTuples,
}

/// The malicious-domain filter could not be built.
///
/// The caller keeps its previous filter (if any) active; a failed build is
/// surfaced, never silently swapped in.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterBuildError {
    /// Target false-positive rate outside the open interval (0, 1)
    #[error("target false-positive rate must be in (0, 1), got {rate}")]
    InvalidTargetRate {
        /// The rejected rate
        rate: f64,
    },

    /// Expected element count of zero cannot size the filter
    #[error("expected element count must be at least 1")]
    InvalidExpectedCount,
}

/// Main error type for flowgate-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Rule definition failed validation
    #[error(transparent)]
    RuleParse(#[from] RuleParseError),

    /// Domain filter construction failed
    #[error(transparent)]
    FilterBuild(#[from] FilterBuildError),

    /// The engine refuses to activate without an explicit default action;
    /// an unmatched flow must never be an ad-hoc runtime decision.
    #[error("no default action configured for unmatched flows")]
    MissingDefaultPolicy,
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RuleParseError::InvalidPortRange { low: 443, high: 80 };
        assert!(err.to_string().contains("443-80"));

        let err = RuleParseError::UnknownProtocol("sctp".to_string());
        assert!(err.to_string().contains("sctp"));

        let err = FilterBuildError::InvalidTargetRate { rate: 1.5 };
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = RuleParseError::EmptyTuples.into();
        assert!(matches!(err, Error::RuleParse(RuleParseError::EmptyTuples)));
    }
}
