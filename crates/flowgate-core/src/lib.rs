//! # flowgate-core
//!
//! Decision core for a traffic-filtering agent: classifies individual
//! network flows as allow or block against an ordered firewall rule set and
//! a probabilistic malicious-domain filter.
//!
//! ## Architecture
//!
//! This crate provides:
//! - **Rule model** - typed firewall rules and flow tuple patterns with a
//!   validating parse step from raw definitions
//! - **Domain membership filter** - approximate set of known-malicious
//!   domains (no false negatives, bounded false positives)
//! - **Matching engine** - the single `classify` decision function
//! - **Rule set manager** - atomic snapshot publication for reload without
//!   blocking concurrent matching
//!
//! ## Example
//!
//! ```rust
//! use flowgate_core::{
//!     Action, Direction, FlowDescriptor, MaliciousDomainFilter, MatchEngine,
//!     Protocol, RuleDef, RuleSetManager, TupleDef,
//! };
//!
//! let manager = RuleSetManager::new();
//! manager.load(vec![RuleDef {
//!     priority: 10,
//!     direction: "out".into(),
//!     protocols: vec!["tcp".into()],
//!     action: "block".into(),
//!     tuples: vec![TupleDef {
//!         dst_host: Some("*.ads.example.com".into()),
//!         ..TupleDef::default()
//!     }],
//! }]);
//!
//! let filter = MaliciousDomainFilter::build(["evil.test"], 0.001, 1).unwrap();
//! let engine = MatchEngine::new(Action::Allow);
//!
//! let flow = FlowDescriptor {
//!     direction: Direction::Outbound,
//!     protocol: Protocol::Tcp,
//!     src_addr: None,
//!     src_port: 50000,
//!     dst_addr: Some("203.0.113.10".parse().unwrap()),
//!     dst_port: 443,
//!     resolved_host: Some("img.ads.example.com".into()),
//! };
//! let verdict = engine.classify(&flow, &manager.current(), &filter);
//! assert_eq!(verdict.action, Action::Block);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod error;
pub mod filter;
pub mod manager;
pub mod rule;

// Re-exports for convenience
pub use engine::{FlowDescriptor, MatchEngine, Verdict, VerdictReason};
pub use error::{Error, FilterBuildError, Result, RuleParseError};
pub use filter::MaliciousDomainFilter;
pub use manager::{LoadResult, RejectedRule, RuleSetManager, RuleSnapshot};
pub use rule::{
    Action, Direction, FirewallRule, FlowTuplePattern, HostPattern, PortSpec, Protocol, RuleDef,
    TupleDef,
};
