//! Flow matching engine
//!
//! The single decision function of the core: reduce one flow descriptor,
//! one rule snapshot, and the malicious-domain filter to a [`Verdict`].
//!
//! `classify` is a pure, bounded-time computation over in-memory
//! structures: no I/O, no DNS resolution, no locks. It is safe to call
//! concurrently with itself and with a reload on the
//! [`RuleSetManager`](crate::manager::RuleSetManager) - a caller obtains
//! one snapshot reference up front and uses it for the whole call, so a
//! concurrent swap can never produce a verdict computed against a mix of
//! old and new rules.

use std::net::IpAddr;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::filter::MaliciousDomainFilter;
use crate::manager::RuleSnapshot;
use crate::rule::{Action, Direction, FirewallRule, Protocol};

/// One observed network flow, as supplied by the interception collaborator
///
/// Addresses and the resolved host are optional: a flow with a missing or
/// unparseable field simply cannot match patterns constrained on that
/// dimension. Malformed flows are never an error - they fail toward
/// evaluating the remaining rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowDescriptor {
    /// Direction of the flow relative to this host
    pub direction: Direction,
    /// Transport protocol
    pub protocol: Protocol,
    /// Local (source) address, if known
    pub src_addr: Option<IpAddr>,
    /// Local (source) port
    pub src_port: u16,
    /// Remote (destination) address, if known
    pub dst_addr: Option<IpAddr>,
    /// Remote (destination) port
    pub dst_port: u16,
    /// Destination host name, as resolved or observed (e.g. from SNI)
    pub resolved_host: Option<String>,
}

/// Why a verdict was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictReason {
    /// The resolved host hit the malicious-domain filter
    MaliciousDomain,
    /// A firewall rule matched; see [`Verdict::matched_rule`]
    RuleMatch,
    /// No rule matched and the filter did not hit
    DefaultPolicy,
}

/// The engine's decision for one flow
#[derive(Debug, Clone)]
pub struct Verdict {
    /// Allow or block
    pub action: Action,
    /// How the decision was reached
    pub reason: VerdictReason,
    /// The matching rule, for auditing; `None` unless `reason` is
    /// [`VerdictReason::RuleMatch`]
    pub matched_rule: Option<Arc<FirewallRule>>,
}

/// Flow classifier with an explicit default policy
///
/// The default action applies when no rule matches and the domain filter
/// does not hit. It is a mandatory configuration input: the engine refuses
/// to construct without one rather than invent a per-flow fallback.
#[derive(Debug, Clone, Copy)]
pub struct MatchEngine {
    default_action: Action,
}

impl MatchEngine {
    /// Create an engine with the given default action for unmatched flows
    pub fn new(default_action: Action) -> Self {
        Self { default_action }
    }

    /// Create an engine from an optional configured default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingDefaultPolicy`] when no default is
    /// configured. This is a startup error, never a per-flow one.
    pub fn from_config(default_action: Option<Action>) -> Result<Self> {
        default_action
            .map(Self::new)
            .ok_or(Error::MissingDefaultPolicy)
    }

    /// The configured default action
    pub fn default_action(&self) -> Action {
        self.default_action
    }

    /// Classify one flow against a rule snapshot and the domain filter.
    ///
    /// 1. If the flow has a resolved host and the filter reports it as
    ///    possibly malicious, the flow is blocked immediately - the filter
    ///    overrides ordinary rule evaluation for known-bad domains.
    /// 2. Otherwise rules are evaluated in snapshot order (priority-sorted,
    ///    stable tie-break); the first matching rule wins and evaluation
    ///    stops.
    /// 3. With no filter hit and no matching rule, the configured default
    ///    applies.
    ///
    /// Identical inputs always produce the identical verdict.
    pub fn classify(
        &self,
        flow: &FlowDescriptor,
        rules: &RuleSnapshot,
        filter: &MaliciousDomainFilter,
    ) -> Verdict {
        if let Some(host) = flow.resolved_host.as_deref() {
            if filter.might_contain(host) {
                debug!(host, "malicious-domain filter hit, blocking");
                return Verdict {
                    action: Action::Block,
                    reason: VerdictReason::MaliciousDomain,
                    matched_rule: None,
                };
            }
        }

        for rule in rules.iter() {
            if rule.matches(flow) {
                debug!(
                    priority = rule.priority,
                    action = %rule.action,
                    "rule matched"
                );
                return Verdict {
                    action: rule.action,
                    reason: VerdictReason::RuleMatch,
                    matched_rule: Some(Arc::clone(rule)),
                };
            }
        }

        debug!(action = %self.default_action, "no rule matched, applying default");
        Verdict {
            action: self.default_action,
            reason: VerdictReason::DefaultPolicy,
            matched_rule: None,
        }
    }
}
