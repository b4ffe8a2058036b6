//! Firewall rule model
//!
//! This module defines the immutable value types a rule set is built from:
//! - [`FlowTuplePattern`]: one matchable tuple (host/address/port constraints)
//! - [`FirewallRule`]: priority, direction, protocols, action, and tuples
//! - [`RuleDef`] / [`TupleDef`]: the raw, loosely-typed records supplied by
//!   the configuration collaborator
//!
//! Construction is a validating parse step: [`FirewallRule::from_def`] turns
//! a raw record into a typed rule or a [`RuleParseError`]. Invalid records
//! are excluded one at a time, never fatal to a whole load.

mod pattern;

pub use pattern::{FlowTuplePattern, HostPattern, PortSpec};

pub(crate) use pattern::parse_addr_pattern;

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;

use crate::engine::FlowDescriptor;
use crate::error::RuleParseError;

/// Traffic direction a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Traffic arriving at this host
    Inbound,
    /// Traffic leaving this host
    Outbound,
}

impl Direction {
    /// Parse a direction name (`in`/`inbound`, `out`/`outbound`)
    pub fn parse(s: &str) -> Result<Self, RuleParseError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" | "inbound" => Ok(Self::Inbound),
            "out" | "outbound" => Ok(Self::Outbound),
            _ => Err(RuleParseError::UnknownDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inbound => write!(f, "in"),
            Self::Outbound => write!(f, "out"),
        }
    }
}

/// Transport protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// TCP
    Tcp,
    /// UDP
    Udp,
    /// ICMP
    Icmp,
}

impl Protocol {
    /// Parse a protocol name from the closed tcp/udp/icmp set
    pub fn parse(s: &str) -> Result<Self, RuleParseError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "icmp" => Ok(Self::Icmp),
            _ => Err(RuleParseError::UnknownProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
            Self::Icmp => write!(f, "icmp"),
        }
    }
}

/// Verdict action attached to a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Let the flow pass
    Allow,
    /// Drop the flow
    Block,
}

impl Action {
    /// Parse an action name (`allow` or `block`)
    pub fn parse(s: &str) -> Result<Self, RuleParseError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "block" => Ok(Self::Block),
            _ => Err(RuleParseError::UnknownAction(s.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Block => write!(f, "block"),
        }
    }
}

/// Raw flow tuple record as supplied by the configuration collaborator
///
/// Field aliases accept the legacy key spellings (`dstHost`, `dstIP`, ...)
/// so existing rule documents keep loading.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TupleDef {
    /// Destination host pattern, e.g. `"*.example.com"`
    #[serde(default, alias = "dstHost")]
    pub dst_host: Option<String>,
    /// Destination IP literal or CIDR block
    #[serde(default, alias = "dstIP")]
    pub dst_ip: Option<String>,
    /// Destination port specifiers, e.g. `["80", "50000-60000"]`
    #[serde(default, alias = "dstPorts")]
    pub dst_ports: Vec<String>,
    /// Source IP literal or CIDR block
    #[serde(default, alias = "srcIP")]
    pub src_ip: Option<String>,
    /// Source port specifiers
    #[serde(default, alias = "srcPorts")]
    pub src_ports: Vec<String>,
}

/// Raw rule record as supplied by the configuration collaborator
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDef {
    /// Evaluation priority; lower values are evaluated first
    #[serde(alias = "level")]
    pub priority: i32,
    /// `in` or `out`
    pub direction: String,
    /// Protocol names; empty matches any protocol
    #[serde(default)]
    pub protocols: Vec<String>,
    /// `allow` or `block`
    pub action: String,
    /// Matchable tuples; must be non-empty
    #[serde(default)]
    pub tuples: Vec<TupleDef>,
}

/// A validated firewall rule
///
/// Rules are immutable once constructed. A rule matches a flow when the
/// direction matches, the protocol matches (empty protocol set = any), and
/// **any** of its tuples matches (tuples are OR'd, fields within a tuple
/// are AND'd).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirewallRule {
    /// Evaluation priority; lower numeric value = evaluated earlier
    pub priority: i32,
    /// Direction this rule applies to
    pub direction: Direction,
    /// Protocols this rule applies to; empty = any protocol
    pub protocols: Vec<Protocol>,
    /// Verdict when the rule matches
    pub action: Action,
    /// OR'd list of matchable tuples; never empty
    pub tuples: Vec<FlowTuplePattern>,
}

impl FirewallRule {
    /// Validate a raw definition into a typed rule
    pub fn from_def(def: &RuleDef) -> Result<Self, RuleParseError> {
        let direction = Direction::parse(&def.direction)?;
        let action = Action::parse(&def.action)?;

        let mut protocols = Vec::with_capacity(def.protocols.len());
        for name in &def.protocols {
            let proto = Protocol::parse(name)?;
            if !protocols.contains(&proto) {
                protocols.push(proto);
            }
        }

        if def.tuples.is_empty() {
            return Err(RuleParseError::EmptyTuples);
        }

        let mut tuples = Vec::with_capacity(def.tuples.len());
        for tuple_def in &def.tuples {
            tuples.push(Self::tuple_from_def(tuple_def)?);
        }

        Ok(Self {
            priority: def.priority,
            direction,
            protocols,
            action,
            tuples,
        })
    }

    fn tuple_from_def(def: &TupleDef) -> Result<FlowTuplePattern, RuleParseError> {
        let dst_host = match def.dst_host.as_deref() {
            Some(pattern) => Some(HostPattern::parse(pattern)?),
            None => None,
        };
        let dst_addr = match def.dst_ip.as_deref() {
            Some(spec) => Some(parse_addr_pattern(spec)?),
            None => None,
        };
        let src_addr = match def.src_ip.as_deref() {
            Some(spec) => Some(parse_addr_pattern(spec)?),
            None => None,
        };

        let mut dst_ports = Vec::with_capacity(def.dst_ports.len());
        for spec in &def.dst_ports {
            dst_ports.push(PortSpec::parse(spec)?);
        }
        let mut src_ports = Vec::with_capacity(def.src_ports.len());
        for spec in &def.src_ports {
            src_ports.push(PortSpec::parse(spec)?);
        }

        Ok(FlowTuplePattern {
            dst_host,
            dst_addr,
            dst_ports,
            src_addr,
            src_ports,
        })
    }

    /// Priority ordering relation used for the snapshot sort
    ///
    /// Lower numeric priority sorts first (evaluated earlier). Equal
    /// priorities compare as `Equal`; the snapshot uses a stable sort, so
    /// insertion order is the documented tie-break.
    pub fn cmp_priority(a: &Self, b: &Self) -> Ordering {
        a.priority.cmp(&b.priority)
    }

    /// Test this rule against a flow
    pub fn matches(&self, flow: &FlowDescriptor) -> bool {
        if flow.direction != self.direction {
            return false;
        }
        if !self.protocols.is_empty() && !self.protocols.contains(&flow.protocol) {
            return false;
        }
        self.tuples.iter().any(|tuple| tuple.matches(flow))
    }
}
