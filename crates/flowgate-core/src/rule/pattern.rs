//! Matchable flow tuple patterns
//!
//! A [`FlowTuplePattern`] is one OR-branch of a firewall rule: a set of
//! optional constraints over destination host/address/ports and source
//! address/ports. Fields within a tuple are AND'd; an absent or empty field
//! is a universal matcher, never one that rejects everything, so a tuple
//! with no fields at all matches any flow.

use std::fmt;
use std::net::IpAddr;

use ipnet::IpNet;

use crate::engine::FlowDescriptor;
use crate::error::RuleParseError;
use crate::filter::normalize_domain;

/// A single port or an inclusive port range
///
/// Parsed from specifiers such as `"443"` or `"50000-60000"`. Both bounds
/// are inclusive and must lie in 1-65535.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortSpec {
    /// Start of the range (inclusive)
    start: u16,
    /// End of the range (inclusive)
    end: u16,
}

impl PortSpec {
    /// Create a range, validating `start <= end`
    pub fn new(start: u16, end: u16) -> Result<Self, RuleParseError> {
        if start == 0 || end == 0 {
            return Err(RuleParseError::InvalidPort {
                spec: format!("{start}-{end}"),
            });
        }
        if start > end {
            return Err(RuleParseError::InvalidPortRange {
                low: start,
                high: end,
            });
        }
        Ok(Self { start, end })
    }

    /// Range covering exactly one port
    pub fn single(port: u16) -> Result<Self, RuleParseError> {
        Self::new(port, port)
    }

    /// Parse a specifier: either `"80"` or `"80-443"`
    pub fn parse(spec: &str) -> Result<Self, RuleParseError> {
        let s = spec.trim();

        let parse_port = |part: &str| -> Result<u16, RuleParseError> {
            part.trim()
                .parse::<u16>()
                .ok()
                .filter(|&p| p != 0)
                .ok_or_else(|| RuleParseError::InvalidPort {
                    spec: spec.to_string(),
                })
        };

        if let Some((low, high)) = s.split_once('-') {
            Self::new(parse_port(low)?, parse_port(high)?)
        } else {
            Self::single(parse_port(s)?)
        }
    }

    /// Inclusive containment check
    pub fn contains(&self, port: u16) -> bool {
        port >= self.start && port <= self.end
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Destination host pattern
///
/// Either an exact domain (`example.com`) or a leading-wildcard pattern
/// (`*.example.com`) that matches the base label itself and any subdomain.
/// Patterns are stored normalized; queries are normalized the same way
/// before comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    /// Exact domain match
    Exact(String),
    /// `*.domain` - matches `domain` and any subdomain of it
    Wildcard(String),
}

impl HostPattern {
    /// Parse a host pattern from a rule definition
    pub fn parse(pattern: &str) -> Result<Self, RuleParseError> {
        let normalized = normalize_domain(pattern);

        if let Some(base) = normalized.strip_prefix("*.") {
            if base.is_empty() || base.contains('*') {
                return Err(RuleParseError::InvalidHostPattern(pattern.to_string()));
            }
            return Ok(Self::Wildcard(base.to_string()));
        }

        if normalized.is_empty() || normalized.contains('*') {
            return Err(RuleParseError::InvalidHostPattern(pattern.to_string()));
        }
        Ok(Self::Exact(normalized))
    }

    /// Check whether a resolved host name matches this pattern
    pub fn matches(&self, host: &str) -> bool {
        let host = normalize_domain(host);
        match self {
            Self::Exact(domain) => host == *domain,
            Self::Wildcard(base) => {
                if host == *base {
                    return true;
                }
                // Subdomain: must end with ".base"
                host.len() > base.len()
                    && host.ends_with(base.as_str())
                    && host.as_bytes()[host.len() - base.len() - 1] == b'.'
            }
        }
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(domain) => write!(f, "{domain}"),
            Self::Wildcard(base) => write!(f, "*.{base}"),
        }
    }
}

/// Parse an IP literal or CIDR block from a rule definition
///
/// Bare literals are widened to host-length prefixes (`/32` or `/128`).
pub(crate) fn parse_addr_pattern(spec: &str) -> Result<IpNet, RuleParseError> {
    let s = spec.trim();
    if let Ok(addr) = s.parse::<IpAddr>() {
        return Ok(IpNet::from(addr));
    }
    s.parse::<IpNet>()
        .map_err(|_| RuleParseError::InvalidCidr(spec.to_string()))
}

/// One matchable tuple of a firewall rule
///
/// Every field is optional; absent (or empty, for the port lists) means
/// "matches anything" on that dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowTuplePattern {
    /// Destination host pattern; `None` matches any host (or no host)
    pub dst_host: Option<HostPattern>,
    /// Destination address or CIDR block
    pub dst_addr: Option<IpNet>,
    /// Destination port specifiers; empty matches any port
    pub dst_ports: Vec<PortSpec>,
    /// Source address or CIDR block
    pub src_addr: Option<IpNet>,
    /// Source port specifiers; empty matches any port
    pub src_ports: Vec<PortSpec>,
}

impl FlowTuplePattern {
    /// The universal tuple: no constraints, matches every flow
    pub fn any() -> Self {
        Self {
            dst_host: None,
            dst_addr: None,
            dst_ports: Vec::new(),
            src_addr: None,
            src_ports: Vec::new(),
        }
    }

    /// Test this tuple against a flow. All present fields must match.
    ///
    /// A present host pattern cannot be satisfied by a flow with no resolved
    /// host, and a present address pattern cannot be satisfied by a flow
    /// with no address on that side: the tuple simply does not match, and
    /// evaluation falls through to the remaining tuples and rules.
    pub fn matches(&self, flow: &FlowDescriptor) -> bool {
        if let Some(pattern) = &self.dst_host {
            match flow.resolved_host.as_deref() {
                Some(host) if pattern.matches(host) => {}
                _ => return false,
            }
        }

        if let Some(net) = &self.dst_addr {
            match flow.dst_addr {
                Some(ip) if net.contains(&ip) => {}
                _ => return false,
            }
        }

        if !self.dst_ports.is_empty() && !self.dst_ports.iter().any(|p| p.contains(flow.dst_port)) {
            return false;
        }

        if let Some(net) = &self.src_addr {
            match flow.src_addr {
                Some(ip) if net.contains(&ip) => {}
                _ => return false,
            }
        }

        if !self.src_ports.is_empty() && !self.src_ports.iter().any(|p| p.contains(flow.src_port)) {
            return false;
        }

        true
    }
}
