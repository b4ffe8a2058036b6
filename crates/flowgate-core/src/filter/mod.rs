//! Malicious-domain membership filter
//!
//! A space-efficient approximate set of known-malicious domain names. The
//! matching engine consults it before any rule evaluation: a hit blocks the
//! flow outright. The filter has **no false negatives** - every inserted
//! domain always reports present - and a bounded false-positive rate, so an
//! innocent domain can occasionally collide and be blocked. That tradeoff is
//! deliberate and documented user-facing behavior.
//!
//! The filter matches literal domains only. Wildcard patterns such as
//! `*.example.com` belong to the rule model, not here.

mod bloom;

use bloom::BloomFilter;
use tracing::info;

use crate::error::FilterBuildError;

/// Normalize a domain name for filter insertion and queries
///
/// Trims surrounding whitespace, strips trailing dot separators, and
/// lowercases. Build and query must use the identical normalization or the
/// no-false-negative guarantee is void, so both go through this function.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Approximate set of known-malicious domain names
///
/// Built once from a corpus and queried read-only thereafter. To update,
/// build a fresh filter and replace the old one wholesale; the structure is
/// never mutated while queries are in flight.
#[derive(Debug, Clone)]
pub struct MaliciousDomainFilter {
    bloom: BloomFilter,
    entries: usize,
    target_rate: f64,
}

impl MaliciousDomainFilter {
    /// Build a filter from a corpus of domain names.
    ///
    /// The bit array and probe count are sized so that membership queries
    /// stay under `target_rate` false positives for `expected_count`
    /// elements. Domains are normalized on insertion.
    ///
    /// # Errors
    ///
    /// Returns [`FilterBuildError`] if `target_rate` is outside (0, 1) or
    /// `expected_count` is zero. On error nothing is built; the caller's
    /// previous filter, if any, stays active.
    pub fn build<I, S>(
        domains: I,
        target_rate: f64,
        expected_count: usize,
    ) -> Result<Self, FilterBuildError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !(target_rate > 0.0 && target_rate < 1.0) {
            return Err(FilterBuildError::InvalidTargetRate { rate: target_rate });
        }
        if expected_count == 0 {
            return Err(FilterBuildError::InvalidExpectedCount);
        }

        let mut bloom = BloomFilter::with_rate(expected_count, target_rate);
        let mut entries = 0;
        for domain in domains {
            let normalized = normalize_domain(domain.as_ref());
            if normalized.is_empty() {
                continue;
            }
            bloom.insert(normalized.as_bytes());
            entries += 1;
        }

        info!(
            entries,
            size_bytes = bloom.size_bytes(),
            probes = bloom.num_hashes(),
            target_rate,
            "built malicious-domain filter"
        );

        Ok(Self {
            bloom,
            entries,
            target_rate,
        })
    }

    /// Query whether a domain is possibly in the malicious set.
    ///
    /// `true` is guaranteed for every domain that was inserted; for domains
    /// that were not, `true` occurs with probability at most roughly the
    /// configured target rate. `false` is always definitive.
    pub fn might_contain(&self, domain: &str) -> bool {
        let normalized = normalize_domain(domain);
        if normalized.is_empty() {
            return false;
        }
        self.bloom.might_contain(normalized.as_bytes())
    }

    /// Number of domains inserted at build time
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Whether the corpus was empty
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// The false-positive rate the filter was sized for
    pub fn target_rate(&self) -> f64 {
        self.target_rate
    }
}
