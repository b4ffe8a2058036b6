//! Bloom filter bit array
//!
//! Sized from a target false-positive rate and an expected element count
//! using the standard formulas `m = -n * ln(p) / ln(2)^2` bits and
//! `k = (m / n) * ln(2)` probes. Probe positions are derived from a single
//! FNV-1a base hash with double hashing, so `k` follows the configured
//! target instead of being fixed.

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Fixed-size Bloom filter over byte strings
///
/// No false negatives: once `insert`ed, `might_contain` always reports true.
/// False positives occur at roughly the configured target rate.
#[derive(Debug, Clone)]
pub(crate) struct BloomFilter {
    bits: Vec<u8>,
    num_bits: u64,
    num_hashes: u32,
}

impl BloomFilter {
    /// Size a filter for `expected` elements at `target_rate` false positives.
    ///
    /// Callers validate the parameters; this only computes the geometry.
    pub(crate) fn with_rate(expected: usize, target_rate: f64) -> Self {
        let n = expected as f64;
        let ln2 = std::f64::consts::LN_2;

        let m = (-n * target_rate.ln() / (ln2 * ln2)).ceil();
        // At least one byte of bits, at least one probe
        let num_bits = (m as u64).max(8);
        let num_hashes = ((num_bits as f64 / n) * ln2).round().max(1.0) as u32;

        Self {
            bits: vec![0u8; num_bits.div_ceil(8) as usize],
            num_bits,
            num_hashes,
        }
    }

    /// Insert a byte string
    pub(crate) fn insert(&mut self, key: &[u8]) {
        let (h1, h2) = Self::hash_pair(key);
        for i in 0..self.num_hashes {
            let bit = h1.wrapping_add((i as u64).wrapping_mul(h2)) % self.num_bits;
            self.bits[(bit >> 3) as usize] |= 1 << (bit & 7);
        }
    }

    /// Test a byte string: true means "possibly present"
    pub(crate) fn might_contain(&self, key: &[u8]) -> bool {
        let (h1, h2) = Self::hash_pair(key);
        for i in 0..self.num_hashes {
            let bit = h1.wrapping_add((i as u64).wrapping_mul(h2)) % self.num_bits;
            if self.bits[(bit >> 3) as usize] & (1 << (bit & 7)) == 0 {
                return false;
            }
        }
        true
    }

    /// Size of the bit array in bytes
    pub(crate) fn size_bytes(&self) -> usize {
        self.bits.len()
    }

    /// Number of probe positions per key
    pub(crate) fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// FNV-1a base hash plus a finalizer-derived second hash for double
    /// hashing. The second hash is forced odd so consecutive probes never
    /// collapse onto one position.
    fn hash_pair(key: &[u8]) -> (u64, u64) {
        let mut h: u64 = FNV_OFFSET_BASIS;
        for &b in key {
            h ^= u64::from(b);
            h = h.wrapping_mul(FNV_PRIME);
        }

        // splitmix64 finalizer
        let mut h2 = h.wrapping_add(0x9e37_79b9_7f4a_7c15);
        h2 = (h2 ^ (h2 >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        h2 = (h2 ^ (h2 >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        h2 ^= h2 >> 31;

        (h, h2 | 1)
    }
}
