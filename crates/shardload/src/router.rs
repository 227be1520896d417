//! Hash Router (§4.3): maps a parsed partition key to a shard index.
//!
//! The router is a pure function, called inline by each Reader — there is
//! no dedicated router worker. Two policies are provided because the
//! original `get_matching_hash_bounds_int` routine is a range-bound lookup
//! against a PostgreSQL-family shard map, not a plain modulo; callers that
//! only need an even split can use [`Modulo`] instead.

use std::sync::Arc;

use crate::err::ShardLoadError;

/// A pluggable strategy for mapping a partition key to a shard index in
/// `[0, shard_count)`.
pub trait ShardRouter: Send + Sync {
    /// Returns the destination shard for `key`. Must be deterministic and
    /// agree with every other Reader and the Reassembler for the same key.
    fn route(&self, key: i64) -> usize;

    /// Number of shards this router distributes across.
    fn shard_count(&self) -> usize;
}

/// `key mod shard_count`, mapped into `[0, shard_count)` (Rust's `%` can
/// return a negative result for a negative `key`, so this wraps it).
#[derive(Debug, Clone, Copy)]
pub struct Modulo {
    shard_count: usize,
}

impl Modulo {
    pub fn new(shard_count: usize) -> Result<Self, ShardLoadError> {
        if shard_count == 0 {
            return Err(ShardLoadError::Config("shard_count must be at least 1".to_string()));
        }
        Ok(Modulo { shard_count })
    }
}

impl ShardRouter for Modulo {
    fn route(&self, key: i64) -> usize {
        let s = self.shard_count as i64;
        (key.rem_euclid(s)) as usize
    }

    fn shard_count(&self) -> usize {
        self.shard_count
    }
}

/// Looks up `key` in a sorted list of half-open `[lo, hi)` bounds, one per
/// shard — the "range-bound" strategy that mirrors a PostgreSQL-family
/// shard map. Bounds must partition the key space with no gaps or
/// overlaps; the last shard's `hi` is conventionally `i64::MAX`.
#[derive(Debug, Clone)]
pub struct RangeBound {
    bounds: Vec<(i64, i64)>,
}

impl RangeBound {
    /// Builds a range-bound router from `(lo, hi)` pairs, one per shard in
    /// shard-index order. Validates that bounds are contiguous and
    /// non-overlapping.
    pub fn new(bounds: Vec<(i64, i64)>) -> Result<Self, ShardLoadError> {
        if bounds.is_empty() {
            return Err(ShardLoadError::Config("at least one shard bound is required".to_string()));
        }
        for (i, &(lo, hi)) in bounds.iter().enumerate() {
            if lo >= hi {
                return Err(ShardLoadError::Config(format!(
                    "shard {i} bound [{lo}, {hi}) is not a valid non-empty range"
                )));
            }
            if i > 0 && bounds[i - 1].1 != lo {
                return Err(ShardLoadError::Config(format!(
                    "shard {i} bound does not start where shard {} ends",
                    i - 1
                )));
            }
        }
        Ok(RangeBound { bounds })
    }

    /// Builds an evenly-spaced range-bound router covering
    /// `[i64::MIN, i64::MAX]` across `shard_count` shards — a convenience
    /// for configs that don't supply explicit bounds.
    pub fn even_split(shard_count: usize) -> Result<Self, ShardLoadError> {
        if shard_count == 0 {
            return Err(ShardLoadError::Config("shard_count must be at least 1".to_string()));
        }
        let span = u64::MAX / shard_count as u64;
        let mut bounds = Vec::with_capacity(shard_count);
        let mut lo = i64::MIN;
        for i in 0..shard_count {
            let hi = if i + 1 == shard_count {
                i64::MAX
            } else {
                lo.saturating_add(span as i64)
            };
            bounds.push((lo, hi));
            lo = hi;
        }
        RangeBound::new(bounds)
    }
}

impl ShardRouter for RangeBound {
    fn route(&self, key: i64) -> usize {
        match self.bounds.binary_search_by(|&(lo, hi)| {
            if key < lo {
                std::cmp::Ordering::Greater
            } else if key >= hi {
                std::cmp::Ordering::Less
            } else {
                std::cmp::Ordering::Equal
            }
        }) {
            Ok(i) => i,
            // key fell outside every bound (shouldn't happen given
            // even_split/validated bounds); clamp to the nearest shard.
            Err(i) => i.min(self.bounds.len() - 1),
        }
    }

    fn shard_count(&self) -> usize {
        self.bounds.len()
    }
}

/// Builds the router named by a primary config's `routerpolicy` field:
/// `"modulo"` for [`Modulo`], `"rangebound"` for [`RangeBound`] — built
/// from `bounds` when given, or an even split across `shard_count`
/// otherwise.
pub fn build(
    policy: &str,
    shard_count: usize,
    bounds: Option<Vec<(i64, i64)>>,
) -> Result<Arc<dyn ShardRouter>, ShardLoadError> {
    match policy {
        "modulo" => Ok(Arc::new(Modulo::new(shard_count)?)),
        "rangebound" => match bounds {
            Some(b) => Ok(Arc::new(RangeBound::new(b)?)),
            None => Ok(Arc::new(RangeBound::even_split(shard_count)?)),
        },
        other => Err(ShardLoadError::Config(format!(
            "routerpolicy {other} must be one of modulo|rangebound"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_selects_modulo() {
        let r = build("modulo", 4, None).unwrap();
        assert_eq!(r.shard_count(), 4);
        assert_eq!(r.route(5), 1);
    }

    #[test]
    fn build_selects_rangebound_with_explicit_bounds() {
        let r = build("rangebound", 2, Some(vec![(0, 10), (10, 20)])).unwrap();
        assert_eq!(r.shard_count(), 2);
        assert_eq!(r.route(15), 1);
    }

    #[test]
    fn build_selects_rangebound_even_split_without_bounds() {
        let r = build("rangebound", 3, None).unwrap();
        assert_eq!(r.shard_count(), 3);
    }

    #[test]
    fn build_rejects_unknown_policy() {
        assert!(build("round-robin", 2, None).is_err());
    }

    #[test]
    fn modulo_wraps_negative_keys() {
        let r = Modulo::new(4).unwrap();
        assert_eq!(r.route(-1), 3);
        assert_eq!(r.route(0), 0);
        assert_eq!(r.route(5), 1);
    }

    #[test]
    fn modulo_is_stable_regardless_of_caller() {
        let r = Modulo::new(2).unwrap();
        // S1 scenario: key 1 -> shard 1, key 2 -> shard 0, key 3 -> shard 1
        assert_eq!(r.route(1), 1);
        assert_eq!(r.route(2), 0);
        assert_eq!(r.route(3), 1);
    }

    #[test]
    fn range_bound_rejects_gaps() {
        assert!(RangeBound::new(vec![(0, 10), (20, 30)]).is_err());
    }

    #[test]
    fn range_bound_even_split_covers_full_range() {
        let r = RangeBound::even_split(3).unwrap();
        assert_eq!(r.shard_count(), 3);
        assert_eq!(r.route(i64::MIN), 0);
        assert_eq!(r.route(i64::MAX), 2);
    }

    #[test]
    fn range_bound_finds_matching_bucket() {
        let r = RangeBound::new(vec![(0, 10), (10, 20), (20, 30)]).unwrap();
        assert_eq!(r.route(5), 0);
        assert_eq!(r.route(10), 1);
        assert_eq!(r.route(29), 2);
    }
}
