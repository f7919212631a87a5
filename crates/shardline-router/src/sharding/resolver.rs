//! Resolution of a partition-column value to the shard that owns it.
//!
//! Hash tables resolve either in O(1) by bucket arithmetic or in O(log n) by
//! searching the recorded hash token ranges; both must pick the same shard
//! for any uniform layout. Range and append tables always search. Reference
//! tables have a single shard that owns every value.

use super::compare::CompareFunction;
use super::hash::{hash_partition_value, HashFunction};
use super::hash_space::HashSpace;
use super::ordering::compare_by_range_start;
use shardline_core::{Datum, PartitionMethod, RoutingError, ShardInterval};
use std::cmp::Ordering;

/// Finds the shard interval that owns `value`.
///
/// `shards` must be sorted ascending by min value and hold `shard_count`
/// intervals. Returns `Ok(None)` when the value falls in a gap between
/// non-contiguous range shards. Missing functions and count mismatches are
/// contract violations and come back as errors.
pub fn find_shard_interval<'a>(
    value: &Datum,
    shards: &'a [ShardInterval],
    shard_count: usize,
    method: PartitionMethod,
    compare: Option<&dyn CompareFunction>,
    hash: Option<&dyn HashFunction>,
    use_binary_search: bool,
) -> Result<Option<&'a ShardInterval>, RoutingError> {
    if shard_count != shards.len() {
        return Err(RoutingError::ShardCountMismatch {
            claimed: shard_count,
            actual: shards.len(),
        });
    }

    match method {
        PartitionMethod::Hash => {
            let hash = hash.ok_or(RoutingError::MissingHashFunction)?;
            let token = hash_partition_value(value, hash)?;

            if use_binary_search {
                let compare = compare.ok_or(RoutingError::MissingCompareFunction { method })?;
                Ok(search_shard_interval(&Datum::Int4(token), shards, compare))
            } else {
                let index = HashSpace::new(shard_count)?.bucket_index(token);
                Ok(Some(&shards[index]))
            }
        }
        PartitionMethod::Reference => match shards {
            [only] => Ok(Some(only)),
            _ => Err(RoutingError::InvalidReferenceShardCount(shard_count)),
        },
        PartitionMethod::Range | PartitionMethod::Append => {
            let compare = compare.ok_or(RoutingError::MissingCompareFunction { method })?;
            Ok(search_shard_interval(value, shards, compare))
        }
    }
}

/// Binary search for the interval whose `[min, max]` contains `value`.
///
/// Boundless intervals must come after every bounded one. A boundless entry
/// is treated as greater than any value and never contains one.
pub fn search_shard_interval<'a>(
    value: &Datum,
    shards: &'a [ShardInterval],
    compare: &dyn CompareFunction,
) -> Option<&'a ShardInterval> {
    debug_assert!(
        is_sorted_by_range_start(shards, compare),
        "shard intervals must be sorted by min value"
    );

    let mut lower = 0;
    let mut upper = shards.len();

    while lower < upper {
        let middle = lower + (upper - lower) / 2;
        let Some((min, max)) = shards[middle].bounds() else {
            upper = middle;
            continue;
        };

        if compare.compare(value, min) == Ordering::Less {
            upper = middle;
            continue;
        }

        if compare.compare(value, max) != Ordering::Greater {
            return Some(&shards[middle]);
        }

        lower = middle + 1;
    }

    None
}

/// Returns true if no interval sorts after its successor.
///
/// Adjacent boundless intervals are accepted.
pub(crate) fn is_sorted_by_range_start(
    shards: &[ShardInterval],
    compare: &dyn CompareFunction,
) -> bool {
    first_unsorted_position(shards, compare).is_none()
}

pub(crate) fn first_unsorted_position(
    shards: &[ShardInterval],
    compare: &dyn CompareFunction,
) -> Option<usize> {
    shards
        .windows(2)
        .position(|pair| {
            !(pair[0].is_boundless() && pair[1].is_boundless())
                && compare_by_range_start(&pair[0], &pair[1], compare) == Ordering::Greater
        })
        .map(|position| position + 1)
}
