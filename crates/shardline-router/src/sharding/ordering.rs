//! Orderings over shard intervals.

use super::compare::CompareFunction;
use shardline_core::ShardInterval;
use std::cmp::Ordering;

/// Compares two intervals by their min values.
///
/// An interval missing either bound is treated as the greater operand. When
/// both are boundless the left one is still reported as greater, so this is
/// not antisymmetric over several boundless intervals.
pub fn compare_by_range_start(
    left: &ShardInterval,
    right: &ShardInterval,
    compare: &dyn CompareFunction,
) -> Ordering {
    let Some((left_min, _)) = left.bounds() else {
        return Ordering::Greater;
    };
    let Some((right_min, _)) = right.bounds() else {
        return Ordering::Less;
    };
    compare.compare(left_min, right_min)
}

/// Compares two intervals by shard id.
#[inline]
pub fn compare_by_id(left: &ShardInterval, right: &ShardInterval) -> Ordering {
    left.shard_id.as_u64().cmp(&right.shard_id.as_u64())
}

/// Returns the interval with the lowest shard id, or `None` if there are none.
///
/// The first of several equal ids wins.
pub fn lowest_by_id<'a, I>(shards: I) -> Option<&'a ShardInterval>
where
    I: IntoIterator<Item = &'a ShardInterval>,
{
    shards.into_iter().fold(None, |lowest, shard| match lowest {
        Some(current) if compare_by_id(current, shard) != Ordering::Greater => Some(current),
        _ => Some(shard),
    })
}
