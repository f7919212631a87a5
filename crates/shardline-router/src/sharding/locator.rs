//! Position of a known shard within its table's sorted shard array.

use super::hash_space::HashSpace;
use super::snapshot::ShardMetadataProvider;
use shardline_core::{PartitionColumnType, PartitionMethod, RoutingError, ShardInterval};

/// Returns the index of `shard` in its table's shard array.
///
/// Reference tables have a single shard at index 0. For hash tables the
/// shard's min value is itself a bucket boundary, so the bucket arithmetic
/// that places a hash token also places the shard. Range and append shards
/// have no closed-form position; resolve them by value instead.
pub fn shard_interval_index<P>(shard: &ShardInterval, provider: &P) -> Result<usize, RoutingError>
where
    P: ShardMetadataProvider + ?Sized,
{
    let table = provider.table_shards(shard.relation_id)?;

    match table.partition_method() {
        PartitionMethod::Reference => {
            if table.shard_count() != 1 {
                return Err(RoutingError::InvalidReferenceShardCount(table.shard_count()));
            }
            Ok(0)
        }
        PartitionMethod::Hash => hash_shard_index(shard, table.shard_count()),
        method => Err(RoutingError::UnsupportedIndexLookup { method }),
    }
}

/// Bucket index of a hash shard in a table with `shard_count` shards.
pub fn hash_shard_index(shard: &ShardInterval, shard_count: usize) -> Result<usize, RoutingError> {
    let min_value = shard
        .min_value
        .as_ref()
        .ok_or(RoutingError::MissingBound(shard.shard_id))?;
    let token = min_value.as_int4().ok_or(RoutingError::TypeMismatch {
        expected: PartitionColumnType::Int4,
        found: min_value.column_type(),
    })?;

    Ok(HashSpace::new(shard_count)?.bucket_index(token))
}
