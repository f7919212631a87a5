//! # Shardline Router
//!
//! Resolves partition-key values of distributed tables to the shards that
//! own them.
//!
//! - [`sharding`] - Hash, range and reference resolution, shard ordering,
//!   shard index lookup and replication checks
//! - [`config`] - Layered routing configuration
//! - [`logging`] - Tracing subscriber setup

pub mod config;
pub mod logging;
pub mod sharding;

// Re-exports
pub use config::{ConfigError, RoutingConfig, ShardlineConfig};
pub use shardline_core::{
    Datum, PartitionColumnType, PartitionMethod, RelationId, RoutingError, ShardId,
    ShardInterval, ShardPlacement,
};
pub use sharding::{RoutePlan, ShardMetadataSnapshot, ShardRouter, SnapshotEpoch, TableShards};
