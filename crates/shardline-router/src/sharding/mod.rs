//! Shard routing for distributed tables.
//!
//! Maps a partition-column value to the shard that owns it, and a known
//! shard to its position in the table's shard array.
//!
//! # Partitioning Methods
//!
//! - **Hash**: values hash into the 32-bit token space, split into one
//!   bucket per shard; resolved by bucket arithmetic or binary search
//! - **Range / Append**: shards own ordered key ranges; resolved by binary
//!   search, values in gaps resolve to no shard
//! - **Reference**: one shard owns every value
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         ShardRouter                             │
//! │                             │                                   │
//! │                 ┌───────────▼───────────┐                       │
//! │                 │ ShardMetadataSnapshot │  (epoch-stamped)      │
//! │                 └───────────┬───────────┘                       │
//! │            ┌────────────────┼─────────────────┐                 │
//! │   ┌────────▼────────┐ ┌─────▼──────┐ ┌────────▼─────────┐       │
//! │   │ resolver        │ │ locator    │ │ replication      │       │
//! │   │ value -> shard  │ │ shard->idx │ │ placement counts │       │
//! │   └───┬─────────┬───┘ └─────┬──────┘ └──────────────────┘       │
//! │       │         │           │                                   │
//! │  ┌────▼───┐ ┌───▼──────┐ ┌──▼─────────┐                         │
//! │  │ hash   │ │ ordering │ │ hash_space │                         │
//! │  └────────┘ └──────────┘ └────────────┘                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod compare;
mod hash;
mod hash_space;
mod locator;
mod lookup3;
mod ordering;
mod replication;
mod resolver;
mod router;
mod snapshot;

pub use compare::{
    builtin_compare_function, compare_datums, BoolCompare, CompareFunction, IntegerCompare,
    TextCompare,
};
pub use hash::{
    builtin_hash_function, hash_partition_value, BoolHash, HashFunction, Int2Hash, Int4Hash,
    Int8Hash, TextHash,
};
pub use hash_space::{HashSpace, HASH_TOKEN_COUNT};
pub use locator::{hash_shard_index, shard_interval_index};
pub use lookup3::{hash_bytes, hash_uint32};
pub use ordering::{compare_by_id, compare_by_range_start, lowest_by_id};
pub use replication::{is_single_replicated, InMemoryPlacements, PlacementCatalog};
pub use resolver::{find_shard_interval, search_shard_interval};
pub use router::{RoutePlan, ShardRouter};
pub use snapshot::{
    ShardMetadataProvider, ShardMetadataSnapshot, SnapshotEpoch, SnapshotLayout, TableLayout,
    TableShards,
};
