//! Immutable, epoch-stamped snapshots of distributed table metadata.
//!
//! Routing never consults ambient catalog state. Callers build a
//! [`ShardMetadataSnapshot`] from their catalog, pass it into every routing
//! call, and replace it (with a new epoch) whenever shards are created,
//! split or moved.

use super::compare::{builtin_compare_function, CompareFunction, IntegerCompare};
use super::hash::{builtin_hash_function, HashFunction};
use super::hash_space::HashSpace;
use super::resolver::{find_shard_interval, first_unsorted_position};
use serde::{Deserialize, Serialize};
use shardline_core::{
    Datum, PartitionColumnType, PartitionMethod, RelationId, RoutingError, ShardInterval,
};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Version marker of a metadata snapshot.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SnapshotEpoch(pub u64);

impl SnapshotEpoch {
    /// Returns the epoch that follows this one, or `None` once epochs are
    /// exhausted.
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(epoch) => Some(Self(epoch)),
            None => None,
        }
    }
}

impl fmt::Display for SnapshotEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of per-table shard metadata.
pub trait ShardMetadataProvider {
    fn table_shards(&self, relation_id: RelationId) -> Result<&TableShards, RoutingError>;
}

/// Serialized form of [`TableShards`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableLayout {
    pub relation_id: RelationId,
    pub partition_method: PartitionMethod,
    pub column_type: PartitionColumnType,
    #[serde(default)]
    pub shards: Vec<ShardInterval>,
}

/// Shard metadata of one distributed table.
///
/// The shard array is validated once on construction; layout facts that
/// routing depends on are derived up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TableLayout", into = "TableLayout")]
pub struct TableShards {
    relation_id: RelationId,
    partition_method: PartitionMethod,
    column_type: PartitionColumnType,
    shards: Vec<ShardInterval>,
    has_uniform_hash_distribution: bool,
    has_overlapping_intervals: bool,
}

impl TableShards {
    /// Validates and wraps a table's sorted shard array.
    pub fn new(
        relation_id: RelationId,
        partition_method: PartitionMethod,
        column_type: PartitionColumnType,
        shards: Vec<ShardInterval>,
    ) -> Result<Self, RoutingError> {
        if let Some(foreign) = shards.iter().find(|s| s.relation_id != relation_id) {
            return Err(RoutingError::RelationMismatch {
                shard_id: foreign.shard_id,
                expected: relation_id,
                found: foreign.relation_id,
            });
        }

        if partition_method == PartitionMethod::Reference && shards.len() != 1 {
            return Err(RoutingError::InvalidReferenceShardCount(shards.len()));
        }

        if partition_method == PartitionMethod::Hash && shards.is_empty() {
            return Err(RoutingError::EmptyShardArray);
        }

        let compare = interval_compare_function(partition_method, column_type);
        if let Some(position) = first_unsorted_position(&shards, compare) {
            return Err(RoutingError::UnsortedShardArray {
                relation_id,
                position,
            });
        }

        let has_uniform_hash_distribution =
            partition_method == PartitionMethod::Hash && is_uniform_hash_layout(&shards);
        let has_overlapping_intervals = detect_overlapping_intervals(&shards, compare);

        tracing::debug!(
            relation = %relation_id,
            method = %partition_method,
            shard_count = shards.len(),
            uniform = has_uniform_hash_distribution,
            overlapping = has_overlapping_intervals,
            "Loaded table shard layout"
        );

        Ok(Self {
            relation_id,
            partition_method,
            column_type,
            shards,
            has_uniform_hash_distribution,
            has_overlapping_intervals,
        })
    }

    pub fn relation_id(&self) -> RelationId {
        self.relation_id
    }

    pub fn partition_method(&self) -> PartitionMethod {
        self.partition_method
    }

    pub fn column_type(&self) -> PartitionColumnType {
        self.column_type
    }

    /// The shard array, sorted by min value.
    pub fn shards(&self) -> &[ShardInterval] {
        &self.shards
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// True if every shard owns exactly its canonical hash bucket.
    pub fn has_uniform_hash_distribution(&self) -> bool {
        self.has_uniform_hash_distribution
    }

    /// True if any two shards may own the same value.
    pub fn has_overlapping_intervals(&self) -> bool {
        self.has_overlapping_intervals
    }

    /// Comparison over this table's shard bounds.
    pub fn compare_function(&self) -> &'static dyn CompareFunction {
        interval_compare_function(self.partition_method, self.column_type)
    }

    /// Hash function of the partition column.
    pub fn hash_function(&self) -> &'static dyn HashFunction {
        builtin_hash_function(self.column_type)
    }

    /// Resolves `value` with the column type's built-in functions.
    ///
    /// Hash tables without a uniform layout always use binary search, since
    /// bucket arithmetic is only valid for canonical bucket bounds.
    pub fn find_shard(
        &self,
        value: &Datum,
        use_binary_search: bool,
    ) -> Result<Option<&ShardInterval>, RoutingError> {
        let binary = use_binary_search
            || (self.partition_method == PartitionMethod::Hash
                && !self.has_uniform_hash_distribution);

        find_shard_interval(
            value,
            &self.shards,
            self.shards.len(),
            self.partition_method,
            Some(self.compare_function()),
            Some(self.hash_function()),
            binary,
        )
    }
}

impl TryFrom<TableLayout> for TableShards {
    type Error = RoutingError;

    fn try_from(layout: TableLayout) -> Result<Self, Self::Error> {
        Self::new(
            layout.relation_id,
            layout.partition_method,
            layout.column_type,
            layout.shards,
        )
    }
}

impl From<TableShards> for TableLayout {
    fn from(table: TableShards) -> Self {
        Self {
            relation_id: table.relation_id,
            partition_method: table.partition_method,
            column_type: table.column_type,
            shards: table.shards,
        }
    }
}

impl ShardMetadataProvider for TableShards {
    fn table_shards(&self, relation_id: RelationId) -> Result<&TableShards, RoutingError> {
        if relation_id == self.relation_id {
            Ok(self)
        } else {
            Err(RoutingError::UnknownRelation(relation_id))
        }
    }
}

/// Hash tables store hash tokens as bounds regardless of the column type.
fn interval_compare_function(
    method: PartitionMethod,
    column_type: PartitionColumnType,
) -> &'static dyn CompareFunction {
    match method {
        PartitionMethod::Hash => &IntegerCompare,
        _ => builtin_compare_function(column_type),
    }
}

fn is_uniform_hash_layout(shards: &[ShardInterval]) -> bool {
    let Ok(space) = HashSpace::new(shards.len()) else {
        return false;
    };

    shards.iter().enumerate().all(|(index, shard)| {
        let (expected_min, expected_max) = space.bucket_bounds(index);
        shard.bounds().is_some_and(|(min, max)| {
            min.as_int4() == Some(expected_min) && max.as_int4() == Some(expected_max)
        })
    })
}

fn detect_overlapping_intervals(shards: &[ShardInterval], compare: &dyn CompareFunction) -> bool {
    if shards.iter().any(ShardInterval::is_boundless) {
        return true;
    }

    shards.windows(2).any(|pair| match (pair[0].bounds(), pair[1].bounds()) {
        (Some((_, prev_max)), Some((next_min, _))) => {
            compare.compare(next_min, prev_max) != Ordering::Greater
        }
        _ => true,
    })
}

/// Serialized form of [`ShardMetadataSnapshot`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotLayout {
    #[serde(default)]
    pub epoch: SnapshotEpoch,
    #[serde(default)]
    pub tables: Vec<TableShards>,
}

/// Point-in-time metadata for a set of distributed tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "SnapshotLayout", into = "SnapshotLayout")]
pub struct ShardMetadataSnapshot {
    epoch: SnapshotEpoch,
    tables: HashMap<RelationId, TableShards>,
}

impl ShardMetadataSnapshot {
    /// Creates an empty snapshot at `epoch`.
    pub fn new(epoch: SnapshotEpoch) -> Self {
        Self {
            epoch,
            tables: HashMap::new(),
        }
    }

    /// Adds a table, replacing any earlier metadata for the same relation.
    pub fn with_table(mut self, table: TableShards) -> Self {
        self.tables.insert(table.relation_id(), table);
        self
    }

    pub fn epoch(&self) -> SnapshotEpoch {
        self.epoch
    }

    /// Fails if this snapshot is not the one the caller expects.
    pub fn check_epoch(&self, expected: SnapshotEpoch) -> Result<(), RoutingError> {
        if self.epoch == expected {
            return Ok(());
        }
        tracing::warn!(
            expected = expected.0,
            actual = self.epoch.0,
            "Shard metadata snapshot is stale"
        );
        Err(RoutingError::StaleSnapshot {
            expected: expected.0,
            actual: self.epoch.0,
        })
    }

    pub fn table(&self, relation_id: RelationId) -> Option<&TableShards> {
        self.tables.get(&relation_id)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableShards> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl ShardMetadataProvider for ShardMetadataSnapshot {
    fn table_shards(&self, relation_id: RelationId) -> Result<&TableShards, RoutingError> {
        self.table(relation_id)
            .ok_or(RoutingError::UnknownRelation(relation_id))
    }
}

impl From<SnapshotLayout> for ShardMetadataSnapshot {
    fn from(layout: SnapshotLayout) -> Self {
        layout
            .tables
            .into_iter()
            .fold(Self::new(layout.epoch), Self::with_table)
    }
}

impl From<ShardMetadataSnapshot> for SnapshotLayout {
    fn from(snapshot: ShardMetadataSnapshot) -> Self {
        let mut tables: Vec<_> = snapshot.tables.into_values().collect();
        tables.sort_by_key(TableShards::relation_id);
        Self {
            epoch: snapshot.epoch,
            tables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardline_core::ShardId;

    const REL: RelationId = RelationId::new(42);

    fn uniform_hash_shards(count: usize) -> Vec<ShardInterval> {
        let space = HashSpace::new(count).unwrap();
        (0..count)
            .map(|i| {
                let (min, max) = space.bucket_bounds(i);
                ShardInterval::hash_range(REL, ShardId::new(i as u64 + 1), min, max)
            })
            .collect()
    }

    #[test]
    fn test_uniform_hash_layout_detected() {
        let table = TableShards::new(
            REL,
            PartitionMethod::Hash,
            PartitionColumnType::Int8,
            uniform_hash_shards(4),
        )
        .unwrap();
        assert!(table.has_uniform_hash_distribution());
        assert!(!table.has_overlapping_intervals());
    }

    #[test]
    fn test_non_uniform_hash_layout_uses_search() {
        let shards = vec![
            ShardInterval::hash_range(REL, ShardId::new(1), i32::MIN, -1),
            ShardInterval::hash_range(REL, ShardId::new(2), 0, 100),
            ShardInterval::hash_range(REL, ShardId::new(3), 101, i32::MAX),
        ];
        let table =
            TableShards::new(REL, PartitionMethod::Hash, PartitionColumnType::Int4, shards).unwrap();
        assert!(!table.has_uniform_hash_distribution());

        // Whatever the token, the owner must actually contain it.
        for v in 0..200 {
            let owner = table.find_shard(&Datum::Int4(v), false).unwrap().unwrap();
            let token = table.hash_function().hash(&Datum::Int4(v)).unwrap();
            let (min, max) = owner.bounds().unwrap();
            assert!(min.as_int4().unwrap() <= token && token <= max.as_int4().unwrap());
        }
    }

    #[test]
    fn test_unsorted_rejected() {
        let shards = vec![
            ShardInterval::new(REL, ShardId::new(1), 20i64, 30i64),
            ShardInterval::new(REL, ShardId::new(2), 1i64, 10i64),
        ];
        let err = TableShards::new(REL, PartitionMethod::Range, PartitionColumnType::Int8, shards)
            .unwrap_err();
        assert_eq!(
            err,
            RoutingError::UnsortedShardArray {
                relation_id: REL,
                position: 1
            }
        );
    }

    #[test]
    fn test_foreign_shard_rejected() {
        let shards = vec![ShardInterval::new(RelationId::new(9), ShardId::new(1), 1i64, 2i64)];
        let err = TableShards::new(REL, PartitionMethod::Range, PartitionColumnType::Int8, shards)
            .unwrap_err();
        assert!(matches!(err, RoutingError::RelationMismatch { .. }));
    }

    #[test]
    fn test_reference_table_needs_one_shard() {
        let err = TableShards::new(
            REL,
            PartitionMethod::Reference,
            PartitionColumnType::Int4,
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, RoutingError::InvalidReferenceShardCount(0));
    }

    #[test]
    fn test_hash_table_needs_shards() {
        let err = TableShards::new(
            REL,
            PartitionMethod::Hash,
            PartitionColumnType::Int4,
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, RoutingError::EmptyShardArray);

        let text = r#"
            relation_id = 42
            partition_method = "hash"
            column_type = "int4"
        "#;
        assert!(toml::from_str::<TableShards>(text).is_err());

        // Range tables without shards are valid; every value misses.
        let empty_range =
            TableShards::new(REL, PartitionMethod::Range, PartitionColumnType::Int8, Vec::new())
                .unwrap();
        assert!(empty_range.find_shard(&Datum::Int8(1), false).unwrap().is_none());
    }

    #[test]
    fn test_overlap_detection() {
        let overlapping = vec![
            ShardInterval::new(REL, ShardId::new(1), 1i64, 10i64),
            ShardInterval::new(REL, ShardId::new(2), 10i64, 20i64),
        ];
        let table =
            TableShards::new(REL, PartitionMethod::Append, PartitionColumnType::Int8, overlapping)
                .unwrap();
        assert!(table.has_overlapping_intervals());

        let with_boundless = vec![
            ShardInterval::new(REL, ShardId::new(1), 1i64, 10i64),
            ShardInterval::boundless(REL, ShardId::new(2)),
        ];
        let table = TableShards::new(
            REL,
            PartitionMethod::Append,
            PartitionColumnType::Int8,
            with_boundless,
        )
        .unwrap();
        assert!(table.has_overlapping_intervals());
    }

    #[test]
    fn test_epoch_check() {
        let snapshot = ShardMetadataSnapshot::new(SnapshotEpoch(3));
        assert!(snapshot.check_epoch(SnapshotEpoch(3)).is_ok());
        assert_eq!(
            snapshot.check_epoch(SnapshotEpoch(2)),
            Err(RoutingError::StaleSnapshot {
                expected: 2,
                actual: 3
            })
        );
        assert_eq!(SnapshotEpoch(3).next(), Some(SnapshotEpoch(4)));
        assert_eq!(SnapshotEpoch(u64::MAX).next(), None);
    }

    #[test]
    fn test_provider_lookup() {
        let table = TableShards::new(
            REL,
            PartitionMethod::Hash,
            PartitionColumnType::Int4,
            uniform_hash_shards(2),
        )
        .unwrap();
        let snapshot = ShardMetadataSnapshot::new(SnapshotEpoch(1)).with_table(table);

        assert_eq!(snapshot.table_shards(REL).unwrap().shard_count(), 2);
        assert_eq!(
            snapshot.table_shards(RelationId::new(1)).unwrap_err(),
            RoutingError::UnknownRelation(RelationId::new(1))
        );
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_snapshot_from_toml() {
        let text = r#"
            epoch = 7

            [[tables]]
            relation_id = 10
            partition_method = "range"
            column_type = "int8"

            [[tables.shards]]
            shard_id = 102008
            relation_id = 10
            min_value = { type = "int8", value = 1 }
            max_value = { type = "int8", value = 10 }

            [[tables.shards]]
            shard_id = 102009
            relation_id = 10
            min_value = { type = "int8", value = 11 }
            max_value = { type = "int8", value = 20 }

            [[tables]]
            relation_id = 11
            partition_method = "reference"
            column_type = "text"

            [[tables.shards]]
            shard_id = 102010
            relation_id = 11
        "#;

        let snapshot: ShardMetadataSnapshot = toml::from_str(text).unwrap();
        assert_eq!(snapshot.epoch(), SnapshotEpoch(7));
        assert_eq!(snapshot.len(), 2);

        let range = snapshot.table(RelationId::new(10)).unwrap();
        let found = range.find_shard(&Datum::Int8(15), false).unwrap().unwrap();
        assert_eq!(found.shard_id, ShardId::new(102009));

        let reference = snapshot.table(RelationId::new(11)).unwrap();
        assert!(reference.shards()[0].is_boundless());
    }

    #[test]
    fn test_invalid_table_in_toml_rejected() {
        let text = r#"
            relation_id = 10
            partition_method = "reference"
            column_type = "int4"
        "#;
        assert!(toml::from_str::<TableShards>(text).is_err());
    }
}
