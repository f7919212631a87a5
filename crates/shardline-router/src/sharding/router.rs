//! Query routing over a metadata snapshot.
//!
//! Resolves partition-column values of a distributed table to shards and
//! builds the shard set a multi-value query has to touch.

use super::locator::shard_interval_index;
use super::ordering::{compare_by_id, lowest_by_id};
use super::replication::{is_single_replicated, PlacementCatalog};
use super::snapshot::{ShardMetadataProvider, ShardMetadataSnapshot, SnapshotEpoch};
use crate::config::RoutingConfig;
use shardline_core::{Datum, RelationId, RoutingError, ShardId, ShardInterval};
use std::collections::HashSet;

/// The shards a query over a set of partition values must reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePlan {
    /// Matched shards, ordered by shard id.
    pub target_shards: Vec<ShardId>,
    /// Lowest matched shard id; the shard that anchors multi-shard work.
    pub anchor_shard: Option<ShardId>,
    /// Whether results need to be merged from multiple shards.
    pub requires_merge: bool,
    /// Values that fell between shards.
    pub unmatched_values: usize,
}

impl RoutePlan {
    /// Returns true if exactly one shard is targeted.
    pub fn is_single_shard(&self) -> bool {
        self.target_shards.len() == 1
    }

    /// Returns true if no value matched a shard.
    pub fn is_empty(&self) -> bool {
        self.target_shards.is_empty()
    }
}

/// Routes values of distributed tables to shards.
#[derive(Debug, Clone, Copy)]
pub struct ShardRouter<'a> {
    snapshot: &'a ShardMetadataSnapshot,
    config: RoutingConfig,
}

impl<'a> ShardRouter<'a> {
    /// Creates a router over `snapshot`.
    pub fn new(snapshot: &'a ShardMetadataSnapshot, config: RoutingConfig) -> Self {
        Self { snapshot, config }
    }

    /// Creates a router, failing if `snapshot` is not at `expected` and the
    /// configuration requires a current snapshot.
    pub fn at_epoch(
        snapshot: &'a ShardMetadataSnapshot,
        config: RoutingConfig,
        expected: SnapshotEpoch,
    ) -> Result<Self, RoutingError> {
        if config.require_current_epoch {
            snapshot.check_epoch(expected)?;
        }
        Ok(Self::new(snapshot, config))
    }

    pub fn epoch(&self) -> SnapshotEpoch {
        self.snapshot.epoch()
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Returns the shard of `relation_id` that owns `value`, if any.
    pub fn find_shard(
        &self,
        relation_id: RelationId,
        value: &Datum,
    ) -> Result<Option<&'a ShardInterval>, RoutingError> {
        let snapshot: &'a ShardMetadataSnapshot = self.snapshot;
        let table = snapshot.table_shards(relation_id)?;
        let shard = table.find_shard(value, self.config.use_binary_search)?;

        match shard {
            Some(shard) => tracing::trace!(
                relation = %relation_id,
                value = %value,
                shard_id = %shard.shard_id,
                "Routed value"
            ),
            None => tracing::debug!(
                relation = %relation_id,
                value = %value,
                "Value is not covered by any shard"
            ),
        }

        Ok(shard)
    }

    /// Returns the position of `shard` within its table's shard array.
    pub fn shard_index(&self, shard: &ShardInterval) -> Result<usize, RoutingError> {
        shard_interval_index(shard, self.snapshot)
    }

    /// Plans a query over several partition values of one table.
    pub fn plan_values(
        &self,
        relation_id: RelationId,
        values: &[Datum],
    ) -> Result<RoutePlan, RoutingError> {
        let mut seen = HashSet::new();
        let mut matched: Vec<&ShardInterval> = Vec::new();
        let mut unmatched_values = 0;

        for value in values {
            match self.find_shard(relation_id, value)? {
                Some(shard) => {
                    if seen.insert(shard.shard_id) {
                        matched.push(shard);
                    }
                }
                None => unmatched_values += 1,
            }
        }

        let anchor_shard = lowest_by_id(matched.iter().copied()).map(|s| s.shard_id);
        matched.sort_by(|a, b| compare_by_id(a, b));

        Ok(RoutePlan {
            requires_merge: matched.len() > 1,
            target_shards: matched.iter().map(|s| s.shard_id).collect(),
            anchor_shard,
            unmatched_values,
        })
    }

    /// Returns true if no shard of `relation_id` has more than one placement.
    pub fn is_single_replicated<C>(&self, relation_id: RelationId, catalog: &C) -> bool
    where
        C: PlacementCatalog + ?Sized,
    {
        is_single_replicated(relation_id, catalog)
    }
}

// =============================================================================
// Tests
// =============================================================================
