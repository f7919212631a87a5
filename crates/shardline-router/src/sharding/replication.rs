//! Replication factor checks over shard placements.

use shardline_core::{RelationId, ShardId, ShardPlacement};
use std::collections::HashMap;

/// Source of shard lists and placements, usually backed by the catalog.
pub trait PlacementCatalog {
    /// Shard ids of a table, in catalog order.
    fn shard_ids(&self, relation_id: RelationId) -> Vec<ShardId>;

    /// Number of placements (replicas) of a shard.
    fn placement_count(&self, shard_id: ShardId) -> usize;
}

/// Returns true if no shard of the table has more than one placement.
///
/// Stops at the first replicated shard. A table without shards is trivially
/// single replicated.
pub fn is_single_replicated<C>(relation_id: RelationId, catalog: &C) -> bool
where
    C: PlacementCatalog + ?Sized,
{
    catalog
        .shard_ids(relation_id)
        .into_iter()
        .all(|shard_id| catalog.placement_count(shard_id) <= 1)
}

/// A placement catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlacements {
    shards: HashMap<RelationId, Vec<ShardId>>,
    placements: HashMap<ShardId, Vec<ShardPlacement>>,
}

impl InMemoryPlacements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shard of a table.
    pub fn add_shard(&mut self, relation_id: RelationId, shard_id: ShardId) {
        self.shards.entry(relation_id).or_default().push(shard_id);
    }

    /// Registers one replica of a shard.
    pub fn add_placement(&mut self, placement: ShardPlacement) {
        self.placements
            .entry(placement.shard_id)
            .or_default()
            .push(placement);
    }

    /// Returns all placements of a shard.
    pub fn placements(&self, shard_id: ShardId) -> &[ShardPlacement] {
        self.placements
            .get(&shard_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl PlacementCatalog for InMemoryPlacements {
    fn shard_ids(&self, relation_id: RelationId) -> Vec<ShardId> {
        self.shards.get(&relation_id).cloned().unwrap_or_default()
    }

    fn placement_count(&self, shard_id: ShardId) -> usize {
        self.placements(shard_id).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const REL: RelationId = RelationId::new(1);

    fn catalog(replicas: &[usize]) -> InMemoryPlacements {
        let mut catalog = InMemoryPlacements::new();
        for (i, &count) in replicas.iter().enumerate() {
            let shard_id = ShardId::new(100 + i as u64);
            catalog.add_shard(REL, shard_id);
            for node in 0..count {
                catalog.add_placement(ShardPlacement::new(shard_id, format!("worker-{node}"), 5432));
            }
        }
        catalog
    }

    #[test]
    fn test_all_single_replicas() {
        assert!(is_single_replicated(REL, &catalog(&[1, 1, 1])));
    }

    #[test]
    fn test_one_replicated_shard() {
        assert!(!is_single_replicated(REL, &catalog(&[1, 2, 1])));
        assert!(!is_single_replicated(REL, &catalog(&[3, 1, 1])));
        assert!(!is_single_replicated(REL, &catalog(&[1, 1, 2])));
    }

    #[test]
    fn test_no_shards() {
        assert!(is_single_replicated(REL, &InMemoryPlacements::new()));
        assert!(is_single_replicated(RelationId::new(2), &catalog(&[2])));
    }

    struct CountingCatalog {
        counts: Vec<usize>,
        lookups: Cell<usize>,
    }

    impl PlacementCatalog for CountingCatalog {
        fn shard_ids(&self, _relation_id: RelationId) -> Vec<ShardId> {
            (0..self.counts.len() as u64).map(ShardId::new).collect()
        }

        fn placement_count(&self, shard_id: ShardId) -> usize {
            self.lookups.set(self.lookups.get() + 1);
            self.counts[shard_id.as_u64() as usize]
        }
    }

    #[test]
    fn test_stops_at_first_replicated_shard() {
        let catalog = CountingCatalog {
            counts: vec![1, 2, 1, 1, 1],
            lookups: Cell::new(0),
        };
        assert!(!is_single_replicated(REL, &catalog));
        assert_eq!(catalog.lookups.get(), 2);
    }

    #[test]
    fn test_placements_lookup() {
        let catalog = catalog(&[2]);
        let placements = catalog.placements(ShardId::new(100));
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[1].address(), "worker-1:5432");
        assert!(catalog.placements(ShardId::new(1)).is_empty());
    }
}
