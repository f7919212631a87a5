//! # Shardline Core
//!
//! Core types shared by the shardline routing crates.
//!
//! This crate provides the vocabulary of a distributed table's shard layout:
//! - [`ShardId`] and [`RelationId`] - Type-safe identifiers
//! - [`PartitionMethod`] - How a table assigns rows to shards
//! - [`Datum`] - A typed partition-column value
//! - [`ShardInterval`] - The key range owned by one shard
//! - [`ShardPlacement`] - One physical replica of a shard
//! - [`RoutingError`] - Errors raised while routing values to shards

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Identifiers (Newtypes for type safety)
// =============================================================================

/// A globally unique shard identifier.
///
/// Shard ids are assigned monotonically at creation time and never change,
/// so they double as a stable sort key independent of the shard's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ShardId(pub u64);

impl ShardId {
    /// Creates a new ShardId from a u64.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ShardId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Identifier of a distributed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct RelationId(pub u32);

impl RelationId {
    /// Creates a new RelationId from a u32.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw u32 value.
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rel{}", self.0)
    }
}

impl From<u32> for RelationId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

// =============================================================================
// Partitioning
// =============================================================================

/// The strategy a distributed table uses to assign rows to shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionMethod {
    /// Rows are placed by the hash of the partition column.
    Hash,
    /// Rows are placed by ordered ranges of the partition column.
    Range,
    /// Ordered ranges that only grow at the end (routed like `Range`).
    Append,
    /// A single shard holds every row.
    Reference,
}

impl PartitionMethod {
    /// Returns the one-character catalog code for this method.
    pub const fn code(self) -> char {
        match self {
            PartitionMethod::Hash => 'h',
            PartitionMethod::Range => 'r',
            PartitionMethod::Append => 'a',
            PartitionMethod::Reference => 'n',
        }
    }

    /// Parses a catalog code.
    pub fn from_code(code: char) -> Result<Self, RoutingError> {
        match code {
            'h' => Ok(PartitionMethod::Hash),
            'r' => Ok(PartitionMethod::Range),
            'a' => Ok(PartitionMethod::Append),
            'n' => Ok(PartitionMethod::Reference),
            other => Err(RoutingError::UnknownPartitionMethod(other)),
        }
    }

    /// Returns true for methods routed by searching ordered key ranges.
    #[inline]
    pub const fn is_range_ordered(self) -> bool {
        matches!(self, PartitionMethod::Range | PartitionMethod::Append)
    }
}

impl fmt::Display for PartitionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PartitionMethod::Hash => "hash",
            PartitionMethod::Range => "range",
            PartitionMethod::Append => "append",
            PartitionMethod::Reference => "reference",
        };
        f.write_str(name)
    }
}

/// The concrete type of a partition column.
///
/// Selects which hash and comparison functions apply to its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionColumnType {
    Bool,
    Int2,
    Int4,
    Int8,
    Text,
}

impl fmt::Display for PartitionColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PartitionColumnType::Bool => "bool",
            PartitionColumnType::Int2 => "int2",
            PartitionColumnType::Int4 => "int4",
            PartitionColumnType::Int8 => "int8",
            PartitionColumnType::Text => "text",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Values
// =============================================================================

/// A typed partition-column value or shard boundary.
///
/// Hash-partitioned shards store their boundaries as [`Datum::Int4`] hash
/// tokens; range-partitioned shards store values of the column's own type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Datum {
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Text(String),
}

impl Datum {
    /// Returns the column type this value belongs to.
    pub fn column_type(&self) -> PartitionColumnType {
        match self {
            Datum::Bool(_) => PartitionColumnType::Bool,
            Datum::Int2(_) => PartitionColumnType::Int2,
            Datum::Int4(_) => PartitionColumnType::Int4,
            Datum::Int8(_) => PartitionColumnType::Int8,
            Datum::Text(_) => PartitionColumnType::Text,
        }
    }

    /// Attempts to get the value as an i32 hash token.
    pub fn as_int4(&self) -> Option<i32> {
        match self {
            Datum::Int4(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to widen an integer value to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Datum::Int2(v) => Some(i64::from(*v)),
            Datum::Int4(v) => Some(i64::from(*v)),
            Datum::Int8(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to get the value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Bool(v) => write!(f, "{v}"),
            Datum::Int2(v) => write!(f, "{v}"),
            Datum::Int4(v) => write!(f, "{v}"),
            Datum::Int8(v) => write!(f, "{v}"),
            Datum::Text(v) => write!(f, "'{v}'"),
        }
    }
}

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Datum::Bool(v)
    }
}

impl From<i16> for Datum {
    fn from(v: i16) -> Self {
        Datum::Int2(v)
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Datum::Int4(v)
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Int8(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::Text(v.to_string())
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::Text(v)
    }
}

// =============================================================================
// Shards
// =============================================================================

/// One contiguous portion of a distributed table's key space.
///
/// A missing bound makes the interval boundless; boundless intervals sort
/// after every bounded one and never match a range probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardInterval {
    pub shard_id: ShardId,
    pub relation_id: RelationId,
    #[serde(default)]
    pub min_value: Option<Datum>,
    #[serde(default)]
    pub max_value: Option<Datum>,
}

impl ShardInterval {
    /// Creates an interval with both bounds present.
    pub fn new(
        relation_id: RelationId,
        shard_id: ShardId,
        min_value: impl Into<Datum>,
        max_value: impl Into<Datum>,
    ) -> Self {
        Self {
            shard_id,
            relation_id,
            min_value: Some(min_value.into()),
            max_value: Some(max_value.into()),
        }
    }

    /// Creates an interval over the hash token range `[min, max]`.
    pub fn hash_range(relation_id: RelationId, shard_id: ShardId, min: i32, max: i32) -> Self {
        Self::new(relation_id, shard_id, Datum::Int4(min), Datum::Int4(max))
    }

    /// Creates an interval with no recorded bounds.
    pub fn boundless(relation_id: RelationId, shard_id: ShardId) -> Self {
        Self {
            shard_id,
            relation_id,
            min_value: None,
            max_value: None,
        }
    }

    #[inline]
    pub fn min_value_exists(&self) -> bool {
        self.min_value.is_some()
    }

    #[inline]
    pub fn max_value_exists(&self) -> bool {
        self.max_value.is_some()
    }

    /// Returns true if either bound is missing.
    #[inline]
    pub fn is_boundless(&self) -> bool {
        !(self.min_value_exists() && self.max_value_exists())
    }

    /// Returns both bounds, or `None` if the interval is boundless.
    pub fn bounds(&self) -> Option<(&Datum, &Datum)> {
        match (&self.min_value, &self.max_value) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}

impl fmt::Display for ShardInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds() {
            Some((min, max)) => write!(f, "shard {} [{}, {}]", self.shard_id, min, max),
            None => write!(f, "shard {} (unbounded)", self.shard_id),
        }
    }
}

/// One physical replica location of a shard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardPlacement {
    pub shard_id: ShardId,
    pub node_name: String,
    pub node_port: u16,
}

impl ShardPlacement {
    /// Creates a new placement.
    pub fn new(shard_id: ShardId, node_name: impl Into<String>, node_port: u16) -> Self {
        Self {
            shard_id,
            node_name: node_name.into(),
            node_port,
        }
    }

    /// Returns the `host:port` address of the placement.
    pub fn address(&self) -> String {
        format!("{}:{}", self.node_name, self.node_port)
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while resolving values or shards.
///
/// A probe that falls into a gap between shards is not an error; resolvers
/// report it as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("finding index of given shard is not supported for {method} partitioned tables")]
    UnsupportedIndexLookup { method: PartitionMethod },

    #[error("{method} partitioned tables require a compare function")]
    MissingCompareFunction { method: PartitionMethod },

    #[error("hash partitioned tables require a hash function")]
    MissingHashFunction,

    #[error("shard count {claimed} does not match shard array length {actual}")]
    ShardCountMismatch { claimed: usize, actual: usize },

    #[error("reference tables must have exactly one shard, found {0}")]
    InvalidReferenceShardCount(usize),

    #[error("cannot route a value to a table without shards")]
    EmptyShardArray,

    #[error("{0} shards exceed the 32-bit hash token space")]
    TooManyShards(usize),

    #[error("shard intervals of {relation_id} are not sorted by min value at position {position}")]
    UnsortedShardArray {
        relation_id: RelationId,
        position: usize,
    },

    #[error("shard {shard_id} belongs to {found}, expected {expected}")]
    RelationMismatch {
        shard_id: ShardId,
        expected: RelationId,
        found: RelationId,
    },

    #[error("shard {0} has no min value")]
    MissingBound(ShardId),

    #[error("expected a {expected} value, found {found}")]
    TypeMismatch {
        expected: PartitionColumnType,
        found: PartitionColumnType,
    },

    #[error("no shard metadata for {0}")]
    UnknownRelation(RelationId),

    #[error("shard metadata snapshot is stale: expected epoch {expected}, found {actual}")]
    StaleSnapshot { expected: u64, actual: u64 },

    #[error("unknown partition method code '{0}'")]
    UnknownPartitionMethod(char),
}
