//! Hashing of partition-column values into the 32-bit hash token space.
//!
//! A [`HashFunction`] is the hashing capability of one partition column type.
//! Callers pass it explicitly into resolution; the built-in functions are
//! selected with [`builtin_hash_function`].

use super::lookup3::{hash_bytes, hash_uint32};
use shardline_core::{Datum, PartitionColumnType, RoutingError};

/// Type-aware hash function over partition-column values.
///
/// Implementations must be deterministic: the same value must always produce
/// the same token, on every node, for the lifetime of the table.
pub trait HashFunction: Send + Sync {
    /// Returns the signed 32-bit hash token of `value`.
    fn hash(&self, value: &Datum) -> Result<i32, RoutingError>;
}

impl<F> HashFunction for F
where
    F: Fn(&Datum) -> Result<i32, RoutingError> + Send + Sync,
{
    fn hash(&self, value: &Datum) -> Result<i32, RoutingError> {
        self(value)
    }
}

/// Applies `hash_function` to a partition-column value.
#[inline]
pub fn hash_partition_value(
    value: &Datum,
    hash_function: &dyn HashFunction,
) -> Result<i32, RoutingError> {
    hash_function.hash(value)
}

fn mismatch(expected: PartitionColumnType, value: &Datum) -> RoutingError {
    RoutingError::TypeMismatch {
        expected,
        found: value.column_type(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolHash;

impl HashFunction for BoolHash {
    fn hash(&self, value: &Datum) -> Result<i32, RoutingError> {
        match value {
            Datum::Bool(v) => Ok(hash_uint32(u32::from(*v)) as i32),
            other => Err(mismatch(PartitionColumnType::Bool, other)),
        }
    }
}

/// Sign-extends before hashing so an int2 hashes like the equal int4.
#[derive(Debug, Clone, Copy, Default)]
pub struct Int2Hash;

impl HashFunction for Int2Hash {
    fn hash(&self, value: &Datum) -> Result<i32, RoutingError> {
        match value {
            Datum::Int2(v) => Ok(hash_uint32(i32::from(*v) as u32) as i32),
            other => Err(mismatch(PartitionColumnType::Int2, other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Int4Hash;

impl HashFunction for Int4Hash {
    fn hash(&self, value: &Datum) -> Result<i32, RoutingError> {
        match value {
            Datum::Int4(v) => Ok(hash_uint32(*v as u32) as i32),
            other => Err(mismatch(PartitionColumnType::Int4, other)),
        }
    }
}

/// Folds the high word into the low word, so values that fit in 32 bits hash
/// exactly like the equal int4.
#[derive(Debug, Clone, Copy, Default)]
pub struct Int8Hash;

impl HashFunction for Int8Hash {
    fn hash(&self, value: &Datum) -> Result<i32, RoutingError> {
        match value {
            Datum::Int8(v) => {
                let lo = *v as u32;
                let hi = (*v >> 32) as u32;
                let folded = if *v >= 0 { lo ^ hi } else { lo ^ !hi };
                Ok(hash_uint32(folded) as i32)
            }
            other => Err(mismatch(PartitionColumnType::Int8, other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextHash;

impl HashFunction for TextHash {
    fn hash(&self, value: &Datum) -> Result<i32, RoutingError> {
        match value {
            Datum::Text(v) => Ok(hash_bytes(v.as_bytes()) as i32),
            other => Err(mismatch(PartitionColumnType::Text, other)),
        }
    }
}

/// Returns the built-in hash function for a column type.
pub fn builtin_hash_function(column_type: PartitionColumnType) -> &'static dyn HashFunction {
    match column_type {
        PartitionColumnType::Bool => &BoolHash,
        PartitionColumnType::Int2 => &Int2Hash,
        PartitionColumnType::Int4 => &Int4Hash,
        PartitionColumnType::Int8 => &Int8Hash,
        PartitionColumnType::Text => &TextHash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let f = builtin_hash_function(PartitionColumnType::Text);
        let a = hash_partition_value(&Datum::from("tenant-42"), f).unwrap();
        let b = hash_partition_value(&Datum::from("tenant-42"), f).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_integer_widths_agree() {
        for v in [0i32, 1, 5, 1000, 65_535, i32::MAX] {
            let int4 = Int4Hash.hash(&Datum::Int4(v)).unwrap();
            let int8 = Int8Hash.hash(&Datum::Int8(i64::from(v))).unwrap();
            assert_eq!(int4, int8, "int4/int8 disagree for {v}");
        }
        for v in [-1i16, 0, 7, i16::MIN, i16::MAX] {
            let int2 = Int2Hash.hash(&Datum::Int2(v)).unwrap();
            let int4 = Int4Hash.hash(&Datum::Int4(i32::from(v))).unwrap();
            assert_eq!(int2, int4, "int2/int4 disagree for {v}");
        }
    }

    #[test]
    fn test_builtin_catalog_values() {
        assert_eq!(Int4Hash.hash(&Datum::Int4(1)), Ok(-1_905_060_026));
        assert_eq!(Int4Hash.hash(&Datum::Int4(-42)), Ok(-487_492_805));
        assert_eq!(Int8Hash.hash(&Datum::Int8(1)), Ok(-1_905_060_026));
        assert_eq!(Int8Hash.hash(&Datum::Int8(1 | (1 << 40))), Ok(1_990_262_574));
        assert_eq!(Int8Hash.hash(&Datum::Int8(-(1 << 40))), Ok(-1_811_739_487));
        assert_eq!(Int2Hash.hash(&Datum::Int2(-1)), Ok(385_747_274));
        assert_eq!(BoolHash.hash(&Datum::Bool(true)), Ok(-1_905_060_026));
        assert_eq!(BoolHash.hash(&Datum::Bool(false)), Ok(-272_711_505));
        assert_eq!(TextHash.hash(&Datum::from("a")), Ok(1_075_015_857));
        assert_eq!(TextHash.hash(&Datum::from("")), Ok(-1_477_818_771));
    }

    #[test]
    fn test_int8_uses_high_word() {
        let low = Int8Hash.hash(&Datum::Int8(1)).unwrap();
        let high = Int8Hash.hash(&Datum::Int8(1 | (1 << 40))).unwrap();
        assert_ne!(low, high);
    }

    #[test]
    fn test_type_mismatch() {
        let err = Int4Hash.hash(&Datum::from("nope")).unwrap_err();
        assert_eq!(
            err,
            RoutingError::TypeMismatch {
                expected: PartitionColumnType::Int4,
                found: PartitionColumnType::Text,
            }
        );
    }

    #[test]
    fn test_closure_as_hash_function() {
        let identity = |value: &Datum| -> Result<i32, RoutingError> {
            value.as_int4().ok_or(RoutingError::TypeMismatch {
                expected: PartitionColumnType::Int4,
                found: value.column_type(),
            })
        };
        assert_eq!(hash_partition_value(&Datum::Int4(-17), &identity), Ok(-17));
    }
}
