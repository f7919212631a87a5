//! Three-way comparison of partition-column values.

use shardline_core::{Datum, PartitionColumnType};
use std::cmp::Ordering;

/// Type-aware comparison over partition-column values.
///
/// Must be a total order consistent with the shard array's sort order;
/// resolution results are unspecified otherwise.
pub trait CompareFunction: Send + Sync {
    fn compare(&self, left: &Datum, right: &Datum) -> Ordering;
}

impl<F> CompareFunction for F
where
    F: Fn(&Datum, &Datum) -> Ordering + Send + Sync,
{
    fn compare(&self, left: &Datum, right: &Datum) -> Ordering {
        self(left, right)
    }
}

fn type_rank(value: &Datum) -> u8 {
    match value {
        Datum::Bool(_) => 0,
        Datum::Int2(_) | Datum::Int4(_) | Datum::Int8(_) => 1,
        Datum::Text(_) => 2,
    }
}

/// Total order over all datums: integers compare numerically across widths,
/// unrelated types order by a fixed type rank.
pub fn compare_datums(left: &Datum, right: &Datum) -> Ordering {
    match (left, right) {
        (Datum::Bool(l), Datum::Bool(r)) => l.cmp(r),
        (Datum::Text(l), Datum::Text(r)) => l.as_bytes().cmp(r.as_bytes()),
        _ => match (left.as_i64(), right.as_i64()) {
            (Some(l), Some(r)) => l.cmp(&r),
            _ => type_rank(left).cmp(&type_rank(right)),
        },
    }
}

/// Integer comparison; also the comparison used for hash tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerCompare;

impl CompareFunction for IntegerCompare {
    #[inline]
    fn compare(&self, left: &Datum, right: &Datum) -> Ordering {
        match (left, right) {
            (Datum::Int4(l), Datum::Int4(r)) => l.cmp(r),
            (Datum::Int8(l), Datum::Int8(r)) => l.cmp(r),
            _ => compare_datums(left, right),
        }
    }
}

/// Byte-wise ("C" collation) text comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCompare;

impl CompareFunction for TextCompare {
    #[inline]
    fn compare(&self, left: &Datum, right: &Datum) -> Ordering {
        compare_datums(left, right)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolCompare;

impl CompareFunction for BoolCompare {
    #[inline]
    fn compare(&self, left: &Datum, right: &Datum) -> Ordering {
        compare_datums(left, right)
    }
}

/// Returns the built-in comparison for a column type.
pub fn builtin_compare_function(column_type: PartitionColumnType) -> &'static dyn CompareFunction {
    match column_type {
        PartitionColumnType::Bool => &BoolCompare,
        PartitionColumnType::Int2 | PartitionColumnType::Int4 | PartitionColumnType::Int8 => {
            &IntegerCompare
        }
        PartitionColumnType::Text => &TextCompare,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_compare_across_widths() {
        let cmp = IntegerCompare;
        assert_eq!(cmp.compare(&Datum::Int4(5), &Datum::Int8(5)), Ordering::Equal);
        assert_eq!(cmp.compare(&Datum::Int2(-1), &Datum::Int4(0)), Ordering::Less);
        assert_eq!(
            cmp.compare(&Datum::Int4(i32::MAX), &Datum::Int4(i32::MIN)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_text_compare_bytewise() {
        let cmp = builtin_compare_function(PartitionColumnType::Text);
        assert_eq!(cmp.compare(&"B".into(), &"a".into()), Ordering::Less);
        assert_eq!(cmp.compare(&"abc".into(), &"abd".into()), Ordering::Less);
        assert_eq!(cmp.compare(&"ab".into(), &"ab".into()), Ordering::Equal);
    }

    #[test]
    fn test_mixed_types_are_total() {
        let values = [Datum::Bool(true), Datum::Int8(-3), Datum::from("x")];
        for l in &values {
            for r in &values {
                assert_eq!(compare_datums(l, r), compare_datums(r, l).reverse());
            }
        }
    }
}
