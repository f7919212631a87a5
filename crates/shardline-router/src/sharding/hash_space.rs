//! Bucket arithmetic over the 32-bit signed hash token space.
//!
//! A uniformly hash partitioned table with `n` shards splits the token range
//! `[i32::MIN, i32::MAX]` into `n` buckets of `floor(2^32 / n)` tokens each.
//! When `n` does not divide `2^32`, the remainder goes to the last bucket.

use shardline_core::RoutingError;

/// Number of distinct 32-bit hash tokens.
pub const HASH_TOKEN_COUNT: u64 = 1 << 32;

/// The bucket layout of a hash partitioned table with a given shard count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashSpace {
    shard_count: usize,
    bucket_width: u64,
}

impl HashSpace {
    /// Creates the layout for `shard_count` buckets.
    pub fn new(shard_count: usize) -> Result<Self, RoutingError> {
        if shard_count == 0 {
            return Err(RoutingError::EmptyShardArray);
        }
        if shard_count as u64 > HASH_TOKEN_COUNT {
            return Err(RoutingError::TooManyShards(shard_count));
        }
        Ok(Self {
            shard_count,
            bucket_width: HASH_TOKEN_COUNT / shard_count as u64,
        })
    }

    #[inline]
    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    /// Number of tokens in every bucket but the last.
    #[inline]
    pub fn bucket_width(&self) -> u64 {
        self.bucket_width
    }

    /// Returns the index of the bucket containing `token`.
    #[inline]
    pub fn bucket_index(&self, token: i32) -> usize {
        let offset = (i64::from(token) - i64::from(i32::MIN)) as u64;
        let index = offset / self.bucket_width;

        // Tokens past the last full bucket belong to the last shard.
        (index as usize).min(self.shard_count - 1)
    }

    /// Returns the inclusive `[min, max]` token range of bucket `index`.
    pub fn bucket_bounds(&self, index: usize) -> (i32, i32) {
        debug_assert!(index < self.shard_count);
        let min = i64::from(i32::MIN) + index as i64 * self.bucket_width as i64;
        let max = if index + 1 == self.shard_count {
            i64::from(i32::MAX)
        } else {
            min + self.bucket_width as i64 - 1
        };
        (min as i32, max as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_shards_rejected() {
        assert_eq!(HashSpace::new(0), Err(RoutingError::EmptyShardArray));
    }

    #[test]
    fn test_three_buckets() {
        let space = HashSpace::new(3).unwrap();
        let width = space.bucket_width();
        assert_eq!(width, HASH_TOKEN_COUNT / 3);

        assert_eq!(space.bucket_index(i32::MIN), 0);
        assert_eq!(space.bucket_index(i32::MAX), 2);

        let boundary = (i64::from(i32::MIN) + width as i64) as i32;
        assert_eq!(space.bucket_index(boundary - 1), 0);
        assert_eq!(space.bucket_index(boundary), 1);
    }

    #[test]
    fn test_last_bucket_absorbs_remainder() {
        let space = HashSpace::new(3).unwrap();
        let (min0, max0) = space.bucket_bounds(0);
        let (min2, max2) = space.bucket_bounds(2);
        assert_eq!(min0, i32::MIN);
        assert_eq!(max2, i32::MAX);

        let first = i64::from(max0) - i64::from(min0) + 1;
        let last = i64::from(max2) - i64::from(min2) + 1;
        assert_eq!(first as u64, space.bucket_width());
        assert_eq!(last as u64, space.bucket_width() + HASH_TOKEN_COUNT % 3);
    }

    #[test]
    fn test_bounds_are_contiguous() {
        for count in [1usize, 2, 3, 7, 32, 100] {
            let space = HashSpace::new(count).unwrap();
            let mut expected_min = i64::from(i32::MIN);
            for i in 0..count {
                let (min, max) = space.bucket_bounds(i);
                assert_eq!(i64::from(min), expected_min);
                assert_eq!(space.bucket_index(min), i);
                assert_eq!(space.bucket_index(max), i);
                expected_min = i64::from(max) + 1;
            }
            assert_eq!(expected_min, i64::from(i32::MAX) + 1);
        }
    }

    #[test]
    fn test_single_bucket_owns_everything() {
        let space = HashSpace::new(1).unwrap();
        assert_eq!(space.bucket_index(i32::MIN), 0);
        assert_eq!(space.bucket_index(0), 0);
        assert_eq!(space.bucket_index(i32::MAX), 0);
        assert_eq!(space.bucket_bounds(0), (i32::MIN, i32::MAX));
    }
}
