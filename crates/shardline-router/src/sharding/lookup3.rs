//! Bob Jenkins' lookup3 mixing, as used by catalog hash functions.
//!
//! Hash tokens computed here are persisted implicitly in every hash
//! partitioned table's shard boundaries, so the output must never change.
//! Multi-byte words are read little-endian.

const GOLDEN_RATIO: u32 = 0x9e37_79b9;
const SEED: u32 = 3_923_095;

struct State {
    a: u32,
    b: u32,
    c: u32,
}

impl State {
    fn new(len: usize) -> Self {
        let init = GOLDEN_RATIO.wrapping_add(len as u32).wrapping_add(SEED);
        Self {
            a: init,
            b: init,
            c: init,
        }
    }

    #[inline]
    fn mix(&mut self) {
        let Self { a, b, c } = self;
        *a = a.wrapping_sub(*c);
        *a ^= c.rotate_left(4);
        *c = c.wrapping_add(*b);
        *b = b.wrapping_sub(*a);
        *b ^= a.rotate_left(6);
        *a = a.wrapping_add(*c);
        *c = c.wrapping_sub(*b);
        *c ^= b.rotate_left(8);
        *b = b.wrapping_add(*a);
        *a = a.wrapping_sub(*c);
        *a ^= c.rotate_left(16);
        *c = c.wrapping_add(*b);
        *b = b.wrapping_sub(*a);
        *b ^= a.rotate_left(19);
        *a = a.wrapping_add(*c);
        *c = c.wrapping_sub(*b);
        *c ^= b.rotate_left(4);
        *b = b.wrapping_add(*a);
    }

    #[inline]
    fn finish(mut self) -> u32 {
        let Self { a, b, c } = &mut self;
        *c ^= *b;
        *c = c.wrapping_sub(b.rotate_left(14));
        *a ^= *c;
        *a = a.wrapping_sub(c.rotate_left(11));
        *b ^= *a;
        *b = b.wrapping_sub(a.rotate_left(25));
        *c ^= *b;
        *c = c.wrapping_sub(b.rotate_left(16));
        *a ^= *c;
        *a = a.wrapping_sub(c.rotate_left(4));
        *b ^= *a;
        *b = b.wrapping_sub(a.rotate_left(14));
        *c ^= *b;
        *c = c.wrapping_sub(b.rotate_left(24));
        *c
    }
}

#[inline]
fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Hashes a single 32-bit word.
pub fn hash_uint32(value: u32) -> u32 {
    let mut state = State::new(std::mem::size_of::<u32>());
    state.a = state.a.wrapping_add(value);
    state.finish()
}

/// Hashes an arbitrary byte string.
pub fn hash_bytes(key: &[u8]) -> u32 {
    let mut state = State::new(key.len());

    let mut blocks = key.chunks_exact(12);
    for block in &mut blocks {
        state.a = state.a.wrapping_add(read_u32(&block[0..4]));
        state.b = state.b.wrapping_add(read_u32(&block[4..8]));
        state.c = state.c.wrapping_add(read_u32(&block[8..12]));
        state.mix();
    }

    // The lowest byte of `c` is reserved for the length, so tail bytes 8..11
    // land one byte higher than their a/b counterparts.
    for (i, &byte) in blocks.remainder().iter().enumerate() {
        let byte = u32::from(byte);
        match i {
            0..=3 => state.a = state.a.wrapping_add(byte << (8 * i)),
            4..=7 => state.b = state.b.wrapping_add(byte << (8 * (i - 4))),
            _ => state.c = state.c.wrapping_add(byte << (8 * (i - 7))),
        }
    }

    state.finish()
}
