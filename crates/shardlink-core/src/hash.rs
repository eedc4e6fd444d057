//! Placement hash.
//!
//! Shard placement is `fnv1a_64(alias) % shard_count`. The function is fixed
//! for the lifetime of the dataset: changing it, or the shard count, moves
//! every existing record to a different shard.

const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a digest of the UTF-8 bytes of `value`.
pub fn fnv1a_64(value: &str) -> u64 {
    value.as_bytes().iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}
