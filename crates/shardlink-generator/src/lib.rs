pub mod random;

pub use random::RandomGenerator;

use shardlink_core::Alias;

/// Symbols an alias is drawn from: digits, uppercase, lowercase.
pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Alias length used unless configured otherwise. 62^8 ≈ 2.18e14 codes.
pub const DEFAULT_ALIAS_LENGTH: usize = 8;

/// Trait for producing aliases.
///
/// Implementations are pure generators that don't interact with storage and
/// make no promise that the result is unused: callers insert and retry on
/// conflict.
pub trait Generator: Send + Sync + 'static {
    /// Produces an alias of exactly `length` symbols from [`ALPHABET`].
    fn generate(&self, length: usize) -> Alias;
}
