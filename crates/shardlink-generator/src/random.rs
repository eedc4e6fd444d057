use crate::{Generator, ALPHABET};
use rand::Rng;
use shardlink_core::Alias;

/// Draws every symbol independently and uniformly from [`ALPHABET`].
///
/// Consecutive calls are unrelated; nothing about the URL being shortened
/// feeds into the output.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for RandomGenerator {
    fn generate(&self, length: usize) -> Alias {
        let mut rng = rand::rng();
        let alias: String = (0..length)
            .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
            .collect();
        Alias::new_unchecked(alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_ALIAS_LENGTH;
    use std::collections::HashSet;

    #[test]
    fn produces_requested_length() {
        let generator = RandomGenerator::new();

        assert_eq!(generator.generate(DEFAULT_ALIAS_LENGTH).as_str().len(), 8);
        assert_eq!(generator.generate(1).as_str().len(), 1);
        assert_eq!(generator.generate(32).as_str().len(), 32);
    }

    #[test]
    fn output_is_a_valid_alias() {
        let generator = RandomGenerator::new();

        for _ in 0..100 {
            let alias = generator.generate(DEFAULT_ALIAS_LENGTH);
            assert!(Alias::new(alias.as_str()).is_ok());
            assert!(alias.as_str().bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn consecutive_calls_differ() {
        let generator = RandomGenerator::new();

        let codes: HashSet<String> = (0..1_000)
            .map(|_| generator.generate(DEFAULT_ALIAS_LENGTH).to_string())
            .collect();

        // 1000 draws from 62^8 codes; any repeat here would point at a broken rng.
        assert_eq!(codes.len(), 1_000);
    }

    #[test]
    fn covers_the_whole_alphabet() {
        let generator = RandomGenerator::new();

        let seen: HashSet<u8> = (0..200)
            .flat_map(|_| generator.generate(64).to_string().into_bytes())
            .collect();

        assert_eq!(seen.len(), ALPHABET.len());
    }

    #[test]
    fn generator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RandomGenerator>();
    }
}
