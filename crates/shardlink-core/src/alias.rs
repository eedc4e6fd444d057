use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A short identifier that stands in for an original URL.
///
/// The alias doubles as the routing key: its hash alone decides which shard
/// owns the record. Aliases are non-empty, at most 64 symbols long and drawn
/// from `[0-9A-Za-z]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alias(String);

impl Alias {
    /// Longest alias accepted by [`Alias::new`].
    pub const MAX_LENGTH: usize = 64;

    /// Creates a new `Alias` after validating the input.
    pub fn new(alias: impl Into<String>) -> Result<Self, CoreError> {
        let alias = alias.into();
        Self::validate(&alias)?;
        Ok(Self(alias))
    }

    /// Creates an `Alias` without validation.
    ///
    /// Use this only for values produced by trusted internal sources
    /// (the generator, or rows read back from a shard).
    pub fn new_unchecked(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    /// Returns the alias as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(alias: &str) -> Result<(), CoreError> {
        if alias.is_empty() {
            return Err(CoreError::InvalidAlias("alias cannot be empty".to_string()));
        }

        if alias.len() > Self::MAX_LENGTH {
            return Err(CoreError::InvalidAlias(format!(
                "length must be at most {}, got {}",
                Self::MAX_LENGTH,
                alias.len()
            )));
        }

        if !alias.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidAlias(format!(
                "must contain only ASCII letters and digits: '{}'",
                alias
            )));
        }

        Ok(())
    }
}

impl Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Alias {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
