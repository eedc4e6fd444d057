use crate::{CreateOutcome, ServiceError, Shortener};
use async_trait::async_trait;
use shardlink_cache::CacheAside;
use shardlink_core::{Alias, AliasRepository, BucketCache, StorageError};
use shardlink_generator::{Generator, DEFAULT_ALIAS_LENGTH};
use std::sync::Arc;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

/// Cache bucket resolved aliases are stored under.
pub const ALIAS_CACHE_BUCKET: &str = "aliases";

#[derive(Debug, Clone, TypedBuilder)]
pub struct ServiceConfig {
    #[builder(default = DEFAULT_ALIAS_LENGTH)]
    pub alias_length: usize,
    /// Inserts tried before giving up on alias collisions.
    #[builder(default = 5)]
    pub max_create_attempts: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ServiceConfig {
    /// Generated aliases must pass [`Alias::new`], or they could be stored
    /// but never resolved.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.alias_length == 0 || self.alias_length > Alias::MAX_LENGTH {
            return Err(ServiceError::InvalidConfig(format!(
                "alias_length must be between 1 and {}, got {}",
                Alias::MAX_LENGTH,
                self.alias_length
            )));
        }

        if self.max_create_attempts == 0 {
            return Err(ServiceError::InvalidConfig(
                "max_create_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Create and resolve on top of a record store, a generator and a cache.
///
/// Creates deduplicate by URL and retry on alias collisions. Resolves read
/// the cache first and warm it in the background after a store hit; nothing
/// is cached on create.
#[derive(Debug)]
pub struct ShortenerService<R, G, C> {
    repository: Arc<R>,
    generator: Arc<G>,
    cache: CacheAside<C>,
    config: ServiceConfig,
}

impl<R, G, C> Clone for ShortenerService<R, G, C> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
            cache: self.cache.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, G, C> ShortenerService<R, G, C>
where
    R: AliasRepository,
    G: Generator,
    C: BucketCache,
{
    pub fn new(
        repository: R,
        generator: G,
        cache: CacheAside<C>,
        config: ServiceConfig,
    ) -> Result<Self, ServiceError> {
        config.validate()?;
        Ok(Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            cache,
            config,
        })
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn cache(&self) -> &CacheAside<C> {
        &self.cache
    }

    /// Accepts absolute http(s) URLs with a non-empty host.
    fn validate_url(url: &str) -> Result<(), ServiceError> {
        if url.is_empty() {
            return Err(ServiceError::InvalidUrl("URL cannot be empty".to_string()));
        }

        if url.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(ServiceError::InvalidUrl(
                "URL must not contain whitespace or control characters".to_string(),
            ));
        }

        let Some((scheme, rest)) = url.split_once("://") else {
            return Err(ServiceError::InvalidUrl(format!(
                "URL must have a valid scheme and host: {url}"
            )));
        };

        let scheme = scheme.to_ascii_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(ServiceError::InvalidUrl(format!(
                "URL scheme must be http or https: {scheme}"
            )));
        }

        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        if host.is_empty() {
            return Err(ServiceError::InvalidUrl(format!("URL has no host: {url}")));
        }

        Ok(())
    }
}

#[async_trait]
impl<R, G, C> Shortener for ShortenerService<R, G, C>
where
    R: AliasRepository,
    G: Generator,
    C: BucketCache,
{
    async fn shorten(&self, original_url: &str) -> Result<CreateOutcome, ServiceError> {
        Self::validate_url(original_url)?;

        if let Some(record) = self.repository.find_by_original_url(original_url).await? {
            debug!(alias = %record.alias, "url already has an alias");
            return Ok(CreateOutcome {
                record,
                created: false,
            });
        }

        for attempt in 1..=self.config.max_create_attempts {
            let alias = self.generator.generate(self.config.alias_length);
            match self.repository.create(&alias, original_url).await {
                Ok(record) => {
                    debug!(alias = %alias, attempt, "alias created");
                    return Ok(CreateOutcome {
                        record,
                        created: true,
                    });
                }
                Err(StorageError::Conflict(_)) => {
                    warn!(alias = %alias, attempt, "alias collision, regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ServiceError::ExhaustedRetries {
            attempts: self.config.max_create_attempts,
        })
    }

    async fn resolve(&self, alias: &str) -> Result<Option<String>, ServiceError> {
        let Ok(alias) = Alias::new(alias) else {
            trace!(alias, "malformed alias");
            return Ok(None);
        };

        if let Some(url) = self.cache.get(ALIAS_CACHE_BUCKET, alias.as_str()).await {
            return Ok(Some(url));
        }

        let Some(record) = self.repository.find_by_alias(&alias).await? else {
            debug!(alias = %alias, "alias not found");
            return Ok(None);
        };

        self.cache
            .populate_detached(ALIAS_CACHE_BUCKET, alias.as_str(), &record.original_url);
        Ok(Some(record.original_url))
    }
}
