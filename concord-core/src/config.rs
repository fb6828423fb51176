//! Configuration types

use crate::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a per-entity-type store bounds its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Never evicts.
    #[default]
    Unbounded,
    /// Evicts the least-recently-accessed entry once `capacity` is exceeded.
    Lru { capacity: usize },
}

impl EvictionPolicy {
    /// The capacity bound, if any.
    pub fn capacity(&self) -> Option<usize> {
        match self {
            EvictionPolicy::Unbounded => None,
            EvictionPolicy::Lru { capacity } => Some(*capacity),
        }
    }
}

/// Per-entity-type eviction configuration.
///
/// Entity types without an explicit entry use `default_policy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    #[serde(default)]
    pub default_policy: EvictionPolicy,
    #[serde(default)]
    pub policies: HashMap<EntityType, EvictionPolicy>,
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_policy(mut self, policy: EvictionPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn with_policy(mut self, entity_type: EntityType, policy: EvictionPolicy) -> Self {
        self.policies.insert(entity_type, policy);
        self
    }

    /// Shorthand for a bounded-LRU policy on one entity type.
    pub fn with_lru(self, entity_type: EntityType, capacity: usize) -> Self {
        self.with_policy(entity_type, EvictionPolicy::Lru { capacity })
    }

    /// The policy that applies to `entity_type`.
    pub fn policy_for(&self, entity_type: EntityType) -> EvictionPolicy {
        self.policies
            .get(&entity_type)
            .copied()
            .unwrap_or(self.default_policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for entity_type in EntityType::ALL {
            if self.policy_for(entity_type).capacity() == Some(0) {
                return Err(ConfigError::InvalidCapacity { entity_type });
            }
        }
        Ok(())
    }
}

/// Page sizes used by paginated remote listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub guilds_batch_size: usize,
    pub members_batch_size: usize,
    pub reactors_batch_size: usize,
    pub bans_batch_size: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            guilds_batch_size: 100,
            members_batch_size: 1000,
            reactors_batch_size: 100,
            bans_batch_size: 1000,
        }
    }
}

impl RemoteConfig {
    pub fn with_guilds_batch_size(mut self, size: usize) -> Self {
        self.guilds_batch_size = size;
        self
    }

    pub fn with_members_batch_size(mut self, size: usize) -> Self {
        self.members_batch_size = size;
        self
    }

    pub fn with_reactors_batch_size(mut self, size: usize) -> Self {
        self.reactors_batch_size = size;
        self
    }

    pub fn with_bans_batch_size(mut self, size: usize) -> Self {
        self.bans_batch_size = size;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for batch_size in [
            self.guilds_batch_size,
            self.members_batch_size,
            self.reactors_batch_size,
            self.bans_batch_size,
        ] {
            if batch_size == 0 {
                return Err(ConfigError::InvalidBatchSize { batch_size });
            }
        }
        Ok(())
    }
}

/// Top-level client configuration.
///
/// ```toml
/// default_strategy = "remote_with_cache_fallback"
/// self_id = "80351110224678912"
///
/// [cache.policies.voice_state]
/// kind = "lru"
/// capacity = 500
///
/// [remote]
/// members_batch_size = 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub default_strategy: EntitySupplyStrategy,
    #[serde(default)]
    pub self_id: Option<Snowflake>,
}

impl ClientConfig {
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_remote(mut self, remote: RemoteConfig) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_default_strategy(mut self, strategy: EntitySupplyStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    pub fn with_self_id(mut self, self_id: Snowflake) -> Self {
        self.self_id = Some(self_id);
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> ConcordResult<Self> {
        let config: ClientConfig = toml::from_str(input).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConcordResult<()> {
        self.cache.validate()?;
        self.remote.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_default_policy_rejected() {
        let config = CacheConfig::new().with_default_policy(EvictionPolicy::Lru { capacity: 0 });
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidCapacity {
                entity_type: EntityType::ALL[0]
            })
        );
    }

    #[test]
    fn test_policy_for_falls_back_to_default() {
        let config = CacheConfig::new()
            .with_default_policy(EvictionPolicy::Lru { capacity: 50 })
            .with_policy(EntityType::Guild, EvictionPolicy::Unbounded);
        assert_eq!(config.policy_for(EntityType::Guild), EvictionPolicy::Unbounded);
        assert_eq!(
            config.policy_for(EntityType::Message),
            EvictionPolicy::Lru { capacity: 50 }
        );
    }

    #[test]
    fn test_cache_validate_names_entity_type() {
        let config = CacheConfig::new().with_lru(EntityType::VoiceState, 0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidCapacity {
                entity_type: EntityType::VoiceState
            })
        );
    }

    #[test]
    fn test_remote_defaults() {
        let remote = RemoteConfig::default();
        assert_eq!(remote.guilds_batch_size, 100);
        assert_eq!(remote.members_batch_size, 1000);
        assert_eq!(remote.reactors_batch_size, 100);
        assert_eq!(remote.bans_batch_size, 1000);
        assert!(remote.validate().is_ok());
    }

    #[test]
    fn test_remote_zero_batch_rejected() {
        let remote = RemoteConfig::default().with_reactors_batch_size(0);
        assert_eq!(
            remote.validate(),
            Err(ConfigError::InvalidBatchSize { batch_size: 0 })
        );
    }

    #[test]
    fn test_client_config_from_toml() {
        let input = r#"
            default_strategy = "remote_with_cache_fallback"
            self_id = "42"

            [cache.policies.voice_state]
            kind = "lru"
            capacity = 500

            [remote]
            members_batch_size = 250
        "#;
        let config = ClientConfig::from_toml_str(input).unwrap();
        assert_eq!(
            config.default_strategy,
            EntitySupplyStrategy::RemoteWithCacheFallback
        );
        assert_eq!(config.self_id, Some(Snowflake::new(42)));
        assert_eq!(
            config.cache.policy_for(EntityType::VoiceState),
            EvictionPolicy::Lru { capacity: 500 }
        );
        assert_eq!(config.cache.policy_for(EntityType::User), EvictionPolicy::Unbounded);
        assert_eq!(config.remote.members_batch_size, 250);
        assert_eq!(config.remote.guilds_batch_size, 100);
    }

    #[test]
    fn test_client_config_empty_toml_is_default() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_client_config_rejects_invalid() {
        let err = ClientConfig::from_toml_str("[remote]\nbans_batch_size = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConcordError::Config(ConfigError::InvalidBatchSize { .. })
        ));

        let err = ClientConfig::from_toml_str("default_strategy = 7").unwrap_err();
        assert!(matches!(err, ConcordError::Config(ConfigError::Parse { .. })));
    }
}
