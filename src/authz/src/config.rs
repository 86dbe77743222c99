//! Runtime configuration
//!
//! Environment variables:
//! - `AUTHZ_PRIVILEGE_TTL` - privilege set TTL in seconds (default: 300)
//! - `AUTHZ_PERMISSION_TTL` - permission name TTL in seconds (default: 86400)

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

use crate::error::{AuthzError, Result};

/// Default TTL for (user, service) privilege sets
pub const DEFAULT_PRIVILEGE_TTL: Duration = Duration::from_secs(300);

/// Default TTL for permission name metadata
pub const DEFAULT_PERMISSION_TTL: Duration = Duration::from_secs(86_400);

pub const PRIVILEGE_TTL_ENV: &str = "AUTHZ_PRIVILEGE_TTL";
pub const PERMISSION_TTL_ENV: &str = "AUTHZ_PERMISSION_TTL";

/// Cache configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live for (user, service) privilege sets
    #[serde(with = "seconds")]
    pub privilege_ttl: Duration,

    /// Time-to-live for resolved permission names
    #[serde(with = "seconds")]
    pub permission_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            privilege_ttl: DEFAULT_PRIVILEGE_TTL,
            permission_ttl: DEFAULT_PERMISSION_TTL,
        }
    }
}

impl CacheConfig {
    /// Reads TTLs from the environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            privilege_ttl: ttl_from(&lookup, PRIVILEGE_TTL_ENV)?
                .unwrap_or(defaults.privilege_ttl),
            permission_ttl: ttl_from(&lookup, PERMISSION_TTL_ENV)?
                .unwrap_or(defaults.permission_ttl),
        })
    }
}

fn ttl_from<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| AuthzError::Config(format!("{}='{}': {}", key, raw, e)))
        })
        .transpose()
}

mod seconds {
    use super::*;

    pub fn serialize<S: Serializer>(
        ttl: &Duration,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
