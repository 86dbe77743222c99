//! Two-tier privilege cache with TTL expiration
//!
//! The outer tier maps `"<user>:<service>"` to the user's privileges for
//! that service, indexed by permission name. The inner tier keeps resolved
//! permission names with a separate, longer TTL.
//!
//! Expiry is checked at read time. Two tasks missing the same key may both
//! fetch; the later write wins. No lock is held while fetching.

pub mod source;

pub use source::{PermissionResolver, PrivilegeFetcher};

use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::{AuthzError, Result};
use crate::indexed_set::IndexedSet;
use crate::privilege::Privilege;

/// Index key under which privileges are grouped by permission name
pub const PERMISSION_NAME_KEY: &str = "permission_name";

/// Privileges of one (user, service) pair
pub type PrivilegeSet = IndexedSet<Privilege>;

/// Cached value with an absolute expiry
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Statistics about cache performance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Privilege set lookups served from cache
    pub hits: usize,
    /// Privilege set lookups that fetched
    pub misses: usize,
    /// Expired entries encountered on read, both tiers
    pub expirations: usize,
    /// Privilege sets currently stored
    pub entries: usize,
    /// Permission name entries currently stored
    pub permission_entries: usize,
}

impl CacheStats {
    /// Calculates the privilege set hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cache of privileges fetched from the remote authority
pub struct PrivilegeCache {
    fetcher: Arc<dyn PrivilegeFetcher>,
    resolver: Arc<dyn PermissionResolver>,

    /// Outer tier: `"<user>:<service>"` to indexed privileges
    privilege_sets: DashMap<String, CacheEntry<Arc<PrivilegeSet>>>,

    /// Inner tier: `permission:<id>` / `group:<id>` to permission names
    permission_names: DashMap<String, CacheEntry<Vec<String>>>,

    privilege_ttl_ms: AtomicU64,
    permission_ttl_ms: AtomicU64,

    stats: DashMap<String, usize>,
}

impl PrivilegeCache {
    /// Creates a cache over separate fetch and resolve collaborators
    pub fn new(
        fetcher: Arc<dyn PrivilegeFetcher>,
        resolver: Arc<dyn PermissionResolver>,
        config: CacheConfig,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            privilege_sets: DashMap::new(),
            permission_names: DashMap::new(),
            privilege_ttl_ms: AtomicU64::new(as_millis(config.privilege_ttl)),
            permission_ttl_ms: AtomicU64::new(as_millis(config.permission_ttl)),
            stats: DashMap::new(),
        }
    }

    /// Creates a cache over one client implementing both collaborators
    pub fn with_source<S>(source: Arc<S>, config: CacheConfig) -> Self
    where
        S: PrivilegeFetcher + PermissionResolver + 'static,
    {
        let fetcher: Arc<dyn PrivilegeFetcher> = source.clone();
        let resolver: Arc<dyn PermissionResolver> = source;
        Self::new(fetcher, resolver, config)
    }

    /// Privileges `user_identifier` holds for `permission_name` on `service`
    ///
    /// An unknown permission name yields an empty list.
    pub async fn privileges_for(
        &self,
        user_identifier: &str,
        service: &str,
        permission_name: &str,
    ) -> Result<Vec<Privilege>> {
        let set = self.privilege_set(user_identifier, service).await?;

        Ok(set
            .by(PERMISSION_NAME_KEY, permission_name)
            .iter()
            .map(|privilege| Privilege::clone(privilege))
            .collect())
    }

    /// Indexed privileges of a (user, service) pair, fetched on miss
    pub async fn privilege_set(
        &self,
        user_identifier: &str,
        service: &str,
    ) -> Result<Arc<PrivilegeSet>> {
        let key = Self::privilege_key(user_identifier, service);

        if let Some(set) = self.cached_set(&key) {
            self.increment_stat("hits");
            debug!("Privilege cache hit for {}", key);
            return Ok(set);
        }

        self.increment_stat("misses");
        debug!("Privilege cache miss for {}, fetching", key);

        let records = self
            .fetcher
            .fetch_privileges(user_identifier, service)
            .await
            .map_err(AuthzError::Upstream)?;

        let mut set = IndexedSet::new().key(PERMISSION_NAME_KEY, |p: &Privilege| {
            p.permission_names.clone()
        });

        for record in records {
            let privilege = Privilege::from_record(record)?;
            let names = self.permission_names_for(&privilege).await?;
            set.add(privilege.with_permission_names(names));
        }

        debug!("Fetched {} privileges for {}", set.len(), key);

        let set = Arc::new(set);
        self.privilege_sets
            .insert(key, CacheEntry::new(Arc::clone(&set), self.privilege_ttl()));

        Ok(set)
    }

    fn cached_set(&self, key: &str) -> Option<Arc<PrivilegeSet>> {
        {
            let entry = self.privilege_sets.get(key)?;
            if !entry.is_expired() {
                return Some(Arc::clone(&entry.value));
            }
        }

        // Another task may have refreshed the entry since the read.
        self.privilege_sets.remove_if(key, |_, entry| entry.is_expired());
        self.increment_stat("expirations");
        debug!("Privilege cache entry expired for {}", key);

        None
    }

    /// Permission names a privilege grants, through its permission and group
    async fn permission_names_for(&self, privilege: &Privilege) -> Result<Vec<String>> {
        let mut names = Vec::new();

        if let Some(permission_id) = &privilege.permission_id {
            let resolved = self
                .cached_names(format!("permission:{}", permission_id), || async {
                    self.resolver
                        .resolve_permission_name(permission_id)
                        .await
                        .map(|name| vec![name])
                })
                .await?;
            names.extend(resolved);
        }

        if let Some(group_id) = &privilege.group_id {
            let resolved = self
                .cached_names(format!("group:{}", group_id), || {
                    self.resolver.resolve_group_permission_names(group_id)
                })
                .await?;
            names.extend(resolved);
        }

        if names.is_empty() {
            debug!("Privilege {} resolves to no permission name", privilege.id);
        }

        Ok(names)
    }

    async fn cached_names<F, Fut>(&self, key: String, resolve: F) -> Result<Vec<String>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Vec<String>>>,
    {
        let cached = self.permission_names.get(&key).and_then(|entry| {
            if entry.is_expired() {
                None
            } else {
                Some(entry.value.clone())
            }
        });

        if let Some(names) = cached {
            return Ok(names);
        }

        if self
            .permission_names
            .remove_if(&key, |_, entry| entry.is_expired())
            .is_some()
        {
            self.increment_stat("expirations");
        }

        let names = resolve().await.map_err(AuthzError::Upstream)?;
        self.permission_names
            .insert(key, CacheEntry::new(names.clone(), self.permission_ttl()));

        Ok(names)
    }

    /// Outer cache key for a (user, service) pair
    pub fn privilege_key(user_identifier: &str, service: &str) -> String {
        format!("{}:{}", user_identifier, service)
    }

    /// Drops the privilege set of a (user, service) pair
    pub fn evict(&self, user_identifier: &str, service: &str) -> bool {
        self.privilege_sets
            .remove(&Self::privilege_key(user_identifier, service))
            .is_some()
    }

    /// Drops a cached permission name
    pub fn evict_permission(&self, permission_id: &str) -> bool {
        self.permission_names
            .remove(&format!("permission:{}", permission_id))
            .is_some()
    }

    /// Clears both tiers and the statistics
    pub fn clear(&self) {
        self.privilege_sets.clear();
        self.permission_names.clear();
        self.stats.clear();
    }

    /// Removes expired entries from both tiers
    pub fn cleanup_expired(&self) {
        self.privilege_sets.retain(|_, entry| !entry.is_expired());
        self.permission_names.retain(|_, entry| !entry.is_expired());
    }

    /// TTL applied to privilege sets written from now on
    pub fn set_privilege_ttl(&self, ttl: Duration) {
        self.privilege_ttl_ms.store(as_millis(ttl), Ordering::Relaxed);
    }

    /// TTL applied to permission names written from now on
    pub fn set_permission_ttl(&self, ttl: Duration) {
        self.permission_ttl_ms.store(as_millis(ttl), Ordering::Relaxed);
    }

    pub fn privilege_ttl(&self) -> Duration {
        Duration::from_millis(self.privilege_ttl_ms.load(Ordering::Relaxed))
    }

    pub fn permission_ttl(&self) -> Duration {
        Duration::from_millis(self.permission_ttl_ms.load(Ordering::Relaxed))
    }

    /// Current TTLs
    pub fn config(&self) -> CacheConfig {
        CacheConfig {
            privilege_ttl: self.privilege_ttl(),
            permission_ttl: self.permission_ttl(),
        }
    }

    /// Returns cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            expirations: self.get_stat("expirations"),
            entries: self.privilege_sets.len(),
            permission_entries: self.permission_names.len(),
        }
    }

    fn increment_stat(&self, key: &str) {
        self.stats
            .entry(key.to_string())
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    fn get_stat(&self, key: &str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}

impl std::fmt::Debug for PrivilegeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivilegeCache")
            .field("config", &self.config())
            .field("stats", &self.stats())
            .finish()
    }
}

fn as_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}
