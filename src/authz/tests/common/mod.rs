//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use vrn_authz::{
    CacheConfig, GroupId, PermissionId, PermissionResolver, PrivilegeCache, PrivilegeFetcher,
    PrivilegeRecord,
};

pub const SERVICE: &str = "widgets";
pub const READ: &str = "widgets.read";
pub const WRITE: &str = "widgets.write";
pub const USER: &str = "user://local/ds-1/alice";

/// In-memory remote authority that counts its calls
#[derive(Default)]
pub struct MockAuthority {
    records: Mutex<Vec<PrivilegeRecord>>,
    permission_names: Mutex<HashMap<String, String>>,
    group_names: Mutex<HashMap<String, Vec<String>>>,
    failing: AtomicBool,
    pub fetches: AtomicUsize,
    pub resolutions: AtomicUsize,
}

impl MockAuthority {
    /// Permission "1" resolves to [`READ`], "2" to [`WRITE`]
    pub fn new() -> Arc<Self> {
        let authority = Self::default();
        authority.name_permission("1", READ);
        authority.name_permission("2", WRITE);
        Arc::new(authority)
    }

    pub fn name_permission(&self, id: &str, name: &str) {
        self.permission_names
            .lock()
            .insert(id.to_string(), name.to_string());
    }

    pub fn name_group(&self, id: &str, names: &[&str]) {
        self.group_names
            .lock()
            .insert(id.to_string(), names.iter().map(|n| n.to_string()).collect());
    }

    /// Grants a privilege on [`READ`]
    pub fn grant(&self, id: &str, scope: &str, allow: bool) {
        self.push(PrivilegeRecord::new(id, scope, allow).with_permission("1"));
    }

    pub fn push(&self, record: PrivilegeRecord) {
        self.records.lock().push(record);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrivilegeFetcher for MockAuthority {
    async fn fetch_privileges(
        &self,
        _user: &str,
        _service: &str,
    ) -> anyhow::Result<Vec<PrivilegeRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("authority unavailable");
        }
        Ok(self.records.lock().clone())
    }
}

#[async_trait]
impl PermissionResolver for MockAuthority {
    async fn resolve_permission_name(
        &self,
        permission_id: &PermissionId,
    ) -> anyhow::Result<String> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        self.permission_names
            .lock()
            .get(permission_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown permission {}", permission_id))
    }

    async fn resolve_group_permission_names(
        &self,
        group_id: &GroupId,
    ) -> anyhow::Result<Vec<String>> {
        Ok(self.group_names.lock().get(group_id).cloned().unwrap_or_default())
    }
}

pub fn cache_over(authority: &Arc<MockAuthority>, config: CacheConfig) -> Arc<PrivilegeCache> {
    Arc::new(PrivilegeCache::with_source(Arc::clone(authority), config))
}

/// Installs a test subscriber honoring `RUST_LOG`; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
