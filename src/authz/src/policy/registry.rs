//! Permission name to policy registry
//!
//! Policies register eagerly with [`PolicyRegistry::register`] or queue
//! themselves with [`PolicyRegistry::lazy_register`] before their name is
//! needed. Queued policies are registered on the next lookup, so policy
//! modules never need a central registration list.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vrn_authz::policy::{BasePolicy, PolicyRegistry};
//!
//! let registry = PolicyRegistry::new();
//! registry.lazy_register(Arc::new(BasePolicy::new("widgets.read", "svc")));
//!
//! assert!(registry.contains_key("widgets.read").unwrap());
//! ```

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

use super::Policy;
use crate::error::{AuthzError, Result};

static GLOBAL_REGISTRY: Lazy<Arc<PolicyRegistry>> = Lazy::new(|| Arc::new(PolicyRegistry::new()));

/// Registry of decision policies keyed by permission name
#[derive(Default)]
pub struct PolicyRegistry {
    /// Registered policies
    policies: DashMap<String, Arc<dyn Policy>>,

    /// Policies queued before their name was resolved
    pending: Mutex<Vec<Arc<dyn Policy>>>,
}

impl PolicyRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, created on first access
    pub fn global() -> Arc<PolicyRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Registers a policy under `name`, or under its own permission name
    ///
    /// Registering a name again replaces the previous policy.
    pub fn register(&self, policy: Arc<dyn Policy>, name: Option<&str>) -> Result<()> {
        let name = name
            .or_else(|| policy.permission_name())
            .map(str::to_string)
            .ok_or_else(|| {
                AuthzError::PolicyInvalid(format!("{:?} declares no permission name", policy))
            })?;

        if self.policies.insert(name.clone(), policy).is_some() {
            warn!("Policy for '{}' replaced", name);
        } else {
            debug!("Policy registered for '{}'", name);
        }

        Ok(())
    }

    /// Queues a policy; it is registered on the next lookup
    pub fn lazy_register(&self, policy: Arc<dyn Policy>) {
        self.pending.lock().push(policy);
    }

    /// Registers every queued policy
    ///
    /// All valid policies are registered; the first failure is returned.
    /// The queue stays locked until every policy is inserted, so a
    /// concurrent lookup waits rather than missing a queued name.
    fn drain_pending(&self) -> Result<()> {
        let mut pending = self.pending.lock();
        if pending.is_empty() {
            return Ok(());
        }

        debug!("Registering {} pending policies", pending.len());

        let mut first_error = None;
        for policy in pending.drain(..) {
            if let Err(e) = self.register(policy, None) {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Whether a policy is registered for `name`
    pub fn contains_key(&self, name: &str) -> Result<bool> {
        self.drain_pending()?;
        Ok(self.policies.contains_key(name))
    }

    /// Policy registered for `name`
    pub fn policy_for(&self, name: &str) -> Result<Arc<dyn Policy>> {
        self.drain_pending()?;
        self.policies
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| AuthzError::PolicyNotFound(name.to_string()))
    }

    /// Registered permission names, sorted
    pub fn names(&self) -> Result<Vec<String>> {
        self.drain_pending()?;
        let mut names: Vec<String> = self.policies.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    /// Number of registered policies, queued ones excluded
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether no policy is registered yet; queued ones are excluded as in [`len`](Self::len)
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Number of policies queued by [`lazy_register`](Self::lazy_register) and not yet registered
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Forgets every policy; test isolation only
    #[cfg(any(test, feature = "test-util"))]
    pub fn reset(&self) {
        self.policies.clear();
        self.pending.lock().clear();
    }
}

impl std::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("registered", &self.policies.len())
            .field("pending", &self.pending.lock().len())
            .finish()
    }
}
