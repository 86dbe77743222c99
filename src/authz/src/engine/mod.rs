//! Authorization engine
//!
//! Binds the privilege cache and the policy registry into an
//! [`AuthzContext`] and builds per-request [`PolicyEvaluator`]s from it.
//!
//! # Architecture
//!
//! ```text
//! authorize(permission, user, target)
//!     │
//!     ├─→ PolicyRegistry ──→ Policy (service, hooks)
//!     │
//!     ├─→ PrivilegeCache ──→ PrivilegeFetcher / PermissionResolver
//!     │        ↓
//!     │   privileges for (user, service, permission)
//!     │        ↓
//!     └─→ interpolate → scope includes target → sort → reduce → Decision
//! ```
//!
//! The context is passed explicitly. [`AuthzContext::install`] additionally publishes one
//! context process-wide for call sites that cannot carry it.

pub mod decision;
pub mod evaluator;
pub mod target;

pub use decision::Decision;
pub use evaluator::{CurrentUser, PolicyEvaluator};
pub use target::{Resource, Target};

use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::info;

use crate::cache::PrivilegeCache;
use crate::error::{AuthzError, Result};
use crate::policy::{Policy, PolicyRegistry};

static GLOBAL_CONTEXT: OnceCell<AuthzContext> = OnceCell::new();

/// Shared authorization state: one privilege cache and one policy registry
#[derive(Debug, Clone)]
pub struct AuthzContext {
    cache: Arc<PrivilegeCache>,
    registry: Arc<PolicyRegistry>,
}

impl AuthzContext {
    /// Context over `cache` and the process-wide registry
    pub fn new(cache: Arc<PrivilegeCache>) -> Self {
        Self::with_registry(cache, PolicyRegistry::global())
    }

    pub fn with_registry(cache: Arc<PrivilegeCache>, registry: Arc<PolicyRegistry>) -> Self {
        Self { cache, registry }
    }

    pub fn builder() -> AuthzContextBuilder {
        AuthzContextBuilder::default()
    }

    /// Publishes `context` process-wide; only the first call succeeds
    pub fn install(context: AuthzContext) -> Result<&'static AuthzContext> {
        GLOBAL_CONTEXT.set(context).map_err(|_| {
            AuthzError::Context("authorization context already installed".to_string())
        })?;

        info!("Authorization context installed");
        Self::global()
    }

    /// The installed process-wide context
    pub fn global() -> Result<&'static AuthzContext> {
        GLOBAL_CONTEXT
            .get()
            .ok_or_else(|| AuthzError::Context("authorization context not installed".to_string()))
    }

    pub fn cache(&self) -> &Arc<PrivilegeCache> {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<PolicyRegistry> {
        &self.registry
    }

    /// Evaluator for the policy registered under `permission_name`
    pub fn evaluator<'a>(
        &'a self,
        permission_name: &str,
        current_user: Option<&'a dyn CurrentUser>,
        target: impl Into<Target<'a>>,
    ) -> Result<PolicyEvaluator<'a>> {
        let policy = self.registry.policy_for(permission_name)?;
        PolicyEvaluator::new(&self.cache, policy, current_user, target)
    }

    /// Evaluates `permission_name` for `current_user` on `target`
    pub async fn authorize<'a>(
        &'a self,
        permission_name: &str,
        current_user: Option<&'a dyn CurrentUser>,
        target: impl Into<Target<'a>>,
    ) -> Result<Decision> {
        self.evaluator(permission_name, current_user, target)?
            .decide()
            .await
    }
}

/// Startup-time assembly of an [`AuthzContext`]
///
/// Policies added here are registered when the context is built, so a
/// policy without a permission name fails at startup.
#[derive(Default)]
pub struct AuthzContextBuilder {
    cache: Option<Arc<PrivilegeCache>>,
    registry: Option<Arc<PolicyRegistry>>,
    policies: Vec<Arc<dyn Policy>>,
}

impl AuthzContextBuilder {
    pub fn cache(mut self, cache: Arc<PrivilegeCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Registry to use instead of the process-wide one
    pub fn registry(mut self, registry: Arc<PolicyRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn policy(mut self, policy: Arc<dyn Policy>) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn build(self) -> Result<AuthzContext> {
        let cache = self
            .cache
            .ok_or_else(|| AuthzError::Context("no privilege cache configured".to_string()))?;
        let registry = self.registry.unwrap_or_else(PolicyRegistry::global);

        for policy in self.policies {
            registry.register(policy, None)?;
        }

        Ok(AuthzContext::with_registry(cache, registry))
    }
}
