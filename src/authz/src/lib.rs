//! # VRN Authorization
//!
//! Client-side authorization over privileges held by a remote authority.
//!
//! ## Features
//!
//! - **VRN scopes** with wildcards, qualifiers and specificity ranking
//! - **Policy registry** resolving permission names to decision policies
//! - **Two-tier TTL cache** for privilege sets and permission names
//! - **Tri-state evaluation**: allow, deny, or indeterminate on conflict
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use vrn_authz::{
//!     AuthzContext, BasePolicy, CacheConfig, Decision, PermissionId, PermissionResolver,
//!     PolicyRegistry, PrivilegeCache, PrivilegeFetcher, PrivilegeRecord, Urn,
//! };
//!
//! struct Authority;
//!
//! #[async_trait]
//! impl PrivilegeFetcher for Authority {
//!     async fn fetch_privileges(
//!         &self,
//!         _user: &str,
//!         _service: &str,
//!     ) -> anyhow::Result<Vec<PrivilegeRecord>> {
//!         Ok(vec![PrivilegeRecord::new("1", "vrn:*:*:widget/*", true).with_permission("7")])
//!     }
//! }
//!
//! #[async_trait]
//! impl PermissionResolver for Authority {
//!     async fn resolve_permission_name(&self, _id: &PermissionId) -> anyhow::Result<String> {
//!         Ok("widgets.read".to_string())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = PrivilegeCache::with_source(Arc::new(Authority), CacheConfig::default());
//!     let cache = Arc::new(cache);
//!     let context = AuthzContext::builder()
//!         .cache(cache)
//!         .registry(Arc::new(PolicyRegistry::new()))
//!         .policy(Arc::new(BasePolicy::new("widgets.read", "widgets")))
//!         .build()?;
//!
//!     let user = Urn::parse("user://local/ds-1/alice")?;
//!     let decision = context
//!         .authorize("widgets.read", Some(&user), "vrn:local:ds-1:widget/42")
//!         .await?;
//!
//!     assert_eq!(decision, Decision::Allow);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod indexed_set;
pub mod policy;
pub mod privilege;
pub mod scope;

// Re-export commonly used types
pub use cache::{CacheStats, PermissionResolver, PrivilegeCache, PrivilegeFetcher};
pub use config::CacheConfig;
pub use engine::{AuthzContext, CurrentUser, Decision, PolicyEvaluator, Resource, Target};
pub use error::{AuthzError, Result};
pub use identity::{IdentifierError, Urn};
pub use indexed_set::{Identifiable, IndexedSet};
pub use policy::{BasePolicy, MostSpecificPolicy, Policy, PolicyRegistry};
pub use privilege::{GroupId, PermissionId, Privilege, PrivilegeId, PrivilegeRecord};
pub use scope::{Qualifiers, Scope, ScopeError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
