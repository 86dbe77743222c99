//! Remote authority collaborators
//!
//! The cache never talks to the network itself. It calls these traits on a
//! miss and passes their errors through unchanged.

use async_trait::async_trait;

use crate::privilege::{GroupId, PermissionId, PrivilegeRecord};

/// Fetches the privileges a user holds for a service
#[async_trait]
pub trait PrivilegeFetcher: Send + Sync {
    async fn fetch_privileges(
        &self,
        user_identifier: &str,
        service: &str,
    ) -> anyhow::Result<Vec<PrivilegeRecord>>;
}

/// Resolves permission ids to permission names
///
/// Implementations must be idempotent; results are cached with the
/// permission TTL.
#[async_trait]
pub trait PermissionResolver: Send + Sync {
    async fn resolve_permission_name(
        &self,
        permission_id: &PermissionId,
    ) -> anyhow::Result<String>;

    /// Permission names granted through a group
    async fn resolve_group_permission_names(
        &self,
        _group_id: &GroupId,
    ) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }
}
