//! Per-request policy evaluation
//!
//! A [`PolicyEvaluator`] binds one policy, one optional user and one target.
//! It fetches the user's privileges for the policy's permission, keeps those
//! whose scope includes the target and reduces their allow flags to a
//! tri-state outcome.

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::decision::Decision;
use super::target::Target;
use crate::cache::PrivilegeCache;
use crate::error::{AuthzError, Result};
use crate::identity::{IdentifierError, Urn};
use crate::policy::Policy;
use crate::privilege::Privilege;
use crate::scope::{Scope, ScopeError};

/// The acting user, as seen by the evaluator
pub trait CurrentUser: Send + Sync {
    /// Stable identifier used as the privilege cache key
    fn identifier(&self) -> String;

    /// Identity used to resolve scope placeholders
    fn urn(&self) -> std::result::Result<Urn, IdentifierError> {
        Urn::parse(&self.identifier())
    }
}

impl CurrentUser for Urn {
    fn identifier(&self) -> String {
        self.to_string()
    }

    fn urn(&self) -> std::result::Result<Urn, IdentifierError> {
        Ok(self.clone())
    }
}

impl CurrentUser for String {
    fn identifier(&self) -> String {
        self.clone()
    }
}

/// Evaluates one permission for one user against one target
pub struct PolicyEvaluator<'a> {
    cache: &'a PrivilegeCache,
    policy: Arc<dyn Policy>,
    permission_name: String,
    current_user: Option<&'a dyn CurrentUser>,
    target: Target<'a>,

    /// Qualified privileges, computed once per evaluator
    qualified: OnceCell<Vec<Privilege>>,
}

impl<'a> PolicyEvaluator<'a> {
    /// Creates an evaluator; the policy must declare a permission name
    pub fn new(
        cache: &'a PrivilegeCache,
        policy: Arc<dyn Policy>,
        current_user: Option<&'a dyn CurrentUser>,
        target: impl Into<Target<'a>>,
    ) -> Result<Self> {
        let permission_name = policy
            .permission_name()
            .map(str::to_string)
            .ok_or_else(|| {
                AuthzError::PolicyInvalid(format!("{:?} declares no permission name", policy))
            })?;

        Ok(Self {
            cache,
            policy,
            permission_name,
            current_user,
            target: target.into(),
            qualified: OnceCell::new(),
        })
    }

    pub fn policy(&self) -> &Arc<dyn Policy> {
        &self.policy
    }

    pub fn permission_name(&self) -> &str {
        &self.permission_name
    }

    pub fn target(&self) -> Target<'a> {
        self.target
    }

    /// Target scope after the policy's scope adjustment
    ///
    /// A target still carrying placeholders is rejected.
    pub fn target_scope(&self) -> Result<Scope> {
        let vrn = self.policy.scope(self.target.resource_identifier());
        let scope = Scope::parse(&vrn)?;
        if scope.has_placeholders() {
            return Err(ScopeError::UnresolvedPlaceholder(vrn).into());
        }
        Ok(scope)
    }

    /// Privileges the user holds for this permission, unfiltered
    ///
    /// Without a current user there are none and nothing is fetched.
    pub async fn privileges(&self) -> Result<Vec<Privilege>> {
        let Some(user) = self.current_user else {
            debug!("No current user for '{}'", self.permission_name);
            return Ok(Vec::new());
        };

        self.cache
            .privileges_for(
                &user.identifier(),
                self.policy.service_name(),
                &self.permission_name,
            )
            .await
    }

    /// Privileges whose scope includes the target, least specific first
    ///
    /// Placeholders are resolved for the current user before matching. Equal
    /// specificity keeps fetch order.
    pub async fn qualified_privileges(&self) -> Result<&[Privilege]> {
        let qualified = self
            .qualified
            .get_or_try_init(|| self.compute_qualified())
            .await?;
        Ok(qualified.as_slice())
    }

    async fn compute_qualified(&self) -> Result<Vec<Privilege>> {
        let target = self.target_scope()?;
        let privileges = self.privileges().await?;

        let user = match self.current_user {
            Some(user) if privileges.iter().any(|p| p.scope.has_placeholders()) => {
                Some(user.urn()?)
            }
            _ => None,
        };

        let mut qualified: Vec<Privilege> = privileges
            .into_iter()
            .map(|privilege| match &user {
                Some(urn) => privilege.for_user(urn),
                None => privilege,
            })
            .filter(|privilege| {
                privilege.includes(&target, |qualifiers| self.policy.qualifiers_valid(qualifiers))
            })
            .collect();

        qualified.sort_by(Privilege::cmp_specificity);

        debug!(
            "{} qualified privileges for '{}' on {}",
            qualified.len(),
            self.permission_name,
            target
        );

        Ok(qualified)
    }

    /// Tri-state outcome: `Some(true)` allow, `Some(false)` deny, `None` ambiguous
    ///
    /// No qualified privilege is a deny. Qualified privileges that all carry
    /// the same flag decide by that flag; mixed flags are ambiguous.
    pub async fn authorized(&self) -> Result<Option<bool>> {
        let qualified = self.qualified_privileges().await?;
        Ok(reduce(qualified))
    }

    /// Decision with the policy's conflict resolution applied
    pub async fn decide(&self) -> Result<Decision> {
        let outcome = match self.authorized().await? {
            Some(allow) => Some(allow),
            None => {
                let qualified = self.qualified_privileges().await?;
                self.policy.resolve_ambiguous(qualified)
            }
        };

        let decision = Decision::from_outcome(outcome);
        if decision == Decision::Indeterminate {
            info!(
                permission = %self.permission_name,
                resource = %self.target.resource_identifier(),
                "Conflicting privileges left unresolved"
            );
        } else {
            debug!(
                permission = %self.permission_name,
                resource = %self.target.resource_identifier(),
                decision = %decision,
                "Authorization evaluated"
            );
        }

        Ok(decision)
    }

    /// Whether the action is permitted; an unresolved conflict is not
    pub async fn permitted(&self) -> Result<bool> {
        Ok(self.decide().await?.is_allowed())
    }
}

impl std::fmt::Debug for PolicyEvaluator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEvaluator")
            .field("permission_name", &self.permission_name)
            .field("user", &self.current_user.map(|u| u.identifier()))
            .field("target", &self.target)
            .finish()
    }
}

/// Reduces allow flags to a tri-state outcome
fn reduce(privileges: &[Privilege]) -> Option<bool> {
    let mut flags = privileges.iter().map(|p| p.allow);
    let Some(first) = flags.next() else {
        return Some(false);
    };
    flags.all(|allow| allow == first).then_some(first)
}
