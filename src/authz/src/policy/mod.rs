//! Decision policies
//!
//! A policy owns one permission. It declares the permission and service
//! names used for the privilege lookup and may customize matching through
//! its hooks. Policies become resolvable by name through the
//! [`PolicyRegistry`].

pub mod registry;

pub use registry::PolicyRegistry;

use std::fmt;

use crate::privilege::Privilege;
use crate::scope::Qualifiers;

/// Permission-specific decision logic
///
/// Only the names are required. The hooks default to plain scope matching.
pub trait Policy: Send + Sync + fmt::Debug {
    /// Permission this policy decides; `None` means it cannot be registered
    fn permission_name(&self) -> Option<&str>;

    /// Service whose privileges are fetched for this permission
    fn service_name(&self) -> &str;

    /// Validates the qualifiers of a privilege scope that otherwise matches
    fn qualifiers_valid(&self, _qualifiers: &Qualifiers) -> bool {
        true
    }

    /// Adjusts the target's resource identifier before it is matched
    fn scope(&self, target: String) -> String {
        target
    }

    /// Settles conflicting allow/deny privileges
    ///
    /// Receives the qualified privileges sorted by ascending specificity.
    /// `None` keeps the outcome indeterminate.
    fn resolve_ambiguous(&self, _privileges: &[Privilege]) -> Option<bool> {
        None
    }
}

/// Policy with declared names and default hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePolicy {
    permission: String,
    service: String,
}

impl BasePolicy {
    pub fn new(permission: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            permission: permission.into(),
            service: service.into(),
        }
    }
}

impl Policy for BasePolicy {
    fn permission_name(&self) -> Option<&str> {
        Some(&self.permission)
    }

    fn service_name(&self) -> &str {
        &self.service
    }
}

/// Policy where the most specific privilege settles a conflict
///
/// When the most specific score is held by privileges that agree, their
/// allow flag wins. Equal scores with different flags stay indeterminate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MostSpecificPolicy {
    base: BasePolicy,
}

impl MostSpecificPolicy {
    pub fn new(permission: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            base: BasePolicy::new(permission, service),
        }
    }
}

impl Policy for MostSpecificPolicy {
    fn permission_name(&self) -> Option<&str> {
        self.base.permission_name()
    }

    fn service_name(&self) -> &str {
        self.base.service_name()
    }

    fn resolve_ambiguous(&self, privileges: &[Privilege]) -> Option<bool> {
        let top = privileges.last()?.specificity_score();
        let mut flags = privileges
            .iter()
            .rev()
            .take_while(|p| p.specificity_score() == top)
            .map(|p| p.allow);

        let first = flags.next()?;
        flags.all(|allow| allow == first).then_some(first)
    }
}
