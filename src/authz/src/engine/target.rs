//! Evaluation targets
//!
//! A target is either a resource identifier string or a value that exposes
//! one. [`Target::resource_identifier`] is the single conversion point.

use std::fmt;

use crate::error::Result;
use crate::scope::Scope;

/// Value exposing a resource identifier (VRN)
pub trait Resource: Send + Sync {
    fn vrn(&self) -> String;
}

impl Resource for Scope {
    fn vrn(&self) -> String {
        self.to_string()
    }
}

/// Resource an action is evaluated against
#[derive(Clone, Copy)]
pub enum Target<'a> {
    /// Raw resource identifier, parsed at evaluation time
    Identifier(&'a str),
    /// Object exposing its resource identifier
    Resource(&'a dyn Resource),
}

impl<'a> Target<'a> {
    /// Resource identifier string of the target
    pub fn resource_identifier(&self) -> String {
        match self {
            Target::Identifier(vrn) => vrn.to_string(),
            Target::Resource(resource) => resource.vrn(),
        }
    }

    /// Parses the target into a scope
    pub fn to_scope(&self) -> Result<Scope> {
        Ok(Scope::parse(&self.resource_identifier())?)
    }
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(vrn: &'a str) -> Self {
        Target::Identifier(vrn)
    }
}

impl<'a> From<&'a String> for Target<'a> {
    fn from(vrn: &'a String) -> Self {
        Target::Identifier(vrn.as_str())
    }
}

impl<'a, R: Resource> From<&'a R> for Target<'a> {
    fn from(resource: &'a R) -> Self {
        Target::Resource(resource)
    }
}

impl fmt::Debug for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Identifier(vrn) => f.debug_tuple("Identifier").field(vrn).finish(),
            Target::Resource(resource) => f.debug_tuple("Resource").field(&resource.vrn()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthzError;

    struct Widget {
        id: u32,
    }

    impl Resource for Widget {
        fn vrn(&self) -> String {
            format!("vrn:local:ds-1:widget/{}", self.id)
        }
    }

    #[test]
    fn test_identifier_target() {
        let target = Target::from("vrn:local:ds-1:widget/42");
        assert_eq!(target.to_scope().unwrap().resource_id(), Some("42"));
    }

    #[test]
    fn test_resource_target() {
        let widget = Widget { id: 7 };
        let target = Target::from(&widget);
        assert_eq!(target.resource_identifier(), "vrn:local:ds-1:widget/7");
    }

    #[test]
    fn test_malformed_target() {
        assert!(matches!(
            Target::from("widget/42").to_scope(),
            Err(AuthzError::InvalidScope(_))
        ));
    }
}
