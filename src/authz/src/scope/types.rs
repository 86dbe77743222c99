/// Scope type definitions and validation
///
/// Provides the VRN-backed Scope type with field validation,
/// inclusion matching and specificity scoring.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::qualifiers::Qualifiers;
use crate::identity::Urn;

/// Scope tag every VRN starts with
pub const VRN_TAG: &str = "vrn";

/// Literal wildcard accepted by every scope field
pub const WILDCARD: &str = "*";

/// Per-field specificity weights: stack, dataset, resource, resource id, qualifiers
const FIELD_WEIGHTS: [u32; 5] = [1, 2, 3, 4, 5];

static LOCATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[a-z0-9-]+|\*|\{stack\}|\{dataset\})$").unwrap());

static RESOURCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[a-z0-9][a-z0-9_-]*|\*)$").unwrap());

static RESOURCE_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z0-9-]+|\*|\{self\}|\{identity\}|\{principal\})$").unwrap()
});

/// Result type for scope operations
pub type ScopeResult<T> = Result<T, ScopeError>;

/// Errors that can occur during scope operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// Scope string does not have the `vrn:<stack>:<dataset>:<resource>` shape
    #[error("invalid scope format: {0}")]
    InvalidFormat(String),

    /// A field violates its grammar
    #[error("invalid {field} '{value}'")]
    InvalidField { field: &'static str, value: String },

    /// Qualifier string is malformed
    #[error("invalid qualifiers: {0}")]
    InvalidQualifiers(String),

    /// Placeholders are only meaningful in privilege scopes
    #[error("unresolved placeholder in '{0}'")]
    UnresolvedPlaceholder(String),
}

/// A wildcard-capable resource scope parsed from a VRN
///
/// Shape: `vrn:<stack>:<dataset>:<resource>[/<resource_id>][?<qualifiers>]`.
/// Every field may hold the literal wildcard `*`. An absent resource id is
/// distinct from `*`: only the wildcard matches any id.
///
/// # Examples
///
/// ```
/// use vrn_authz::scope::Scope;
///
/// let scope = Scope::parse("vrn:*:*:jobs/*").unwrap();
/// assert!(scope.includes_str("vrn:local:-1:jobs/5").unwrap());
/// assert_eq!(scope.specificity_score(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Scope {
    stack_id: String,
    dataset_id: String,
    resource: String,
    resource_id: Option<String>,
    qualifiers: Qualifiers,
}

impl Scope {
    /// Creates a scope from explicit fields, validating each one
    pub fn new(
        stack_id: impl Into<String>,
        dataset_id: impl Into<String>,
        resource: impl Into<String>,
        resource_id: Option<String>,
        qualifiers: Qualifiers,
    ) -> ScopeResult<Self> {
        let scope = Self {
            stack_id: stack_id.into(),
            dataset_id: dataset_id.into(),
            resource: resource.into(),
            resource_id,
            qualifiers,
        };
        scope.validate()?;
        Ok(scope)
    }

    /// Parses a VRN string
    ///
    /// Splits on `:` into tag, stack, dataset and remainder; the remainder is
    /// split on `?` for qualifiers and on `/` for resource and resource id.
    pub fn parse(value: &str) -> ScopeResult<Self> {
        let mut parts = value.splitn(4, ':');
        let (tag, stack_id, dataset_id, remainder) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(tag), Some(stack), Some(dataset), Some(rest)) => {
                    (tag, stack, dataset, rest)
                }
                _ => {
                    return Err(ScopeError::InvalidFormat(format!(
                        "'{}' needs stack, dataset and resource components",
                        value
                    )))
                }
            };

        if tag != VRN_TAG {
            return Err(ScopeError::InvalidFormat(format!(
                "'{}' does not start with '{}:'",
                value, VRN_TAG
            )));
        }

        let (path, qualifiers) = match remainder.split_once('?') {
            Some((path, query)) => (path, Qualifiers::parse(query)?),
            None => (remainder, Qualifiers::new()),
        };

        let (resource, resource_id) = match path.split_once('/') {
            Some((resource, id)) => (resource, Some(id.to_string())),
            None => (path, None),
        };

        Self::new(stack_id, dataset_id, resource, resource_id, qualifiers)
    }

    fn validate(&self) -> ScopeResult<()> {
        check_field("stack_id", &self.stack_id, &LOCATION_PATTERN)?;
        check_field("dataset_id", &self.dataset_id, &LOCATION_PATTERN)?;
        check_field("resource", &self.resource, &RESOURCE_PATTERN)?;
        if let Some(id) = &self.resource_id {
            check_field("resource_id", id, &RESOURCE_ID_PATTERN)?;
        }
        Ok(())
    }

    /// Replaces the qualifiers
    pub fn with_qualifiers(mut self, qualifiers: Qualifiers) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    pub fn stack_id(&self) -> &str {
        &self.stack_id
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    pub fn qualifiers(&self) -> &Qualifiers {
        &self.qualifiers
    }

    /// Checks whether this scope includes another, ignoring qualifiers
    pub fn includes(&self, other: &Scope) -> bool {
        self.includes_with(other, |_| true)
    }

    /// Checks whether this scope includes another
    ///
    /// When every field matches and this scope carries qualifiers,
    /// `qualifier_check` is called with them and its answer is final.
    pub fn includes_with<F>(&self, other: &Scope, qualifier_check: F) -> bool
    where
        F: FnOnce(&Qualifiers) -> bool,
    {
        let matched = field_matches(&self.stack_id, &other.stack_id)
            && field_matches(&self.dataset_id, &other.dataset_id)
            && field_matches(&self.resource, &other.resource)
            && self.resource_id_matches(other);

        if !matched {
            return false;
        }

        if self.qualifiers.is_empty() {
            true
        } else {
            qualifier_check(&self.qualifiers)
        }
    }

    /// Parses `other` and checks inclusion, ignoring qualifiers
    pub fn includes_str(&self, other: &str) -> ScopeResult<bool> {
        Ok(self.includes(&Scope::parse(other)?))
    }

    fn resource_id_matches(&self, other: &Scope) -> bool {
        // A bare wildcard resource covers every id, including none.
        if self.resource == WILDCARD && self.resource_id.is_none() {
            return true;
        }

        match (&self.resource_id, &other.resource_id) {
            (Some(mine), _) if mine == WILDCARD => true,
            (mine, theirs) => mine == theirs,
        }
    }

    /// Sums field weights over the fields that are present and concrete
    pub fn specificity_score(&self) -> u32 {
        let concrete = [
            is_concrete(&self.stack_id),
            is_concrete(&self.dataset_id),
            is_concrete(&self.resource),
            self.resource_id.as_deref().map_or(false, is_concrete),
            !self.qualifiers.is_empty(),
        ];

        concrete
            .iter()
            .zip(FIELD_WEIGHTS.iter())
            .filter(|(concrete, _)| **concrete)
            .map(|(_, weight)| weight)
            .sum()
    }

    /// Whether any field still holds a `{...}` placeholder
    pub fn has_placeholders(&self) -> bool {
        is_placeholder(&self.stack_id)
            || is_placeholder(&self.dataset_id)
            || self.resource_id.as_deref().map_or(false, is_placeholder)
    }

    /// Resolves placeholders against a user identifier
    ///
    /// `{stack}`, `{dataset}`, `{principal}` and `{identity}` take the
    /// matching URN field; `{self}` takes the identity when present and the
    /// principal otherwise. Placeholders without a value, or whose value
    /// would be the wildcard, stay in place.
    pub fn interpolate(&self, user: &Urn) -> Scope {
        if !self.has_placeholders() {
            return self.clone();
        }

        let resolve = |field: &str| -> String {
            placeholder_value(field, user).unwrap_or_else(|| field.to_string())
        };

        Scope {
            stack_id: resolve(&self.stack_id),
            dataset_id: resolve(&self.dataset_id),
            resource: self.resource.clone(),
            resource_id: self.resource_id.as_deref().map(resolve),
            qualifiers: self.qualifiers.clone(),
        }
    }
}

fn check_field(field: &'static str, value: &str, pattern: &Regex) -> ScopeResult<()> {
    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(ScopeError::InvalidField {
            field,
            value: value.to_string(),
        })
    }
}

fn field_matches(pattern: &str, value: &str) -> bool {
    pattern == WILDCARD || pattern == value
}

fn is_concrete(value: &str) -> bool {
    !value.is_empty() && value != WILDCARD
}

fn is_placeholder(value: &str) -> bool {
    value.starts_with('{') && value.ends_with('}')
}

fn placeholder_value(field: &str, user: &Urn) -> Option<String> {
    let value = match field {
        "{stack}" => Some(user.stack_id()),
        "{dataset}" => Some(user.dataset_id()),
        "{principal}" => Some(user.principal_id()),
        "{identity}" => user.identity_id(),
        "{self}" => Some(user.identity_id().unwrap_or_else(|| user.principal_id())),
        _ => None,
    };

    // A wildcard user segment never widens a privilege.
    value.filter(|v| *v != WILDCARD).map(str::to_string)
}

impl FromStr for Scope {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Scope {
    type Error = ScopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.to_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            VRN_TAG, self.stack_id, self.dataset_id, self.resource
        )?;
        if let Some(id) = &self.resource_id {
            write!(f, "/{}", id)?;
        }
        if !self.qualifiers.is_empty() {
            write!(f, "?{}", self.qualifiers)?;
        }
        Ok(())
    }
}
