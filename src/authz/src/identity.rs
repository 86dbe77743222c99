//! User identifiers (URN)
//!
//! A URN names the caller: `user://<stack>/<dataset>/<principal>[/<identity>]`.
//! It is half of the privilege cache key and the source of values for
//! scope placeholders.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Scheme prefix every user identifier starts with
pub const URN_PREFIX: &str = "user://";

static SEGMENT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:[a-z0-9_-]+|\*)$").unwrap());

/// Errors raised while parsing a user identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("'{0}' does not start with 'user://'")]
    MissingPrefix(String),

    #[error("'{0}' needs stack, dataset and principal segments")]
    InvalidFormat(String),

    #[error("invalid {field} '{value}'")]
    InvalidSegment { field: &'static str, value: String },
}

/// Parsed user identifier
///
/// Equality compares all four fields; an absent identity is distinct from `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Urn {
    stack_id: String,
    dataset_id: String,
    principal_id: String,
    identity_id: Option<String>,
}

impl Urn {
    /// Creates an identifier from explicit fields
    pub fn new(
        stack_id: impl Into<String>,
        dataset_id: impl Into<String>,
        principal_id: impl Into<String>,
        identity_id: Option<String>,
    ) -> Result<Self, IdentifierError> {
        let urn = Self {
            stack_id: stack_id.into(),
            dataset_id: dataset_id.into(),
            principal_id: principal_id.into(),
            identity_id,
        };

        check_segment("stack_id", &urn.stack_id)?;
        check_segment("dataset_id", &urn.dataset_id)?;
        check_segment("principal_id", &urn.principal_id)?;
        if let Some(identity) = &urn.identity_id {
            check_segment("identity_id", identity)?;
        }

        Ok(urn)
    }

    /// Parses `user://<stack>/<dataset>/<principal>[/<identity>]`
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        let path = value
            .strip_prefix(URN_PREFIX)
            .ok_or_else(|| IdentifierError::MissingPrefix(value.to_string()))?;

        let segments: Vec<&str> = path.split('/').collect();
        match segments.as_slice() {
            [stack, dataset, principal] => Self::new(*stack, *dataset, *principal, None),
            [stack, dataset, principal, identity] => {
                Self::new(*stack, *dataset, *principal, Some(identity.to_string()))
            }
            _ => Err(IdentifierError::InvalidFormat(value.to_string())),
        }
    }

    pub fn stack_id(&self) -> &str {
        &self.stack_id
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn principal_id(&self) -> &str {
        &self.principal_id
    }

    pub fn identity_id(&self) -> Option<&str> {
        self.identity_id.as_deref()
    }

    /// The same principal without an identity component
    pub fn principal(&self) -> Urn {
        Urn {
            identity_id: None,
            ..self.clone()
        }
    }
}

fn check_segment(field: &'static str, value: &str) -> Result<(), IdentifierError> {
    if SEGMENT_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(IdentifierError::InvalidSegment {
            field,
            value: value.to_string(),
        })
    }
}

impl FromStr for Urn {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Urn {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Urn> for String {
    fn from(urn: Urn) -> Self {
        urn.to_string()
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}/{}/{}",
            URN_PREFIX, self.stack_id, self.dataset_id, self.principal_id
        )?;
        if let Some(identity) = &self.identity_id {
            write!(f, "/{}", identity)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_identity() {
        let urn = Urn::parse("user://local/ds-1/principal-x/identity-y").unwrap();
        assert_eq!(urn.stack_id(), "local");
        assert_eq!(urn.dataset_id(), "ds-1");
        assert_eq!(urn.principal_id(), "principal-x");
        assert_eq!(urn.identity_id(), Some("identity-y"));
        assert_eq!(urn.to_string(), "user://local/ds-1/principal-x/identity-y");
    }

    #[test]
    fn test_parse_without_identity() {
        let urn = Urn::parse("user://local/-1/principal-x").unwrap();
        assert_eq!(urn.identity_id(), None);
        assert_eq!(urn.to_string(), "user://local/-1/principal-x");
    }

    #[test]
    fn test_absent_identity_is_not_wildcard() {
        let absent = Urn::parse("user://local/ds-1/p").unwrap();
        let wildcard = Urn::parse("user://local/ds-1/p/*").unwrap();
        assert_ne!(absent, wildcard);
        assert_eq!(wildcard.principal(), absent);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Urn::parse("local/ds-1/p"),
            Err(IdentifierError::MissingPrefix(_))
        ));
        assert!(matches!(
            Urn::parse("user://local/ds-1"),
            Err(IdentifierError::InvalidFormat(_))
        ));
        assert!(matches!(
            Urn::parse("user://local/ds-1/p/i/extra"),
            Err(IdentifierError::InvalidFormat(_))
        ));
        assert!(matches!(
            Urn::parse("user://local//p"),
            Err(IdentifierError::InvalidSegment { field: "dataset_id", .. })
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let urn: Urn = serde_json::from_str("\"user://local/ds-1/p\"").unwrap();
        assert_eq!(serde_json::to_string(&urn).unwrap(), "\"user://local/ds-1/p\"");
    }
}
