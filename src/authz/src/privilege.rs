//! Privilege records
//!
//! A privilege is an allow/deny rule bound to a scope and to a permission
//! (or a group of permissions). Privileges rank by scope specificity.

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

use crate::error::Result;
use crate::identity::Urn;
use crate::indexed_set::Identifiable;
use crate::scope::{Qualifiers, Scope};

/// Privilege identifier
pub type PrivilegeId = String;

/// Permission identifier
pub type PermissionId = String;

/// Permission group identifier
pub type GroupId = String;

/// Privilege as returned by the remote authority, scope still unparsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeRecord {
    #[serde(deserialize_with = "id_string")]
    pub id: PrivilegeId,

    /// Scope in VRN form
    pub scope: String,

    pub allow: bool,

    #[serde(default, deserialize_with = "optional_id_string")]
    pub permission_id: Option<PermissionId>,

    #[serde(default, deserialize_with = "optional_id_string")]
    pub group_id: Option<GroupId>,

    #[serde(default, deserialize_with = "optional_id_string")]
    pub subject_id: Option<String>,
}

impl PrivilegeRecord {
    /// Create a record for a single permission
    pub fn new(id: impl Into<String>, scope: impl Into<String>, allow: bool) -> Self {
        Self {
            id: id.into(),
            scope: scope.into(),
            allow,
            permission_id: None,
            group_id: None,
            subject_id: None,
        }
    }

    pub fn with_permission(mut self, permission_id: impl Into<String>) -> Self {
        self.permission_id = Some(permission_id.into());
        self
    }

    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }
}

/// Parsed privilege, enriched with the permission names it grants
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Privilege {
    pub id: PrivilegeId,
    pub scope: Scope,
    pub allow: bool,
    pub permission_id: Option<PermissionId>,
    pub group_id: Option<GroupId>,
    pub subject_id: Option<String>,

    /// Permission names this privilege applies to; several for a group
    pub permission_names: Vec<String>,
}

impl Privilege {
    /// Parses a raw record; a malformed scope is an error
    pub fn from_record(record: PrivilegeRecord) -> Result<Self> {
        Ok(Self {
            scope: Scope::parse(&record.scope)?,
            id: record.id,
            allow: record.allow,
            permission_id: record.permission_id,
            group_id: record.group_id,
            subject_id: record.subject_id,
            permission_names: Vec::new(),
        })
    }

    /// Attaches resolved permission names
    pub fn with_permission_names(mut self, names: Vec<String>) -> Self {
        self.permission_names = names;
        self
    }

    pub fn specificity_score(&self) -> u32 {
        self.scope.specificity_score()
    }

    /// Orders privileges from least to most specific scope
    ///
    /// Equal scores compare equal; there is no further tie-break.
    pub fn cmp_specificity(&self, other: &Privilege) -> Ordering {
        self.specificity_score().cmp(&other.specificity_score())
    }

    /// Whether this privilege's scope includes `target`
    pub fn includes<F>(&self, target: &Scope, qualifier_check: F) -> bool
    where
        F: FnOnce(&Qualifiers) -> bool,
    {
        self.scope.includes_with(target, qualifier_check)
    }

    /// A copy whose scope placeholders are resolved for `user`
    pub fn for_user(&self, user: &Urn) -> Privilege {
        if !self.scope.has_placeholders() {
            return self.clone();
        }
        Privilege {
            scope: self.scope.interpolate(user),
            ..self.clone()
        }
    }
}

impl Identifiable for Privilege {
    fn id(&self) -> String {
        self.id.clone()
    }
}

/// Remote ids are numeric for some record types and strings for others
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Str(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Int(n) => n.to_string(),
            RawId::Str(s) => s,
        }
    }
}

fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_id_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthzError;

    #[test]
    fn test_record_from_json() {
        let json = r#"{
            "id": 7,
            "scope": "vrn:*:*:widget/*",
            "allow": true,
            "permission_id": 12,
            "group_id": null
        }"#;
        let record: PrivilegeRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, "7");
        assert_eq!(record.permission_id.as_deref(), Some("12"));
        assert_eq!(record.group_id, None);
        assert_eq!(record.subject_id, None);
    }

    #[test]
    fn test_record_with_string_ids() {
        let json = r#"{"id": "p-1", "scope": "vrn:*:*:*", "allow": false, "group_id": "g-1"}"#;
        let record: PrivilegeRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.id, "p-1");
        assert_eq!(record.group_id.as_deref(), Some("g-1"));
    }

    #[test]
    fn test_invalid_scope_rejected() {
        let record = PrivilegeRecord::new("1", "widget/42", true);
        assert!(matches!(
            Privilege::from_record(record),
            Err(AuthzError::InvalidScope(_))
        ));
    }

    #[test]
    fn test_subject_carried_into_privilege() {
        let record = PrivilegeRecord::new("1", "vrn:*:*:*", true)
            .with_group("g-1")
            .with_subject("principal-x");
        let privilege = Privilege::from_record(record).unwrap();

        assert_eq!(privilege.subject_id.as_deref(), Some("principal-x"));
        assert_eq!(privilege.group_id.as_deref(), Some("g-1"));
    }

    #[test]
    fn test_sort_by_specificity() {
        let scopes = ["vrn:local:ds-1:widget/42", "vrn:*:*:*", "vrn:*:*:widget/*"];
        let mut privileges: Vec<Privilege> = scopes
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Privilege::from_record(PrivilegeRecord::new(i.to_string(), *s, true)).unwrap()
            })
            .collect();

        privileges.sort_by(Privilege::cmp_specificity);

        let scores: Vec<u32> = privileges.iter().map(Privilege::specificity_score).collect();
        assert_eq!(scores, vec![0, 3, 10]);
    }

    #[test]
    fn test_for_user_resolves_placeholders() {
        let user = Urn::parse("user://local/ds-1/principal-x").unwrap();
        let privilege = Privilege::from_record(PrivilegeRecord::new(
            "1",
            "vrn:{stack}:{dataset}:users/{principal}",
            true,
        ))
        .unwrap();

        let resolved = privilege.for_user(&user);
        assert_eq!(resolved.scope.to_string(), "vrn:local:ds-1:users/principal-x");
        assert_eq!(resolved.id, privilege.id);
    }
}
