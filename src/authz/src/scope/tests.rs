/// Test suite for the scope module
///
/// Covers inclusion across wildcard combinations, qualifier callbacks,
/// placeholder interpolation and property checks.

use super::*;
use crate::identity::Urn;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn scope(s: &str) -> Scope {
    Scope::parse(s).unwrap()
}

// ============================================================================
// Inclusion
// ============================================================================

#[test]
fn test_exact_inclusion() {
    assert!(scope("vrn:local:ds-1:widget/42").includes(&scope("vrn:local:ds-1:widget/42")));
    assert!(!scope("vrn:local:ds-1:widget/42").includes(&scope("vrn:local:ds-1:widget/43")));
}

#[test]
fn test_wildcard_is_not_symmetric() {
    let broad = scope("vrn:*:*:jobs/*");
    let narrow = scope("vrn:local:-1:jobs/5");

    assert!(broad.includes(&narrow));
    assert!(!narrow.includes(&broad));
}

#[test]
fn test_absent_id_differs_from_wildcard_id() {
    let no_id = scope("vrn:local:ds-1:widget");

    assert!(no_id.includes(&scope("vrn:local:ds-1:widget")));
    assert!(!no_id.includes(&scope("vrn:local:ds-1:widget/42")));
    assert!(scope("vrn:local:ds-1:widget/*").includes(&scope("vrn:local:ds-1:widget/42")));
}

#[test]
fn test_wildcard_id_matches_target_without_id() {
    assert!(scope("vrn:local:ds-1:widget/*").includes(&scope("vrn:local:ds-1:widget")));
}

#[test]
fn test_bare_wildcard_resource_covers_any_id() {
    let any = scope("vrn:local:ds-1:*");

    assert!(any.includes(&scope("vrn:local:ds-1:widget")));
    assert!(any.includes(&scope("vrn:local:ds-1:widget/42")));
    assert!(any.includes(&scope("vrn:local:ds-1:jobs/7")));
}

#[test]
fn test_wildcard_resource_with_concrete_id() {
    let id_only = scope("vrn:local:ds-1:*/42");

    assert!(id_only.includes(&scope("vrn:local:ds-1:widget/42")));
    assert!(!id_only.includes(&scope("vrn:local:ds-1:widget/43")));
    assert!(!id_only.includes(&scope("vrn:local:ds-1:widget")));
}

#[test]
fn test_stack_and_dataset_mismatch() {
    let s = scope("vrn:local:ds-1:widget/*");

    assert!(!s.includes(&scope("vrn:prod:ds-1:widget/1")));
    assert!(!s.includes(&scope("vrn:local:ds-2:widget/1")));
    assert!(!s.includes(&scope("vrn:local:ds-1:gadget/1")));
}

#[test]
fn test_includes_str_parses_other() {
    let s = scope("vrn:*:*:*");
    assert!(s.includes_str("vrn:local:-1:jobs/5").unwrap());
    assert!(matches!(
        s.includes_str("jobs/5"),
        Err(ScopeError::InvalidFormat(_))
    ));
}

// ============================================================================
// Qualifiers
// ============================================================================

#[test]
fn test_qualifier_check_overrides_match() {
    let s = scope("vrn:local:ds-1:widget/*?owner=me");
    let target = scope("vrn:local:ds-1:widget/42");

    assert!(s.includes_with(&target, |q| q.get("owner") == Some("me")));
    assert!(!s.includes_with(&target, |_| false));
}

#[test]
fn test_qualifier_check_ignored_without_qualifiers() {
    let s = scope("vrn:local:ds-1:widget/*");
    let target = scope("vrn:local:ds-1:widget/42");

    assert!(s.includes_with(&target, |_| false));
}

#[test]
fn test_qualifier_check_not_called_on_mismatch() {
    let s = scope("vrn:local:ds-1:widget/*?owner=me");
    let target = scope("vrn:local:ds-1:gadget/42");
    let mut called = false;

    assert!(!s.includes_with(&target, |_| {
        called = true;
        true
    }));
    assert!(!called);
}

#[test]
fn test_qualifiers_without_callback_do_not_affect_match() {
    let s = scope("vrn:local:ds-1:widget/*?owner=me");
    assert!(s.includes(&scope("vrn:local:ds-1:widget/42")));
}

#[test]
fn test_qualifiers_from_map_verbatim() {
    let mut map = BTreeMap::new();
    map.insert("state".to_string(), "open".to_string());

    let s = Scope::new("local", "ds-1", "widget", None, Qualifiers::from(map)).unwrap();
    assert_eq!(s.to_string(), "vrn:local:ds-1:widget?state=open");
    assert_eq!(s.specificity_score(), 1 + 2 + 3 + 5);
}

// ============================================================================
// Placeholders
// ============================================================================

#[test]
fn test_interpolate_self_prefers_identity() {
    let user = Urn::parse("user://local/ds-1/principal-x/identity-y").unwrap();
    let s = scope("vrn:{stack}:{dataset}:users/{self}").interpolate(&user);

    assert_eq!(s.to_string(), "vrn:local:ds-1:users/identity-y");
    assert!(!s.has_placeholders());
}

#[test]
fn test_interpolate_self_falls_back_to_principal() {
    let user = Urn::parse("user://local/ds-1/principal-x").unwrap();
    let s = scope("vrn:local:ds-1:users/{self}").interpolate(&user);

    assert_eq!(s.resource_id(), Some("principal-x"));
}

#[test]
fn test_unresolved_identity_placeholder_stays() {
    let user = Urn::parse("user://local/ds-1/principal-x").unwrap();
    let s = scope("vrn:local:ds-1:users/{identity}").interpolate(&user);

    assert_eq!(s.resource_id(), Some("{identity}"));
    assert!(!s.includes(&scope("vrn:local:ds-1:users/principal-x")));
}

#[test]
fn test_wildcard_user_segments_never_widen_scope() {
    let user = Urn::parse("user://*/*/principal-x/*").unwrap();
    let s = scope("vrn:{stack}:{dataset}:profile/{self}").interpolate(&user);

    assert_eq!(s.stack_id(), "{stack}");
    assert_eq!(s.dataset_id(), "{dataset}");
    assert_eq!(s.resource_id(), Some("{self}"));
    assert!(!s.includes(&scope("vrn:local:ds-1:profile/someone-else")));
    assert!(!s.includes(&scope("vrn:local:ds-1:profile/principal-x")));
}

#[test]
fn test_wildcard_principal_not_substituted() {
    let user = Urn::parse("user://local/ds-1/*").unwrap();
    let s = scope("vrn:local:ds-1:users/{principal}").interpolate(&user);

    assert_eq!(s.resource_id(), Some("{principal}"));
    assert!(!s.includes(&scope("vrn:local:ds-1:users/anyone")));
}

// ============================================================================
// Properties
// ============================================================================

fn concrete_field() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9-]{0,8}"
}

fn concrete_scope() -> impl Strategy<Value = Scope> {
    (
        concrete_field(),
        concrete_field(),
        "[a-z][a-z0-9_]{0,8}",
        proptest::option::of(concrete_field()),
    )
        .prop_map(|(stack, dataset, resource, id)| {
            Scope::new(stack, dataset, resource, id, Qualifiers::new()).unwrap()
        })
}

proptest! {
    #[test]
    fn prop_full_wildcard_includes_everything(s in concrete_scope()) {
        prop_assert!(scope("vrn:*:*:*").includes(&s));
    }

    #[test]
    fn prop_inclusion_is_reflexive(s in concrete_scope()) {
        let reparsed = Scope::parse(&s.to_string()).unwrap();
        prop_assert!(reparsed.includes(&s));
        prop_assert_eq!(reparsed, s);
    }

    #[test]
    fn prop_concretizing_never_lowers_specificity(s in concrete_scope()) {
        let id = s.resource_id().map(str::to_string);
        let wildcarded = [
            Scope::new("*", s.dataset_id(), s.resource(), id.clone(), Qualifiers::new()).unwrap(),
            Scope::new(s.stack_id(), "*", s.resource(), id.clone(), Qualifiers::new()).unwrap(),
            Scope::new(s.stack_id(), s.dataset_id(), "*", id, Qualifiers::new()).unwrap(),
            Scope::new(
                s.stack_id(),
                s.dataset_id(),
                s.resource(),
                Some("*".to_string()),
                Qualifiers::new(),
            )
            .unwrap(),
        ];

        for w in &wildcarded {
            prop_assert!(w.specificity_score() <= s.specificity_score());
            prop_assert!(w.includes(&s));
        }
    }
}
