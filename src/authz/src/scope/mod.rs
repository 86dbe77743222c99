/// Resource scope (VRN) parsing and matching
///
/// A scope describes which resources a privilege applies to. Scopes
/// are matched by inclusion and ranked by specificity.
///
/// # Examples
///
/// ```
/// use vrn_authz::scope::Scope;
///
/// let broad = Scope::parse("vrn:*:*:widget/*").unwrap();
/// let narrow = Scope::parse("vrn:local:ds-1:widget/42").unwrap();
///
/// assert!(broad.includes(&narrow));
/// assert!(!narrow.includes(&broad));
/// assert!(broad.specificity_score() < narrow.specificity_score());
/// ```

mod qualifiers;
mod types;

#[cfg(test)]
mod tests;

pub use qualifiers::Qualifiers;
pub use types::{Scope, ScopeError, ScopeResult, VRN_TAG, WILDCARD};
