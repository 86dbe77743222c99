//! Authorization decision types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of evaluating one permission against one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Every qualified privilege allows
    Allow,
    /// Every qualified privilege denies, or none qualifies
    Deny,
    /// Qualified privileges disagree and the policy did not settle it
    Indeterminate,
}

impl Decision {
    /// Maps the tri-state outcome of [`authorized`](super::PolicyEvaluator::authorized)
    pub fn from_outcome(outcome: Option<bool>) -> Self {
        match outcome {
            Some(true) => Decision::Allow,
            Some(false) => Decision::Deny,
            None => Decision::Indeterminate,
        }
    }

    pub fn outcome(self) -> Option<bool> {
        match self {
            Decision::Allow => Some(true),
            Decision::Deny => Some(false),
            Decision::Indeterminate => None,
        }
    }

    /// Only an explicit allow permits the action
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

impl From<Option<bool>> for Decision {
    fn from(outcome: Option<bool>) -> Self {
        Decision::from_outcome(outcome)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
            Decision::Indeterminate => "indeterminate",
        };
        f.write_str(label)
    }
}
