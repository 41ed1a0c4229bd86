//! Access claim entries for the registry bearer token

use serde::{Deserialize, Serialize};

use crate::engine::AccessDecision;

/// One entry of the token's `access` claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    /// Resource type token (`registry`, `repository`, `repository(plugin)`)
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Resource name
    pub name: String,

    /// Granted actions
    pub actions: Vec<String>,
}

impl AccessEntry {
    /// Entry for a granted decision, `None` for denies
    pub fn from_decision(decision: &AccessDecision) -> Option<Self> {
        if !decision.granted {
            return None;
        }

        let scope = decision.scope.as_ref()?;
        Some(Self {
            resource_type: scope.scope_type().as_str().to_string(),
            name: scope.name().to_string(),
            actions: decision.effective_actions.to_vec(),
        })
    }
}

/// Access entries for the granted decisions, in request order
///
/// Denied scopes are omitted; absence is the only signal a client gets.
pub fn granted_access(decisions: &[AccessDecision]) -> Vec<AccessEntry> {
    decisions.iter().filter_map(AccessEntry::from_decision).collect()
}
