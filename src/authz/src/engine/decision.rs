//! Access decision types

use serde::Serialize;
use std::fmt;

use crate::actions::ActionSet;
use crate::config::{CatalogAudience, NamespaceStrategy, KEY_CATALOG_AUDIENCE};
use crate::scope::Scope;
use crate::types::ROLE_ADMIN;

/// Decision for a single requested scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    /// Whether any action was granted
    pub granted: bool,

    /// Scope string as received
    pub raw_scope: String,

    /// Parsed scope, absent when the string could not be parsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,

    /// Granted actions; empty on deny
    pub effective_actions: ActionSet,

    /// Why the decision was taken
    pub reason: DecisionReason,
}

impl AccessDecision {
    /// Create a grant decision
    pub fn grant(scope: Scope, effective_actions: ActionSet, reason: DecisionReason) -> Self {
        Self {
            granted: true,
            raw_scope: scope.as_str().to_string(),
            scope: Some(scope),
            effective_actions,
            reason,
        }
    }

    /// Create a deny decision for a parsed scope
    pub fn deny(scope: Scope, reason: DecisionReason) -> Self {
        Self {
            granted: false,
            raw_scope: scope.as_str().to_string(),
            scope: Some(scope),
            effective_actions: ActionSet::new(),
            reason,
        }
    }

    /// Create a deny decision for a scope string that could not be parsed
    pub fn unparsable(raw_scope: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            granted: false,
            raw_scope: raw_scope.into(),
            scope: None,
            effective_actions: ActionSet::new(),
            reason: DecisionReason::UnparsableScope {
                detail: detail.into(),
            },
        }
    }
}

/// Reason for a decision
///
/// The `Display` form is the human-readable audit text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionReason {
    // Grants
    /// Principal holds the administrator role
    AdministratorRole,

    /// Catalog access allowed by the configured audience
    CatalogAudience { audience: CatalogAudience },

    /// Every requested action was allowed
    AllPrivileges { strategy: NamespaceStrategy },

    /// Only some requested actions were allowed
    PartialPrivileges {
        strategy: NamespaceStrategy,
        allowed: ActionSet,
    },

    // Denies
    /// Scope string could not be parsed
    UnparsableScope { detail: String },

    /// Scope requested no actions
    NoActionsRequested,

    /// Catalog audience does not include the principal's class
    CatalogAudienceRequired { audience: CatalogAudience },

    /// Registry scopes other than the catalog need the administrator role
    RegistryAdministratorOnly,

    /// Repository without namespace
    DefaultNamespace,

    /// Group strategy enabled and the principal has no namespace group
    NoNamespaceMembership,

    /// Group strategy enabled and the namespace group is missing
    MissingNamespaceGroup { group: String },

    /// No enabled strategy establishes ownership
    NamespaceNotOwned { namespace: String },

    /// Namespace owned, but no requested action is allowed
    MissingPrivileges { requested: ActionSet },
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdministratorRole => write!(f, "administrator role '{}'", ROLE_ADMIN),
            Self::CatalogAudience { audience } => {
                write!(f, "allowed by catalog audience '{}'", audience)
            }
            Self::AllPrivileges { strategy } => {
                write!(f, "all privileges on namespace owned by {}", strategy)
            }
            Self::PartialPrivileges { strategy, allowed } => write!(
                f,
                "partial privileges [{}] on namespace owned by {}",
                allowed, strategy
            ),
            Self::UnparsableScope { detail } => write!(f, "unparsable scope: {}", detail),
            Self::NoActionsRequested => write!(f, "no actions requested"),
            Self::CatalogAudienceRequired { audience } => write!(
                f,
                "role '{}' or ${}='{}' needed to access catalog",
                ROLE_ADMIN, KEY_CATALOG_AUDIENCE, audience
            ),
            Self::RegistryAdministratorOnly => {
                write!(f, "role '{}' needed to access registry scope", ROLE_ADMIN)
            }
            Self::DefaultNamespace => write!(
                f,
                "administrator-only default namespace, role '{}' needed",
                ROLE_ADMIN
            ),
            Self::NoNamespaceMembership => {
                write!(f, "principal belongs to no namespace - check groups")
            }
            Self::MissingNamespaceGroup { group } => {
                write!(f, "missing namespace group '{}' - check groups", group)
            }
            Self::NamespaceNotOwned { namespace } => write!(
                f,
                "principal does not own namespace '{}' by any enabled strategy",
                namespace
            ),
            Self::MissingPrivileges { requested } => write!(
                f,
                "missing privileges for requested actions [{}] - check client roles",
                requested
            ),
        }
    }
}
