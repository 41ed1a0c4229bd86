//! Decision engine
//!
//! Orchestrates scope parsing, type dispatch, namespace ownership and
//! action filtering for every requested scope.
//!
//! ```text
//! raw scope → parse → actions? → admin? → type dispatch
//!                                           ├─ registry:catalog → audience check
//!                                           ├─ registry:*       → deny
//!                                           └─ repository       → namespace → ownership → filter
//! ```
//!
//! Every path ends in an [`AccessDecision`]; business-rule failures are
//! denies, never errors.

pub mod decision;

pub use decision::{AccessDecision, DecisionReason};

use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::config::{CatalogAudience, PolicyConfig, PolicyHandle};
use crate::filter::{filter_actions, has_all_privileges};
use crate::namespace::{is_owner, resolve_namespace, Ownership};
use crate::scope::{split_scopes, Scope};
use crate::types::Principal;

/// Evaluate every raw scope independently
///
/// The output has one decision per input scope, in input order.
pub fn evaluate<S: AsRef<str>>(
    principal: &Principal,
    raw_scopes: &[S],
    config: &PolicyConfig,
) -> Vec<AccessDecision> {
    raw_scopes
        .iter()
        .map(|raw| evaluate_scope(principal, raw.as_ref(), config))
        .collect()
}

/// Evaluate a session's space-separated scope parameter
///
/// A missing or blank parameter yields no decisions.
pub fn evaluate_session(
    principal: &Principal,
    scope_param: Option<&str>,
    config: &PolicyConfig,
) -> Vec<AccessDecision> {
    let raw_scopes = split_scopes(scope_param);
    if raw_scopes.is_empty() {
        debug!("Session does not contain a scope, ignoring further access check");
    }
    evaluate(principal, raw_scopes.as_slice(), config)
}

/// Evaluate a single raw scope
pub fn evaluate_scope(principal: &Principal, raw_scope: &str, config: &PolicyConfig) -> AccessDecision {
    let decision = match Scope::parse(raw_scope) {
        Ok(scope) => {
            trace!("Parsed scope '{}' into {:?}", raw_scope, scope);
            decide(principal, scope, config)
        }
        Err(e) => AccessDecision::unparsable(raw_scope, e.to_string()),
    };

    if decision.granted {
        debug!(
            "Granting access for user '{}' on scope '{}' with [{}]: {}",
            principal.username, decision.raw_scope, decision.effective_actions, decision.reason
        );
    } else {
        warn!(
            "Access denied for user '{}' on scope '{}': {}",
            principal.username, decision.raw_scope, decision.reason
        );
    }

    decision
}

fn decide(principal: &Principal, scope: Scope, config: &PolicyConfig) -> AccessDecision {
    if scope.actions().is_empty() {
        return AccessDecision::deny(scope, DecisionReason::NoActionsRequested);
    }

    // Administrators receive exactly what they asked for, wildcard included
    if principal.is_admin() {
        let actions = scope.actions().clone();
        return AccessDecision::grant(scope, actions, DecisionReason::AdministratorRole);
    }

    if scope.scope_type().is_repository() {
        return decide_repository(principal, scope, config);
    }

    if scope.is_catalog() {
        return decide_catalog(principal, scope, config);
    }

    AccessDecision::deny(scope, DecisionReason::RegistryAdministratorOnly)
}

fn decide_catalog(principal: &Principal, scope: Scope, config: &PolicyConfig) -> AccessDecision {
    let audience = if config.allows_catalog(CatalogAudience::User) {
        Some(CatalogAudience::User)
    } else if config.allows_catalog(CatalogAudience::Editor) && principal.is_editor() {
        Some(CatalogAudience::Editor)
    } else {
        None
    };

    match audience {
        Some(audience) => {
            let actions = scope.actions().clone();
            AccessDecision::grant(scope, actions, DecisionReason::CatalogAudience { audience })
        }
        None => {
            let audience = if principal.is_editor() {
                CatalogAudience::Editor
            } else {
                CatalogAudience::User
            };
            AccessDecision::deny(scope, DecisionReason::CatalogAudienceRequired { audience })
        }
    }
}

fn decide_repository(principal: &Principal, scope: Scope, config: &PolicyConfig) -> AccessDecision {
    let Some(namespace) = resolve_namespace(scope.name()) else {
        return AccessDecision::deny(scope, DecisionReason::DefaultNamespace);
    };

    let ownership = is_owner(&namespace, principal, config);
    let strategy = match &ownership {
        Ownership::Owned { strategy } => *strategy,
        Ownership::NoNamespaceGroups => {
            return AccessDecision::deny(scope, DecisionReason::NoNamespaceMembership);
        }
        Ownership::MissingGroup { group } => {
            let reason = DecisionReason::MissingNamespaceGroup { group: group.clone() };
            return AccessDecision::deny(scope, reason);
        }
        Ownership::NotOwned => {
            return AccessDecision::deny(scope, DecisionReason::NamespaceNotOwned { namespace });
        }
    };

    let requested = scope.actions();
    let allowed = filter_actions(requested, principal, &ownership, config);

    if allowed.is_empty() {
        let reason = DecisionReason::MissingPrivileges {
            requested: requested.clone(),
        };
        return AccessDecision::deny(scope, reason);
    }

    let reason = if has_all_privileges(&allowed, requested, config.wildcard_actions()) {
        DecisionReason::AllPrivileges { strategy }
    } else {
        DecisionReason::PartialPrivileges {
            strategy,
            allowed: allowed.clone(),
        }
    };

    AccessDecision::grant(scope, allowed, reason)
}

/// Decision engine bound to a swappable policy snapshot
///
/// Each call evaluates all of its scopes against the single snapshot that
/// was current when the call started.
#[derive(Debug, Default)]
pub struct DecisionEngine {
    policy: PolicyHandle,
}

impl DecisionEngine {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            policy: PolicyHandle::new(config),
        }
    }

    /// Current policy snapshot
    pub fn policy(&self) -> Arc<PolicyConfig> {
        self.policy.snapshot()
    }

    /// Install a new policy snapshot
    pub fn reconfigure(&self, config: PolicyConfig) {
        let previous = self.policy.replace(config);
        debug!("Policy replaced, previous snapshot: {:?}", previous);
    }

    /// Evaluate raw scopes for `principal`
    pub fn evaluate<S: AsRef<str>>(&self, principal: &Principal, raw_scopes: &[S]) -> Vec<AccessDecision> {
        let config = self.policy.snapshot();
        evaluate(principal, raw_scopes, &config)
    }

    /// Evaluate a session's scope parameter for `principal`
    pub fn evaluate_session(&self, principal: &Principal, scope_param: Option<&str>) -> Vec<AccessDecision> {
        let config = self.policy.snapshot();
        evaluate_session(principal, scope_param, &config)
    }
}
