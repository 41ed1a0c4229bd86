//! Namespace extraction and ownership resolution
//!
//! A repository name `<namespace>/<image>` belongs to a namespace; bare
//! names and deeper paths belong to the administrator-only default
//! namespace. Ownership is decided by the enabled strategies of the
//! policy, tried in the fixed order username, domain, sld, group. The
//! first match wins.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::{NamespaceStrategy, PolicyConfig};
use crate::types::Principal;

/// Outcome of an ownership check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Ownership {
    /// Owned through the given strategy
    Owned { strategy: NamespaceStrategy },

    /// Group strategy enabled, but the principal has no prefixed group at all
    NoNamespaceGroups,

    /// Group strategy enabled, but the matching prefixed group is missing
    MissingGroup { group: String },

    /// No enabled strategy matched
    NotOwned,
}

impl Ownership {
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned { .. })
    }

    /// Strategy that established ownership
    pub fn strategy(&self) -> Option<NamespaceStrategy> {
        match self {
            Self::Owned { strategy } => Some(*strategy),
            _ => None,
        }
    }
}

/// Extract the lower-cased namespace of a repository name
///
/// Only names with exactly two `/`-separated segments have a namespace.
///
/// ```
/// use registry_authz::namespace::resolve_namespace;
///
/// assert_eq!(resolve_namespace("Team/image"), Some("team".to_string()));
/// assert_eq!(resolve_namespace("image"), None);
/// assert_eq!(resolve_namespace("a/b/c"), None);
/// ```
pub fn resolve_namespace(name: &str) -> Option<String> {
    let mut segments = name.split('/');
    match (segments.next(), segments.next(), segments.next()) {
        (Some(namespace), Some(_), None) => Some(namespace.to_lowercase()),
        _ => None,
    }
}

/// Lower-cased domain of an email address
///
/// Requires exactly one `@` and a non-empty domain.
pub fn email_domain(email: &str) -> Option<String> {
    let (_, domain) = email.split_once('@')?;
    if domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(domain.to_lowercase())
}

/// Second-to-last label of an email address's domain
///
/// `john@mail.company.com` yields `company`; single-label domains yield
/// nothing.
pub fn second_level_domain(email: &str) -> Option<String> {
    let domain = email_domain(email)?;
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return None;
    }

    let sld = labels[labels.len() - 2];
    (!sld.is_empty()).then(|| sld.to_string())
}

/// Namespaces the principal belongs to through prefixed groups
///
/// Groups without the prefix are ignored. A group named exactly like the
/// prefix carries no namespace.
pub fn group_namespaces(principal: &Principal, group_prefix: &str) -> BTreeSet<String> {
    let prefix = group_prefix.to_lowercase();
    principal
        .groups()
        .iter()
        .filter_map(|group| group.strip_prefix(prefix.as_str()))
        .filter(|namespace| !namespace.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decide whether `principal` owns `namespace` under `config`
pub fn is_owner(namespace: &str, principal: &Principal, config: &PolicyConfig) -> Ownership {
    for strategy in NamespaceStrategy::PRIORITY {
        if !config.uses(strategy) {
            continue;
        }

        let owned = match strategy {
            NamespaceStrategy::Username => namespace == principal.username.to_lowercase(),
            NamespaceStrategy::Domain => {
                email_domain(principal.email()).as_deref() == Some(namespace)
            }
            NamespaceStrategy::Sld => {
                second_level_domain(principal.email()).as_deref() == Some(namespace)
            }
            NamespaceStrategy::Group => {
                let namespaces = group_namespaces(principal, config.group_prefix());
                if namespaces.is_empty() {
                    return Ownership::NoNamespaceGroups;
                }
                if !namespaces.contains(namespace) {
                    return Ownership::MissingGroup {
                        group: format!("{}{}", config.group_prefix(), namespace),
                    };
                }
                true
            }
        };

        if owned {
            return Ownership::Owned { strategy };
        }
    }

    Ownership::NotOwned
}
