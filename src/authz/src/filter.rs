//! Role-based action filtering inside an owned namespace

use crate::actions::{ActionSet, ACTION_DELETE, ACTION_PULL, ACTION_PUSH};
use crate::config::{NamespaceStrategy, PolicyConfig, WriteAccess};
use crate::namespace::Ownership;
use crate::types::Principal;

/// Whether the principal may push and delete in a namespace it owns
pub fn has_write_access(principal: &Principal, ownership: &Ownership, config: &PolicyConfig) -> bool {
    if principal.is_editor() {
        return true;
    }

    config.write_access() == WriteAccess::EditorOrOwner
        && ownership.strategy() == Some(NamespaceStrategy::Username)
}

/// Compute the allowed subset of the requested actions
///
/// The wildcard is substituted first. `pull` is always allowed once the
/// namespace is owned; `push` and `delete` need write access; any other
/// token is dropped. Without ownership nothing is allowed.
pub fn filter_actions(
    requested: &ActionSet,
    principal: &Principal,
    ownership: &Ownership,
    config: &PolicyConfig,
) -> ActionSet {
    if requested.is_empty() || !ownership.is_owned() {
        return ActionSet::new();
    }

    let write = has_write_access(principal, ownership, config);

    requested
        .substitute(config.wildcard_actions())
        .iter()
        .filter(|action| match *action {
            ACTION_PULL => true,
            ACTION_PUSH | ACTION_DELETE => write,
            _ => false,
        })
        .collect()
}

/// Whether `allowed` covers everything that was asked for
///
/// A request of exactly `*` counts as fully granted when the whole
/// wildcard substitution set was allowed.
pub fn has_all_privileges(allowed: &ActionSet, requested: &ActionSet, wildcard_actions: &ActionSet) -> bool {
    allowed.is_superset(requested)
        || (requested.is_wildcard_only() && allowed.is_superset(wildcard_actions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ROLE_EDITOR;

    fn set(actions: &[&str]) -> ActionSet {
        actions.iter().copied().collect()
    }

    fn group_owned() -> Ownership {
        Ownership::Owned { strategy: NamespaceStrategy::Group }
    }

    fn user() -> Principal {
        Principal::new("johnny")
    }

    fn editor() -> Principal {
        Principal::new("johnny").with_role(ROLE_EDITOR)
    }

    #[test]
    fn test_user_gets_pull_only() {
        let config = PolicyConfig::default();
        let cases = [
            (set(&["*"]), set(&["pull"])),
            (set(&["pull"]), set(&["pull"])),
            (set(&["push"]), set(&[])),
            (set(&["delete"]), set(&[])),
            (set(&["pull", "push"]), set(&["pull"])),
        ];

        for (requested, expected) in cases {
            assert_eq!(
                filter_actions(&requested, &user(), &group_owned(), &config),
                expected,
                "requested {}",
                requested
            );
        }
    }

    #[test]
    fn test_editor_gets_requested_actions() {
        let config = PolicyConfig::default();
        let cases = [
            (set(&["*"]), set(&["pull", "push", "delete"])),
            (set(&["pull"]), set(&["pull"])),
            (set(&["push"]), set(&["push"])),
            (set(&["delete"]), set(&["delete"])),
            (set(&["pull", "push"]), set(&["pull", "push"])),
        ];

        for (requested, expected) in cases {
            assert_eq!(
                filter_actions(&requested, &editor(), &group_owned(), &config),
                expected,
                "requested {}",
                requested
            );
        }
    }

    #[test]
    fn test_username_owner_write_access_follows_policy() {
        let owned = Ownership::Owned { strategy: NamespaceStrategy::Username };

        let config = PolicyConfig::default();
        assert_eq!(
            filter_actions(&set(&["*"]), &user(), &owned, &config),
            set(&["pull", "push", "delete"])
        );

        let config = PolicyConfig::builder().write_access(WriteAccess::Editor).build();
        assert_eq!(filter_actions(&set(&["*"]), &user(), &owned, &config), set(&["pull"]));
    }

    #[test]
    fn test_two_action_wildcard() {
        let config = PolicyConfig::builder().wildcard_actions(["pull", "push"]).build();
        assert_eq!(
            filter_actions(&set(&["*"]), &editor(), &group_owned(), &config),
            set(&["pull", "push"])
        );
        // Explicit delete is still honoured for editors
        assert_eq!(
            filter_actions(&set(&["delete"]), &editor(), &group_owned(), &config),
            set(&["delete"])
        );
    }

    #[test]
    fn test_unknown_actions_are_dropped() {
        let config = PolicyConfig::default();
        assert_eq!(
            filter_actions(&set(&["pull", "annotate"]), &editor(), &group_owned(), &config),
            set(&["pull"])
        );
    }

    #[test]
    fn test_nothing_without_ownership() {
        let config = PolicyConfig::default();
        assert!(filter_actions(&set(&["pull"]), &editor(), &Ownership::NotOwned, &config).is_empty());
        assert!(filter_actions(&set(&[]), &editor(), &group_owned(), &config).is_empty());
    }

    #[test]
    fn test_has_all_privileges() {
        let all = ActionSet::all_actions();
        assert!(has_all_privileges(&set(&["pull", "push", "delete"]), &set(&["*"]), &all));
        assert!(has_all_privileges(&set(&["delete", "pull"]), &set(&["pull", "delete"]), &all));
        assert!(!has_all_privileges(&set(&["pull"]), &set(&["push"]), &all));
        assert!(!has_all_privileges(&set(&["pull"]), &set(&["*"]), &all));
    }
}
