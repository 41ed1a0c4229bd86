//! Property-based tests for the decision engine

use proptest::prelude::*;
use registry_authz::{
    evaluate, evaluate_scope, ActionSet, CatalogAudience, NamespaceStrategy, PolicyConfig, Principal,
    WriteAccess,
};

fn principal_strategy() -> impl Strategy<Value = Principal> {
    (
        "[a-z]{1,6}",
        prop::option::of("[a-z]{1,4}@[a-z]{1,4}\\.[a-z]{2,3}"),
        prop::collection::vec(prop::sample::select(vec!["editor", "user", "viewer"]), 0..3),
        prop::collection::vec(prop_oneof!["registry-[a-z]{1,4}", "[a-z]{1,6}"], 0..4),
    )
        .prop_map(|(username, email, roles, groups)| {
            let principal = Principal::new(username).with_roles(roles).with_groups(groups);
            match email {
                Some(email) => principal.with_email(email),
                None => principal,
            }
        })
}

fn config_strategy() -> impl Strategy<Value = PolicyConfig> {
    (
        prop::sample::subsequence(vec![CatalogAudience::User, CatalogAudience::Editor], 0..=2),
        prop::sample::subsequence(NamespaceStrategy::PRIORITY.to_vec(), 0..=4),
        prop::sample::select(vec![WriteAccess::Editor, WriteAccess::EditorOrOwner]),
    )
        .prop_map(|(audience, scope, write_access)| {
            PolicyConfig::builder()
                .catalog_audience(audience)
                .namespace_scope(scope)
                .write_access(write_access)
                .build()
        })
}

fn actions_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(vec!["pull", "push", "delete", "*", "custom"], 1..=5)
}

fn repository_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["[a-z]{1,4}", "[a-z]{1,4}/[a-z]{1,4}", "[a-z]{1,4}/[a-z]{1,4}/[a-z]{1,4}"]
}

fn scope_strategy() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["registry", "repository", "repository(plugin)"]),
        prop_oneof![Just("catalog".to_string()), repository_name_strategy()],
        actions_strategy(),
    )
        .prop_map(|(scope_type, name, actions)| format!("{}:{}:{}", scope_type, name, actions.join(",")))
}

#[cfg(test)]
mod determinism {
    use super::*;

    proptest! {
        #[test]
        fn test_evaluation_is_idempotent(
            principal in principal_strategy(),
            config in config_strategy(),
            scopes in prop::collection::vec(scope_strategy(), 0..5),
        ) {
            let first = evaluate(&principal, scopes.as_slice(), &config);
            let second = evaluate(&principal, scopes.as_slice(), &config);
            prop_assert_eq!(first.len(), scopes.len());
            prop_assert_eq!(first, second);
        }

        #[test]
        fn test_arbitrary_input_always_decided(raw in ".{0,40}") {
            let decision = evaluate_scope(&Principal::new("john"), &raw, &PolicyConfig::default());
            prop_assert_eq!(decision.raw_scope, raw);
            if !decision.granted {
                prop_assert!(decision.effective_actions.is_empty());
            }
        }
    }
}

#[cfg(test)]
mod administrator {
    use super::*;

    proptest! {
        #[test]
        fn test_admin_receives_requested_actions(
            principal in principal_strategy(),
            config in config_strategy(),
            scope in scope_strategy(),
        ) {
            let admin = principal.with_role("admin");
            let decision = evaluate_scope(&admin, &scope, &config);
            let requested = decision.scope.as_ref().map(|s| s.actions().clone());

            prop_assert!(decision.granted);
            prop_assert_eq!(Some(decision.effective_actions), requested);
        }
    }
}

#[cfg(test)]
mod filtering {
    use super::*;

    fn vocabulary() -> ActionSet {
        ActionSet::all_actions()
    }

    proptest! {
        #[test]
        fn test_non_admin_repository_grants_stay_in_vocabulary(
            principal in principal_strategy(),
            config in config_strategy(),
            name in repository_name_strategy(),
            actions in actions_strategy(),
        ) {
            let scope = format!("repository:{}:{}", name, actions.join(","));
            let decision = evaluate_scope(&principal, &scope, &config);

            prop_assert!(vocabulary().is_superset(&decision.effective_actions));
            prop_assert_eq!(decision.granted, !decision.effective_actions.is_empty());
        }

        #[test]
        fn test_wildcard_grants_at_least_any_subset(
            principal in principal_strategy(),
            config in config_strategy(),
            name in "[a-z]{1,4}/[a-z]{1,4}",
            subset in prop::sample::subsequence(vec!["pull", "push", "delete"], 1..=3),
        ) {
            let wildcard = evaluate_scope(&principal, &format!("repository:{}:*", name), &config);
            let explicit = evaluate_scope(&principal, &format!("repository:{}:{}", name, subset.join(",")), &config);

            prop_assert!(wildcard.effective_actions.is_superset(&explicit.effective_actions));
        }

        #[test]
        fn test_username_scope_only_grants_own_namespace(
            principal in principal_strategy(),
            namespace in "[a-z]{1,6}",
            actions in actions_strategy(),
        ) {
            prop_assume!(namespace != principal.username);
            let config = PolicyConfig::builder()
                .namespace_scope([NamespaceStrategy::Username])
                .build();

            let scope = format!("repository:{}/image:{}", namespace, actions.join(","));
            prop_assert!(!evaluate_scope(&principal, &scope, &config).granted);
        }
    }
}
