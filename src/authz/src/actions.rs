//! Registry action vocabulary and wildcard substitution

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Read access to a repository
pub const ACTION_PULL: &str = "pull";

/// Write access to a repository
pub const ACTION_PUSH: &str = "push";

/// Deletion of manifests and blobs
pub const ACTION_DELETE: &str = "delete";

/// Wildcard standing for every action
pub const ACTION_ALL: &str = "*";

/// Set of action tokens as they appear in a scope
///
/// Backed by an ordered set so evaluation output is deterministic.
/// Tokens are kept verbatim, including unknown ones and the wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSet(BTreeSet<String>);

impl ActionSet {
    /// Create an empty action set
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Parse the comma-separated actions segment of a scope
    ///
    /// Empty tokens are skipped, so an empty segment yields an empty set.
    pub fn parse(segment: &str) -> Self {
        segment
            .split(',')
            .filter(|action| !action.is_empty())
            .collect()
    }

    /// The full substitution set for `*` in the three-action vocabulary
    pub fn all_actions() -> Self {
        [ACTION_PULL, ACTION_PUSH, ACTION_DELETE].into_iter().collect()
    }

    /// Add an action, returning whether it was new
    pub fn insert(&mut self, action: impl Into<String>) -> bool {
        self.0.insert(action.into())
    }

    /// Whether the set contains `action`
    pub fn contains(&self, action: &str) -> bool {
        self.0.contains(action)
    }

    /// Whether the set contains the wildcard
    pub fn has_wildcard(&self) -> bool {
        self.contains(ACTION_ALL)
    }

    /// Whether the set is exactly `{*}`
    pub fn is_wildcard_only(&self) -> bool {
        self.0.len() == 1 && self.has_wildcard()
    }

    /// Whether every action of `other` is in this set
    pub fn is_superset(&self, other: &ActionSet) -> bool {
        self.0.is_superset(&other.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Owned copy of the actions in set order
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// Replace the wildcard by `wildcard_actions`
    ///
    /// Non-wildcard actions pass through unchanged; without a wildcard the
    /// result equals the input.
    pub fn substitute(&self, wildcard_actions: &ActionSet) -> ActionSet {
        if !self.has_wildcard() {
            return self.clone();
        }

        let mut substituted: BTreeSet<String> = self
            .0
            .iter()
            .filter(|action| action.as_str() != ACTION_ALL)
            .cloned()
            .collect();
        substituted.extend(wildcard_actions.0.iter().cloned());
        ActionSet(substituted)
    }
}

impl<S: Into<String>> FromIterator<S> for ActionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a ActionSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        write!(f, "{}", joined.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(actions: &[&str]) -> ActionSet {
        actions.iter().copied().collect()
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(ActionSet::parse("pull,push"), set(&["push", "pull"]));
        assert_eq!(ActionSet::parse("pull,pull"), set(&["pull"]));
        assert!(ActionSet::parse("").is_empty());
        assert_eq!(ActionSet::parse("pull,,push"), set(&["pull", "push"]));
    }

    #[test]
    fn test_substitute_wildcard() {
        let substituted = set(&["*"]).substitute(&ActionSet::all_actions());
        assert_eq!(substituted, set(&["pull", "push", "delete"]));
    }

    #[test]
    fn test_substitute_wildcard_and_pull() {
        let substituted = set(&["*", "pull"]).substitute(&ActionSet::all_actions());
        assert_eq!(substituted, set(&["pull", "push", "delete"]));
    }

    #[test]
    fn test_substitute_two_action_vocabulary() {
        let substituted = set(&["*"]).substitute(&set(&["pull", "push"]));
        assert_eq!(substituted, set(&["pull", "push"]));
    }

    #[test]
    fn test_substitute_without_wildcard_is_identity() {
        let requested = set(&["pull", "custom"]);
        assert_eq!(requested.substitute(&ActionSet::all_actions()), requested);
    }

    #[test]
    fn test_wildcard_only() {
        assert!(set(&["*"]).is_wildcard_only());
        assert!(!set(&["*", "pull"]).is_wildcard_only());
        assert!(!set(&["pull"]).is_wildcard_only());
    }

    #[test]
    fn test_display() {
        assert_eq!(set(&["push", "pull"]).to_string(), "pull,push");
        assert_eq!(ActionSet::new().to_string(), "");
    }
}
