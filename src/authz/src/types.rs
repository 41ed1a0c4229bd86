//! Core authorization types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::Result;

/// Role granting unrestricted access to every scope
pub const ROLE_ADMIN: &str = "admin";

/// Elevated role granting push and delete inside owned namespaces
pub const ROLE_EDITOR: &str = "editor";

/// Implicit role of any authenticated principal
pub const ROLE_USER: &str = "user";

/// Requesting principal (registry client user)
///
/// A read-only snapshot of identity attributes taken once per request.
/// Role and group names are lower-cased on construction so every later
/// comparison is case-insensitive. Both sets are private and only filled
/// through the normalizing builders or deserialization:
///
/// ```compile_fail
/// use std::collections::BTreeSet;
/// use registry_authz::Principal;
///
/// let principal = Principal {
///     username: "john".to_string(),
///     email: None,
///     roles: BTreeSet::from(["Admin".to_string()]),
///     groups: BTreeSet::new(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "PrincipalRecord")]
pub struct Principal {
    /// Login name as supplied by the identity store
    pub username: String,

    /// Email address, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Client role names, lower-cased
    roles: BTreeSet<String>,

    /// Group names including flattened sub-groups, lower-cased
    groups: BTreeSet<String>,
}

/// Wire form of a principal before normalization
#[derive(Deserialize)]
struct PrincipalRecord {
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    groups: Vec<String>,
}

impl From<PrincipalRecord> for Principal {
    fn from(record: PrincipalRecord) -> Self {
        let mut principal = Principal::new(record.username)
            .with_roles(record.roles)
            .with_groups(record.groups);
        principal.email = record.email;
        principal
    }
}

impl Principal {
    /// Create a principal with no email, roles or groups
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    /// Set the email address
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Add a client role
    pub fn with_role(mut self, role: impl AsRef<str>) -> Self {
        self.roles.insert(role.as_ref().to_lowercase());
        self
    }

    /// Add several client roles
    pub fn with_roles<I, S>(self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        roles.into_iter().fold(self, |principal, role| principal.with_role(role))
    }

    /// Add a group membership
    pub fn with_group(mut self, group: impl AsRef<str>) -> Self {
        self.groups.insert(group.as_ref().to_lowercase());
        self
    }

    /// Add several group memberships
    pub fn with_groups<I, S>(self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        groups.into_iter().fold(self, |principal, group| principal.with_group(group))
    }

    /// Whether the principal holds `role` (case-insensitive)
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(&role.to_lowercase())
    }

    /// Client role names, lower-cased
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Group names, lower-cased
    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    pub fn is_editor(&self) -> bool {
        self.has_role(ROLE_EDITOR)
    }

    /// Email address, or the empty string
    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }

    /// Parse a JSON principal document
    pub fn from_json(document: &str) -> Result<Self> {
        Ok(serde_json::from_str(document)?)
    }

    /// Read and parse a JSON principal document
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let document = std::fs::read_to_string(path)?;
        Self::from_json(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_creation() {
        let principal = Principal::new("Johnny")
            .with_email("johnny@example.com")
            .with_role("Editor")
            .with_group("Registry-Team");

        assert_eq!(principal.username, "Johnny");
        assert_eq!(principal.email(), "johnny@example.com");
        assert!(principal.is_editor());
        assert!(principal.has_role("EDITOR"));
        assert!(!principal.is_admin());
        assert!(principal.groups().contains("registry-team"));
    }

    #[test]
    fn test_principal_without_email() {
        let principal = Principal::new("johnny");
        assert_eq!(principal.email(), "");
        assert!(principal.roles().is_empty());
    }

    #[test]
    fn test_principal_deserialization_normalizes_case() {
        let principal = Principal::from_json(
            r#"{"username": "johnny", "roles": ["Admin"], "groups": ["Registry-Ops", "registry-ops"]}"#,
        )
        .unwrap();

        assert!(principal.is_admin());
        assert_eq!(principal.groups().len(), 1);
        assert!(principal.email.is_none());
    }

    #[test]
    fn test_principal_document_errors() {
        assert!(matches!(
            Principal::from_json(r#"{"roles": ["admin"]}"#),
            Err(crate::error::ConfigError::Json(_))
        ));
        assert!(matches!(
            Principal::from_file("/nonexistent/principal.json"),
            Err(crate::error::ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_mixed_case_names_are_stored_lower_cased() {
        let built = Principal::new("john")
            .with_roles(["Admin", "EDITOR"])
            .with_groups(["Registry-Team"]);
        let parsed = Principal::from_json(
            r#"{"username": "john", "roles": ["Admin", "EDITOR"], "groups": ["Registry-Team"]}"#,
        )
        .unwrap();

        for principal in [built, parsed] {
            assert_eq!(
                principal.roles().iter().map(String::as_str).collect::<Vec<_>>(),
                vec!["admin", "editor"]
            );
            assert_eq!(
                principal.groups().iter().map(String::as_str).collect::<Vec<_>>(),
                vec!["registry-team"]
            );
        }
    }

    #[test]
    fn test_mixed_case_names_drive_decisions() {
        use crate::config::PolicyConfig;
        use crate::engine::evaluate_scope;

        let config = PolicyConfig::default();

        let admin = Principal::new("john").with_role("Admin");
        assert!(evaluate_scope(&admin, "registry:other:pull", &config).granted);

        let member = Principal::new("john").with_group("Registry-Team");
        let decision = evaluate_scope(&member, "repository:team/app:pull", &config);
        assert!(decision.granted);
        assert_eq!(decision.effective_actions.to_vec(), vec!["pull"]);
    }
}
