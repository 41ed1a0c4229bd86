//! Scope type definitions and parsing
//!
//! Provides the registry `Scope` value parsed from the bearer-token
//! scope grammar `type:name:actions`.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::actions::ActionSet;
use crate::error::ScopeError;

/// Result type for scope operations
pub type ScopeResult<T> = Result<T, ScopeError>;

/// Name of the registry-level catalog resource
pub const NAME_CATALOG: &str = "catalog";

/// Resource type of a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeType {
    /// `registry` - registry-level resources such as the catalog
    #[serde(rename = "registry")]
    Registry,
    /// `repository` - an image repository
    #[serde(rename = "repository")]
    Repository,
    /// `repository(plugin)` - a plugin repository, handled like `repository`
    #[serde(rename = "repository(plugin)")]
    RepositoryPlugin,
}

impl ScopeType {
    /// Wire token of this type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registry => "registry",
            Self::Repository => "repository",
            Self::RepositoryPlugin => "repository(plugin)",
        }
    }

    /// Whether resources of this type live in namespaces
    pub fn is_repository(&self) -> bool {
        matches!(self, Self::Repository | Self::RepositoryPlugin)
    }
}

impl FromStr for ScopeType {
    type Err = ScopeError;

    fn from_str(s: &str) -> ScopeResult<Self> {
        match s {
            "registry" => Ok(Self::Registry),
            "repository" => Ok(Self::Repository),
            "repository(plugin)" => Ok(Self::RepositoryPlugin),
            other => Err(ScopeError::InvalidType(other.to_string())),
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single requested unit of access
///
/// # Examples
///
/// ```
/// use registry_authz::scope::{Scope, ScopeType};
///
/// let scope = Scope::parse("repository:team/image:pull,push").unwrap();
/// assert_eq!(scope.scope_type(), ScopeType::Repository);
/// assert_eq!(scope.name(), "team/image");
/// assert!(scope.actions().contains("push"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Scope {
    /// Scope string as received
    #[serde(skip)]
    raw: String,
    /// Resource type
    #[serde(rename = "type")]
    scope_type: ScopeType,
    /// Resource name, verbatim
    name: String,
    /// Requested actions
    actions: ActionSet,
}

impl Scope {
    /// Parse a raw scope string
    ///
    /// The string must contain exactly two `:` delimiters; names containing
    /// `:` are therefore rejected as malformed.
    pub fn parse(raw: &str) -> ScopeResult<Self> {
        let segments: Vec<&str> = raw.split(':').collect();
        let [scope_type, name, actions] = segments.as_slice() else {
            return Err(ScopeError::Malformed {
                scope: raw.to_string(),
            });
        };

        Ok(Self {
            raw: raw.to_string(),
            scope_type: scope_type.parse()?,
            name: (*name).to_string(),
            actions: ActionSet::parse(actions),
        })
    }

    /// Returns the raw scope string
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scope_type(&self) -> ScopeType {
        self.scope_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requested actions, wildcard not substituted
    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    /// Whether this is the `registry:catalog` scope
    pub fn is_catalog(&self) -> bool {
        self.scope_type == ScopeType::Registry && self.name == NAME_CATALOG
    }
}

impl FromStr for Scope {
    type Err = ScopeError;

    fn from_str(s: &str) -> ScopeResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Split a session's scope parameter into individual scope strings
///
/// A missing or blank parameter yields no scopes.
pub fn split_scopes(scope_param: Option<&str>) -> Vec<&str> {
    scope_param
        .map(|param| param.split_whitespace().collect())
        .unwrap_or_default()
}
