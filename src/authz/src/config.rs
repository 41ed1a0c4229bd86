//! Policy configuration
//!
//! [`PolicyConfig`] is an immutable snapshot built once by the host and
//! shared by every decision. All loaders (environment, TOML document,
//! builder) run the same normalization: tokens are lower-cased, unknown
//! tokens are dropped with a warning, and empty required sets fall back to
//! their defaults.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::actions::{ActionSet, ACTION_DELETE, ACTION_PULL, ACTION_PUSH};
use crate::error::{Result, UnknownToken};
use crate::types::{ROLE_EDITOR, ROLE_USER};

/// Catalog audience key
pub const KEY_CATALOG_AUDIENCE: &str = "REGISTRY_CATALOG_AUDIENCE";

/// Namespace scope key
pub const KEY_NAMESPACE_SCOPE: &str = "REGISTRY_NAMESPACE_SCOPE";

/// Group prefix key
pub const KEY_GROUP_PREFIX: &str = "REGISTRY_GROUP_PREFIX";

/// Wildcard substitution key
pub const KEY_WILDCARD_ACTIONS: &str = "REGISTRY_WILDCARD_ACTIONS";

/// Write access rule key
pub const KEY_WRITE_ACCESS: &str = "REGISTRY_WRITE_ACCESS";

/// Default prefix marking namespace groups
pub const DEFAULT_GROUP_PREFIX: &str = "registry-";

/// Principal class allowed to read the registry catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogAudience {
    /// Any authenticated principal
    User,
    /// Principals holding the editor role
    Editor,
}

impl CatalogAudience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => ROLE_USER,
            Self::Editor => ROLE_EDITOR,
        }
    }
}

impl FromStr for CatalogAudience {
    type Err = UnknownToken;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "editor" => Ok(Self::Editor),
            other => Err(UnknownToken(other.to_string())),
        }
    }
}

impl fmt::Display for CatalogAudience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Namespace ownership strategy
///
/// Variants are declared in evaluation priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceStrategy {
    /// Namespace equals the lower-cased username
    Username,
    /// Namespace equals the email domain
    Domain,
    /// Namespace equals the email second-level domain
    Sld,
    /// Namespace equals a prefixed group name with the prefix stripped
    Group,
}

impl NamespaceStrategy {
    /// All strategies in evaluation priority order
    pub const PRIORITY: [NamespaceStrategy; 4] = [
        NamespaceStrategy::Username,
        NamespaceStrategy::Domain,
        NamespaceStrategy::Sld,
        NamespaceStrategy::Group,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Domain => "domain",
            Self::Sld => "sld",
            Self::Group => "group",
        }
    }
}

impl FromStr for NamespaceStrategy {
    type Err = UnknownToken;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "username" => Ok(Self::Username),
            "domain" => Ok(Self::Domain),
            "sld" => Ok(Self::Sld),
            "group" => Ok(Self::Group),
            other => Err(UnknownToken(other.to_string())),
        }
    }
}

impl fmt::Display for NamespaceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who receives push and delete inside an owned namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteAccess {
    /// Only principals holding the editor role
    Editor,
    /// Editors, and the owner of a namespace matched by exact username
    #[default]
    EditorOrOwner,
}

impl WriteAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::EditorOrOwner => "editor-or-owner",
        }
    }
}

impl FromStr for WriteAccess {
    type Err = UnknownToken;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "editor" => Ok(Self::Editor),
            "editor-or-owner" => Ok(Self::EditorOrOwner),
            other => Err(UnknownToken(other.to_string())),
        }
    }
}

/// Immutable policy snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyConfig {
    /// Principal classes allowed to read the catalog; empty means admins only
    catalog_audience: BTreeSet<CatalogAudience>,

    /// Enabled ownership strategies, never empty
    namespace_scope: BTreeSet<NamespaceStrategy>,

    /// Prefix marking namespace groups, lower-cased
    group_prefix: String,

    /// Substitution set for `*`
    wildcard_actions: ActionSet,

    /// Write access rule
    write_access: WriteAccess,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            catalog_audience: BTreeSet::new(),
            namespace_scope: default_namespace_scope(),
            group_prefix: DEFAULT_GROUP_PREFIX.to_string(),
            wildcard_actions: ActionSet::all_actions(),
            write_access: WriteAccess::default(),
        }
    }
}

fn default_namespace_scope() -> BTreeSet<NamespaceStrategy> {
    BTreeSet::from([NamespaceStrategy::Group])
}

impl PolicyConfig {
    /// Start building a configuration from defaults
    pub fn builder() -> PolicyConfigBuilder {
        PolicyConfigBuilder::default()
    }

    /// Load the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load the configuration from an arbitrary key lookup
    ///
    /// Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(value) = lookup(KEY_CATALOG_AUDIENCE) {
            builder = builder.catalog_audience(parse_tokens::<CatalogAudience>(KEY_CATALOG_AUDIENCE, &value));
        }
        if let Some(value) = lookup(KEY_NAMESPACE_SCOPE) {
            builder = builder.namespace_scope(parse_tokens::<NamespaceStrategy>(KEY_NAMESPACE_SCOPE, &value));
        }
        if let Some(value) = lookup(KEY_GROUP_PREFIX) {
            builder = builder.group_prefix(value);
        }
        if let Some(value) = lookup(KEY_WILDCARD_ACTIONS) {
            builder = builder.wildcard_actions(split_list(&value));
        }
        if let Some(write_access) = lookup(KEY_WRITE_ACCESS).and_then(|value| parse_write_access(&value)) {
            builder = builder.write_access(write_access);
        }

        builder.build()
    }

    /// Parse a TOML policy document
    ///
    /// ```
    /// use registry_authz::config::{NamespaceStrategy, PolicyConfig};
    ///
    /// let config = PolicyConfig::from_toml_str(r#"
    ///     catalog_audience = ["user"]
    ///     namespace_scope = ["username", "group"]
    ///     group_prefix = "docker-"
    /// "#).unwrap();
    ///
    /// assert!(config.namespace_scope().contains(&NamespaceStrategy::Username));
    /// assert_eq!(config.group_prefix(), "docker-");
    /// ```
    pub fn from_toml_str(document: &str) -> Result<Self> {
        let file: PolicyFile = toml::from_str(document)?;
        Ok(file.into_config())
    }

    /// Read and parse a TOML policy document
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path)?;
        debug!("Loading policy configuration from {}", path.display());
        Self::from_toml_str(&document)
    }

    pub fn catalog_audience(&self) -> &BTreeSet<CatalogAudience> {
        &self.catalog_audience
    }

    pub fn namespace_scope(&self) -> &BTreeSet<NamespaceStrategy> {
        &self.namespace_scope
    }

    pub fn group_prefix(&self) -> &str {
        &self.group_prefix
    }

    pub fn wildcard_actions(&self) -> &ActionSet {
        &self.wildcard_actions
    }

    pub fn write_access(&self) -> WriteAccess {
        self.write_access
    }

    /// Whether `strategy` is enabled
    pub fn uses(&self, strategy: NamespaceStrategy) -> bool {
        self.namespace_scope.contains(&strategy)
    }

    /// Whether `audience` may read the catalog
    pub fn allows_catalog(&self, audience: CatalogAudience) -> bool {
        self.catalog_audience.contains(&audience)
    }
}

/// Builder for [`PolicyConfig`]
///
/// `build()` enforces the snapshot invariants, so a builder can never
/// produce an empty namespace scope or a wildcard set without `pull`.
#[derive(Debug, Clone, Default)]
pub struct PolicyConfigBuilder {
    catalog_audience: Option<BTreeSet<CatalogAudience>>,
    namespace_scope: Option<BTreeSet<NamespaceStrategy>>,
    group_prefix: Option<String>,
    wildcard_actions: Option<Vec<String>>,
    write_access: Option<WriteAccess>,
}

impl PolicyConfigBuilder {
    pub fn catalog_audience(mut self, audience: impl IntoIterator<Item = CatalogAudience>) -> Self {
        self.catalog_audience = Some(audience.into_iter().collect());
        self
    }

    pub fn namespace_scope(mut self, scope: impl IntoIterator<Item = NamespaceStrategy>) -> Self {
        self.namespace_scope = Some(scope.into_iter().collect());
        self
    }

    pub fn group_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.group_prefix = Some(prefix.into());
        self
    }

    pub fn wildcard_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wildcard_actions = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    pub fn write_access(mut self, write_access: WriteAccess) -> Self {
        self.write_access = Some(write_access);
        self
    }

    /// Build the snapshot, substituting defaults for empty required sets
    pub fn build(self) -> PolicyConfig {
        let defaults = PolicyConfig::default();

        let namespace_scope = match self.namespace_scope {
            Some(scope) if scope.is_empty() => {
                warn!(
                    "Empty or unsupported values for ${}, resetting to default '{}'",
                    KEY_NAMESPACE_SCOPE,
                    NamespaceStrategy::Group
                );
                defaults.namespace_scope
            }
            Some(scope) => scope,
            None => defaults.namespace_scope,
        };

        let wildcard_actions = match self.wildcard_actions {
            Some(actions) => normalize_wildcard_actions(actions),
            None => defaults.wildcard_actions,
        };

        PolicyConfig {
            catalog_audience: self.catalog_audience.unwrap_or(defaults.catalog_audience),
            namespace_scope,
            group_prefix: self
                .group_prefix
                .map(|prefix| prefix.to_lowercase())
                .unwrap_or(defaults.group_prefix),
            wildcard_actions,
            write_access: self.write_access.unwrap_or(defaults.write_access),
        }
    }
}

/// Keep only vocabulary actions and ensure `pull` is present
fn normalize_wildcard_actions(actions: Vec<String>) -> ActionSet {
    let mut normalized = ActionSet::new();
    for action in actions {
        let action = action.trim().to_lowercase();
        if [ACTION_PULL, ACTION_PUSH, ACTION_DELETE].contains(&action.as_str()) {
            normalized.insert(action);
        } else if !action.is_empty() {
            warn!("Dropping unsupported action '{}' from ${}", action, KEY_WILDCARD_ACTIONS);
        }
    }

    if normalized.is_empty() {
        warn!(
            "Empty or unsupported values for ${}, resetting to default '{}'",
            KEY_WILDCARD_ACTIONS,
            ActionSet::all_actions()
        );
        return ActionSet::all_actions();
    }

    normalized.insert(ACTION_PULL);
    normalized
}

/// Split a comma-separated list, trimming and lower-casing each token
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Parse a comma-separated list of known tokens, dropping the rest
fn parse_tokens<T: FromStr<Err = UnknownToken>>(key: &str, value: &str) -> Vec<T> {
    split_list(value)
        .into_iter()
        .filter_map(|token| match token.parse() {
            Ok(parsed) => Some(parsed),
            Err(UnknownToken(unknown)) => {
                warn!("Dropping unsupported value '{}' from ${}", unknown, key);
                None
            }
        })
        .collect()
}

/// Parse the write access rule; unsupported values keep the default
fn parse_write_access(value: &str) -> Option<WriteAccess> {
    match value.trim().to_lowercase().parse::<WriteAccess>() {
        Ok(write_access) => Some(write_access),
        Err(UnknownToken(token)) => {
            warn!(
                "Unsupported value for ${}: '{}', keeping default '{}'",
                KEY_WRITE_ACCESS,
                token,
                WriteAccess::default().as_str()
            );
            None
        }
    }
}

/// TOML form of the policy
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PolicyFile {
    catalog_audience: Option<Vec<String>>,
    namespace_scope: Option<Vec<String>>,
    group_prefix: Option<String>,
    wildcard_actions: Option<Vec<String>>,
    write_access: Option<String>,
}

impl PolicyFile {
    fn into_config(self) -> PolicyConfig {
        let mut builder = PolicyConfig::builder();

        if let Some(audience) = self.catalog_audience {
            let joined = audience.join(",");
            builder = builder.catalog_audience(parse_tokens::<CatalogAudience>(KEY_CATALOG_AUDIENCE, &joined));
        }
        if let Some(scope) = self.namespace_scope {
            let joined = scope.join(",");
            builder = builder.namespace_scope(parse_tokens::<NamespaceStrategy>(KEY_NAMESPACE_SCOPE, &joined));
        }
        if let Some(prefix) = self.group_prefix {
            builder = builder.group_prefix(prefix);
        }
        if let Some(actions) = self.wildcard_actions {
            builder = builder.wildcard_actions(actions);
        }
        if let Some(write_access) = self.write_access.as_deref().and_then(parse_write_access) {
            builder = builder.write_access(write_access);
        }

        builder.build()
    }
}

/// Swappable holder of the current policy snapshot
///
/// Readers take an `Arc` to the current snapshot and keep evaluating against
/// it even if a newer one is installed meanwhile.
#[derive(Debug)]
pub struct PolicyHandle {
    current: RwLock<Arc<PolicyConfig>>,
}

impl PolicyHandle {
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// The current snapshot
    pub fn snapshot(&self) -> Arc<PolicyConfig> {
        Arc::clone(&self.current.read())
    }

    /// Install a new snapshot, returning the previous one
    pub fn replace(&self, config: PolicyConfig) -> Arc<PolicyConfig> {
        let next = Arc::new(config);
        let mut current = self.current.write();
        std::mem::replace(&mut *current, next)
    }
}

impl Default for PolicyHandle {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}
