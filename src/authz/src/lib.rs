//! # Registry Authorization Engine
//!
//! Decides which operations a principal is granted on container-registry
//! bearer-token scopes.
//!
//! ## Features
//!
//! - **Scope parsing** of `type:name:actions` strings
//! - **Namespace ownership** by username, email domain, email second-level
//!   domain or prefixed group membership
//! - **Role-based filtering** of `pull`, `push` and `delete`
//! - **Administrator bypass** and catalog audience rules
//! - **Immutable policy snapshots** with atomic replacement
//!
//! ## Example
//!
//! ```rust
//! use registry_authz::{evaluate, granted_access, PolicyConfig, Principal};
//!
//! let config = PolicyConfig::default();
//! let principal = Principal::new("john").with_group("registry-team");
//!
//! let decisions = evaluate(&principal, &["repository:team/app:pull,push"], &config);
//! assert!(decisions[0].granted);
//! assert_eq!(decisions[0].effective_actions.to_vec(), vec!["pull"]);
//!
//! let access = granted_access(&decisions);
//! assert_eq!(access[0].name, "team/app");
//! ```

pub mod access;
pub mod actions;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod namespace;
pub mod scope;
pub mod types;

// Re-export commonly used types
pub use access::{granted_access, AccessEntry};
pub use actions::ActionSet;
pub use config::{CatalogAudience, NamespaceStrategy, PolicyConfig, PolicyHandle, WriteAccess};
pub use engine::{evaluate, evaluate_scope, evaluate_session, AccessDecision, DecisionEngine, DecisionReason};
pub use error::{ConfigError, Result, ScopeError, UnknownToken};
pub use namespace::Ownership;
pub use scope::{Scope, ScopeType};
pub use types::Principal;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
