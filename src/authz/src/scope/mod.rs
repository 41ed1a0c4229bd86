//! Registry scope parsing module
//!
//! Parses bearer-token scope strings of the form `type:name:actions`
//! into structured [`Scope`] values.
//!
//! # Examples
//!
//! ```
//! use registry_authz::scope::{split_scopes, Scope};
//!
//! let raw = split_scopes(Some("registry:catalog:* repository:team/app:pull"));
//! assert_eq!(raw.len(), 2);
//!
//! let scope = Scope::parse(raw[1]).unwrap();
//! assert_eq!(scope.name(), "team/app");
//! ```

mod types;


pub use types::{split_scopes, Scope, ScopeResult, ScopeType, NAME_CATALOG};
pub use crate::error::ScopeError;
