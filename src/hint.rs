//! Cache-control directive metadata.
//!
//! Fields, and the types fields return, declare caching intent through a
//! `@cacheControl` directive. This module models one directive instance
//! ([`CacheHint`]), validated construction from raw directive arguments,
//! and the type-level lookup registry ([`SchemaHints`]).
//!
//! # Example
//!
//! ```rust
//! use graphql_cache_policy::{CacheHint, CacheScope, SchemaHints};
//!
//! let hints = SchemaHints::new()
//!     .with_type("User", CacheHint::new().with_max_age(30).with_scope(CacheScope::Private))
//!     .with_type("Category", CacheHint::new().with_max_age(86_400));
//!
//! assert_eq!(hints.for_type("User").unwrap().max_age, Some(30));
//! assert!(hints.for_type("Order").is_none());
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Visibility classification governing which caches may store a response.
///
/// `Public` is the default; `Private` strictly dominates when folding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheScope {
    /// Any cache, shared or private, may store the response.
    #[default]
    Public,
    /// Only caches private to a single user may store the response.
    Private,
}

impl CacheScope {
    /// Whether this scope is strictly more restrictive than `other`.
    pub fn is_more_restrictive_than(self, other: CacheScope) -> bool {
        self == CacheScope::Private && other == CacheScope::Public
    }
}

impl FromStr for CacheScope {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "PUBLIC" => Ok(CacheScope::Public),
            "PRIVATE" => Ok(CacheScope::Private),
            _ => Err(Error::UnknownScope(value.to_string())),
        }
    }
}

/// One `@cacheControl` directive instance, attached to a field or a type.
///
/// All attributes are optional; an attribute left unset contributes no
/// constraint for its dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheHint {
    /// Freshness window in seconds for private/default caches.
    pub max_age: Option<u32>,

    /// Freshness window in seconds for shared caches, independent of `max_age`.
    pub shared_max_age: Option<u32>,

    /// Do not set a local freshness value; let an ancestor's value stand.
    /// Distinct from simply omitting `max_age`.
    pub inherit_max_age: bool,

    /// Visibility scope.
    pub scope: Option<CacheScope>,

    /// Request-attribute names (e.g. header names) that partition cached
    /// responses for this subtree. Empty means no vary constraint.
    pub vary: Vec<String>,
}

impl CacheHint {
    /// Create an empty hint that contributes no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the private-cache freshness window in seconds.
    pub fn with_max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Set the shared-cache freshness window in seconds.
    pub fn with_shared_max_age(mut self, seconds: u32) -> Self {
        self.shared_max_age = Some(seconds);
        self
    }

    /// Mark the freshness dimensions as inherited from an ancestor.
    pub fn with_inherit_max_age(mut self) -> Self {
        self.inherit_max_age = true;
        self
    }

    /// Set the visibility scope.
    pub fn with_scope(mut self, scope: CacheScope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Add vary attributes.
    pub fn with_vary<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vary.extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Whether this hint contributes nothing at all.
    pub fn is_empty(&self) -> bool {
        self.max_age.is_none()
            && self.shared_max_age.is_none()
            && !self.inherit_max_age
            && self.scope.is_none()
            && self.vary.is_empty()
    }

    /// Build a validated hint from raw directive arguments.
    ///
    /// This is the compilation-stage boundary: malformed values (negative or
    /// fractional durations, unknown scopes, non-string vary entries) are
    /// rejected here so the folding path never has to re-validate. Unknown
    /// argument names are ignored; directive shape validation belongs to the
    /// schema layer.
    pub fn from_args(args: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let mut hint = CacheHint::new();

        if let Some(value) = args.get("maxAge") {
            hint.max_age = Some(parse_seconds("maxAge", value)?);
        }

        if let Some(value) = args.get("sharedMaxAge") {
            hint.shared_max_age = Some(parse_seconds("sharedMaxAge", value)?);
        }

        if let Some(value) = args.get("inheritMaxAge") {
            hint.inherit_max_age = value.as_bool().ok_or_else(|| Error::InvalidDirective {
                argument: "inheritMaxAge",
                reason: format!("expected a boolean, got {value}"),
            })?;
        }

        if let Some(value) = args.get("scope") {
            let raw = value.as_str().ok_or_else(|| Error::InvalidDirective {
                argument: "scope",
                reason: format!("expected an enum value, got {value}"),
            })?;
            hint.scope = Some(raw.parse()?);
        }

        if let Some(value) = args.get("vary") {
            let entries = value.as_array().ok_or_else(|| Error::InvalidDirective {
                argument: "vary",
                reason: format!("expected a list of strings, got {value}"),
            })?;
            for entry in entries {
                let name = entry.as_str().ok_or_else(|| Error::InvalidDirective {
                    argument: "vary",
                    reason: format!("expected a string entry, got {entry}"),
                })?;
                hint.vary.push(name.to_string());
            }
        }

        Ok(hint)
    }
}

fn parse_seconds(argument: &'static str, value: &serde_json::Value) -> Result<u32> {
    let seconds = value.as_u64().ok_or_else(|| Error::InvalidDirective {
        argument,
        reason: format!("must be a non-negative integer, got {value}"),
    })?;
    u32::try_from(seconds).map_err(|_| Error::InvalidDirective {
        argument,
        reason: format!("{seconds} seconds exceeds the supported maximum"),
    })
}

/// Type-level directive lookup: declared type name to directive instance.
///
/// Field-level hints travel on the compiled selection tree itself; type-level
/// hints are registered here once per schema and consulted during folding for
/// dimensions the field did not set.
#[derive(Debug, Clone, Default)]
pub struct SchemaHints {
    types: HashMap<String, CacheHint>,
}

impl SchemaHints {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the hint carried by a type (builder style).
    pub fn with_type(mut self, type_name: impl Into<String>, hint: CacheHint) -> Self {
        self.insert(type_name, hint);
        self
    }

    /// Register the hint carried by a type.
    pub fn insert(&mut self, type_name: impl Into<String>, hint: CacheHint) {
        self.types.insert(type_name.into(), hint);
    }

    /// Look up the first matching cache-control directive for a type.
    pub fn for_type(&self, type_name: &str) -> Option<&CacheHint> {
        self.types.get(type_name)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
