//! Request-scoped orchestration of the policy computation.
//!
//! [`CacheControlPlugin`] wires the three pieces together for one query
//! execution: the gatekeeper decides whether to compute at all, the folder
//! walks the selection tree once, and the emitter publishes the finished
//! artifacts. The plugin holds per-deployment state (options and the
//! type-level hint registry) and is cheap to share across requests; each
//! call allocates its own accumulator, so concurrent requests need no
//! coordination.

use crate::emitter::{emit, PolicyArtifacts};
use crate::error::Result;
use crate::folder::{should_compute_policy, PolicyFolder};
use crate::hint::SchemaHints;
use crate::operation::{CompiledOperation, TypeResolution};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Options controlling cache-policy computation.
///
/// # Example
///
/// ```rust
/// use graphql_cache_policy::CacheControlOptions;
///
/// let options = CacheControlOptions {
///     default_max_age: Some(300), // uncovered fields cap freshness at 5 minutes
///     emit_http_headers: true,
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheControlOptions {
    /// Freshness window in seconds folded in for root and structured fields
    /// that declare no `maxAge` of their own. `None` disables the default,
    /// leaving undeclared fields without a contribution.
    pub default_max_age: Option<u32>,

    /// Whether [`CacheControlPlugin::publish`] also writes the computed
    /// artifacts as HTTP response headers.
    pub emit_http_headers: bool,
}

impl Default for CacheControlOptions {
    fn default() -> Self {
        Self {
            default_max_age: None,
            emit_http_headers: true,
        }
    }
}

/// Computes the response caching policy for one query execution.
///
/// # Example
///
/// ```rust
/// use graphql_cache_policy::{
///     CacheControlPlugin, CacheHint, CompiledOperation, Field, MonomorphicResolution,
///     SchemaHints, Selection, SelectionSet,
/// };
///
/// let plugin = CacheControlPlugin::new(
///     SchemaHints::new().with_type("Reading", CacheHint::new().with_max_age(60)),
/// );
///
/// let operation = CompiledOperation::query(SelectionSet::new(vec![Selection::composite(
///     Field::new("latestReading", "Reading"),
///     SelectionSet::new(vec![Selection::leaf(Field::new("value", "Float"))]),
/// )]));
///
/// let artifacts = plugin
///     .process(&operation, &MonomorphicResolution)
///     .expect("query is cacheable");
/// assert_eq!(artifacts.cache_control.unwrap().header_value(), "max-age=60");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CacheControlPlugin {
    options: CacheControlOptions,
    hints: SchemaHints,
}

impl CacheControlPlugin {
    /// Create a plugin over the schema's type-level hint registry.
    pub fn new(hints: SchemaHints) -> Self {
        Self {
            options: CacheControlOptions::default(),
            hints,
        }
    }

    /// Replace the options (builder style).
    pub fn with_options(mut self, options: CacheControlOptions) -> Self {
        self.options = options;
        self
    }

    /// The active options.
    pub fn options(&self) -> &CacheControlOptions {
        &self.options
    }

    /// Run gatekeeper, folder, and emitter for one compiled operation.
    ///
    /// Returns `None` when the gatekeeper skips the operation or when no
    /// caching constraints were declared anywhere in the tree; the caller
    /// then applies its own default (typically: do not cache).
    pub fn process(
        &self,
        operation: &CompiledOperation,
        resolver: &dyn TypeResolution,
    ) -> Option<PolicyArtifacts> {
        if !should_compute_policy(operation) {
            return None;
        }

        let mut folder = PolicyFolder::new(&self.hints, resolver);
        if let Some(seconds) = self.options.default_max_age {
            folder = folder.with_default_max_age(seconds);
        }

        let policy = folder.fold(operation);
        let artifacts = emit(&policy);
        if artifacts.is_empty() {
            None
        } else {
            Some(artifacts)
        }
    }

    /// Publish computed artifacts: store them keyed into the execution
    /// context's extension map and, when
    /// [`emit_http_headers`](CacheControlOptions::emit_http_headers) is set,
    /// write the corresponding response headers.
    pub fn publish(
        &self,
        artifacts: &PolicyArtifacts,
        extensions: &mut HashMap<String, serde_json::Value>,
        headers: &mut HeaderMap,
    ) -> Result<()> {
        artifacts.store(extensions)?;
        if self.options.emit_http_headers {
            artifacts.apply_headers(headers);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::{CACHE_CONTROL_EXTENSION, VARY_EXTENSION};
    use crate::hint::{CacheHint, CacheScope};
    use crate::operation::{Field, MonomorphicResolution, Selection, SelectionSet};
    use axum::http::header;

    fn single_field_query(hint: Option<CacheHint>) -> CompiledOperation {
        let mut field = Field::new("reading", "Reading");
        if let Some(hint) = hint {
            field = field.with_hint(hint);
        }
        CompiledOperation::query(SelectionSet::new(vec![Selection::leaf(field)]))
    }

    #[test]
    fn test_process_publishes_artifacts() {
        let plugin = CacheControlPlugin::new(SchemaHints::new());
        let operation = single_field_query(Some(
            CacheHint::new().with_max_age(60).with_vary(["X-User-Id"]),
        ));

        let artifacts = plugin
            .process(&operation, &MonomorphicResolution)
            .expect("cacheable");
        assert_eq!(artifacts.cache_control.unwrap().max_age, Some(60));
        assert_eq!(artifacts.vary.as_deref(), Some("x-user-id"));
    }

    #[test]
    fn test_process_returns_none_without_constraints() {
        let plugin = CacheControlPlugin::new(SchemaHints::new());
        let operation = single_field_query(None);

        assert!(plugin.process(&operation, &MonomorphicResolution).is_none());
    }

    #[test]
    fn test_process_returns_none_for_gatekept_operations() {
        let plugin = CacheControlPlugin::new(
            SchemaHints::new().with_type("Reading", CacheHint::new().with_max_age(60)),
        );

        let mutation = CompiledOperation::mutation(SelectionSet::new(vec![Selection::leaf(
            Field::new("reading", "Reading"),
        )]));
        assert!(plugin.process(&mutation, &MonomorphicResolution).is_none());

        let introspection = CompiledOperation::query(SelectionSet::new(vec![Selection::leaf(
            Field::new("__schema", "__Schema"),
        )]));
        assert!(plugin
            .process(&introspection, &MonomorphicResolution)
            .is_none());
    }

    #[test]
    fn test_process_applies_default_max_age() {
        let plugin = CacheControlPlugin::new(SchemaHints::new()).with_options(
            CacheControlOptions {
                default_max_age: Some(120),
                emit_http_headers: true,
            },
        );

        let operation = single_field_query(None);
        let artifacts = plugin
            .process(&operation, &MonomorphicResolution)
            .expect("default window applies to the root field");
        assert_eq!(artifacts.cache_control.unwrap().max_age, Some(120));
    }

    #[test]
    fn test_publish_stores_and_sets_headers() {
        let plugin = CacheControlPlugin::new(SchemaHints::new());
        let operation = single_field_query(Some(
            CacheHint::new()
                .with_max_age(30)
                .with_scope(CacheScope::Private)
                .with_vary(["x-user-id"]),
        ));

        let artifacts = plugin
            .process(&operation, &MonomorphicResolution)
            .expect("cacheable");

        let mut extensions = HashMap::new();
        let mut headers = HeaderMap::new();
        plugin
            .publish(&artifacts, &mut extensions, &mut headers)
            .unwrap();

        assert!(extensions.contains_key(CACHE_CONTROL_EXTENSION));
        assert!(extensions.contains_key(VARY_EXTENSION));
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            "private, max-age=30"
        );
        assert_eq!(headers.get(header::VARY).unwrap(), "x-user-id");
    }

    #[test]
    fn test_publish_respects_header_toggle() {
        let plugin = CacheControlPlugin::new(SchemaHints::new()).with_options(
            CacheControlOptions {
                default_max_age: None,
                emit_http_headers: false,
            },
        );

        let operation = single_field_query(Some(CacheHint::new().with_max_age(30)));
        let artifacts = plugin
            .process(&operation, &MonomorphicResolution)
            .expect("cacheable");

        let mut extensions = HashMap::new();
        let mut headers = HeaderMap::new();
        plugin
            .publish(&artifacts, &mut extensions, &mut headers)
            .unwrap();

        assert!(extensions.contains_key(CACHE_CONTROL_EXTENSION));
        assert!(headers.is_empty());
    }

    #[test]
    fn test_options_default() {
        let options = CacheControlOptions::default();
        assert_eq!(options.default_max_age, None);
        assert!(options.emit_http_headers);
    }

    #[test]
    fn test_options_serde() {
        let options = CacheControlOptions {
            default_max_age: Some(300),
            emit_http_headers: false,
        };

        let json = serde_json::to_string(&options).unwrap();
        let back: CacheControlOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.default_max_age, Some(300));
        assert!(!back.emit_http_headers);
    }
}
