//! Operation gatekeeping and the constraint-folding traversal.
//!
//! The gatekeeper decides whether a caching policy should be computed at
//! all; the folder then walks the whole selection tree once, extracting
//! directive-declared constraints from each field and, where the field left
//! dimensions open, from the field's declared return type, and tightens the
//! running [`CachePolicy`].
//!
//! # Example
//!
//! ```rust
//! use graphql_cache_policy::{
//!     CacheHint, CompiledOperation, Field, MonomorphicResolution, PolicyFolder, SchemaHints,
//!     Selection, SelectionSet,
//! };
//!
//! let operation = CompiledOperation::query(SelectionSet::new(vec![Selection::leaf(
//!     Field::new("latestReading", "Reading").with_hint(CacheHint::new().with_max_age(60)),
//! )]));
//!
//! let hints = SchemaHints::new();
//! let folder = PolicyFolder::new(&hints, &MonomorphicResolution);
//! let policy = folder.fold(&operation);
//! assert_eq!(policy.max_age, Some(60));
//! ```

use crate::hint::SchemaHints;
use crate::operation::{CompiledOperation, OperationKind, Selection, TypeResolution};
use crate::policy::{CachePolicy, OverrideFlags};

/// Decide whether a caching policy should be computed for an operation.
///
/// Pure predicate with no side effects. Returns `false` for operations that
/// cannot be cached as a single artifact: anything that is not a read-only
/// query, operations with deferred or streamed parts, and operations whose
/// root selections query schema metadata (any introspection field other
/// than `__typename`).
pub fn should_compute_policy(operation: &CompiledOperation) -> bool {
    if operation.kind != OperationKind::Query {
        tracing::debug!(kind = ?operation.kind, "Skipping cache policy: not a read-only query");
        return false;
    }

    if operation.has_incremental_delivery {
        tracing::debug!("Skipping cache policy: operation has incremental parts");
        return false;
    }

    if let Some(selection) = operation
        .root
        .iter()
        .find(|selection| selection.field.is_introspection() && !selection.field.is_typename())
    {
        tracing::debug!(
            field = %selection.field.name,
            "Skipping cache policy: operation queries schema metadata"
        );
        return false;
    }

    true
}

/// The recursive constraint folder.
///
/// Borrows the type-level hint registry and the type-resolution collaborator
/// for the duration of one computation. The traversal is synchronous,
/// performs no I/O, and completes in time proportional to the number of
/// selection nodes times the concrete-type fan-out per polymorphic node.
pub struct PolicyFolder<'a> {
    hints: &'a SchemaHints,
    resolver: &'a dyn TypeResolution,
    default_max_age: Option<u32>,
}

impl<'a> PolicyFolder<'a> {
    /// Create a folder over the given registry and resolver.
    pub fn new(hints: &'a SchemaHints, resolver: &'a dyn TypeResolution) -> Self {
        Self {
            hints,
            resolver,
            default_max_age: None,
        }
    }

    /// Fold a default freshness window into every root or structured field
    /// that declares no `maxAge` of its own.
    pub fn with_default_max_age(mut self, seconds: u32) -> Self {
        self.default_max_age = Some(seconds);
        self
    }

    /// Visit every selection reachable from the operation's root and return
    /// the finished policy.
    pub fn fold(&self, operation: &CompiledOperation) -> CachePolicy {
        let mut policy = CachePolicy::new();
        for selection in &operation.root {
            self.visit(selection, true, &mut policy);
        }

        tracing::debug!(
            max_age = ?policy.max_age,
            shared_max_age = ?policy.shared_max_age,
            scope = ?policy.scope,
            vary = policy.vary.len(),
            "Folded cache constraints"
        );

        policy
    }

    fn visit(&self, selection: &Selection, is_root: bool, policy: &mut CachePolicy) {
        // Override flags start fresh on every node and never propagate.
        let mut flags = OverrideFlags::default();

        if let Some(hint) = &selection.field.hint {
            policy.restrict(hint, &mut flags);
        }

        // The declared return type is consulted once, and only for the
        // dimensions the field's own directive left open.
        if !flags.all_set() {
            if let Some(type_hint) = self.hints.for_type(&selection.field.type_name) {
                policy.restrict(type_hint, &mut flags);
            }
        }

        if let Some(default) = self.default_max_age {
            if !flags.max_age && (is_root || selection.selection_set.is_some()) {
                policy.restrict_max_age(default);
            }
        }

        if selection.selection_set.is_some() {
            for realized in self.resolver.realize(selection) {
                for child in realized.selection_set {
                    self.visit(child, false, policy);
                }
            }
        }
    }
}
