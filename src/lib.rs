//! # graphql-cache-policy
//!
//! Response cache-policy computation for GraphQL query execution.
//!
//! Fields, and the types fields return, declare cache metadata through a
//! `@cacheControl` directive: a freshness window for private caches, a
//! separate window for shared caches, a visibility scope, and a set of
//! request attributes that must partition cached responses. Before a query
//! executes, this crate walks the compiled selection tree once and folds
//! every applicable directive into one effective policy for the whole
//! response: the tightest freshness window, the most restrictive scope, and
//! the union of vary attributes.
//!
//! ## Main Components
//!
//! - [`CacheControlPlugin`]: the per-deployment entry point wiring the
//!   pieces together for one request.
//! - [`PolicyFolder`]: the recursive constraint folder over the selection
//!   tree, with [`should_compute_policy`] gatekeeping which operations get
//!   a policy at all.
//! - [`CachePolicy`]: the accumulator with its monotonic tightening rules.
//! - [`PolicyArtifacts`]: the published cache-control descriptor and vary
//!   list, storable into an execution context or applied as HTTP headers.
//! - [`SchemaHints`] / [`CacheHint`]: type-level directive registry and the
//!   directive model itself.
//! - [`TypeResolution`]: the seam through which polymorphic selections fan
//!   out into concrete types.
//!
//! ## Example
//!
//! ```rust
//! use graphql_cache_policy::{
//!     CacheControlPlugin, CacheHint, CacheScope, CompiledOperation, Field,
//!     MonomorphicResolution, SchemaHints, Selection, SelectionSet,
//! };
//!
//! // The compiler collaborator hands over an immutable selection tree.
//! let operation = CompiledOperation::query(SelectionSet::new(vec![
//!     Selection::leaf(
//!         Field::new("topStories", "Story").with_hint(CacheHint::new().with_max_age(60)),
//!     ),
//!     Selection::composite(
//!         Field::new("me", "User"),
//!         SelectionSet::new(vec![Selection::leaf(Field::new("name", "String"))]),
//!     ),
//! ]));
//!
//! // Type-level hints come from the schema.
//! let plugin = CacheControlPlugin::new(SchemaHints::new().with_type(
//!     "User",
//!     CacheHint::new().with_max_age(30).with_scope(CacheScope::Private),
//! ));
//!
//! let artifacts = plugin
//!     .process(&operation, &MonomorphicResolution)
//!     .expect("cacheable query");
//! assert_eq!(
//!     artifacts.cache_control.unwrap().header_value(),
//!     "private, max-age=30"
//! );
//! ```

pub mod emitter;
pub mod error;
pub mod folder;
pub mod hint;
pub mod operation;
pub mod plugin;
pub mod policy;

pub use emitter::{
    emit, CacheControlDescriptor, PolicyArtifacts, CACHE_CONTROL_EXTENSION, VARY_EXTENSION,
};
pub use error::{Error, Result};
pub use folder::{should_compute_policy, PolicyFolder};
pub use hint::{CacheHint, CacheScope, SchemaHints};
pub use operation::{
    CompiledOperation, Field, MonomorphicResolution, OperationKind, RealizedSelection, Selection,
    SelectionSet, StaticTypeResolution, TypeResolution, TYPENAME_FIELD,
};
pub use plugin::{CacheControlOptions, CacheControlPlugin};
pub use policy::{CachePolicy, OverrideFlags};
