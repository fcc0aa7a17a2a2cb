//! Compiled-operation abstraction.
//!
//! Parsing and compiling a query into a selection tree is the job of an
//! upstream compiler; this module is the narrow interface through which the
//! policy computation consumes its output. The tree is immutable once built
//! and is only ever read here.
//!
//! Polymorphic selections (a field whose declared type is an interface or
//! union) are handled through the [`TypeResolution`] seam: the resolver
//! enumerates the concrete runtime types a selection may produce and the
//! selection set realized against each one.

use crate::hint::CacheHint;
use std::collections::HashMap;

/// The always-safe type-name meta-field.
pub const TYPENAME_FIELD: &str = "__typename";

/// The kind of a compiled operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// A read-only query.
    Query,
    /// A write operation.
    Mutation,
    /// A long-lived streaming operation.
    Subscription,
}

/// The field a selection invokes: its name, declared return type, and the
/// cache-control directive the compiler attached to it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name as written in the schema.
    pub name: String,
    /// Name of the field's declared return type (unwrapped of list/non-null).
    pub type_name: String,
    /// Cache-control directive attached to the field definition.
    pub hint: Option<CacheHint>,
}

impl Field {
    /// Create a field with no attached directive.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            hint: None,
        }
    }

    /// Attach a cache-control directive to the field.
    pub fn with_hint(mut self, hint: CacheHint) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Whether this field queries schema metadata (`__`-prefixed).
    pub fn is_introspection(&self) -> bool {
        self.name.starts_with("__")
    }

    /// Whether this is the `__typename` meta-field.
    pub fn is_typename(&self) -> bool {
        self.name == TYPENAME_FIELD
    }
}

/// An ordered list of selections at one level of the tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    selections: Vec<Selection>,
}

impl SelectionSet {
    /// Create a selection set from its selections.
    pub fn new(selections: Vec<Selection>) -> Self {
        Self { selections }
    }

    /// Iterate the selections in compiled order.
    pub fn iter(&self) -> std::slice::Iter<'_, Selection> {
        self.selections.iter()
    }

    /// Number of selections at this level.
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    /// Whether this level selects nothing.
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

impl<'a> IntoIterator for &'a SelectionSet {
    type Item = &'a Selection;
    type IntoIter = std::slice::Iter<'a, Selection>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One node in the compiled query tree: a field invocation plus the nested
/// selection set present when the field's type is itself structured.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// The invoked field.
    pub field: Field,
    /// Nested selections, for structured return types.
    pub selection_set: Option<SelectionSet>,
}

impl Selection {
    /// A selection of a scalar-like field with no nested selections.
    pub fn leaf(field: Field) -> Self {
        Self {
            field,
            selection_set: None,
        }
    }

    /// A selection of a structured field with nested selections.
    pub fn composite(field: Field, selection_set: SelectionSet) -> Self {
        Self {
            field,
            selection_set: Some(selection_set),
        }
    }
}

/// A compiled operation as handed over by the query compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledOperation {
    /// The operation kind.
    pub kind: OperationKind,
    /// Operation name, when the query document declared one.
    pub name: Option<String>,
    /// Whether any part of the response is delivered incrementally
    /// (deferred or streamed).
    pub has_incremental_delivery: bool,
    /// The root selection set.
    pub root: SelectionSet,
}

impl CompiledOperation {
    /// A read-only query over the given root selections.
    pub fn query(root: SelectionSet) -> Self {
        Self {
            kind: OperationKind::Query,
            name: None,
            has_incremental_delivery: false,
            root,
        }
    }

    /// A mutation over the given root selections.
    pub fn mutation(root: SelectionSet) -> Self {
        Self {
            kind: OperationKind::Mutation,
            ..Self::query(root)
        }
    }

    /// A subscription over the given root selections.
    pub fn subscription(root: SelectionSet) -> Self {
        Self {
            kind: OperationKind::Subscription,
            ..Self::query(root)
        }
    }

    /// Set the operation name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark the operation as containing deferred or streamed parts.
    pub fn with_incremental_delivery(mut self) -> Self {
        self.has_incremental_delivery = true;
        self
    }
}

/// One concrete runtime type a polymorphic selection may produce, together
/// with the selection set realized against that type.
#[derive(Debug, Clone, Copy)]
pub struct RealizedSelection<'a> {
    /// Name of the concrete type.
    pub type_name: &'a str,
    /// The selections that apply when the field resolves to this type.
    pub selection_set: &'a SelectionSet,
}

/// The type-resolution collaborator.
///
/// Given a selection carrying a nested selection set, enumerate every
/// concrete type the selection may produce at runtime. The enumeration is
/// precomputed and side-effect free; a selection with zero resolvable
/// concrete types simply contributes nothing from that branch.
pub trait TypeResolution {
    /// Concrete types for `selection`, each with its realized selection set.
    fn realize<'a>(&'a self, selection: &'a Selection) -> Vec<RealizedSelection<'a>>;
}

/// Resolution for schemas without interface or union fields: every selection
/// produces exactly its declared type, realized as its own nested set.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonomorphicResolution;

impl TypeResolution for MonomorphicResolution {
    fn realize<'a>(&'a self, selection: &'a Selection) -> Vec<RealizedSelection<'a>> {
        match &selection.selection_set {
            Some(selection_set) => vec![RealizedSelection {
                type_name: &selection.field.type_name,
                selection_set,
            }],
            None => Vec::new(),
        }
    }
}

/// Static fan-out table for polymorphic selections.
///
/// Maps an abstract (interface/union) type name to the concrete types it may
/// produce and the selection set realized against each. Declared types with
/// no entry fall back to monomorphic behavior.
#[derive(Debug, Clone, Default)]
pub struct StaticTypeResolution {
    variants: HashMap<String, Vec<(String, SelectionSet)>>,
}

impl StaticTypeResolution {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the concrete variants of an abstract type (builder style).
    pub fn with_variants(
        mut self,
        abstract_type: impl Into<String>,
        variants: Vec<(String, SelectionSet)>,
    ) -> Self {
        self.variants.insert(abstract_type.into(), variants);
        self
    }
}

impl TypeResolution for StaticTypeResolution {
    fn realize<'a>(&'a self, selection: &'a Selection) -> Vec<RealizedSelection<'a>> {
        if let Some(variants) = self.variants.get(&selection.field.type_name) {
            return variants
                .iter()
                .map(|(type_name, selection_set)| RealizedSelection {
                    type_name,
                    selection_set,
                })
                .collect();
        }
        MonomorphicResolution.realize(selection)
    }
}
