//! The effective cache policy and its tightening rules.
//!
//! One [`CachePolicy`] accumulator is created per computation, mutated during
//! a single traversal of the selection tree, and handed to the emitter at the
//! end. Every merge operation only ever tightens: freshness windows take the
//! minimum, scope can only move toward `Private`, and the vary set only
//! grows. All merges are commutative and idempotent, so traversal order
//! cannot change the final policy.

use crate::hint::{CacheHint, CacheScope};
use std::collections::BTreeSet;

/// Per-node override state.
///
/// Once a field's own directive has supplied (or explicitly inherited) a
/// dimension, the type-level directive is not consulted for that dimension
/// on the same node. Constructed fresh for every visited selection; never
/// propagates across nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideFlags {
    /// The `maxAge` dimension was set or frozen on this node.
    pub max_age: bool,
    /// The `sharedMaxAge` dimension was set or frozen on this node.
    pub shared_max_age: bool,
    /// The scope dimension was tightened on this node.
    pub scope: bool,
    /// Vary attributes were contributed on this node.
    pub vary: bool,
}

impl OverrideFlags {
    /// Whether every dimension has been settled for this node.
    pub fn all_set(&self) -> bool {
        self.max_age && self.shared_max_age && self.scope && self.vary
    }
}

/// The running policy for one computation.
///
/// Invariants, maintained by [`restrict`](CachePolicy::restrict): `max_age`
/// and `shared_max_age` each hold the minimum of all contributing values
/// seen so far, `scope` holds the most restrictive value seen so far, and
/// `vary` holds the lower-cased, deduplicated union of all contributing
/// vary sets in canonical sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// Tightest freshness window (seconds) for private/default caches.
    pub max_age: Option<u32>,
    /// Tightest freshness window (seconds) for shared caches.
    pub shared_max_age: Option<u32>,
    /// Most restrictive visibility seen so far.
    pub scope: CacheScope,
    /// Union of all vary attributes, lower-cased and sorted.
    pub vary: BTreeSet<String>,
}

impl CachePolicy {
    /// Create an unconstrained policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one directive instance into the policy.
    ///
    /// Per dimension: a present `max_age` overwrites only when the node's
    /// flag is unset and the value is strictly tighter than (or the first
    /// contribution to) the accumulator; otherwise `inherit_max_age` freezes
    /// the dimension so a looser source later in the same node cannot
    /// override it. The identical rule applies independently to
    /// `shared_max_age`. Scope applies when present and strictly more
    /// restrictive. A non-empty vary list merges into the union.
    pub fn restrict(&mut self, hint: &CacheHint, flags: &mut OverrideFlags) {
        if let Some(seconds) = hint.max_age {
            if !flags.max_age && self.max_age.is_none_or(|current| seconds < current) {
                self.max_age = Some(seconds);
                flags.max_age = true;
            } else if hint.inherit_max_age {
                flags.max_age = true;
            }
        } else if hint.inherit_max_age {
            flags.max_age = true;
        }

        if let Some(seconds) = hint.shared_max_age {
            if !flags.shared_max_age && self.shared_max_age.is_none_or(|current| seconds < current)
            {
                self.shared_max_age = Some(seconds);
                flags.shared_max_age = true;
            } else if hint.inherit_max_age {
                flags.shared_max_age = true;
            }
        } else if hint.inherit_max_age {
            flags.shared_max_age = true;
        }

        if !flags.scope {
            if let Some(scope) = hint.scope {
                if scope.is_more_restrictive_than(self.scope) {
                    self.scope = scope;
                    flags.scope = true;
                }
            }
        }

        if !flags.vary && !hint.vary.is_empty() {
            for attribute in &hint.vary {
                self.vary.insert(attribute.to_lowercase());
            }
            flags.vary = true;
        }
    }

    /// Min-fold a bare freshness window into `max_age`, outside the
    /// per-node override rules. Used for the configured default window.
    pub fn restrict_max_age(&mut self, seconds: u32) {
        if self.max_age.is_none_or(|current| seconds < current) {
            self.max_age = Some(seconds);
        }
    }

    /// Whether any constraint has been contributed at all.
    pub fn has_constraints(&self) -> bool {
        self.max_age.is_some()
            || self.shared_max_age.is_some()
            || self.scope == CacheScope::Private
            || !self.vary.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_policy_is_unconstrained() {
        let policy = CachePolicy::new();
        assert_eq!(policy.max_age, None);
        assert_eq!(policy.shared_max_age, None);
        assert_eq!(policy.scope, CacheScope::Public);
        assert!(policy.vary.is_empty());
        assert!(!policy.has_constraints());
    }

    #[test]
    fn test_max_age_takes_minimum() {
        let mut policy = CachePolicy::new();

        let mut flags = OverrideFlags::default();
        policy.restrict(&CacheHint::new().with_max_age(60), &mut flags);
        assert_eq!(policy.max_age, Some(60));
        assert!(flags.max_age);

        // A looser value from a later node does not widen the window.
        let mut flags = OverrideFlags::default();
        policy.restrict(&CacheHint::new().with_max_age(120), &mut flags);
        assert_eq!(policy.max_age, Some(60));
        assert!(!flags.max_age);

        let mut flags = OverrideFlags::default();
        policy.restrict(&CacheHint::new().with_max_age(30), &mut flags);
        assert_eq!(policy.max_age, Some(30));
    }

    #[test]
    fn test_shared_max_age_independent_of_max_age() {
        let mut policy = CachePolicy::new();
        let mut flags = OverrideFlags::default();
        policy.restrict(&CacheHint::new().with_shared_max_age(300), &mut flags);

        assert_eq!(policy.max_age, None);
        assert_eq!(policy.shared_max_age, Some(300));
        assert!(flags.shared_max_age);
        assert!(!flags.max_age);

        let mut flags = OverrideFlags::default();
        policy.restrict(&CacheHint::new().with_max_age(60), &mut flags);
        assert_eq!(policy.max_age, Some(60));
        assert_eq!(policy.shared_max_age, Some(300));
    }

    #[test]
    fn test_zero_max_age_is_a_valid_tightest_window() {
        let mut policy = CachePolicy::new();
        let mut flags = OverrideFlags::default();
        policy.restrict(&CacheHint::new().with_max_age(0), &mut flags);
        assert_eq!(policy.max_age, Some(0));
        assert!(policy.has_constraints());
    }

    #[test]
    fn test_flag_blocks_second_source_on_same_node() {
        let mut policy = CachePolicy::new();
        let mut flags = OverrideFlags::default();

        // Field-level directive wins the node.
        policy.restrict(&CacheHint::new().with_max_age(60), &mut flags);
        // Type-level directive on the same node must not alter the result,
        // even though it is numerically smaller.
        policy.restrict(&CacheHint::new().with_max_age(10), &mut flags);

        assert_eq!(policy.max_age, Some(60));
    }

    #[test]
    fn test_inherit_freezes_current_value() {
        let mut policy = CachePolicy::new();
        let mut flags = OverrideFlags::default();
        policy.restrict(&CacheHint::new().with_max_age(100), &mut flags);

        // A field with inheritMaxAge and no local value leaves the
        // accumulator untouched and blocks the type-level source.
        let mut flags = OverrideFlags::default();
        policy.restrict(&CacheHint::new().with_inherit_max_age(), &mut flags);
        assert_eq!(policy.max_age, Some(100));
        assert!(flags.max_age);
        assert!(flags.shared_max_age);

        policy.restrict(&CacheHint::new().with_max_age(5), &mut flags);
        assert_eq!(policy.max_age, Some(100));
    }

    #[test]
    fn test_inherit_with_non_winning_value_still_freezes() {
        let mut policy = CachePolicy::new();
        let mut flags = OverrideFlags::default();
        policy.restrict(&CacheHint::new().with_max_age(30), &mut flags);

        // Present but looser value plus inherit: no overwrite, but frozen.
        let mut flags = OverrideFlags::default();
        policy.restrict(
            &CacheHint::new().with_max_age(90).with_inherit_max_age(),
            &mut flags,
        );
        assert_eq!(policy.max_age, Some(30));
        assert!(flags.max_age);
    }

    #[test]
    fn test_scope_only_tightens() {
        let mut policy = CachePolicy::new();

        let mut flags = OverrideFlags::default();
        policy.restrict(&CacheHint::new().with_scope(CacheScope::Public), &mut flags);
        assert_eq!(policy.scope, CacheScope::Public);
        assert!(!flags.scope);

        let mut flags = OverrideFlags::default();
        policy.restrict(&CacheHint::new().with_scope(CacheScope::Private), &mut flags);
        assert_eq!(policy.scope, CacheScope::Private);
        assert!(flags.scope);

        // Once private, a public hint elsewhere cannot loosen it.
        let mut flags = OverrideFlags::default();
        policy.restrict(&CacheHint::new().with_scope(CacheScope::Public), &mut flags);
        assert_eq!(policy.scope, CacheScope::Private);
    }

    #[test]
    fn test_vary_union_lower_cased_and_sorted() {
        let mut policy = CachePolicy::new();

        let mut flags = OverrideFlags::default();
        policy.restrict(&CacheHint::new().with_vary(["X-User-Id"]), &mut flags);
        assert!(flags.vary);

        let mut flags = OverrideFlags::default();
        policy.restrict(
            &CacheHint::new().with_vary(["Accept-Language", "x-user-id"]),
            &mut flags,
        );

        let attributes: Vec<&str> = policy.vary.iter().map(String::as_str).collect();
        assert_eq!(attributes, vec!["accept-language", "x-user-id"]);
    }

    #[test]
    fn test_vary_flag_blocks_type_level_merge() {
        let mut policy = CachePolicy::new();
        let mut flags = OverrideFlags::default();

        policy.restrict(&CacheHint::new().with_vary(["a"]), &mut flags);
        policy.restrict(&CacheHint::new().with_vary(["b"]), &mut flags);

        assert_eq!(policy.vary.len(), 1);
        assert!(policy.vary.contains("a"));
    }

    #[test]
    fn test_empty_hint_contributes_nothing() {
        let mut policy = CachePolicy::new();
        let mut flags = OverrideFlags::default();
        policy.restrict(&CacheHint::new(), &mut flags);

        assert!(!policy.has_constraints());
        assert!(!flags.max_age && !flags.shared_max_age && !flags.scope && !flags.vary);
    }

    #[test]
    fn test_restrict_is_order_independent() {
        let hints = [
            CacheHint::new().with_max_age(60),
            CacheHint::new().with_max_age(30).with_vary(["x-user-id"]),
            CacheHint::new()
                .with_scope(CacheScope::Private)
                .with_shared_max_age(600),
        ];

        let fold = |order: &[usize]| {
            let mut policy = CachePolicy::new();
            for &index in order {
                // Each hint on its own node, so flags reset between them.
                let mut flags = OverrideFlags::default();
                policy.restrict(&hints[index], &mut flags);
            }
            policy
        };

        let forward = fold(&[0, 1, 2]);
        let reversed = fold(&[2, 1, 0]);
        let shuffled = fold(&[1, 2, 0]);

        assert_eq!(forward, reversed);
        assert_eq!(forward, shuffled);
        assert_eq!(forward.max_age, Some(30));
        assert_eq!(forward.shared_max_age, Some(600));
        assert_eq!(forward.scope, CacheScope::Private);
    }

    #[test]
    fn test_restrict_max_age_min_fold() {
        let mut policy = CachePolicy::new();
        policy.restrict_max_age(300);
        assert_eq!(policy.max_age, Some(300));

        policy.restrict_max_age(60);
        assert_eq!(policy.max_age, Some(60));

        policy.restrict_max_age(600);
        assert_eq!(policy.max_age, Some(60));
    }

    #[test]
    fn test_all_set_short_circuit_state() {
        let mut flags = OverrideFlags::default();
        assert!(!flags.all_set());

        flags.max_age = true;
        flags.shared_max_age = true;
        flags.scope = true;
        assert!(!flags.all_set());

        flags.vary = true;
        assert!(flags.all_set());
    }
}
