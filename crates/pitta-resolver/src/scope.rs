//! The resolver's stack of block scopes.
//!
//! Only local scopes live here; the global scope is never pushed, so an
//! empty stack means "at top level".

use std::collections::HashMap;

/// One block scope: name → whether its initializer has finished.
#[derive(Debug, Default)]
struct Scope {
    bindings: HashMap<String, bool>,
}

#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub(crate) fn pop_scope(&mut self) {
        debug_assert!(!self.scopes.is_empty(), "cannot pop the global scope");
        self.scopes.pop();
    }

    /// Declare `name` in the innermost scope, not yet defined.
    ///
    /// Returns `false` if the innermost scope already declares it. Globals
    /// are never tracked, so this always succeeds at top level.
    pub(crate) fn declare(&mut self, name: &str) -> bool {
        let Some(scope) = self.scopes.last_mut() else {
            return true;
        };
        if scope.bindings.contains_key(name) {
            return false;
        }
        scope.bindings.insert(name.to_string(), false);
        true
    }

    /// Mark `name` as fully initialized in the innermost scope.
    pub(crate) fn define(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(name.to_string(), true);
        }
    }

    /// Whether `name` is declared in the innermost scope but still inside
    /// its own initializer.
    pub(crate) fn is_uninitialized(&self, name: &str) -> bool {
        self.scopes
            .last()
            .and_then(|s| s.bindings.get(name))
            .is_some_and(|defined| !defined)
    }

    /// Number of scopes between the innermost one and the one declaring
    /// `name`, or `None` if no local scope declares it.
    pub(crate) fn distance(&self, name: &str) -> Option<usize> {
        self.scopes
            .iter()
            .rev()
            .position(|s| s.bindings.contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_scope_is_untracked() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.declare("a"));
        assert!(scopes.declare("a"));
        assert_eq!(scopes.distance("a"), None);
    }

    #[test]
    fn test_duplicate_in_same_scope() {
        let mut scopes = ScopeStack::new();
        scopes.push_scope();
        assert!(scopes.declare("a"));
        assert!(!scopes.declare("a"));
        scopes.push_scope();
        assert!(scopes.declare("a"), "shadowing in an inner scope is fine");
    }

    #[test]
    fn test_distance_counts_from_innermost() {
        let mut scopes = ScopeStack::new();
        scopes.push_scope();
        scopes.define("outer");
        scopes.push_scope();
        scopes.push_scope();
        scopes.define("inner");
        assert_eq!(scopes.distance("inner"), Some(0));
        assert_eq!(scopes.distance("outer"), Some(2));
        assert_eq!(scopes.distance("missing"), None);
    }

    #[test]
    fn test_initializer_state() {
        let mut scopes = ScopeStack::new();
        scopes.push_scope();
        scopes.declare("a");
        assert!(scopes.is_uninitialized("a"));
        scopes.define("a");
        assert!(!scopes.is_uninitialized("a"));
        assert!(!scopes.is_uninitialized("b"));
    }

    #[test]
    fn test_pop_restores_outer_view() {
        let mut scopes = ScopeStack::new();
        scopes.push_scope();
        scopes.define("a");
        scopes.push_scope();
        scopes.define("a");
        assert_eq!(scopes.distance("a"), Some(0));
        scopes.pop_scope();
        assert_eq!(scopes.distance("a"), Some(0));
        scopes.pop_scope();
        assert_eq!(scopes.distance("a"), None);
    }
}
