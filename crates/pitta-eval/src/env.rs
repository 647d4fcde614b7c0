//! Lexical environments.
//!
//! Each scope is a flat map plus a shared link to its enclosing scope. A
//! closure keeps its defining chain alive by holding the innermost `Rc`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::{Value, ValueError};

/// Shared, mutable handle to a scope.
pub type EnvRef = Rc<RefCell<Environment>>;

/// Outcome of an assignment that may not find its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignError {
    /// No scope on the searched path binds the name.
    Unbound,
    /// The binding exists but refused the value.
    Value(ValueError),
}

impl From<ValueError> for AssignError {
    fn from(err: ValueError) -> Self {
        Self::Value(err)
    }
}

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A root scope with no parent.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Self {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    pub fn enclosing(&self) -> Option<&EnvRef> {
        self.enclosing.as_ref()
    }

    /// Insert or overwrite `name` in this scope. No assignment rules apply.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Whether this scope itself binds `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Look `name` up in this scope, then outward.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        self.enclosing.as_ref()?.borrow().get(name)
    }

    /// Assign to the nearest binding of `name`, through [`Value::assign`].
    pub fn assign(&mut self, name: &str, value: &Value) -> Result<(), AssignError> {
        if let Some(slot) = self.values.get_mut(name) {
            return Ok(slot.assign(value)?);
        }
        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => Err(AssignError::Unbound),
        }
    }

    /// The scope exactly `depth` links out from `env`.
    pub fn ancestor(env: &EnvRef, depth: usize) -> Option<EnvRef> {
        let mut current = Rc::clone(env);
        for _ in 0..depth {
            let next = current.borrow().enclosing.clone()?;
            current = next;
        }
        Some(current)
    }

    /// Read `name` from the scope `depth` links out, without searching further.
    pub fn get_at(env: &EnvRef, depth: usize, name: &str) -> Option<Value> {
        let scope = Self::ancestor(env, depth)?;
        let value = scope.borrow().values.get(name).cloned();
        value
    }

    /// Assign `name` in the scope `depth` links out.
    pub fn assign_at(
        env: &EnvRef,
        depth: usize,
        name: &str,
        value: &Value,
    ) -> Result<(), AssignError> {
        let scope = Self::ancestor(env, depth).ok_or(AssignError::Unbound)?;
        let mut scope = scope.borrow_mut();
        let slot = scope.values.get_mut(name).ok_or(AssignError::Unbound)?;
        Ok(slot.assign(value)?)
    }
}
