//! Runtime values.
//!
//! A [`Value`] is either *owning* (the payload lives in the value) or
//! *bound*: a scalar or string that reads and writes through a shared cell
//! owned by the host. Bound values are only produced by the native bridge and
//! keep their kind for life.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::error::RuntimeError;
use crate::heap::{CallableId, ClassId, Heap, InstanceId};

/// A Pitta runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
    Null,
    Undefined,
    Class(ClassId),
    Instance(InstanceId),
    Function(CallableId),
    /// Host-owned storage seen through a shared cell.
    Bound(HostCell),
}

/// Shared storage behind a bound [`Value`].
#[derive(Debug, Clone)]
pub enum HostCell {
    Int(Rc<Cell<i32>>),
    Float(Rc<Cell<f32>>),
    Bool(Rc<Cell<bool>>),
    String(Rc<RefCell<String>>),
}

/// The kind of a value, with bound values reporting their primitive kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Float,
    Bool,
    String,
    Null,
    Undefined,
    Class,
    Instance,
    Function,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Bool => "Bool",
            Self::String => "String",
            Self::Null => "Null",
            Self::Undefined => "Undefined",
            Self::Class => "Class",
            Self::Instance => "Instance",
            Self::Function => "Function",
        };
        f.write_str(name)
    }
}

/// A kind violation on access or assignment.
///
/// Carries no line; the interpreter attaches one with [`ValueError::at`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("Expected {expected} but got {found}.")]
    Mismatch {
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("Cannot store {from} into a bound {target}.")]
    KindChange { target: ValueKind, from: ValueKind },
    #[error("Cannot set a bound {0} to Null or Undefined.")]
    Unset(ValueKind),
    #[error("Cannot assign {from} to a String.")]
    StringReassign { from: ValueKind },
}

impl ValueError {
    pub fn at(self, line: u32) -> RuntimeError {
        RuntimeError::type_error(line, self.to_string())
    }
}

impl HostCell {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Bool(_) => ValueKind::Bool,
            Self::String(_) => ValueKind::String,
        }
    }

    /// Current contents as an owning value.
    pub fn load(&self) -> Value {
        match self {
            Self::Int(c) => Value::Int(c.get()),
            Self::Float(c) => Value::Float(c.get()),
            Self::Bool(c) => Value::Bool(c.get()),
            Self::String(c) => Value::String(c.borrow().clone()),
        }
    }

    /// Write `source` into the shared storage. The kind must match.
    pub fn store(&self, source: &Value) -> Result<(), ValueError> {
        match (self, source) {
            (Self::Int(c), Value::Int(n)) => c.set(*n),
            (Self::Float(c), Value::Float(x)) => c.set(*x),
            (Self::Bool(c), Value::Bool(b)) => c.set(*b),
            (Self::String(c), Value::String(s)) => c.borrow_mut().clone_from(s),
            (cell, Value::Null | Value::Undefined) => return Err(ValueError::Unset(cell.kind())),
            (cell, other) => {
                return Err(ValueError::KindChange {
                    target: cell.kind(),
                    from: other.kind(),
                })
            }
        }
        Ok(())
    }
}

impl Value {
    pub fn bound_int(cell: Rc<Cell<i32>>) -> Self {
        Self::Bound(HostCell::Int(cell))
    }

    pub fn bound_float(cell: Rc<Cell<f32>>) -> Self {
        Self::Bound(HostCell::Float(cell))
    }

    pub fn bound_bool(cell: Rc<Cell<bool>>) -> Self {
        Self::Bound(HostCell::Bool(cell))
    }

    pub fn bound_string(cell: Rc<RefCell<String>>) -> Self {
        Self::Bound(HostCell::String(cell))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Bool(_) => ValueKind::Bool,
            Self::String(_) => ValueKind::String,
            Self::Null => ValueKind::Null,
            Self::Undefined => ValueKind::Undefined,
            Self::Class(_) => ValueKind::Class,
            Self::Instance(_) => ValueKind::Instance,
            Self::Function(_) => ValueKind::Function,
            Self::Bound(cell) => cell.kind(),
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Self::Bound(_))
    }

    /// An owning copy. Bound values are read out of their cell.
    pub fn detach(&self) -> Value {
        match self {
            Self::Bound(cell) => cell.load(),
            other => other.clone(),
        }
    }

    /// Truthiness. Ints count when above zero, Floats when at or above zero.
    /// Reference kinds are always true.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Int(n) => *n > 0,
            Self::Float(x) => *x >= 0.0,
            Self::Bool(b) => *b,
            Self::String(s) => !s.is_empty(),
            Self::Class(_) | Self::Instance(_) | Self::Function(_) => true,
            Self::Null | Self::Undefined => false,
            Self::Bound(cell) => cell.load().truthy(),
        }
    }

    fn mismatch(&self, expected: ValueKind) -> ValueError {
        ValueError::Mismatch {
            expected,
            found: self.kind(),
        }
    }

    // ── Typed Accessors ───────────────────────────────────────────────────────

    pub fn as_int(&self) -> Result<i32, ValueError> {
        match self {
            Self::Int(n) => Ok(*n),
            Self::Bound(HostCell::Int(c)) => Ok(c.get()),
            _ => Err(self.mismatch(ValueKind::Int)),
        }
    }

    pub fn as_float(&self) -> Result<f32, ValueError> {
        match self {
            Self::Float(x) => Ok(*x),
            Self::Bound(HostCell::Float(c)) => Ok(c.get()),
            _ => Err(self.mismatch(ValueKind::Float)),
        }
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Bound(HostCell::Bool(c)) => Ok(c.get()),
            _ => Err(self.mismatch(ValueKind::Bool)),
        }
    }

    pub fn as_string(&self) -> Result<String, ValueError> {
        match self {
            Self::String(s) => Ok(s.clone()),
            Self::Bound(HostCell::String(c)) => Ok(c.borrow().clone()),
            _ => Err(self.mismatch(ValueKind::String)),
        }
    }

    pub fn as_callable(&self) -> Result<CallableId, ValueError> {
        match self {
            Self::Function(id) => Ok(*id),
            _ => Err(self.mismatch(ValueKind::Function)),
        }
    }

    pub fn as_class(&self) -> Result<ClassId, ValueError> {
        match self {
            Self::Class(id) => Ok(*id),
            _ => Err(self.mismatch(ValueKind::Class)),
        }
    }

    pub fn as_instance(&self) -> Result<InstanceId, ValueError> {
        match self {
            Self::Instance(id) => Ok(*id),
            _ => Err(self.mismatch(ValueKind::Instance)),
        }
    }

    // ── Assignment ────────────────────────────────────────────────────────────

    /// Assign `source` into this slot.
    ///
    /// A bound slot is written through and must keep its kind. An owning
    /// slot takes the new value, except that a String only accepts a String,
    /// `Null` or `Undefined`.
    pub fn assign(&mut self, source: &Value) -> Result<(), ValueError> {
        let source = source.detach();
        match self {
            Self::Bound(cell) => cell.store(&source),
            Self::String(_)
                if !matches!(source, Self::String(_) | Self::Null | Self::Undefined) =>
            {
                Err(ValueError::StringReassign {
                    from: source.kind(),
                })
            }
            slot => {
                *slot = source;
                Ok(())
            }
        }
    }

    // ── Display ───────────────────────────────────────────────────────────────

    /// The text `print` writes for this value.
    pub fn to_display_string(&self, heap: &Heap) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Float(x) => format!("{x:.6}"),
            Self::Bool(b) => b.to_string(),
            Self::String(s) => s.clone(),
            Self::Null => "Null".to_string(),
            Self::Undefined => "Undefined".to_string(),
            Self::Class(id) => format!("<class {}>", heap.class(*id).name),
            Self::Instance(id) => {
                let class = heap.instance(*id).class;
                format!("<{} instance>", heap.class(class).name)
            }
            Self::Function(id) => {
                let callable = heap.callable(*id);
                if callable.is_native() {
                    format!("<native fn {}>", callable.name())
                } else {
                    format!("<fn {}>", callable.name())
                }
            }
            Self::Bound(cell) => cell.load().to_display_string(heap),
        }
    }
}

/// Equality holds only within one kind; reference kinds compare by handle.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self.detach(), other.detach()) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Null, Self::Null) | (Self::Undefined, Self::Undefined) => true,
            (Self::Class(a), Self::Class(b)) => a == b,
            (Self::Instance(a), Self::Instance(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a == b,
            _ => false,
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(n)
    }
}

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness_table() {
        assert!(Value::Bool(true).truthy());
        assert!(!Value::Bool(false).truthy());
        assert!(Value::Int(1).truthy());
        assert!(!Value::Int(0).truthy());
        assert!(!Value::Int(-3).truthy());
        assert!(Value::Float(0.0).truthy());
        assert!(!Value::Float(-0.5).truthy());
        assert!(Value::from("x").truthy());
        assert!(!Value::from("").truthy());
        assert!(!Value::Null.truthy());
        assert!(!Value::Undefined.truthy());
        assert!(!Value::bound_bool(Rc::new(Cell::new(false))).truthy());
        assert!(Value::bound_int(Rc::new(Cell::new(4))).truthy());
    }

    #[test]
    fn test_equality_is_kind_strict() {
        assert_eq!(Value::Int(1), Value::Int(1));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Null, Value::Undefined);
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn test_bound_reads_through() {
        let cell = Rc::new(Cell::new(2.5f32));
        let value = Value::bound_float(cell.clone());
        cell.set(4.0);
        assert_eq!(value.as_float(), Ok(4.0));
        assert_eq!(value.kind(), ValueKind::Float);
        assert_eq!(value, Value::Float(4.0));
    }

    #[test]
    fn test_bound_assign_writes_through() {
        let cell = Rc::new(RefCell::new("a".to_string()));
        let mut slot = Value::bound_string(cell.clone());
        slot.assign(&Value::from("b")).unwrap();
        assert_eq!(*cell.borrow(), "b");
        assert!(slot.is_bound());
    }

    #[test]
    fn test_bound_assign_rejects_kind_change() {
        let mut slot = Value::bound_int(Rc::new(Cell::new(1)));
        assert_eq!(
            slot.assign(&Value::Float(1.0)),
            Err(ValueError::KindChange {
                target: ValueKind::Int,
                from: ValueKind::Float
            })
        );
        assert_eq!(
            slot.assign(&Value::Null),
            Err(ValueError::Unset(ValueKind::Int))
        );
    }

    #[test]
    fn test_owning_assign_changes_kind() {
        let mut slot = Value::Int(1);
        slot.assign(&Value::from("now text")).unwrap();
        assert_eq!(slot, Value::from("now text"));
    }

    #[test]
    fn test_owning_string_rejects_non_string() {
        let mut slot = Value::from("s");
        assert_eq!(
            slot.assign(&Value::Int(3)),
            Err(ValueError::StringReassign {
                from: ValueKind::Int
            })
        );
        slot.assign(&Value::Null).unwrap();
        assert_eq!(slot, Value::Null);
    }

    #[test]
    fn test_assign_from_bound_detaches() {
        let cell = Rc::new(Cell::new(7));
        let mut slot = Value::Undefined;
        slot.assign(&Value::bound_int(cell.clone())).unwrap();
        cell.set(8);
        assert!(!slot.is_bound());
        assert_eq!(slot, Value::Int(7));
    }

    #[test]
    fn test_accessors_do_not_coerce() {
        assert!(Value::Int(1).as_float().is_err());
        assert!(Value::Float(1.0).as_int().is_err());
        assert_eq!(
            Value::Null.as_string(),
            Err(ValueError::Mismatch {
                expected: ValueKind::String,
                found: ValueKind::Null
            })
        );
    }

    #[test]
    fn test_display_primitives() {
        let heap = Heap::default();
        assert_eq!(Value::Float(1.5).to_display_string(&heap), "1.500000");
        assert_eq!(Value::Int(-4).to_display_string(&heap), "-4");
        assert_eq!(Value::Bool(true).to_display_string(&heap), "true");
        assert_eq!(Value::Undefined.to_display_string(&heap), "Undefined");
    }
}
