//! The callable family: host functions, script functions and native methods.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use pitta_types::ast::FunctionDecl;

use crate::env::{EnvRef, Environment};
use crate::error::RuntimeResult;
use crate::heap::InstanceId;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// A host function exposed as a global.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> RuntimeResult<Value>;

/// Type-erased native method. The third argument is the receiver's host object.
pub type HostMethod = Rc<dyn Fn(&mut Interpreter, &[Value], &dyn Any) -> RuntimeResult<Value>>;

#[derive(Clone)]
pub enum Callable {
    Native {
        name: String,
        arity: usize,
        function: NativeFn,
    },
    Script {
        decl: Rc<FunctionDecl>,
        closure: EnvRef,
        /// `init` methods hand back `this` instead of their return value.
        is_initializer: bool,
    },
    NativeBound {
        name: String,
        arity: usize,
        method: HostMethod,
        /// `None` until bound to an instance.
        receiver: Option<InstanceId>,
    },
}

impl Callable {
    pub fn name(&self) -> &str {
        match self {
            Self::Native { name, .. } | Self::NativeBound { name, .. } => name,
            Self::Script { decl, .. } => &decl.name.name,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Self::Native { arity, .. } | Self::NativeBound { arity, .. } => *arity,
            Self::Script { decl, .. } => decl.arity(),
        }
    }

    pub fn is_native(&self) -> bool {
        !matches!(self, Self::Script { .. })
    }

    /// A copy of this method bound to `instance`.
    ///
    /// Script methods get a fresh scope holding `this` over their closure.
    /// Host functions have no receiver and return `None`.
    pub fn bind(&self, instance: InstanceId) -> Option<Callable> {
        match self {
            Self::Script {
                decl,
                closure,
                is_initializer,
            } => {
                let mut scope = Environment::with_enclosing(Rc::clone(closure));
                scope.define("this", Value::Instance(instance));
                Some(Self::Script {
                    decl: Rc::clone(decl),
                    closure: scope.into_ref(),
                    is_initializer: *is_initializer,
                })
            }
            Self::NativeBound {
                name, arity, method, ..
            } => Some(Self::NativeBound {
                name: name.clone(),
                arity: *arity,
                method: Rc::clone(method),
                receiver: Some(instance),
            }),
            Self::Native { .. } => None,
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native { name, arity, .. } => f
                .debug_struct("Native")
                .field("name", name)
                .field("arity", arity)
                .finish_non_exhaustive(),
            Self::Script {
                decl,
                is_initializer,
                ..
            } => f
                .debug_struct("Script")
                .field("name", &decl.name.name)
                .field("arity", &decl.arity())
                .field("is_initializer", is_initializer)
                .finish_non_exhaustive(),
            Self::NativeBound {
                name,
                arity,
                receiver,
                ..
            } => f
                .debug_struct("NativeBound")
                .field("name", name)
                .field("arity", arity)
                .field("receiver", receiver)
                .finish_non_exhaustive(),
        }
    }
}
