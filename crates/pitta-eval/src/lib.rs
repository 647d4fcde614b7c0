//! Pitta tree-walking interpreter.
//!
//! Executes a resolved [`Program`](pitta_types::ast::Program) directly from
//! the AST. All classes, instances and callables live in the interpreter's
//! [`Heap`] and are referred to by handle; environments form an `Rc` chain so
//! closures keep their defining scopes alive.

mod callable;
mod class;
mod env;
mod error;
mod heap;
mod interpreter;
mod native;
mod ops;
mod output;
mod stack;
pub mod stdlib;
mod value;
pub mod vector;

pub use callable::{Callable, HostMethod, NativeFn};
pub use class::{Class, Constructor, GenerateFn, HostObject, Instance, NativeConstructor};
pub use env::{AssignError, EnvRef, Environment};
pub use error::{RuntimeError, RuntimeResult};
pub use heap::{CallableId, ClassId, Heap, InstanceId};
pub use interpreter::{ExecResult, Interpreter, InterpreterConfig, DEFAULT_MAX_CALL_DEPTH};
pub use native::{
    host_object, wrap_host, FieldAdapter, Generator, Method, NativeClass, NativeClassHandle,
};
pub use output::{CaptureOutput, Output, StdOutput};
pub use stack::ensure_sufficient_stack;
pub use value::{HostCell, Value, ValueError, ValueKind};
pub use vector::{Vec2, Vec3, Vec4, Vector, VectorClasses};
