//! Pitta resolver: one static pass over a parsed program.
//!
//! For every local variable reference the resolver records how many
//! environment links the interpreter must walk to reach the defining scope.
//! References it does not record are globals. Along the way it enforces the
//! scope rules (duplicate declarations, self-referential initializers,
//! misplaced `return`, `this` and `super`) and accumulates violations.
//!
//! ```text
//! Source → Lexer → Parser → Resolver → Interpreter
//! ```

mod resolver;
mod scope;

pub use resolver::{resolve, Locals, Resolution, Resolver};
