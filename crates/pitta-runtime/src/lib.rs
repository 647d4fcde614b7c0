//! Pitta runtime: the library entry point for running scripts.
//!
//! ```text
//! Source → Lexer → Parser → Resolver → Interpreter
//! ```
//!
//! The [`Runtime`] owns an interpreter preloaded with the standard library and
//! vector classes, reports compile errors as `[line N] Error at 'x': message`
//! and runtime faults as `Runtime error: ...`, and remembers whether either
//! occurred.

mod runtime;

pub use pitta_eval::{CaptureOutput, InterpreterConfig, Output, RuntimeError, StdOutput, Value};
pub use runtime::{check, run_to_result, RunError, RunResult, Runtime};
