//! Shared types for the Pitta scripting runtime.
//!
//! Every stage (lexer, parser, resolver, interpreter) speaks in terms of
//! the AST, source spans and diagnostics defined here.

mod error;
mod span;
pub mod ast;

pub use error::{CompileErrors, ErrorCategory, ErrorCode, PittaError, Severity, MAX_ERRORS};
pub use span::{SourceFile, Span};

/// Result type used by the front-end stages.
pub type Result<T> = std::result::Result<T, PittaError>;
