//! Runtime error types for the Pitta interpreter.

use thiserror::Error;

/// A fatal runtime fault. Any of these ends the current `interpret` call.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Operand kind mismatch, bad conversion, division by zero, etc.
    #[error("[line {line}] {message}")]
    Type { line: u32, message: String },

    /// A call supplied the wrong number of arguments.
    #[error("[line {line}] Expected {expected} arguments but got {got}.")]
    Arity {
        line: u32,
        expected: usize,
        got: usize,
    },

    /// Unknown variable, field or method.
    #[error("[line {line}] Undefined name '{name}'.")]
    UndefinedName { line: u32, name: String },

    /// Script recursion went past the configured call depth.
    #[error("[line {line}] Stack overflow: call depth exceeded {depth}.")]
    StackOverflow { line: u32, depth: usize },

    /// The print or input sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    pub fn type_error(line: u32, message: impl Into<String>) -> Self {
        Self::Type {
            line,
            message: message.into(),
        }
    }

    pub fn undefined(line: u32, name: impl Into<String>) -> Self {
        Self::UndefinedName {
            line,
            name: name.into(),
        }
    }

    /// Source line of the fault, when one is known.
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Type { line, .. }
            | Self::Arity { line, .. }
            | Self::UndefinedName { line, .. }
            | Self::StackOverflow { line, .. } => Some(*line),
            Self::Io(_) => None,
        }
    }
}

/// Result alias for interpreter operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_line() {
        let err = RuntimeError::type_error(4, "Operands must be two Ints.");
        assert_eq!(err.to_string(), "[line 4] Operands must be two Ints.");
        assert_eq!(err.line(), Some(4));
    }

    #[test]
    fn test_arity_message() {
        let err = RuntimeError::Arity {
            line: 2,
            expected: 1,
            got: 3,
        };
        assert_eq!(err.to_string(), "[line 2] Expected 1 arguments but got 3.");
    }

    #[test]
    fn test_io_has_no_line() {
        let err = RuntimeError::from(std::io::Error::other("closed"));
        assert_eq!(err.line(), None);
        assert!(err.to_string().starts_with("I/O error"));
    }
}
