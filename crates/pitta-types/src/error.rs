use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of diagnostics stored per run; later ones are only counted.
pub const MAX_ERRORS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Lexical,
    Syntax,
    Resolution,
}

/// Numeric diagnostic code (E100–E399).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Lexical errors (E100–E199) ──
    pub const UNEXPECTED_CHARACTER: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const INVALID_NUMBER: Self = Self(102);

    // ── Syntax errors (E200–E299) ──
    pub const UNEXPECTED_TOKEN: Self = Self(200);
    pub const EXPECTED_EXPRESSION: Self = Self(201);
    pub const INVALID_ASSIGNMENT_TARGET: Self = Self(202);
    pub const TOO_MANY_ARGUMENTS: Self = Self(203);
    pub const TOO_MANY_PARAMETERS: Self = Self(204);
    pub const NESTING_TOO_DEEP: Self = Self(205);

    // ── Resolution errors (E300–E399) ──
    pub const DUPLICATE_DECLARATION: Self = Self(300);
    pub const SELF_REFERENTIAL_INITIALIZER: Self = Self(301);
    pub const RETURN_OUTSIDE_FUNCTION: Self = Self(302);
    pub const RETURN_VALUE_IN_INITIALIZER: Self = Self(303);
    pub const THIS_OUTSIDE_CLASS: Self = Self(304);
    pub const SUPER_OUTSIDE_CLASS: Self = Self(305);
    pub const SUPER_WITHOUT_SUPERCLASS: Self = Self(306);
    pub const SELF_INHERITANCE: Self = Self(307);

    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Lexical,
            200..=299 => ErrorCategory::Syntax,
            _ => ErrorCategory::Resolution,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A structured compile-time diagnostic (lexer, parser or resolver).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PittaError {
    pub file: String,
    pub code: ErrorCode,
    pub severity: Severity,
    pub category: ErrorCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The offending source line, for context.
    pub source_line: String,
    /// Where on the line the error sits: ` at 'x'`, ` at end`, or empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
}

impl PittaError {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            context: String::new(),
        }
    }

    /// Attach the offending lexeme.
    pub fn at_lexeme(mut self, lexeme: &str) -> Self {
        self.context = format!(" at '{lexeme}'");
        self
    }

    /// Mark the error as occurring at end of input.
    pub fn at_end(mut self) -> Self {
        self.context = " at end".to_string();
        self
    }

    /// The classic one-line report: `[line N] Error at 'x': message`.
    pub fn report_line(&self) -> String {
        format!(
            "[line {}] Error{}: {}",
            self.span.line(),
            self.context,
            self.message
        )
    }
}

impl fmt::Display for PittaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for PittaError {}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lexical => write!(f, "lexical"),
            Self::Syntax => write!(f, "syntax"),
            Self::Resolution => write!(f, "resolution"),
        }
    }
}

/// Accumulated diagnostics from one front-end pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileErrors {
    pub errors: Vec<PittaError>,
    pub warnings: Vec<PittaError>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl CompileErrors {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push_error(&mut self, error: PittaError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    pub fn push_warning(&mut self, warning: PittaError) {
        self.warnings.push(warning);
        self.total_warnings += 1;
    }

    /// Fold another pass's diagnostics into this one.
    pub fn extend(&mut self, other: CompileErrors) {
        let dropped = other.total_errors - other.errors.len();
        for err in other.errors {
            self.push_error(err);
        }
        self.total_errors += dropped;
        for warning in other.warnings {
            self.push_warning(warning);
        }
    }

    /// Whether any stored error carries `code`.
    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(code: ErrorCode) -> PittaError {
        PittaError::new(
            "test.pitta",
            code,
            "Already a variable with this name in this scope.",
            Span::new(3, 9, 3, 10),
            "    var a = 2;",
        )
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(
            ErrorCode::UNEXPECTED_CHARACTER.category(),
            ErrorCategory::Lexical
        );
        assert_eq!(
            ErrorCode::EXPECTED_EXPRESSION.category(),
            ErrorCategory::Syntax
        );
        assert_eq!(
            ErrorCode::SELF_INHERITANCE.category(),
            ErrorCategory::Resolution
        );
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::DUPLICATE_DECLARATION.to_string(), "E300");
        assert_eq!(ErrorCode::UNTERMINATED_STRING.to_string(), "E101");
    }

    #[test]
    fn test_report_line_formats() {
        let plain = sample(ErrorCode::DUPLICATE_DECLARATION);
        assert_eq!(
            plain.report_line(),
            "[line 3] Error: Already a variable with this name in this scope."
        );
        let at = sample(ErrorCode::DUPLICATE_DECLARATION).at_lexeme("a");
        assert_eq!(
            at.report_line(),
            "[line 3] Error at 'a': Already a variable with this name in this scope."
        );
        let end = sample(ErrorCode::UNEXPECTED_TOKEN).at_end();
        assert!(end.report_line().starts_with("[line 3] Error at end:"));
    }

    #[test]
    fn test_error_json_serialization() {
        let err = sample(ErrorCode::DUPLICATE_DECLARATION).at_lexeme("a");
        let json = serde_json::to_string_pretty(&err).unwrap();
        assert!(json.contains("\"code\": 300"));
        assert!(json.contains("\"category\": \"resolution\""));
        assert!(json.contains("\"line\": 3"));
        assert!(json.contains("\"context\""));

        let back: PittaError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, err.code);
        assert_eq!(back.context, " at 'a'");
    }

    #[test]
    fn test_empty_context_not_serialized() {
        let json = serde_json::to_string(&sample(ErrorCode::INVALID_NUMBER)).unwrap();
        assert!(!json.contains("context"));
    }

    #[test]
    fn test_compile_errors_max_limit() {
        let mut errs = CompileErrors::empty();
        for _ in 0..25 {
            errs.push_error(sample(ErrorCode::UNEXPECTED_TOKEN));
        }
        assert_eq!(errs.errors.len(), MAX_ERRORS);
        assert_eq!(errs.total_errors, 25);
        assert!(errs.has_errors());
    }

    #[test]
    fn test_compile_errors_extend_keeps_totals() {
        let mut first = CompileErrors::empty();
        first.push_error(sample(ErrorCode::UNEXPECTED_CHARACTER));
        let mut second = CompileErrors::empty();
        for _ in 0..22 {
            second.push_error(sample(ErrorCode::SELF_INHERITANCE));
        }
        first.extend(second);
        assert_eq!(first.total_errors, 23);
        assert_eq!(first.errors.len(), MAX_ERRORS);
        assert!(first.has_code(ErrorCode::UNEXPECTED_CHARACTER));
        assert!(first.has_code(ErrorCode::SELF_INHERITANCE));
    }

    #[test]
    fn test_compile_errors_json_output() {
        let mut errs = CompileErrors::empty();
        errs.push_error(sample(ErrorCode::RETURN_OUTSIDE_FUNCTION));
        let json = serde_json::to_string(&errs).unwrap();
        assert!(json.contains("\"total_errors\":1"));
        assert!(json.contains("\"total_warnings\":0"));
    }
}
