//! The runtime driver and its report sinks.

use std::path::Path;

use pitta_eval::{
    CaptureOutput, Interpreter, InterpreterConfig, Output, RuntimeError, StdOutput, VectorClasses,
};
use pitta_parser::parse_source_from;
use pitta_resolver::{resolve, Locals};
use pitta_types::ast::{ExprId, Program};
use pitta_types::{CompileErrors, PittaError, SourceFile};
use serde::Serialize;
use thiserror::Error;

/// Why a run stopped early.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("compilation failed with {} error(s)", .0.total_errors)]
    Compile(CompileErrors),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("cannot read script: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    /// Conventional process exit status: 65 for bad input, 70 for a runtime
    /// fault, 74 for I/O.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Compile(_) => 65,
            Self::Runtime(_) => 70,
            Self::Io(_) => 74,
        }
    }
}

/// Serializable outcome of [`run_to_result`].
#[derive(Debug, Serialize)]
pub struct RunResult {
    pub success: bool,
    pub output: Vec<String>,
    pub errors: CompileErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_error: Option<String>,
}

/// Lex, parse and resolve `source` without running it.
pub fn check(source: &str, filename: &str) -> CompileErrors {
    let sf = SourceFile::new(filename, source);
    compile(&sf, ExprId(0)).errors
}

/// Run `source` in a fresh runtime with captured output.
pub fn run_to_result(source: &str, filename: &str) -> RunResult {
    let capture = CaptureOutput::new();
    let mut runtime = Runtime::with_output(capture.clone());
    let (errors, runtime_error) = match runtime.run_named(filename, source) {
        Ok(()) => (CompileErrors::empty(), None),
        Err(RunError::Compile(errors)) => (errors, None),
        Err(err) => (CompileErrors::empty(), Some(err.to_string())),
    };
    RunResult {
        success: !errors.has_errors() && runtime_error.is_none(),
        output: capture.lines(),
        errors,
        runtime_error,
    }
}

struct Compiled {
    program: Program,
    locals: Locals,
    errors: CompileErrors,
    next_id: ExprId,
}

/// Parse then resolve. Resolution is skipped when parsing failed.
fn compile(sf: &SourceFile, first_id: ExprId) -> Compiled {
    let parsed = parse_source_from(sf, first_id);
    let mut errors = parsed.errors;
    let mut locals = Locals::new();
    if !errors.has_errors() {
        let resolution = resolve(&parsed.program, sf);
        errors.extend(resolution.errors);
        locals = resolution.locals;
    }
    Compiled {
        program: parsed.program,
        locals,
        errors,
        next_id: parsed.next_id,
    }
}

/// Owns an interpreter and the error state of the runs made through it.
///
/// Globals persist across runs, so a host can feed a script piece by piece.
pub struct Runtime {
    interpreter: Interpreter,
    vectors: VectorClasses,
    next_id: ExprId,
    had_error: bool,
    had_runtime_error: bool,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// A runtime over stdout/stdin with the standard prelude.
    pub fn new() -> Self {
        Self::with_output(StdOutput)
    }

    pub fn with_output(output: impl Output + 'static) -> Self {
        Self::with_config(InterpreterConfig::default(), output)
    }

    pub fn with_config(config: InterpreterConfig, output: impl Output + 'static) -> Self {
        let mut interpreter = Interpreter::with_config(config, output);
        let vectors = interpreter.load_prelude();
        Self {
            interpreter,
            vectors,
            next_id: ExprId(0),
            had_error: false,
            had_runtime_error: false,
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// The registered `vec2`/`vec3`/`vec4` classes, for binding host vectors.
    pub fn vectors(&self) -> VectorClasses {
        self.vectors
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn reset_errors(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    // ── Running ───────────────────────────────────────────────────────────────

    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        self.run_named("<script>", source)
    }

    /// Compile and execute `source`. Any compile error skips execution.
    pub fn run_named(&mut self, name: &str, source: &str) -> Result<(), RunError> {
        tracing::debug!(file = name, bytes = source.len(), "run");
        let sf = SourceFile::new(name, source);
        let compiled = compile(&sf, self.next_id);
        self.next_id = compiled.next_id;

        if compiled.errors.has_errors() {
            for error in &compiled.errors.errors {
                self.report_error(error);
            }
            return Err(RunError::Compile(compiled.errors));
        }

        if let Err(err) = self.interpreter.interpret(&compiled.program, compiled.locals) {
            self.runtime_error(&err);
            return Err(err.into());
        }
        Ok(())
    }

    pub fn run_file(&mut self, path: impl AsRef<Path>) -> Result<(), RunError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        self.run_named(&path.display().to_string(), &source)
    }

    // ── Report Sinks ──────────────────────────────────────────────────────────

    /// Write `[line N] Error{where}: message` and flag the compile error.
    pub fn report(&mut self, line: u32, location: &str, message: &str) {
        let text = format!("[line {line}] Error{location}: {message}");
        tracing::warn!(line, "{message}");
        self.emit(&text);
        self.had_error = true;
    }

    pub fn report_error(&mut self, error: &PittaError) {
        self.report(error.span.line(), &error.context, &error.message);
    }

    /// Write `Runtime error: ...` and flag the runtime error.
    pub fn runtime_error(&mut self, error: &RuntimeError) {
        tracing::error!(%error, "runtime error");
        self.emit(&format!("Runtime error: {error}"));
        self.had_runtime_error = true;
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = self.interpreter.output_mut().write_error(text) {
            tracing::error!(%err, "failed to write diagnostic");
        }
    }
}
