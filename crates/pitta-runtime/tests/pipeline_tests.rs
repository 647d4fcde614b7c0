//! End-to-end tests: source → lex → parse → resolve → interpret, with the
//! report sinks and error flags.

use pitta_runtime::{check, run_to_result, CaptureOutput, RunError, Runtime, RuntimeError, Value};
use pitta_types::ErrorCode;
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn runtime() -> (Runtime, CaptureOutput) {
    let capture = CaptureOutput::new();
    (Runtime::with_output(capture.clone()), capture)
}

fn lines(expected: &[&str]) -> Vec<String> {
    expected.iter().map(|s| s.to_string()).collect()
}

const INHERITANCE: &str = r#"
class Shape {
  init(name) { this.name = name; }
  area() { return 0.0; }
  describe() { return this.name ++ " with area " ++ str(this.area()); }
}

class Rect < Shape {
  init(w, h) {
    super.init("rect");
    this.w = w;
    this.h = h;
  }
  area() { return this.w * this.h; }
}

class Square < Rect {
  init(side) { super.init(side, side); this.name = "square"; }
}

print Rect(2.0, 3.0).describe();
print Square(2.0).describe();
"#;

// ══════════════════════════════════════════════════════════════════════════════
// Successful runs
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn runs_a_program_end_to_end() {
    let (mut rt, out) = runtime();
    rt.run(INHERITANCE).unwrap();
    assert_eq!(
        out.lines(),
        lines(&["rect with area 6.000000", "square with area 4.000000"])
    );
    assert!(!rt.had_error());
    assert!(!rt.had_runtime_error());
}

#[test]
fn globals_persist_across_runs() {
    let (mut rt, out) = runtime();
    rt.run("var total = 0; func add(n) { total = total + n; }").unwrap();
    rt.run("add(2); add(3);").unwrap();
    rt.run("print total;").unwrap();
    assert_eq!(out.lines(), lines(&["5"]));
}

#[test]
fn closures_from_earlier_runs_still_resolve() {
    let (mut rt, out) = runtime();
    rt.run(
        r#"
func makeAdder(n) {
  func add(x) { return x + n; }
  return add;
}
var addTwo = makeAdder(2);
"#,
    )
    .unwrap();
    rt.run("{ var local = 40; print addTwo(local); }").unwrap();
    assert_eq!(out.lines(), lines(&["42"]));
}

#[test]
fn host_reads_script_globals() {
    let (mut rt, _) = runtime();
    rt.run("var answer = 6 * 7;").unwrap();
    assert_eq!(rt.interpreter().get_global("answer"), Some(Value::Int(42)));
}

#[test]
fn host_vectors_are_shared_with_scripts() {
    let (mut rt, out) = runtime();
    let host = std::rc::Rc::new(pitta_eval::Vec2::new([0.0, 0.0]));
    let vectors = rt.vectors();
    let value = vectors.vec2.bind_existing(rt.interpreter_mut(), host.clone());
    rt.interpreter_mut().define_global("velocity", value);
    rt.run("velocity.x = 2.5; print velocity.dot(vec2(2.0, 0.0));").unwrap();
    assert_eq!(host.get(0), 2.5);
    assert_eq!(out.lines(), lines(&["5.000000"]));
}

// ══════════════════════════════════════════════════════════════════════════════
// Compile errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn syntax_error_is_reported_and_nothing_runs() {
    let (mut rt, out) = runtime();
    let err = rt.run("print \"first\";\nprint 1 +;").unwrap_err();
    assert!(matches!(err, RunError::Compile(_)));
    assert_eq!(err.exit_code(), 65);
    assert!(out.lines().is_empty());
    assert_eq!(
        out.errors(),
        lines(&["[line 2] Error at ';': Expect expression."])
    );
    assert!(rt.had_error());
    assert!(!rt.had_runtime_error());
}

#[test]
fn resolution_errors_accumulate() {
    let (mut rt, out) = runtime();
    let err = rt
        .run(
            r#"
return 1;
print this;
{ var a = 1; var a = 2; }
"#,
        )
        .unwrap_err();
    let RunError::Compile(errors) = err else {
        panic!("expected compile errors");
    };
    assert_eq!(errors.total_errors, 3);
    assert!(errors.has_code(ErrorCode::RETURN_OUTSIDE_FUNCTION));
    assert!(errors.has_code(ErrorCode::THIS_OUTSIDE_CLASS));
    assert!(errors.has_code(ErrorCode::DUPLICATE_DECLARATION));
    assert_eq!(out.errors().len(), 3);
    assert_eq!(out.errors()[0], "[line 2] Error at 'return': Can't return from top-level code.");
}

#[test]
fn reset_clears_flags() {
    let (mut rt, _) = runtime();
    rt.run("var;").unwrap_err();
    assert!(rt.had_error());
    rt.reset_errors();
    assert!(!rt.had_error());
    rt.run("print 1;").unwrap();
    assert!(!rt.had_error());
}

#[test]
fn report_formats_location() {
    let (mut rt, out) = runtime();
    rt.report(7, " at end", "Expect ';' after value.");
    rt.report(8, "", "Something broke.");
    assert_eq!(
        out.errors(),
        lines(&[
            "[line 7] Error at end: Expect ';' after value.",
            "[line 8] Error: Something broke.",
        ])
    );
    assert!(rt.had_error());
}

#[test]
fn check_returns_diagnostics_without_running() {
    let errors = check("var a = 1; { var b = b; }", "check.pitta");
    assert!(errors.has_code(ErrorCode::SELF_REFERENTIAL_INITIALIZER));
    let json: serde_json::Value = serde_json::from_str(&errors.to_json().unwrap()).unwrap();
    assert_eq!(json["total_errors"], 1);
    assert_eq!(json["errors"][0]["file"], "check.pitta");

    assert!(!check("print 1;", "ok.pitta").has_errors());
}

// ══════════════════════════════════════════════════════════════════════════════
// Runtime errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn runtime_error_is_reported_and_halts() {
    let (mut rt, out) = runtime();
    let err = rt.run("print 1 + 1;\nprint 1 ++ 2;\nprint 3;").unwrap_err();
    assert!(matches!(err, RunError::Runtime(RuntimeError::Type { line: 2, .. })));
    assert_eq!(err.exit_code(), 70);
    assert_eq!(out.lines(), lines(&["2"]));
    assert_eq!(
        out.errors(),
        lines(&["Runtime error: [line 2] Operands of '++' must be two Strings, got Int and Int."])
    );
    assert!(rt.had_runtime_error());
    assert!(!rt.had_error());
}

#[test]
fn runtime_continues_after_runtime_error() {
    let (mut rt, out) = runtime();
    rt.run("undefinedThing();").unwrap_err();
    rt.run("print \"still alive\";").unwrap();
    assert_eq!(out.lines(), lines(&["still alive"]));
}

#[test]
fn missing_file_is_an_io_error() {
    let (mut rt, _) = runtime();
    let err = rt.run_file("/definitely/not/here.pitta").unwrap_err();
    assert!(matches!(err, RunError::Io(_)));
    assert_eq!(err.exit_code(), 74);
}

#[test]
fn run_to_result_serializes() {
    let ok = run_to_result("print \"hi\";", "ok.pitta");
    assert!(ok.success);
    assert_eq!(ok.output, lines(&["hi"]));

    let failed = run_to_result("print 1 / 0;", "div.pitta");
    assert!(!failed.success);
    assert_eq!(
        failed.runtime_error.as_deref(),
        Some("[line 1] Division by zero.")
    );
    let json = serde_json::to_value(&failed).unwrap();
    assert_eq!(json["success"], false);
    assert!(json.get("runtime_error").is_some());

    let broken = run_to_result("print ;", "broken.pitta");
    assert!(!broken.success);
    assert!(broken.errors.has_code(ErrorCode::EXPECTED_EXPRESSION));
    let json = serde_json::to_value(&broken).unwrap();
    assert!(json.get("runtime_error").is_none());
}
