//! Resolver integration tests.
//!
//! Each test parses a program, runs the resolver and asserts either on the
//! recorded distances or on the presence of specific error codes.

use pitta_parser::parse_source;
use pitta_resolver::{resolve, Resolution};
use pitta_types::ast::*;
use pitta_types::{ErrorCode, SourceFile};
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn run(source: &str) -> (Program, Resolution) {
    let sf = SourceFile::new("test.pitta", source);
    let parsed = parse_source(&sf);
    assert!(
        !parsed.errors.has_errors(),
        "parse errors: {:?}",
        parsed.errors.errors
    );
    let resolution = resolve(&parsed.program, &sf);
    (parsed.program, resolution)
}

fn assert_ok(source: &str) -> (Program, Resolution) {
    let (program, resolution) = run(source);
    assert!(
        !resolution.errors.has_errors(),
        "expected no errors, got:\n{}",
        resolution
            .errors
            .errors
            .iter()
            .map(|e| e.report_line())
            .collect::<Vec<_>>()
            .join("\n")
    );
    (program, resolution)
}

fn assert_error(source: &str, expected: ErrorCode) {
    let (_, resolution) = run(source);
    assert!(
        resolution.errors.has_code(expected),
        "expected {expected}, got {:?}",
        resolution
            .errors
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect::<Vec<_>>()
    );
}

/// Every name reference (variable, assignment, `this`, `super`) in source
/// order, with its recorded distance (`None` = global).
fn references(source: &str) -> Vec<(String, Option<usize>)> {
    let (program, resolution) = assert_ok(source);
    let mut out = Vec::new();
    for stmt in &program.stmts {
        walk_stmt(stmt, &resolution, &mut out);
    }
    out
}

fn walk_stmt(stmt: &Stmt, r: &Resolution, out: &mut Vec<(String, Option<usize>)>) {
    match stmt {
        Stmt::Var(d) => {
            if let Some(init) = &d.initializer {
                walk_expr(init, r, out);
            }
        }
        Stmt::Block(b) => b.stmts.iter().for_each(|s| walk_stmt(s, r, out)),
        Stmt::If(s) => {
            walk_expr(&s.condition, r, out);
            walk_stmt(&s.then_branch, r, out);
            if let Some(e) = &s.else_branch {
                walk_stmt(e, r, out);
            }
        }
        Stmt::While(s) => {
            walk_expr(&s.condition, r, out);
            walk_stmt(&s.body, r, out);
        }
        Stmt::Function(f) => f.body.iter().for_each(|s| walk_stmt(s, r, out)),
        Stmt::Class(c) => {
            if let Some(sup) = &c.superclass {
                walk_expr(sup, r, out);
            }
            for m in &c.methods {
                m.body.iter().for_each(|s| walk_stmt(s, r, out));
            }
        }
        Stmt::Print(s) => walk_expr(&s.expr, r, out),
        Stmt::Return(s) => {
            if let Some(v) = &s.value {
                walk_expr(v, r, out);
            }
        }
        Stmt::Expr(s) => walk_expr(&s.expr, r, out),
    }
}

fn walk_expr(e: &Expr, r: &Resolution, out: &mut Vec<(String, Option<usize>)>) {
    let depth = r.locals.get(&e.id).copied();
    match &e.kind {
        ExprKind::Variable(name) => out.push((name.name.clone(), depth)),
        ExprKind::Assign { name, value } => {
            walk_expr(value, r, out);
            out.push((format!("{}=", name.name), depth));
        }
        ExprKind::This => out.push(("this".into(), depth)),
        ExprKind::Super { .. } => out.push(("super".into(), depth)),
        ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
            walk_expr(left, r, out);
            walk_expr(right, r, out);
        }
        ExprKind::Unary { operand, .. } => walk_expr(operand, r, out),
        ExprKind::Call { callee, args } => {
            walk_expr(callee, r, out);
            args.iter().for_each(|a| walk_expr(a, r, out));
        }
        ExprKind::Get { object, .. } => walk_expr(object, r, out),
        ExprKind::Set { object, value, .. } => {
            walk_expr(object, r, out);
            walk_expr(value, r, out);
        }
        ExprKind::Grouping(inner) => walk_expr(inner, r, out),
        ExprKind::Literal(_) => {}
    }
}

fn refs(pairs: &[(&str, Option<usize>)]) -> Vec<(String, Option<usize>)> {
    pairs.iter().map(|(n, d)| (n.to_string(), *d)).collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// Distances
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn globals_are_not_recorded() {
    assert_eq!(
        references("var a = 1; print a; a = 2;"),
        refs(&[("a", None), ("a=", None)])
    );
}

#[test]
fn block_locals_count_enclosing_blocks() {
    assert_eq!(
        references("{ var a = 1; { { print a; a = 3; } } }"),
        refs(&[("a", Some(2)), ("a=", Some(2))])
    );
}

#[test]
fn shadowing_resolves_to_innermost() {
    assert_eq!(
        references("{ var a = 1; { var a = 2; print a; } print a; }"),
        refs(&[("a", Some(0)), ("a", Some(0))])
    );
}

#[test]
fn parameters_and_body_share_a_scope() {
    assert_eq!(
        references("func f(x) { var y = x; print y; }"),
        refs(&[("x", Some(0)), ("y", Some(0))])
    );
}

#[test]
fn closures_see_enclosing_function_scope() {
    assert_eq!(
        references(
            "func outer() { var c = 0; func inner() { c = c + 1; return c; } return inner; }"
        ),
        refs(&[
            ("c", Some(1)),
            ("c=", Some(1)),
            ("c", Some(1)),
            ("inner", Some(0)),
        ])
    );
}

#[test]
fn recursion_resolves_own_name() {
    // Global function: its name is a global reference.
    assert_eq!(
        references("func f(n) { return f(n); }"),
        refs(&[("f", None), ("n", Some(0))])
    );
    // Local function: declared in the enclosing block before the body.
    assert_eq!(
        references("{ func f(n) { return f(n); } }"),
        refs(&[("f", Some(1)), ("n", Some(0))])
    );
}

#[test]
fn this_in_method_is_one_scope_out() {
    assert_eq!(
        references("class A { m() { return this; } }"),
        refs(&[("this", Some(1))])
    );
}

#[test]
fn this_inside_nested_function_in_method() {
    assert_eq!(
        references("class A { m() { func g() { return this; } return g; } }"),
        refs(&[("this", Some(2)), ("g", Some(0))])
    );
}

#[test]
fn super_sits_outside_this() {
    assert_eq!(
        references("class A {} class B < A { m() { return super.m; } }"),
        refs(&[("A", None), ("super", Some(2))])
    );
}

#[test]
fn for_loop_variable_distance() {
    // Lowered: { var i; while (i < 2) { { print i; } i = i + 1; } }
    assert_eq!(
        references("for (var i = 0; i < 2; i = i + 1) { print i; }"),
        refs(&[
            ("i", Some(0)),
            ("i", Some(2)),
            ("i", Some(1)),
            ("i=", Some(1)),
        ])
    );
}

#[test]
fn idempotent_resolution() {
    let sf = SourceFile::new(
        "test.pitta",
        "{ var a = 1; func f() { return a; } print f(); }",
    );
    let parsed = parse_source(&sf);
    let first = resolve(&parsed.program, &sf);
    let second = resolve(&parsed.program, &sf);
    assert_eq!(first.locals, second.locals);
}

// ══════════════════════════════════════════════════════════════════════════════
// Scope rule errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn duplicate_local_declaration() {
    assert_error("{ var a = 1; var a = 2; }", ErrorCode::DUPLICATE_DECLARATION);
}

#[test]
fn duplicate_parameter() {
    assert_error("func f(a, a) {}", ErrorCode::DUPLICATE_DECLARATION);
}

#[test]
fn global_redeclaration_is_allowed() {
    assert_ok("var a = 1; var a = 2;");
}

#[test]
fn own_initializer_read() {
    assert_error("{ var a = a; }", ErrorCode::SELF_REFERENTIAL_INITIALIZER);
}

#[test]
fn outer_shadowed_name_in_initializer_is_still_an_error() {
    assert_error(
        "{ var a = 1; { var a = a + 1; } }",
        ErrorCode::SELF_REFERENTIAL_INITIALIZER,
    );
}

#[test]
fn global_initializer_may_reference_global() {
    assert_ok("var a = 1; var b = a;");
}

#[test]
fn top_level_return() {
    assert_error("return 1;", ErrorCode::RETURN_OUTSIDE_FUNCTION);
}

#[test]
fn value_return_in_initializer() {
    assert_error(
        "class A { init() { return 1; } }",
        ErrorCode::RETURN_VALUE_IN_INITIALIZER,
    );
}

#[test]
fn bare_return_in_initializer_is_fine() {
    assert_ok("class A { init() { return; } }");
}

#[test]
fn this_outside_class() {
    assert_error("print this;", ErrorCode::THIS_OUTSIDE_CLASS);
    assert_error("func f() { return this; }", ErrorCode::THIS_OUTSIDE_CLASS);
}

#[test]
fn super_outside_class() {
    assert_error("print super.m;", ErrorCode::SUPER_OUTSIDE_CLASS);
}

#[test]
fn super_without_superclass() {
    assert_error(
        "class A { m() { return super.m; } }",
        ErrorCode::SUPER_WITHOUT_SUPERCLASS,
    );
}

#[test]
fn class_inheriting_from_itself() {
    assert_error("class A < A {}", ErrorCode::SELF_INHERITANCE);
}

#[test]
fn errors_accumulate_across_statements() {
    let (_, resolution) = run(
        "return 1;\n{ var a = 1; var a = 2; }\nprint this;\nclass A < A {}",
    );
    let codes: Vec<ErrorCode> = resolution.errors.errors.iter().map(|e| e.code).collect();
    assert_eq!(
        codes,
        vec![
            ErrorCode::RETURN_OUTSIDE_FUNCTION,
            ErrorCode::DUPLICATE_DECLARATION,
            ErrorCode::THIS_OUTSIDE_CLASS,
            ErrorCode::SELF_INHERITANCE,
        ]
    );
    let lines: Vec<u32> = resolution
        .errors
        .errors
        .iter()
        .map(|e| e.span.line())
        .collect();
    assert_eq!(lines, vec![1, 2, 3, 4]);
}

#[test]
fn error_report_names_lexeme() {
    let (_, resolution) = run("{ var a = 1; var a = 2; }");
    assert_eq!(
        resolution.errors.errors[0].report_line(),
        "[line 1] Error at 'a': Already a variable with this name in this scope."
    );
}
