//! Integration tests for the native bridge and the vector classes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pitta_eval::{
    host_object, wrap_host, CaptureOutput, Interpreter, NativeClass, NativeClassHandle,
    RuntimeError, RuntimeResult, Value, Vec2, VectorClasses,
};
use pitta_parser::parse_source_from;
use pitta_resolver::resolve;
use pitta_types::ast::ExprId;
use pitta_types::SourceFile;
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// A host type with one field of each bound kind.
#[derive(Debug, Default)]
struct Counter {
    count: Rc<Cell<i32>>,
    label: Rc<RefCell<String>>,
    enabled: Rc<Cell<bool>>,
}

fn counter_class(interp: &mut Interpreter) -> NativeClassHandle<Counter> {
    NativeClass::new("Counter", 1, |interp: &mut Interpreter, args: &[Value]| {
        let start = args[0].as_int().map_err(|e| e.at(interp.current_line()))?;
        Ok(Counter {
            count: Rc::new(Cell::new(start)),
            label: Rc::new(RefCell::new("counter".to_string())),
            enabled: Rc::new(Cell::new(true)),
        })
    })
    .fields(|c: &Counter| {
        vec![
            ("count", Value::bound_int(c.count.clone())),
            ("label", Value::bound_string(c.label.clone())),
            ("enabled", Value::bound_bool(c.enabled.clone())),
        ]
    })
    .method("bump", 1, bump)
    .method("describe", 0, |_: &mut Interpreter, _: &[Value], c: &Counter| {
        Ok(Value::String(format!("{}={}", c.label.borrow(), c.count.get())))
    })
    .register(interp)
}

fn bump(interp: &mut Interpreter, args: &[Value], c: &Counter) -> RuntimeResult<Value> {
    let by = args[0].as_int().map_err(|e| e.at(interp.current_line()))?;
    c.count.set(c.count.get() + by);
    Ok(Value::Int(c.count.get()))
}

struct Session {
    interp: Interpreter,
    out: CaptureOutput,
    vectors: VectorClasses,
    next_id: ExprId,
}

impl Session {
    fn new() -> Self {
        let out = CaptureOutput::new();
        let mut interp = Interpreter::new(out.clone());
        let vectors = interp.load_prelude();
        Self {
            interp,
            out,
            vectors,
            next_id: ExprId(0),
        }
    }

    fn exec(&mut self, source: &str) -> Result<(), RuntimeError> {
        let sf = SourceFile::new("native.pitta", source);
        let parsed = parse_source_from(&sf, self.next_id);
        assert!(!parsed.errors.has_errors(), "{:?}", parsed.errors.errors);
        self.next_id = parsed.next_id;
        let resolution = resolve(&parsed.program, &sf);
        assert!(!resolution.errors.has_errors(), "{:?}", resolution.errors.errors);
        self.interp.interpret(&parsed.program, resolution.locals)
    }

    fn lines(&self) -> Vec<String> {
        self.out.lines()
    }
}

fn lines(expected: &[&str]) -> Vec<String> {
    expected.iter().map(|s| s.to_string()).collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// Vector classes
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn vector_fields_read_and_write() {
    let mut s = Session::new();
    s.exec(
        r#"
var v = vec2(1.0, 2.0);
print v.x;
v.y = 5.0;
print v.y;
print v;
"#,
    )
    .unwrap();
    assert_eq!(s.lines(), lines(&["1.000000", "5.000000", "<vec2 instance>"]));
}

#[test]
fn vector_methods() {
    let mut s = Session::new();
    s.exec(
        r#"
var a = vec3(1.0, 2.0, 3.0);
var b = vec3(4.0, 5.0, 6.0);
var sum = a.add(b);
print str(sum.x) ++ ",";
print str(sum.z);
print str(b.sub(a).y);
print str(a.scale(2.0).z);
print str(b.div(2.0).x);
print a.dot(b);
"#,
    )
    .unwrap();
    assert_eq!(
        s.lines(),
        lines(&["5.000000,", "9.000000", "3.000000", "6.000000", "2.000000", "32.000000"])
    );
}

#[test]
fn vector_results_are_independent() {
    let mut s = Session::new();
    s.exec(
        r#"
var a = vec2(1.0, 1.0);
var b = a.scale(1.0);
b.x = 9.0;
print a.x;
"#,
    )
    .unwrap();
    assert_eq!(s.lines(), lines(&["1.000000"]));
}

#[test]
fn vector_constructor_requires_floats() {
    let mut s = Session::new();
    let err = s.exec("vec2(1, 2);").unwrap_err();
    assert_eq!(err.to_string(), "[line 1] Expected Float but got Int.");
    let err = s.exec("vec4(1.0, 2.0);").unwrap_err();
    assert!(matches!(err, RuntimeError::Arity { expected: 4, got: 2, .. }));
}

#[test]
fn vector_methods_check_their_operands() {
    let mut s = Session::new();
    let err = s.exec("vec2(1.0, 1.0).add(vec3(1.0, 1.0, 1.0));").unwrap_err();
    assert_eq!(err.to_string(), "[line 1] Expected a vec2, got Instance.");
    let err = s.exec("vec2(1.0, 1.0).scale(2);").unwrap_err();
    assert!(matches!(err, RuntimeError::Type { .. }));
}

#[test]
fn bound_fields_keep_their_kind() {
    let mut s = Session::new();
    s.exec("var v = vec2(1.0, 2.0);").unwrap();
    let err = s.exec("v.x = 1;").unwrap_err();
    assert_eq!(err.to_string(), "[line 1] Cannot store Int into a bound Float.");
    let err = s.exec("v.x = null;").unwrap_err();
    assert_eq!(err.to_string(), "[line 1] Cannot set a bound Float to Null or Undefined.");
}

#[test]
fn script_subclass_of_native_class() {
    let mut s = Session::new();
    s.exec(
        r#"
class Pos < vec2 {
  lengthSquared() { return this.dot(this); }
}
var p = Pos(3.0, 4.0);
print p.lengthSquared();
print p;
"#,
    )
    .unwrap();
    assert_eq!(s.lines(), lines(&["25.000000", "<Pos instance>"]));
}

// ══════════════════════════════════════════════════════════════════════════════
// Host interop
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn bind_existing_shares_storage_both_ways() {
    let mut s = Session::new();
    let host = Rc::new(Vec2::new([1.0, 2.0]));
    let value = s.vectors.vec2.bind_existing(&mut s.interp, Rc::clone(&host));
    s.interp.define_global("pos", value);

    s.exec("pos.x = 10.0;").unwrap();
    assert_eq!(host.get(0), 10.0);

    host.set(1, 3.0);
    s.exec("print pos.y;").unwrap();
    assert_eq!(s.lines(), lines(&["3.000000"]));
}

#[test]
fn handle_recovers_host_object() {
    let mut s = Session::new();
    s.exec("var v = vec2(7.0, 8.0);").unwrap();
    let Some(Value::Instance(id)) = s.interp.get_global("v") else {
        panic!("v is not an instance");
    };
    let host = s.vectors.vec2.host(&s.interp, id).unwrap();
    assert_eq!(host.values(), [7.0, 8.0]);
    assert!(s.vectors.vec3.host(&s.interp, id).is_none());
}

#[test]
fn custom_native_class() {
    let mut s = Session::new();
    let handle = counter_class(&mut s.interp);
    s.exec(
        r#"
var c = Counter(5);
print c.bump(2);
print c.count;
c.label = "hits";
print c.describe();
print c.enabled;
c.enabled = false;
"#,
    )
    .unwrap();
    assert_eq!(s.lines(), lines(&["7", "7", "hits=7", "true"]));

    let Some(Value::Instance(id)) = s.interp.get_global("c") else {
        panic!("c is not an instance");
    };
    let counter = handle.host(&s.interp, id).unwrap();
    assert_eq!(counter.count.get(), 7);
    assert_eq!(*counter.label.borrow(), "hits");
    assert!(!counter.enabled.get());
}

#[test]
fn native_method_arity_is_checked() {
    let mut s = Session::new();
    counter_class(&mut s.interp);
    let err = s.exec("Counter(0).bump();").unwrap_err();
    assert!(matches!(err, RuntimeError::Arity { expected: 1, got: 0, .. }));
}

#[test]
fn native_methods_are_cached_per_instance() {
    let mut s = Session::new();
    counter_class(&mut s.interp);
    s.exec("var c = Counter(0); print c.bump == c.bump;").unwrap();
    assert_eq!(s.lines(), lines(&["true"]));
}

#[test]
fn bound_global_scalar() {
    let mut s = Session::new();
    let speed = Rc::new(Cell::new(1.5f32));
    s.interp.define_global("speed", Value::bound_float(Rc::clone(&speed)));
    s.exec("speed = speed * 2.0; var copy = speed; copy = 0.0;").unwrap();
    assert_eq!(speed.get(), 3.0);
}

#[test]
fn wrap_and_unwrap_host_objects() {
    let mut s = Session::new();
    let value = wrap_host(&mut s.interp, Rc::new(Vec2::new([0.5, 0.25]))).unwrap();
    let host = host_object::<Vec2>(&s.interp, &value).unwrap();
    assert_eq!(host.values(), [0.5, 0.25]);
    assert_eq!(s.interp.stringify(&value), "<vec2 instance>");

    let err = wrap_host(&mut s.interp, Rc::new(42u8)).unwrap_err();
    assert!(matches!(err, RuntimeError::Type { .. }));
}
