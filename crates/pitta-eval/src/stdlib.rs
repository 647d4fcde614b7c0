//! Built-in functions and sentinels.

use crate::error::{RuntimeError, RuntimeResult};
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Define the conversion functions, `input` and the `Null`/`Undefined`
/// sentinels in globals.
pub fn register(interp: &mut Interpreter) {
    interp.define_native("int", 1, to_int);
    interp.define_native("float", 1, to_float);
    interp.define_native("string", 1, to_string);
    interp.define_native("str", 1, to_string);
    interp.define_native("bool", 1, to_bool);
    interp.define_native("input", 0, input);
    interp.define_global("Null", Value::Null);
    interp.define_global("Undefined", Value::Undefined);
    tracing::debug!("registered stdlib");
}

fn to_int(interp: &mut Interpreter, args: &[Value]) -> RuntimeResult<Value> {
    let converted = match args[0].detach() {
        Value::Int(n) => Some(n),
        // Saturating truncation toward zero; NaN becomes 0.
        Value::Float(x) => Some(x as i32),
        Value::Bool(b) => Some(i32::from(b)),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };
    match converted {
        Some(v) => Ok(Value::Int(v)),
        None => Err(conversion_error(interp, &args[0], "Int")),
    }
}

fn to_float(interp: &mut Interpreter, args: &[Value]) -> RuntimeResult<Value> {
    let converted = match args[0].detach() {
        Value::Int(n) => Some(n as f32),
        Value::Float(x) => Some(x),
        Value::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    };
    match converted {
        Some(v) => Ok(Value::Float(v)),
        None => Err(conversion_error(interp, &args[0], "Float")),
    }
}

fn to_string(interp: &mut Interpreter, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::String(interp.stringify(&args[0])))
}

fn to_bool(_: &mut Interpreter, args: &[Value]) -> RuntimeResult<Value> {
    Ok(Value::Bool(args[0].truthy()))
}

fn input(interp: &mut Interpreter, _: &[Value]) -> RuntimeResult<Value> {
    Ok(match interp.output_mut().read_line()? {
        Some(line) => Value::String(line),
        None => Value::Undefined,
    })
}

fn conversion_error(interp: &Interpreter, value: &Value, target: &str) -> RuntimeError {
    match value.detach() {
        Value::String(s) => interp.type_error(format!("Cannot convert '{s}' to {target}.")),
        other => interp.type_error(format!("Cannot convert {} to {target}.", other.kind())),
    }
}
