//! Operator semantics on already-evaluated operands.
//!
//! Errors are plain messages; the interpreter attaches the line.

use pitta_types::ast::{BinOp, UnaryOp};

use crate::value::Value;

type OpResult = Result<Value, String>;

/// Apply a binary operator. Operands may be bound; they are read, never written.
pub fn binary(op: BinOp, left: &Value, right: &Value) -> OpResult {
    let (left, right) = (left.detach(), right.detach());
    match op {
        BinOp::Eq => Ok(Value::Bool(left == right)),
        BinOp::NotEq => Ok(Value::Bool(left != right)),

        BinOp::Add => numeric(op, &left, &right, i32::wrapping_add, |a, b| a + b),
        BinOp::Sub => numeric(op, &left, &right, i32::wrapping_sub, |a, b| a - b),
        BinOp::Mul => numeric(op, &left, &right, i32::wrapping_mul, |a, b| a * b),
        BinOp::Div => {
            if matches!(right, Value::Int(0)) && matches!(left, Value::Int(_)) {
                return Err("Division by zero.".to_string());
            }
            numeric(op, &left, &right, i32::wrapping_div, |a, b| a / b)
        }

        BinOp::Less => compare(op, &left, &right, |a, b| a < b, |a, b| a < b),
        BinOp::Greater => compare(op, &left, &right, |a, b| a > b, |a, b| a > b),
        BinOp::LessEq => compare(op, &left, &right, |a, b| a <= b, |a, b| a <= b),
        BinOp::GreaterEq => compare(op, &left, &right, |a, b| a >= b, |a, b| a >= b),

        BinOp::Mod => {
            if matches!(right, Value::Int(0)) && matches!(left, Value::Int(_)) {
                return Err("Modulo by zero.".to_string());
            }
            integer(op, &left, &right, i32::wrapping_rem)
        }
        BinOp::BitAnd => integer(op, &left, &right, |a, b| a & b),
        BinOp::BitOr => integer(op, &left, &right, |a, b| a | b),
        BinOp::BitXor => integer(op, &left, &right, |a, b| a ^ b),
        // wrapping_shl/shr mask the count to 0..31.
        BinOp::Shl => integer(op, &left, &right, |a, b| a.wrapping_shl(b as u32)),
        BinOp::Shr => integer(op, &left, &right, |a, b| a.wrapping_shr(b as u32)),

        BinOp::Concat => match (&left, &right) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            _ => Err(operand_error(op, "two Strings", &left, &right)),
        },
    }
}

/// Apply a unary operator.
pub fn unary(op: UnaryOp, operand: &Value) -> OpResult {
    let operand = operand.detach();
    match (op, &operand) {
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Neg, other) => Err(format!(
            "Operand of '-' must be an Int or a Float, got {}.",
            other.kind()
        )),
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.truthy())),
        (UnaryOp::BitNot, Value::Int(n)) => Ok(Value::Int(!n)),
        (UnaryOp::BitNot, other) => {
            Err(format!("Operand of '~' must be an Int, got {}.", other.kind()))
        }
    }
}

fn numeric(
    op: BinOp,
    left: &Value,
    right: &Value,
    int_op: fn(i32, i32) -> i32,
    float_op: fn(f32, f32) -> f32,
) -> OpResult {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(*a, *b))),
        _ => Err(operand_error(op, "two Ints or two Floats", left, right)),
    }
}

fn compare(
    op: BinOp,
    left: &Value,
    right: &Value,
    int_op: fn(&i32, &i32) -> bool,
    float_op: fn(&f32, &f32) -> bool,
) -> OpResult {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Bool(int_op(a, b))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Bool(float_op(a, b))),
        _ => Err(operand_error(op, "two Ints or two Floats", left, right)),
    }
}

fn integer(op: BinOp, left: &Value, right: &Value, int_op: fn(i32, i32) -> i32) -> OpResult {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
        _ => Err(operand_error(op, "two Ints", left, right)),
    }
}

fn operand_error(op: BinOp, expected: &str, left: &Value, right: &Value) -> String {
    format!(
        "Operands of '{}' must be {expected}, got {} and {}.",
        op.as_str(),
        left.kind(),
        right.kind()
    )
}
