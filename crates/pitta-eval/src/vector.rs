//! The `vec2`, `vec3` and `vec4` native classes.
//!
//! Components live in shared cells, so `v.x = 2.0` in a script and
//! [`Vector::set`] on the host side update the same storage.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::RuntimeResult;
use crate::interpreter::Interpreter;
use crate::native::{host_object, wrap_host, NativeClass, NativeClassHandle};
use crate::value::Value;

const AXES: [&str; 4] = ["x", "y", "z", "w"];

/// An `N`-component float vector.
#[derive(Debug, Clone)]
pub struct Vector<const N: usize> {
    components: [Rc<Cell<f32>>; N],
}

pub type Vec2 = Vector<2>;
pub type Vec3 = Vector<3>;
pub type Vec4 = Vector<4>;

impl<const N: usize> Vector<N> {
    pub fn new(values: [f32; N]) -> Self {
        Self {
            components: values.map(|v| Rc::new(Cell::new(v))),
        }
    }

    pub fn values(&self) -> [f32; N] {
        std::array::from_fn(|i| self.components[i].get())
    }

    /// Panics if `axis >= N`.
    pub fn get(&self, axis: usize) -> f32 {
        self.components[axis].get()
    }

    /// Panics if `axis >= N`.
    pub fn set(&self, axis: usize, value: f32) {
        self.components[axis].set(value);
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.components
            .iter()
            .zip(&other.components)
            .map(|(a, b)| a.get() * b.get())
            .sum()
    }

    fn zip_with(&self, other: &Self, f: impl Fn(f32, f32) -> f32) -> Self {
        let (a, b) = (self.values(), other.values());
        Self::new(std::array::from_fn(|i| f(a[i], b[i])))
    }

    fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(self.values().map(f))
    }

    fn fields(&self) -> Vec<(&'static str, Value)> {
        AXES.iter()
            .zip(&self.components)
            .map(|(axis, cell)| (*axis, Value::bound_float(Rc::clone(cell))))
            .collect()
    }
}

/// Handles for the three registered vector classes.
#[derive(Clone, Copy)]
pub struct VectorClasses {
    pub vec2: NativeClassHandle<Vec2>,
    pub vec3: NativeClassHandle<Vec3>,
    pub vec4: NativeClassHandle<Vec4>,
}

pub fn register(interp: &mut Interpreter) -> VectorClasses {
    VectorClasses {
        vec2: register_vector::<2>(interp, "vec2"),
        vec3: register_vector::<3>(interp, "vec3"),
        vec4: register_vector::<4>(interp, "vec4"),
    }
}

fn register_vector<const N: usize>(
    interp: &mut Interpreter,
    name: &str,
) -> NativeClassHandle<Vector<N>> {
    NativeClass::new(name, N, construct::<N>)
        .fields(Vector::<N>::fields)
        .method("add", 1, add::<N>)
        .method("sub", 1, sub::<N>)
        .method("scale", 1, scale::<N>)
        .method("div", 1, div::<N>)
        .method("dot", 1, dot::<N>)
        .register(interp)
}

// ── Constructor and Methods ───────────────────────────────────────────────────

fn float_arg(interp: &Interpreter, value: &Value) -> RuntimeResult<f32> {
    value.as_float().map_err(|err| err.at(interp.current_line()))
}

fn vector_arg<const N: usize>(interp: &Interpreter, value: &Value) -> RuntimeResult<Rc<Vector<N>>> {
    host_object::<Vector<N>>(interp, value).ok_or_else(|| {
        interp.type_error(format!("Expected a vec{N}, got {}.", value.kind()))
    })
}

fn construct<const N: usize>(interp: &mut Interpreter, args: &[Value]) -> RuntimeResult<Vector<N>> {
    let mut values = [0.0; N];
    for (slot, arg) in values.iter_mut().zip(args) {
        *slot = float_arg(interp, arg)?;
    }
    Ok(Vector::new(values))
}

fn add<const N: usize>(interp: &mut Interpreter, args: &[Value], v: &Vector<N>) -> RuntimeResult<Value> {
    let other = vector_arg::<N>(interp, &args[0])?;
    wrap_host(interp, Rc::new(v.zip_with(&other, |a, b| a + b)))
}

fn sub<const N: usize>(interp: &mut Interpreter, args: &[Value], v: &Vector<N>) -> RuntimeResult<Value> {
    let other = vector_arg::<N>(interp, &args[0])?;
    wrap_host(interp, Rc::new(v.zip_with(&other, |a, b| a - b)))
}

fn scale<const N: usize>(interp: &mut Interpreter, args: &[Value], v: &Vector<N>) -> RuntimeResult<Value> {
    let factor = float_arg(interp, &args[0])?;
    wrap_host(interp, Rc::new(v.map(|c| c * factor)))
}

fn div<const N: usize>(interp: &mut Interpreter, args: &[Value], v: &Vector<N>) -> RuntimeResult<Value> {
    let divisor = float_arg(interp, &args[0])?;
    wrap_host(interp, Rc::new(v.map(|c| c / divisor)))
}

fn dot<const N: usize>(interp: &mut Interpreter, args: &[Value], v: &Vector<N>) -> RuntimeResult<Value> {
    let other = vector_arg::<N>(interp, &args[0])?;
    Ok(Value::Float(v.dot(&other)))
}
