//! The native bridge: exposing host types and functions to scripts.
//!
//! A host type `T` becomes a Pitta class through [`NativeClass`]. Its fields
//! are exposed as bound values over `Rc<Cell<_>>` storage inside `T`, so reads
//! and writes from either side are seen by the other.
//!
//! ```text
//! struct Counter { count: Rc<Cell<i32>> }
//!
//! let counter = NativeClass::new("Counter", 0, |_, _| Ok(Counter::default()))
//!     .fields(|c| vec![("count", Value::bound_int(c.count.clone()))])
//!     .method("bump", 0, |_, _, c| { c.count.set(c.count.get() + 1); Ok(Value::Null) })
//!     .register(&mut interpreter);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::callable::{Callable, HostMethod, NativeFn};
use crate::class::{Class, Constructor, GenerateFn, HostObject, Instance, NativeConstructor};
use crate::error::RuntimeResult;
use crate::heap::{ClassId, InstanceId};
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Builds a host object from constructor arguments.
pub type Generator<T> = fn(&mut Interpreter, &[Value]) -> RuntimeResult<T>;

/// Lists the script-visible fields of a host object.
pub type FieldAdapter<T> = fn(&T) -> Vec<(&'static str, Value)>;

/// A method body with typed access to the receiver.
pub type Method<T> = fn(&mut Interpreter, &[Value], &T) -> RuntimeResult<Value>;

type ErasedFields = Rc<dyn Fn(&dyn Any) -> Vec<(String, Value)>>;

/// Registration record for a host type, keyed by its `TypeId`.
pub(crate) struct NativeType {
    pub(crate) class: ClassId,
    pub(crate) fields: ErasedFields,
}

fn no_fields<T>(_: &T) -> Vec<(&'static str, Value)> {
    Vec::new()
}

fn owned_fields(fields: Vec<(&'static str, Value)>) -> Vec<(String, Value)> {
    fields
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Builder describing a host type as a class.
pub struct NativeClass<T> {
    name: String,
    arity: usize,
    generator: Generator<T>,
    fields: FieldAdapter<T>,
    methods: Vec<(String, usize, Method<T>)>,
}

impl<T: 'static> NativeClass<T> {
    /// `arity` is the number of arguments the class is called with.
    pub fn new(name: impl Into<String>, arity: usize, generator: Generator<T>) -> Self {
        Self {
            name: name.into(),
            arity,
            generator,
            fields: no_fields::<T>,
            methods: Vec::new(),
        }
    }

    pub fn fields(mut self, adapter: FieldAdapter<T>) -> Self {
        self.fields = adapter;
        self
    }

    pub fn method(mut self, name: impl Into<String>, arity: usize, method: Method<T>) -> Self {
        self.methods.push((name.into(), arity, method));
        self
    }

    /// Allocate the class and its methods, and define the class in globals.
    pub fn register(self, interp: &mut Interpreter) -> NativeClassHandle<T> {
        let adapter = self.fields;

        let mut methods = HashMap::new();
        for (name, arity, body) in self.methods {
            let class_name = self.name.clone();
            let method: HostMethod = Rc::new(
                move |interp: &mut Interpreter, args: &[Value], host: &dyn Any| {
                    let host = host.downcast_ref::<T>().ok_or_else(|| {
                        interp.type_error(format!("Receiver is not a {class_name}."))
                    })?;
                    body(interp, args, host)
                },
            );
            let id = interp.heap_mut().alloc_callable(Callable::NativeBound {
                name: name.clone(),
                arity,
                method,
                receiver: None,
            });
            methods.insert(name, id);
        }

        let generator = self.generator;
        let generate: GenerateFn = Rc::new(move |interp: &mut Interpreter, args: &[Value]| {
            let object = Rc::new(generator(interp, args)?);
            let fields = owned_fields(adapter(&object));
            Ok(HostObject { object, fields })
        });

        tracing::debug!(name = %self.name, arity = self.arity, methods = methods.len(), "register native class");
        let class = interp.heap_mut().alloc_class(Class {
            name: self.name.clone(),
            superclass: None,
            methods,
            constructor: Constructor::Native(NativeConstructor {
                arity: self.arity,
                generate,
            }),
        });

        let erased: ErasedFields = Rc::new(move |any: &dyn Any| {
            any.downcast_ref::<T>()
                .map(|host| owned_fields(adapter(host)))
                .unwrap_or_default()
        });
        interp
            .native_types
            .insert(TypeId::of::<T>(), NativeType { class, fields: erased });
        interp.define_global(self.name, Value::Class(class));

        NativeClassHandle {
            class,
            fields: adapter,
            _host: PhantomData,
        }
    }
}

/// A registered host class.
pub struct NativeClassHandle<T> {
    class: ClassId,
    fields: FieldAdapter<T>,
    _host: PhantomData<fn() -> T>,
}

impl<T> Clone for NativeClassHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NativeClassHandle<T> {}

impl<T: 'static> NativeClassHandle<T> {
    pub fn class_id(&self) -> ClassId {
        self.class
    }

    /// Wrap an existing host object without running the generator.
    /// Script and host share the object's field storage.
    pub fn bind_existing(&self, interp: &mut Interpreter, object: Rc<T>) -> Value {
        let fields = owned_fields((self.fields)(&object));
        let instance = Instance::with_host(self.class, HostObject { object, fields });
        Value::Instance(interp.heap_mut().alloc_instance(instance))
    }

    /// The host object behind `instance`, if it is an instance of this class
    /// or a subclass and carries a `T`.
    pub fn host(&self, interp: &Interpreter, instance: InstanceId) -> Option<Rc<T>> {
        let object = interp.heap().instance(instance);
        if !interp.heap().inherits(object.class, self.class) {
            return None;
        }
        object.host.clone()?.downcast::<T>().ok()
    }
}

/// The `T` behind any bridged instance value.
pub fn host_object<T: 'static>(interp: &Interpreter, value: &Value) -> Option<Rc<T>> {
    let Value::Instance(id) = value else {
        return None;
    };
    interp.heap().instance(*id).host.clone()?.downcast::<T>().ok()
}

/// Wrap `object` as an instance of whichever class registered `T`.
pub fn wrap_host<T: 'static>(interp: &mut Interpreter, object: Rc<T>) -> RuntimeResult<Value> {
    let Some(native) = interp.native_types.get(&TypeId::of::<T>()) else {
        return Err(interp.type_error(format!(
            "No class is registered for host type {}.",
            std::any::type_name::<T>()
        )));
    };
    let class = native.class;
    let any: &dyn Any = &*object;
    let fields = (native.fields)(any);
    let instance = Instance::with_host(class, HostObject { object, fields });
    Ok(Value::Instance(interp.heap_mut().alloc_instance(instance)))
}

impl Interpreter {
    /// Define a host function in globals.
    pub fn define_native(&mut self, name: &str, arity: usize, function: NativeFn) {
        let id = self.heap_mut().alloc_callable(Callable::Native {
            name: name.to_string(),
            arity,
            function,
        });
        self.define_global(name, Value::Function(id));
    }
}
