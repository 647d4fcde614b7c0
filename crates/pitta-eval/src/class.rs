//! Classes and instances.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::RuntimeResult;
use crate::heap::{CallableId, ClassId};
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Builds a host object for a native class from constructor arguments.
pub type GenerateFn = Rc<dyn Fn(&mut Interpreter, &[Value]) -> RuntimeResult<HostObject>>;

/// A class: name, optional superclass and its own method table.
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub superclass: Option<ClassId>,
    pub methods: HashMap<String, CallableId>,
    pub constructor: Constructor,
}

/// How calling a class produces an instance.
#[derive(Debug, Clone)]
pub enum Constructor {
    /// Allocate an empty instance and run `init` if one is found.
    Script,
    /// Run the bridge generator and wrap the host object it returns.
    Native(NativeConstructor),
}

#[derive(Clone)]
pub struct NativeConstructor {
    pub arity: usize,
    pub generate: GenerateFn,
}

impl fmt::Debug for NativeConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeConstructor")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// A host object plus the fields that expose it to scripts.
pub struct HostObject {
    pub object: Rc<dyn Any>,
    pub fields: Vec<(String, Value)>,
}

pub struct Instance {
    pub class: ClassId,
    pub fields: HashMap<String, Value>,
    /// Methods already bound to this instance, by name.
    pub bound_methods: HashMap<String, CallableId>,
    pub host: Option<Rc<dyn Any>>,
}

impl Instance {
    pub fn new(class: ClassId) -> Self {
        Self {
            class,
            fields: HashMap::new(),
            bound_methods: HashMap::new(),
            host: None,
        }
    }

    pub fn with_host(class: ClassId, host: HostObject) -> Self {
        Self {
            class,
            fields: host.fields.into_iter().collect(),
            bound_methods: HashMap::new(),
            host: Some(host.object),
        }
    }

    /// Field value as an owning snapshot.
    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).map(Value::detach)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class)
            .field("fields", &self.fields)
            .field("bound_methods", &self.bound_methods)
            .field("host", &self.host.is_some())
            .finish()
    }
}
