//! The interpreter-owned arena of classes, instances and callables.
//!
//! Objects are addressed by typed `Copy` handles and live until the heap is
//! dropped. There is no collection.

use crate::callable::Callable;
use crate::class::{Class, Constructor, Instance, NativeConstructor};

macro_rules! handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

handle!(
    /// Handle to a [`Class`] in the heap.
    ClassId
);
handle!(
    /// Handle to an [`Instance`] in the heap.
    InstanceId
);
handle!(
    /// Handle to a [`Callable`] in the heap.
    CallableId
);

#[derive(Debug, Default)]
pub struct Heap {
    classes: Vec<Class>,
    instances: Vec<Instance>,
    callables: Vec<Callable>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Allocation ────────────────────────────────────────────────────────────

    pub fn alloc_class(&mut self, class: Class) -> ClassId {
        self.classes.push(class);
        ClassId(self.classes.len() as u32 - 1)
    }

    pub fn alloc_instance(&mut self, instance: Instance) -> InstanceId {
        self.instances.push(instance);
        InstanceId(self.instances.len() as u32 - 1)
    }

    pub fn alloc_callable(&mut self, callable: Callable) -> CallableId {
        self.callables.push(callable);
        CallableId(self.callables.len() as u32 - 1)
    }

    // ── Access ────────────────────────────────────────────────────────────────
    //
    // Handles are only minted by this heap, so indexing cannot miss.

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.index()]
    }

    pub fn instance(&self, id: InstanceId) -> &Instance {
        &self.instances[id.index()]
    }

    pub fn instance_mut(&mut self, id: InstanceId) -> &mut Instance {
        &mut self.instances[id.index()]
    }

    pub fn callable(&self, id: CallableId) -> &Callable {
        &self.callables[id.index()]
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn callable_count(&self) -> usize {
        self.callables.len()
    }

    // ── Class Queries ─────────────────────────────────────────────────────────

    /// Walk `class` and its superclasses; the first class defining `name` wins.
    pub fn find_method(&self, class: ClassId, name: &str) -> Option<CallableId> {
        let mut current = Some(class);
        while let Some(id) = current {
            let class = self.class(id);
            if let Some(method) = class.methods.get(name) {
                return Some(*method);
            }
            current = class.superclass;
        }
        None
    }

    /// The nearest native constructor on the superclass chain, if any.
    pub fn native_constructor(&self, class: ClassId) -> Option<&NativeConstructor> {
        let mut current = Some(class);
        while let Some(id) = current {
            let class = self.class(id);
            if let Constructor::Native(native) = &class.constructor {
                return Some(native);
            }
            current = class.superclass;
        }
        None
    }

    /// Arguments a call to `class` takes: `init`'s arity, else the native
    /// generator's, else zero.
    pub fn constructor_arity(&self, class: ClassId) -> usize {
        if let Some(init) = self.find_method(class, "init") {
            return self.callable(init).arity();
        }
        self.native_constructor(class).map_or(0, |native| native.arity)
    }

    /// Whether `class` is `ancestor` or inherits from it.
    pub fn inherits(&self, class: ClassId, ancestor: ClassId) -> bool {
        let mut current = Some(class);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.class(id).superclass;
        }
        false
    }
}
