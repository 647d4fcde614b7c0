//! The tree-walking interpreter.

use std::any::TypeId;
use std::collections::HashMap;
use std::rc::Rc;

use pitta_resolver::Locals;
use pitta_types::ast::*;

use crate::callable::Callable;
use crate::class::{Class, Constructor, Instance};
use crate::env::{AssignError, EnvRef, Environment};
use crate::error::{RuntimeError, RuntimeResult};
use crate::heap::{CallableId, ClassId, Heap, InstanceId};
use crate::native::NativeType;
use crate::ops;
use crate::output::Output;
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;
use crate::vector::VectorClasses;

/// Default limit on nested script calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

/// Tunables for an [`Interpreter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    pub max_call_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl InterpreterConfig {
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecResult {
    Completed,
    /// A `return` is unwinding to the nearest call.
    Returning(Value),
}

pub struct Interpreter {
    heap: Heap,
    globals: EnvRef,
    environment: EnvRef,
    locals: Locals,
    output: Box<dyn Output>,
    config: InterpreterConfig,
    call_depth: usize,
    line: u32,
    pub(crate) native_types: HashMap<TypeId, NativeType>,
}

impl Interpreter {
    /// An interpreter with an empty global scope.
    pub fn new(output: impl Output + 'static) -> Self {
        Self::with_config(InterpreterConfig::default(), output)
    }

    pub fn with_config(config: InterpreterConfig, output: impl Output + 'static) -> Self {
        let globals = Environment::new().into_ref();
        Self {
            heap: Heap::new(),
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            output: Box::new(output),
            config,
            call_depth: 0,
            line: 0,
            native_types: HashMap::new(),
        }
    }

    /// Define the standard library and the vector classes in globals.
    pub fn load_prelude(&mut self) -> VectorClasses {
        crate::stdlib::register(self);
        crate::vector::register(self)
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    /// The innermost scope statements currently execute in.
    pub fn environment(&self) -> &EnvRef {
        &self.environment
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn output_mut(&mut self) -> &mut dyn Output {
        self.output.as_mut()
    }

    /// Line of the expression being evaluated; natives use it for errors.
    pub fn current_line(&self) -> u32 {
        self.line
    }

    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    pub fn define_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.borrow_mut().define(name, value);
    }

    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.globals.borrow().get(name)
    }

    /// A `TypeError` at the current line.
    pub fn type_error(&self, message: impl Into<String>) -> RuntimeError {
        RuntimeError::type_error(self.line, message)
    }

    pub fn stringify(&self, value: &Value) -> String {
        value.to_display_string(&self.heap)
    }

    // ── Entry Points ──────────────────────────────────────────────────────────

    /// Execute `program` using the resolver's side table.
    ///
    /// The table is merged with earlier ones so functions from previous runs
    /// still resolve. On error the environment is reset to the globals.
    #[tracing::instrument(level = "debug", skip_all, fields(stmts = program.stmts.len()))]
    pub fn interpret(&mut self, program: &Program, locals: Locals) -> RuntimeResult<()> {
        self.locals.extend(locals);
        for stmt in &program.stmts {
            if let Err(err) = self.execute(stmt) {
                tracing::debug!(error = %err, "execution halted");
                self.environment = Rc::clone(&self.globals);
                self.call_depth = 0;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Call a function or class value from host code.
    ///
    /// Errors raised before any script line runs report line 0.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> RuntimeResult<Value> {
        self.line = 0;
        self.call_value(callee.detach(), args)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    pub fn execute(&mut self, stmt: &Stmt) -> RuntimeResult<ExecResult> {
        ensure_sufficient_stack(|| self.execute_inner(stmt))
    }

    fn execute_inner(&mut self, stmt: &Stmt) -> RuntimeResult<ExecResult> {
        match stmt {
            Stmt::Expr(s) => {
                self.evaluate(&s.expr)?;
                Ok(ExecResult::Completed)
            }
            Stmt::Print(s) => {
                let value = self.evaluate(&s.expr)?;
                let text = self.stringify(&value);
                self.output.write_line(&text)?;
                Ok(ExecResult::Completed)
            }
            Stmt::Var(decl) => {
                let value = match &decl.initializer {
                    Some(init) => self.evaluate(init)?,
                    None => Value::Undefined,
                };
                self.environment.borrow_mut().define(&decl.name.name, value);
                Ok(ExecResult::Completed)
            }
            Stmt::Block(block) => {
                let scope = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(&block.stmts, scope.into_ref())
            }
            Stmt::If(s) => {
                if self.evaluate(&s.condition)?.truthy() {
                    self.execute(&s.then_branch)
                } else if let Some(else_branch) = &s.else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(ExecResult::Completed)
                }
            }
            Stmt::While(s) => {
                while self.evaluate(&s.condition)?.truthy() {
                    if let ExecResult::Returning(value) = self.execute(&s.body)? {
                        return Ok(ExecResult::Returning(value));
                    }
                }
                Ok(ExecResult::Completed)
            }
            Stmt::Function(decl) => {
                tracing::debug!(name = %decl.name.name, "declare function");
                let function = self.heap.alloc_callable(Callable::Script {
                    decl: Rc::clone(decl),
                    closure: Rc::clone(&self.environment),
                    is_initializer: false,
                });
                self.environment
                    .borrow_mut()
                    .define(&decl.name.name, Value::Function(function));
                Ok(ExecResult::Completed)
            }
            Stmt::Class(decl) => {
                self.declare_class(decl)?;
                Ok(ExecResult::Completed)
            }
            Stmt::Return(s) => {
                let value = match &s.value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                Ok(ExecResult::Returning(value))
            }
        }
    }

    /// Run `stmts` in `scope`, restoring the previous environment afterwards
    /// whether they complete, return or fail.
    pub fn execute_block(&mut self, stmts: &[Stmt], scope: EnvRef) -> RuntimeResult<ExecResult> {
        let previous = std::mem::replace(&mut self.environment, scope);
        let result = self.execute_all(stmts);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, stmts: &[Stmt]) -> RuntimeResult<ExecResult> {
        for stmt in stmts {
            if let ExecResult::Returning(value) = self.execute(stmt)? {
                return Ok(ExecResult::Returning(value));
            }
        }
        Ok(ExecResult::Completed)
    }

    fn declare_class(&mut self, decl: &ClassDecl) -> RuntimeResult<()> {
        let name = &decl.name.name;
        tracing::debug!(%name, methods = decl.methods.len(), "declare class");
        self.environment.borrow_mut().define(name, Value::Null);

        let superclass = match &decl.superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(id) => Some(id),
                other => {
                    return Err(RuntimeError::type_error(
                        expr.span.line(),
                        format!("Superclass must be a class, got {}.", other.kind()),
                    ))
                }
            },
            None => None,
        };

        let method_scope = match superclass {
            Some(id) => {
                let mut scope = Environment::with_enclosing(Rc::clone(&self.environment));
                scope.define("super", Value::Class(id));
                scope.into_ref()
            }
            None => Rc::clone(&self.environment),
        };

        let mut methods = HashMap::new();
        for method in &decl.methods {
            let callable = self.heap.alloc_callable(Callable::Script {
                decl: Rc::clone(method),
                closure: Rc::clone(&method_scope),
                is_initializer: method.name.name == "init",
            });
            methods.insert(method.name.name.clone(), callable);
        }

        let class = self.heap.alloc_class(Class {
            name: name.clone(),
            superclass,
            methods,
            constructor: Constructor::Script,
        });
        self.environment
            .borrow_mut()
            .assign(name, &Value::Class(class))
            .map_err(|err| self.assign_error(decl.name.span.line(), name, err))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate `expr` to an owning value.
    pub fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        ensure_sufficient_stack(|| self.evaluate_inner(expr))
    }

    fn evaluate_inner(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        let line = expr.span.line();
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(literal_value(literal)),
            ExprKind::Grouping(inner) => self.evaluate(inner),
            ExprKind::Variable(name) => self.look_up(expr.id, &name.name, line),
            ExprKind::This => self.look_up(expr.id, "this", line),
            ExprKind::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.assign_variable(expr.id, &name.name, &value, line)?;
                Ok(value)
            }
            ExprKind::Binary { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                ops::binary(*op, &left, &right).map_err(|msg| RuntimeError::type_error(line, msg))
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.evaluate(operand)?;
                ops::unary(*op, &operand).map_err(|msg| RuntimeError::type_error(line, msg))
            }
            ExprKind::Logical { left, op, right } => {
                let left = self.evaluate(left)?;
                let short_circuit = match op {
                    LogicalOp::Or => left.truthy(),
                    LogicalOp::And => !left.truthy(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }
            ExprKind::Call { callee, args } => {
                let callee = self.evaluate(callee)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate(arg)?);
                }
                self.line = line;
                Ok(self.call_value(callee, values)?.detach())
            }
            ExprKind::Get { object, name } => {
                let object = self.evaluate(object)?;
                let Value::Instance(instance) = object else {
                    return Err(RuntimeError::type_error(
                        line,
                        format!("Only instances have properties, got {}.", object.kind()),
                    ));
                };
                self.get_property(instance, &name.name, line)
            }
            ExprKind::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;
                let Value::Instance(instance) = object else {
                    return Err(RuntimeError::type_error(
                        line,
                        format!("Only instances have fields, got {}.", object.kind()),
                    ));
                };
                let value = self.evaluate(value)?;
                self.set_field(instance, &name.name, &value, line)?;
                Ok(value)
            }
            ExprKind::Super { method } => self.super_method(expr.id, &method.name, line),
        }
    }

    // ── Variables ─────────────────────────────────────────────────────────────

    fn look_up(&self, id: ExprId, name: &str, line: u32) -> RuntimeResult<Value> {
        let value = match self.locals.get(&id) {
            Some(&depth) => Environment::get_at(&self.environment, depth, name),
            None => self.globals.borrow().get(name),
        };
        value
            .map(|v| v.detach())
            .ok_or_else(|| RuntimeError::undefined(line, name))
    }

    fn assign_variable(&self, id: ExprId, name: &str, value: &Value, line: u32) -> RuntimeResult<()> {
        let result = match self.locals.get(&id) {
            Some(&depth) => Environment::assign_at(&self.environment, depth, name, value),
            None => self.globals.borrow_mut().assign(name, value),
        };
        result.map_err(|err| self.assign_error(line, name, err))
    }

    fn assign_error(&self, line: u32, name: &str, err: AssignError) -> RuntimeError {
        match err {
            AssignError::Unbound => RuntimeError::undefined(line, name),
            AssignError::Value(err) => err.at(line),
        }
    }

    // ── Properties ────────────────────────────────────────────────────────────

    /// Field, else cached bound method, else bind the class's method and cache it.
    pub fn get_property(&mut self, instance: InstanceId, name: &str, line: u32) -> RuntimeResult<Value> {
        let object = self.heap.instance(instance);
        if let Some(value) = object.field(name) {
            return Ok(value);
        }
        if let Some(&bound) = object.bound_methods.get(name) {
            return Ok(Value::Function(bound));
        }
        let class = object.class;
        let method = self
            .heap
            .find_method(class, name)
            .ok_or_else(|| RuntimeError::undefined(line, name))?;
        let bound = self.bind_method(method, instance, line)?;
        self.heap
            .instance_mut(instance)
            .bound_methods
            .insert(name.to_string(), bound);
        Ok(Value::Function(bound))
    }

    /// Write an existing field through [`Value::assign`], or add a new one.
    pub fn set_field(&mut self, instance: InstanceId, name: &str, value: &Value, line: u32) -> RuntimeResult<()> {
        let fields = &mut self.heap.instance_mut(instance).fields;
        match fields.get_mut(name) {
            Some(slot) => slot.assign(value).map_err(|err| err.at(line)),
            None => {
                fields.insert(name.to_string(), value.detach());
                Ok(())
            }
        }
    }

    fn bind_method(&mut self, method: CallableId, instance: InstanceId, line: u32) -> RuntimeResult<CallableId> {
        let callable = self.heap.callable(method);
        let bound = callable.bind(instance).ok_or_else(|| {
            RuntimeError::type_error(
                line,
                format!("Native function '{}' cannot be bound.", callable.name()),
            )
        })?;
        Ok(self.heap.alloc_callable(bound))
    }

    fn super_method(&mut self, id: ExprId, name: &str, line: u32) -> RuntimeResult<Value> {
        let Some(&depth) = self.locals.get(&id) else {
            return Err(RuntimeError::undefined(line, "super"));
        };
        let superclass = Environment::get_at(&self.environment, depth, "super")
            .ok_or_else(|| RuntimeError::undefined(line, "super"))?
            .as_class()
            .map_err(|err| err.at(line))?;
        let this = depth
            .checked_sub(1)
            .and_then(|d| Environment::get_at(&self.environment, d, "this"))
            .ok_or_else(|| RuntimeError::undefined(line, "this"))?
            .as_instance()
            .map_err(|err| err.at(line))?;
        let method = self
            .heap
            .find_method(superclass, name)
            .ok_or_else(|| RuntimeError::undefined(line, name))?;
        let bound = self.bind_method(method, this, line)?;
        Ok(Value::Function(bound))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Calls
    // ══════════════════════════════════════════════════════════════════════

    fn call_value(&mut self, callee: Value, args: Vec<Value>) -> RuntimeResult<Value> {
        match callee {
            Value::Function(id) => self.call_function(id, args),
            Value::Class(id) => self.instantiate(id, args),
            other => Err(self.type_error(format!(
                "Can only call functions and classes, got {}.",
                other.kind()
            ))),
        }
    }

    fn check_arity(&self, expected: usize, got: usize) -> RuntimeResult<()> {
        if expected == got {
            Ok(())
        } else {
            Err(RuntimeError::Arity {
                line: self.line,
                expected,
                got,
            })
        }
    }

    fn call_function(&mut self, id: CallableId, args: Vec<Value>) -> RuntimeResult<Value> {
        let callable = self.heap.callable(id).clone();
        self.check_arity(callable.arity(), args.len())?;
        tracing::trace!(name = callable.name(), depth = self.call_depth, "call");
        match callable {
            Callable::Native { function, .. } => function(self, &args),
            Callable::NativeBound {
                name,
                method,
                receiver,
                ..
            } => {
                let host = receiver
                    .and_then(|instance| self.heap.instance(instance).host.clone())
                    .ok_or_else(|| {
                        self.type_error(format!("Native method '{name}' has no host object."))
                    })?;
                method(self, &args, &*host)
            }
            Callable::Script {
                decl,
                closure,
                is_initializer,
            } => {
                if self.call_depth >= self.config.max_call_depth {
                    return Err(RuntimeError::StackOverflow {
                        line: self.line,
                        depth: self.config.max_call_depth,
                    });
                }
                let mut scope = Environment::with_enclosing(Rc::clone(&closure));
                for (param, arg) in decl.params.iter().zip(args) {
                    scope.define(&param.name, arg);
                }
                self.call_depth += 1;
                let result = self.execute_block(&decl.body, scope.into_ref());
                self.call_depth -= 1;
                let returned = match result? {
                    ExecResult::Returning(value) => value,
                    ExecResult::Completed => Value::Null,
                };
                if is_initializer {
                    return Environment::get_at(&closure, 0, "this")
                        .ok_or_else(|| self.type_error("Initializer is not bound to an instance."));
                }
                Ok(returned)
            }
        }
    }

    fn instantiate(&mut self, class: ClassId, args: Vec<Value>) -> RuntimeResult<Value> {
        self.check_arity(self.heap.constructor_arity(class), args.len())?;

        if let Some(init) = self.heap.find_method(class, "init") {
            let instance = self.heap.alloc_instance(Instance::new(class));
            let line = self.line;
            let bound = self.bind_method(init, instance, line)?;
            self.call_function(bound, args)?;
            return Ok(Value::Instance(instance));
        }

        let instance = match self.heap.native_constructor(class).cloned() {
            Some(native) => {
                let host = (native.generate)(self, &args)?;
                Instance::with_host(class, host)
            }
            None => Instance::new(class),
        };
        Ok(Value::Instance(self.heap.alloc_instance(instance)))
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(x) => Value::Float(*x),
        Literal::String(s) => Value::String(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
        Literal::Undefined => Value::Undefined,
    }
}
