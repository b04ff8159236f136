//! Runtime object model: values, closures, classes and instances.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{FunctionDecl, LiteralValue};
use crate::environment::{EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::token::Token;

/// Host implementation of a native callable. The error string becomes a
/// runtime error located at the call's closing parenthesis.
pub type NativeFn = fn(&[Value]) -> std::result::Result<Value, String>;

/// Name of the method run when a class is called.
pub const INITIALIZER: &str = "init";

#[derive(Clone)]
pub enum Value {
    NativeFunction {
        name: &'static str,
        arity: usize,
        func: NativeFn,
    },
    Function(Rc<Function>),
    Class(Rc<Class>),
    Instance(Rc<RefCell<Instance>>),
    Number(f64),
    String(String),
    Bool(bool),
    Nil,
}

impl Value {
    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Short type label used in log lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::NativeFunction { .. } => "native function",
            Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Nil => "nil",
        }
    }
}

impl From<LiteralValue> for Value {
    fn from(literal: LiteralValue) -> Self {
        match literal {
            LiteralValue::Number(n) => Value::Number(n),
            LiteralValue::Str(s) => Value::String(s),
            LiteralValue::True => Value::Bool(true),
            LiteralValue::False => Value::Bool(false),
            LiteralValue::Nil => Value::Nil,
        }
    }
}

impl PartialEq for Value {
    /// Primitives compare by value, heap objects by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::NativeFunction { name: a, .. }, Value::NativeFunction { name: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::NativeFunction { name, .. } => write!(f, "<native fn {}>", name),

            Value::Function(function) => write!(f, "<fn {}>", function.name()),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.borrow().class.name),

            Value::Number(n) => write!(f, "{}", format_number(*n)),

            Value::String(s) => write!(f, "{}", s),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Nil => write!(f, "nil"),
        }
    }
}

/// JavaScript-style number text: `3`, `2.5`, `0` for both zeros,
/// `Infinity`, `NaN`, and exponent form (`1e+23`, `1.5e-7`) outside
/// `[1e-6, 1e21)`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }

    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    if n == 0.0 {
        return "0".to_string();
    }

    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        // shortest round-trip digits, never an exponent
        return n.to_string();
    }

    let exponential = format!("{:e}", n);
    match exponential.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => exponential,
    }
}

// Closures may (indirectly) contain themselves, so Debug goes through Display.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

/// A user function or method together with the scope it closes over.
pub struct Function {
    pub declaration: Rc<FunctionDecl>,
    pub closure: EnvRef,
    pub is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A copy of this method whose closure additionally binds `this`.
    pub fn bind(&self, instance: Value) -> Function {
        let environment = Environment::with_enclosing(&self.closure);
        environment.borrow_mut().define("this", instance);

        Function::new(
            Rc::clone(&self.declaration),
            environment,
            self.is_initializer,
        )
    }
}

pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: HashMap<String, Function>,
}

impl Class {
    /// Look `name` up on this class, then along the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<&Function> {
        match self.methods.get(name) {
            Some(method) => Some(method),
            None => self
                .superclass
                .as_deref()
                .and_then(|superclass| superclass.find_method(name)),
        }
    }

    /// Calling a class takes as many arguments as its initializer.
    pub fn arity(&self) -> usize {
        self.find_method(INITIALIZER).map_or(0, Function::arity)
    }
}

pub struct Instance {
    pub class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Fields shadow methods; methods come back bound to `instance`.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &Token) -> Result<Value> {
        let this = instance.borrow();

        if let Some(value) = this.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = this.class.find_method(&name.lexeme) {
            let bound = method.bind(Value::Instance(Rc::clone(instance)));
            return Ok(Value::Function(Rc::new(bound)));
        }

        Err(LoxError::runtime(
            name,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    /// Create or overwrite a field; the method table is never consulted.
    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}
