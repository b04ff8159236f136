//! Runtime scope chain.
//!
//! Each [`Environment`] owns the bindings of one scope plus a link to its
//! enclosing scope. Scopes are shared through `Rc<RefCell<_>>`: a block's
//! scope lives for as long as any closure captured it, and closures created
//! in the same scope observe each other's writes.
//!
//! Two families of access exist:
//! * `get` / `assign` walk outward by name (used for globals),
//! * `get_at` / `assign_at` jump exactly `distance` hops outward, where the
//!   distance is the one the resolver computed with [`scope_distance`].

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to one scope.
pub type EnvRef = Rc<RefCell<Environment>>;

/// Number of hops from the innermost of `scope_count` nested scopes to the
/// scope at `index` (0 = outermost).
///
/// The resolver records this value and the interpreter hands it to
/// [`Environment::ancestor`]; both sides agree because every runtime scope
/// is created exactly where the resolver opened a static one.
#[inline]
pub fn scope_distance(scope_count: usize, index: usize) -> usize {
    scope_count - 1 - index
}

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// A fresh global scope.
    pub fn global() -> EnvRef {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// A fresh scope nested inside `enclosing`.
    pub fn with_enclosing(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(Rc::clone(enclosing)),
        }))
    }

    /// Install or overwrite a binding in this scope only.
    pub fn define(&mut self, name: &str, value: Value) {
        debug!("define '{}'", name);
        self.values.insert(name.to_string(), value);
    }

    /// Walk outward until `name` is found.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    /// Walk outward and overwrite the nearest existing binding of `name`.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// The scope exactly `distance` hops outward from `env`.
    ///
    /// A chain shorter than `distance` means the resolver and the runtime
    /// disagree about nesting; it is reported as an undefined variable
    /// rather than a panic.
    pub fn ancestor(env: &EnvRef, distance: usize, name: &Token) -> Result<EnvRef> {
        let mut current: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next = current.borrow().enclosing.clone();
            current = next.ok_or_else(|| undefined(name))?;
        }

        Ok(current)
    }

    /// Read `name` from the scope `distance` hops out, without walking further.
    pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value> {
        let scope = Self::ancestor(env, distance, name)?;
        let value = scope.borrow().values.get(&name.lexeme).cloned();

        value.ok_or_else(|| undefined(name))
    }

    /// Write `name` in the scope `distance` hops out, without walking further.
    pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
        let scope = Self::ancestor(env, distance, name)?;
        let mut scope = scope.borrow_mut();

        match scope.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name)),
        }
    }
}

fn undefined(name: &Token) -> LoxError {
    LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}
