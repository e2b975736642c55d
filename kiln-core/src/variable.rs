//! Variable environment
//!
//! Globals live in one [`Scope`] shared by every execution context. Each
//! context (the main program or one trigger run) owns a [`ScopeStack`] of
//! lexical frames. [`Environment`] is the borrowed view the engine resolves
//! names through, innermost frame first.

use crate::error::DispatchError;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;

// ==================== Variable ====================

/// Named mutable storage cell
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    value: Value,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Replace the value wholesale
    pub fn set(&mut self, value: Value) {
        self.value = value;
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ==================== Scope ====================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    vars: HashMap<String, Variable>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare or redeclare `name` in this scope
    pub fn declare(&mut self, name: &str, value: Value) {
        match self.vars.get_mut(name) {
            Some(var) => var.set(value),
            None => {
                self.vars.insert(name.to_string(), Variable::new(name, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.vars.get_mut(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.vars.get(name).map(Variable::value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        self.vars.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.values()
    }
}

// ==================== ScopeStack ====================

/// Lexical frames of one execution context
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeStack {
    frames: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.frames.push(Scope::new());
    }

    /// Pop the innermost frame, destroying its variables
    pub fn pop(&mut self) -> Option<Scope> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drop every frame above `depth`
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    pub fn innermost(&self) -> Option<&Scope> {
        self.frames.last()
    }
}

// ==================== Environment ====================

/// Name resolution over one context's frames plus the shared globals
pub struct Environment<'a> {
    globals: &'a mut Scope,
    locals: &'a mut ScopeStack,
}

impl<'a> Environment<'a> {
    pub fn new(globals: &'a mut Scope, locals: &'a mut ScopeStack) -> Self {
        Self { globals, locals }
    }

    /// Declare in the innermost frame (the globals when no frame is active)
    pub fn declare(&mut self, name: &str, value: Value) {
        match self.locals.frames.last_mut() {
            Some(frame) => frame.declare(name, value),
            None => self.globals.declare(name, value),
        }
    }

    pub fn get(&self, name: &str) -> Result<&Value, DispatchError> {
        self.locals
            .frames
            .iter()
            .rev()
            .find_map(|frame| frame.value(name))
            .or_else(|| self.globals.value(name))
            .ok_or_else(|| DispatchError::UndefinedVariable(name.to_string()))
    }

    /// Assign to the nearest existing variable, else declare in the innermost frame
    pub fn set(&mut self, name: &str, value: Value) {
        match self.resolve_mut(name) {
            Some(var) => var.set(value),
            None => self.declare(name, value),
        }
    }

    /// Remove the nearest variable called `name`
    pub fn undeclare(&mut self, name: &str) -> Result<Variable, DispatchError> {
        for frame in self.locals.frames.iter_mut().rev() {
            if let Some(var) = frame.remove(name) {
                return Ok(var);
            }
        }
        self.globals
            .remove(name)
            .ok_or_else(|| DispatchError::UndefinedVariable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    fn resolve_mut(&mut self, name: &str) -> Option<&mut Variable> {
        for frame in self.locals.frames.iter_mut().rev() {
            if let Some(var) = frame.get_mut(name) {
                return Some(var);
            }
        }
        self.globals.get_mut(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_innermost_first_resolution() {
        let mut globals = Scope::new();
        let mut locals = ScopeStack::new();
        globals.declare("x", Value::from(1));
        locals.push();

        let mut env = Environment::new(&mut globals, &mut locals);
        env.declare("x", Value::from(2));
        assert_eq!(env.get("x"), Ok(&Value::from(2)));

        locals.pop();
        let env = Environment::new(&mut globals, &mut locals);
        assert_eq!(env.get("x"), Ok(&Value::from(1)));
    }

    #[test]
    fn test_set_updates_enclosing_variable() {
        let mut globals = Scope::new();
        let mut locals = ScopeStack::new();
        globals.declare("count", Value::from(0));
        locals.push();

        let mut env = Environment::new(&mut globals, &mut locals);
        env.set("count", Value::from(5));
        env.set("fresh", Value::from(true));

        assert_eq!(globals.value("count"), Some(&Value::from(5)));
        assert!(!globals.contains("fresh"));
        assert!(locals.innermost().is_some_and(|s| s.contains("fresh")));
    }

    #[test]
    fn test_set_without_frames_goes_global() {
        let mut globals = Scope::new();
        let mut locals = ScopeStack::new();
        Environment::new(&mut globals, &mut locals).set("g", Value::from("v"));
        assert_eq!(globals.value("g"), Some(&Value::from("v")));
    }

    #[test]
    fn test_undefined_and_undeclare() {
        let mut globals = Scope::new();
        let mut locals = ScopeStack::new();
        let mut env = Environment::new(&mut globals, &mut locals);

        assert_eq!(env.get("nope"), Err(DispatchError::UndefinedVariable("nope".into())));
        env.declare("a", Value::from(1));
        let removed = env.undeclare("a").unwrap();
        assert_eq!(removed.name(), "a");
        assert!(!env.contains("a"));
        assert!(env.undeclare("a").is_err());
    }

    #[test]
    fn test_frame_pop_destroys_variables() {
        let mut globals = Scope::new();
        let mut locals = ScopeStack::new();
        locals.push();
        Environment::new(&mut globals, &mut locals).declare("tmp", Value::from(1));
        locals.truncate(0);
        assert!(!Environment::new(&mut globals, &mut locals).contains("tmp"));
    }
}
