// ABOUTME: Environment module for managing variable bindings and scopes

use crate::error::ArcError;
use crate::symbol::{intern, Symbol};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub struct Environment {
    bindings: RefCell<HashMap<Symbol, Value>>,
    parent: Option<Rc<Environment>>,
}

thread_local! {
    /// Mirrors arc.cpp's `global_env` global: native operators such as
    /// `eval`/`apply`/`bound`/`macex`/`load` need the global frame, but a
    /// `BuiltinFn` is a bare function pointer with no captured
    /// environment, so it's reached through here instead. Set once, by
    /// `register_builtins`, before any builtin can run.
    static GLOBAL: RefCell<Option<Rc<Environment>>> = const { RefCell::new(None) };
}

/// Records `env` as the environment `global_environment()` returns.
pub fn set_global_environment(env: Rc<Environment>) {
    GLOBAL.with(|g| *g.borrow_mut() = Some(env));
}

/// The environment most recently recorded by `set_global_environment`.
pub fn global_environment() -> Rc<Environment> {
    GLOBAL.with(|g| {
        g.borrow()
            .clone()
            .expect("global environment accessed before set_global_environment")
    })
}

impl Environment {
    /// Creates a new global environment with no parent
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment with a parent
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// *bind(sym, v)*: write in the current frame, shadowing parents (§4.2).
    pub fn bind(&self, sym: Symbol, value: Value) {
        self.bindings.borrow_mut().insert(sym, value);
    }

    /// Convenience wrapper over `bind` for builtin registration, used by
    /// the generated `register_<fn>` functions from `#[builtin]`.
    pub fn bind_builtin(&self, name: &str, f: crate::value::BuiltinFn, _doc: &str) {
        self.bind(intern(name), Value::Builtin(f));
    }

    /// *lookup(sym)*: walk parents; return bound value or unbound-symbol
    /// error (§4.2).
    pub fn lookup(&self, sym: &Symbol) -> Result<Value, ArcError> {
        if let Some(value) = self.bindings.borrow().get(sym) {
            return Ok(value.clone());
        }
        if let Some(ref parent) = self.parent {
            return parent.lookup(sym);
        }
        Err(ArcError::UnboundSymbol)
    }

    pub fn is_bound(&self, sym: &Symbol) -> bool {
        self.lookup(sym).is_ok()
    }

    /// Walks to the root ancestor frame. `mac` binds its macro there
    /// regardless of the lexical environment the `mac` form appears in
    /// (§4.3), and `eval`/`bound` resolve names against it directly.
    pub fn global(self: &Rc<Self>) -> Rc<Environment> {
        match &self.parent {
            Some(parent) => parent.global(),
            None => self.clone(),
        }
    }

    /// *assign(sym, v)*: walk parents to find an existing binding and
    /// overwrite it; if none is found anywhere, bind in the current frame
    /// (§4.2 — this is the `assign` special form's semantics, distinct
    /// from `bind`).
    pub fn assign(&self, sym: Symbol, value: Value) {
        if self.assign_existing(&sym, &value) {
            return;
        }
        self.bind(sym, value);
    }

    fn assign_existing(&self, sym: &Symbol, value: &Value) -> bool {
        if self.bindings.borrow().contains_key(sym) {
            self.bindings.borrow_mut().insert(sym.clone(), value.clone());
            return true;
        }
        if let Some(ref parent) = self.parent {
            return parent.assign_existing(sym, value);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let env = Environment::new();
        env.bind(intern("x"), Value::Num(42.0));

        match env.lookup(&intern("x")) {
            Ok(Value::Num(n)) => assert_eq!(n, 42.0),
            _ => panic!("Expected Num(42.0)"),
        }
    }

    #[test]
    fn test_undefined_symbol() {
        let env = Environment::new();
        assert!(env.lookup(&intern("undefined")).is_err());
    }

    #[test]
    fn test_shadowing() {
        let parent = Environment::new();
        parent.bind(intern("x"), Value::Num(42.0));

        let child = Environment::with_parent(parent);
        child.bind(intern("x"), Value::Num(100.0));

        match child.lookup(&intern("x")) {
            Ok(Value::Num(n)) => assert_eq!(n, 100.0),
            _ => panic!("Expected Num(100.0)"),
        }
    }

    #[test]
    fn test_parent_lookup() {
        let parent = Environment::new();
        parent.bind(intern("x"), Value::Num(42.0));

        let child = Environment::with_parent(parent);

        match child.lookup(&intern("x")) {
            Ok(Value::Num(n)) => assert_eq!(n, 42.0),
            _ => panic!("Expected Num(42.0)"),
        }
    }

    #[test]
    fn test_multiple_levels() {
        let grandparent = Environment::new();
        grandparent.bind(intern("a"), Value::Num(1.0));

        let parent = Environment::with_parent(grandparent);
        parent.bind(intern("b"), Value::Num(2.0));

        let child = Environment::with_parent(parent);
        child.bind(intern("c"), Value::Num(3.0));

        assert!(matches!(child.lookup(&intern("a")), Ok(Value::Num(n)) if n == 1.0));
        assert!(matches!(child.lookup(&intern("b")), Ok(Value::Num(n)) if n == 2.0));
        assert!(matches!(child.lookup(&intern("c")), Ok(Value::Num(n)) if n == 3.0));
    }

    #[test]
    fn assign_overwrites_ancestor_binding_without_shadowing() {
        let parent = Environment::new();
        parent.bind(intern("x"), Value::Num(1.0));

        let child = Environment::with_parent(parent.clone());
        child.assign(intern("x"), Value::Num(2.0));

        // assign found the binding in the parent frame and updated it there,
        // rather than shadowing it in the child.
        assert!(matches!(parent.lookup(&intern("x")), Ok(Value::Num(n)) if n == 2.0));
    }

    #[test]
    fn assign_binds_in_current_frame_when_unbound_anywhere() {
        let env = Environment::new();
        env.assign(intern("y"), Value::Num(5.0));
        assert!(matches!(env.lookup(&intern("y")), Ok(Value::Num(n)) if n == 5.0));
    }
}
