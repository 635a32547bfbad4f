//! Environment for variable scopes
//!
//! Each scope owns its own bindings and links to the scope that encloses
//! it. Function calls and standalone blocks get a fresh enclosed scope;
//! closures keep a handle to the scope they were defined in.

use crate::runtime::object::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope.
/// Closures and child scopes hold the same scope, so it lives as long as
/// its longest holder.
pub type SharedEnvironment = Rc<RefCell<Environment>>;

/// A single lexical scope
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Object>,
    outer: Option<SharedEnvironment>,
}

impl Environment {
    /// Create the root scope of a program run
    pub fn new_root() -> SharedEnvironment {
        Rc::new(RefCell::new(Environment::default()))
    }

    /// Create a child scope of `outer`
    pub fn new_enclosed(outer: &SharedEnvironment) -> SharedEnvironment {
        Rc::new(RefCell::new(Environment {
            store: HashMap::new(),
            outer: Some(Rc::clone(outer)),
        }))
    }

    /// Look a name up, searching from this scope outward
    pub fn get(&self, name: &str) -> Option<Object> {
        match self.store.get(name) {
            Some(value) => Some(value.clone()),
            None => self.outer.as_ref()?.borrow().get(name),
        }
    }

    /// Bind a name in this scope, replacing any previous binding here.
    /// Returns the stored value.
    pub fn set(&mut self, name: impl Into<String>, value: Object) -> Object {
        self.store.insert(name.into(), value.clone());
        value
    }

    /// Bindings owned by this scope, sorted by name
    pub fn bindings(&self) -> Vec<(String, Object)> {
        let mut bindings: Vec<(String, Object)> = self
            .store
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }
}
