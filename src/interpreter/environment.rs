use crate::object::Object;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

struct Scope {
    store: RefCell<HashMap<String, Object>>,
    outer: Option<Environment>,
}

/// Shared handle to one scope in a chain of lexical scopes.
///
/// Cloning the handle does not copy the bindings: closures capture the
/// scope they were created in and observe later `let`s made there.
#[derive(Clone)]
pub struct Environment {
    scope: Rc<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        Self::with_outer(None)
    }

    /// A fresh scope whose lookups fall back to `outer`.
    pub fn enclosed(outer: &Environment) -> Self {
        Self::with_outer(Some(outer.clone()))
    }

    fn with_outer(outer: Option<Environment>) -> Self {
        Self {
            scope: Rc::new(Scope {
                store: RefCell::new(HashMap::new()),
                outer,
            }),
        }
    }

    /// Looks a name up here, then in each enclosing scope.
    pub fn get(&self, name: &str) -> Option<Object> {
        if let Some(value) = self.scope.store.borrow().get(name) {
            return Some(value.clone());
        }
        self.scope.outer.as_ref().and_then(|outer| outer.get(name))
    }

    /// Binds in this scope only; enclosing scopes are never written.
    pub fn set(&self, name: impl Into<String>, value: Object) {
        self.scope.store.borrow_mut().insert(name.into(), value);
    }

    pub fn has_outer(&self) -> bool {
        self.scope.outer.is_some()
    }

    /// Names bound directly in this scope, sorted.
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scope.store.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.scope, &other.scope)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

// Bindings may hold closures over this very scope, so only names are shown.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("names", &self.local_names())
            .field("has_outer", &self.has_outer())
            .finish()
    }
}
