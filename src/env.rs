// ABOUTME: Variable environment: a flat identifier-to-value map with block reconciliation

use crate::value::Value;
use std::collections::HashMap;

/// One frame of variable bindings. Function calls get a fresh frame holding
/// only their arguments; block bodies get a copy of the enclosing frame that
/// is reconciled back when the block completes.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: HashMap<String, Value>,
}

impl Env {
    pub fn new() -> Self {
        Env {
            vars: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Copy handed to a block body before it runs.
    pub fn child(&self) -> Env {
        self.clone()
    }

    /// Fold a completed block's bindings back in: a name bound on both sides
    /// takes the block's value; names created inside the block are dropped.
    pub fn absorb(&mut self, inner: Env) {
        for (name, value) in inner.vars {
            if let Some(existing) = self.vars.get_mut(&name) {
                *existing = value;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::Num;

    #[test]
    fn test_set_and_get() {
        let mut env = Env::new();
        env.set("x", Value::Num(Num::from(42)));
        assert_eq!(env.get("x"), Some(Value::Num(Num::from(42))));
        assert_eq!(env.get("missing"), None);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut env = Env::new();
        env.set("Total", Value::Num(Num::from(1)));
        assert!(env.contains("Total"));
        assert!(!env.contains("total"));
    }

    #[test]
    fn test_absorb_updates_shared_names() {
        let mut outer = Env::new();
        outer.set("x", Value::Num(Num::from(1)));

        let mut inner = outer.child();
        inner.set("x", Value::Num(Num::from(2)));
        outer.absorb(inner);

        assert_eq!(outer.get("x"), Some(Value::Num(Num::from(2))));
    }

    #[test]
    fn test_absorb_drops_block_locals() {
        let mut outer = Env::new();
        outer.set("x", Value::Num(Num::from(1)));

        let mut inner = outer.child();
        inner.set("temp", Value::Bool(true));
        outer.absorb(inner);

        assert!(!outer.contains("temp"));
        assert_eq!(outer.len(), 1);
    }
}
