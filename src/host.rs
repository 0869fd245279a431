// ABOUTME: Host-callable function surface: trait, simple wrapper, and lookup table

use crate::error::ScriptError;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// A host function is native code callable from a script. The evaluator pops
/// `arity()` values off the value stack, passes them in call order, and
/// pushes the returned value (void operations return `Value::Null`).
pub trait HostFn {
    fn name(&self) -> &str;

    /// Number of stack values a call consumes.
    fn arity(&self) -> usize;

    fn call(&self, args: &[Value]) -> Result<Value, ScriptError>;
}

/// Wrapper turning a plain function pointer into a host function.
pub struct SimpleFn {
    name: &'static str,
    arity: usize,
    func: fn(&[Value]) -> Result<Value, ScriptError>,
}

impl SimpleFn {
    pub fn new(
        name: &'static str,
        arity: usize,
        func: fn(&[Value]) -> Result<Value, ScriptError>,
    ) -> Self {
        SimpleFn { name, arity, func }
    }
}

impl HostFn for SimpleFn {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, args: &[Value]) -> Result<Value, ScriptError> {
        (self.func)(args)
    }
}

/// Registry of host functions. Lookup is case-insensitive.
#[derive(Default, Clone)]
pub struct FnTable {
    fns: HashMap<String, Rc<dyn HostFn>>,
}

impl FnTable {
    pub fn new() -> Self {
        FnTable {
            fns: HashMap::new(),
        }
    }

    pub fn register(&mut self, func: Rc<dyn HostFn>) {
        self.fns.insert(func.name().to_ascii_lowercase(), func);
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn HostFn>> {
        self.fns.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fns.contains_key(&name.to_ascii_lowercase())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
