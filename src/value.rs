// ABOUTME: Runtime value types: numbers, strings, booleans, arrays, references

use crate::num::Num;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Shared handle to a sparse array. Cloning an array value clones the handle,
/// so every environment holding it sees the same elements.
pub type ArrayRef = Rc<RefCell<BTreeMap<i64, Value>>>;

#[derive(Debug, Clone)]
pub enum Value {
    Num(Num),
    Str(String),
    Bool(bool),
    Null,
    Array(ArrayRef),
    /// Handle to a named function
    Func(String),
    /// Transient reference to one array element, kept on the value stack so
    /// assignment operators can write through it
    Slot(Slot),
}

/// Write-through reference to a single array element.
#[derive(Debug, Clone)]
pub struct Slot {
    pub array: ArrayRef,
    pub index: i64,
}

impl Slot {
    /// Current element value; absent indices read as null.
    pub fn get(&self) -> Value {
        self.array
            .borrow()
            .get(&self.index)
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn set(&self, value: Value) {
        self.array.borrow_mut().insert(self.index, value);
    }
}

impl Value {
    pub fn new_array() -> Value {
        Value::Array(Rc::new(RefCell::new(BTreeMap::new())))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Func(_) => "function",
            Value::Slot(_) => "reference",
        }
    }

    /// Collapse an array-element reference to the value it points at; every
    /// other value passes through unchanged.
    pub fn deref(self) -> Value {
        match self {
            Value::Slot(slot) => slot.get(),
            other => other,
        }
    }

    /// Coercion text used by string concatenation and console output: strings
    /// render bare, numbers as their exact decimal form, booleans as
    /// `true`/`false`.
    pub fn text(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Num(a), Value::Num(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Func(a), Value::Func(b)) => a == b,
            (Value::Slot(a), Value::Slot(b)) => Rc::ptr_eq(&a.array, &b.array) && a.index == b.index,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "'{}'", s),
            Value::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Null => write!(f, "null"),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, (index, value)) in elements.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", index, value)?;
                }
                write!(f, "]")
            }
            Value::Func(name) => write!(f, "function {}", name),
            Value::Slot(slot) => write!(f, "{}", slot.get()),
        }
    }
}
