// ABOUTME: JSON conversion for values and environment snapshots

use crate::env::Env;
use crate::num::Num;
use crate::value::Value;
use num_traits::ToPrimitive;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Number};

/// Largest integer magnitude a JSON number carries without losing digits.
const MAX_SAFE_INT: u64 = 9_007_199_254_740_992;

/// Decimals up to this many significant digits survive the trip through f64.
const MAX_F64_DIGITS: u64 = 15;

/// Render a value for host consumption: arrays become objects keyed by
/// index, numbers that would lose digits as JSON numbers become exact
/// decimal strings, and element references collapse to their referent.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Num(Num::Int(i)) => match i.to_i64() {
            Some(small) if small.unsigned_abs() <= MAX_SAFE_INT => json!(small),
            _ => json!(i.to_string()),
        },
        Value::Num(Num::Dec(d)) => {
            if d.digits() <= MAX_F64_DIGITS {
                match d.to_f64().and_then(Number::from_f64) {
                    Some(n) => serde_json::Value::Number(n),
                    None => json!(d.to_string()),
                }
            } else {
                json!(d.to_string())
            }
        }
        Value::Str(s) => json!(s),
        Value::Bool(b) => json!(b),
        Value::Null => serde_json::Value::Null,
        Value::Array(elements) => {
            let mut map = Map::new();
            for (index, element) in elements.borrow().iter() {
                map.insert(index.to_string(), value_to_json(element));
            }
            serde_json::Value::Object(map)
        }
        Value::Func(name) => json!(format!("function {name}")),
        Value::Slot(slot) => value_to_json(&slot.get()),
    }
}

/// Snapshot of every binding, keyed by variable name, names sorted.
pub fn env_to_json(env: &Env) -> serde_json::Value {
    let mut entries: Vec<_> = env.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let mut map = Map::new();
    for (name, value) in entries {
        map.insert(name.clone(), value_to_json(value));
    }
    serde_json::Value::Object(map)
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        value_to_json(self).serialize(serializer)
    }
}

impl Serialize for Env {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        env_to_json(self).serialize(serializer)
    }
}
