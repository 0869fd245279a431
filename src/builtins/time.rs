//! Clock built-ins: millis

use crate::error::ScriptError;
use crate::host::{FnTable, SimpleFn};
use crate::num::Num;
use crate::value::Value;
use num_bigint::BigInt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock milliseconds since the Unix epoch, as an integer.
pub fn builtin_millis(_args: &[Value]) -> Result<Value, ScriptError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ScriptError::internal(format!("clock before the epoch: {e}")))?;
    Ok(Value::Num(Num::Int(BigInt::from(elapsed.as_millis()))))
}

/// Register the clock builtins.
pub fn register(table: &mut FnTable) {
    table.register(Rc::new(SimpleFn::new("millis", 0, builtin_millis)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_is_a_nondecreasing_integer() {
        let first = builtin_millis(&[]).unwrap();
        let second = builtin_millis(&[]).unwrap();
        let (Value::Num(a), Value::Num(b)) = (&first, &second) else {
            panic!("expected numbers");
        };
        assert!(a.is_int());
        assert!(b >= a);
        assert!(*a > Num::from(0));
    }
}
