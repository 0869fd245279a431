//! Integer bit built-ins: radix, bit, set, clr, flip
//!
//! All of them require integer arguments; negative values use two's
//! complement bit semantics.

use crate::error::ScriptError;
use crate::host::{FnTable, SimpleFn};
use crate::num::Num;
use crate::value::Value;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::rc::Rc;

fn int_arg<'a>(name: &str, args: &'a [Value], position: usize) -> Result<&'a BigInt, ScriptError> {
    match args.get(position) {
        Some(Value::Num(Num::Int(i))) => Ok(i),
        Some(Value::Num(_)) => Err(ScriptError::mismatch(format!(
            "{name}: argument {} must be an integer",
            position + 1
        ))),
        Some(other) => Err(ScriptError::mismatch(format!(
            "{name}: argument {} must be an integer, got {}",
            position + 1,
            other.type_name()
        ))),
        None => Err(ScriptError::internal(format!("{name}: missing argument"))),
    }
}

fn bit_index(name: &str, args: &[Value], position: usize) -> Result<u64, ScriptError> {
    int_arg(name, args, position)?
        .to_u64()
        .ok_or_else(|| ScriptError::math(format!("{name}: bit index out of range")))
}

/// Integer rendered as an uppercase string in the given base (2 to 36).
pub fn builtin_radix(args: &[Value]) -> Result<Value, ScriptError> {
    let value = int_arg("radix", args, 0)?;
    let base = int_arg("radix", args, 1)?
        .to_u32()
        .filter(|b| (2..=36).contains(b))
        .ok_or_else(|| ScriptError::math("radix: base must be between 2 and 36"))?;
    Ok(Value::Str(value.to_str_radix(base).to_uppercase()))
}

/// Test one bit, as a boolean.
pub fn builtin_bit(args: &[Value]) -> Result<Value, ScriptError> {
    let value = int_arg("bit", args, 0)?;
    let index = bit_index("bit", args, 1)?;
    Ok(Value::Bool(value.bit(index)))
}

/// Copy of the value with one bit set.
pub fn builtin_set(args: &[Value]) -> Result<Value, ScriptError> {
    let mut value = int_arg("set", args, 0)?.clone();
    value.set_bit(bit_index("set", args, 1)?, true);
    Ok(Value::Num(Num::Int(value)))
}

/// Copy of the value with one bit cleared.
pub fn builtin_clr(args: &[Value]) -> Result<Value, ScriptError> {
    let mut value = int_arg("clr", args, 0)?.clone();
    value.set_bit(bit_index("clr", args, 1)?, false);
    Ok(Value::Num(Num::Int(value)))
}

/// Copy of the value with one bit inverted.
pub fn builtin_flip(args: &[Value]) -> Result<Value, ScriptError> {
    let mut value = int_arg("flip", args, 0)?.clone();
    let index = bit_index("flip", args, 1)?;
    let current = value.bit(index);
    value.set_bit(index, !current);
    Ok(Value::Num(Num::Int(value)))
}

/// Register all bit builtins.
pub fn register(table: &mut FnTable) {
    table.register(Rc::new(SimpleFn::new("radix", 2, builtin_radix)));
    table.register(Rc::new(SimpleFn::new("bit", 2, builtin_bit)));
    table.register(Rc::new(SimpleFn::new("set", 2, builtin_set)));
    table.register(Rc::new(SimpleFn::new("clr", 2, builtin_clr)));
    table.register(Rc::new(SimpleFn::new("flip", 2, builtin_flip)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(text: &str) -> Value {
        Value::Num(Num::parse(text).unwrap())
    }

    #[test]
    fn test_radix_uppercases() {
        assert_eq!(
            builtin_radix(&[num("255"), num("16")]).unwrap(),
            Value::Str("FF".to_string())
        );
        assert_eq!(
            builtin_radix(&[num("5"), num("2")]).unwrap(),
            Value::Str("101".to_string())
        );
        assert_eq!(
            builtin_radix(&[num("-255"), num("16")]).unwrap(),
            Value::Str("-FF".to_string())
        );
    }

    #[test]
    fn test_radix_range() {
        assert!(builtin_radix(&[num("255"), num("1")]).is_err());
        assert!(builtin_radix(&[num("255"), num("37")]).is_err());
    }

    #[test]
    fn test_bit_test() {
        assert_eq!(builtin_bit(&[num("5"), num("0")]).unwrap(), Value::Bool(true));
        assert_eq!(builtin_bit(&[num("5"), num("1")]).unwrap(), Value::Bool(false));
        assert_eq!(builtin_bit(&[num("5"), num("2")]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_set_clr_flip() {
        assert_eq!(builtin_set(&[num("4"), num("0")]).unwrap(), num("5"));
        assert_eq!(builtin_clr(&[num("5"), num("0")]).unwrap(), num("4"));
        assert_eq!(builtin_flip(&[num("5"), num("0")]).unwrap(), num("4"));
        assert_eq!(builtin_flip(&[num("4"), num("0")]).unwrap(), num("5"));
    }

    #[test]
    fn test_decimal_operands_are_rejected() {
        assert!(builtin_bit(&[num("5.0"), num("0")]).is_err());
        assert!(builtin_set(&[num("5"), num("0.5")]).is_err());
    }
}
