//! Numeric built-ins: max, min, abs, pow, trunc
//!
//! All of them accept either integers or decimals and follow the promotion
//! rules of the numeric core: a decimal anywhere makes the result decimal,
//! except `trunc` with zero digits, which always produces an integer.

use crate::error::ScriptError;
use crate::host::{FnTable, SimpleFn};
use crate::num::{self, Num};
use crate::value::Value;
use bigdecimal::BigDecimal;
use std::rc::Rc;

fn num_arg<'a>(name: &str, args: &'a [Value], position: usize) -> Result<&'a Num, ScriptError> {
    match args.get(position) {
        Some(Value::Num(n)) => Ok(n),
        Some(other) => Err(ScriptError::type_error(format!(
            "{name}: argument {} must be a number, got {}",
            position + 1,
            other.type_name()
        ))),
        None => Err(ScriptError::internal(format!("{name}: missing argument"))),
    }
}

/// Larger of two numbers.
pub fn builtin_max(args: &[Value]) -> Result<Value, ScriptError> {
    let a = num_arg("max", args, 0)?;
    let b = num_arg("max", args, 1)?;
    Ok(Value::Num(if a >= b { a.clone() } else { b.clone() }))
}

/// Smaller of two numbers.
pub fn builtin_min(args: &[Value]) -> Result<Value, ScriptError> {
    let a = num_arg("min", args, 0)?;
    let b = num_arg("min", args, 1)?;
    Ok(Value::Num(if a <= b { a.clone() } else { b.clone() }))
}

/// Absolute value.
pub fn builtin_abs(args: &[Value]) -> Result<Value, ScriptError> {
    Ok(Value::Num(num_arg("abs", args, 0)?.abs()))
}

/// Raise to an integer power; decimal iff the base is decimal.
pub fn builtin_pow(args: &[Value]) -> Result<Value, ScriptError> {
    let base = num_arg("pow", args, 0)?;
    let exp = num_arg("pow", args, 1)?;
    Ok(Value::Num(base.pow(exp)?))
}

/// With zero digits, floor to an integer; with `n > 0` digits, round half-up
/// to `n` decimal places.
pub fn builtin_trunc(args: &[Value]) -> Result<Value, ScriptError> {
    let value = num_arg("trunc", args, 0)?;
    let digits = num_arg("trunc", args, 1)?
        .to_i64()
        .ok_or_else(|| ScriptError::mismatch("trunc: digit count must be an integer"))?;
    if digits < 0 {
        return Err(ScriptError::math("trunc: digit count cannot be negative"));
    }
    if digits == 0 {
        let int = match value {
            Num::Int(i) => i.clone(),
            Num::Dec(d) => num::floor_to_int(d),
        };
        return Ok(Value::Num(Num::Int(int)));
    }
    let dec = match value {
        Num::Int(i) => BigDecimal::from(i.clone()),
        Num::Dec(d) => d.clone(),
    };
    Ok(Value::Num(Num::Dec(num::round_to_places(&dec, digits))))
}

/// Register all numeric builtins.
pub fn register(table: &mut FnTable) {
    table.register(Rc::new(SimpleFn::new("max", 2, builtin_max)));
    table.register(Rc::new(SimpleFn::new("min", 2, builtin_min)));
    table.register(Rc::new(SimpleFn::new("abs", 1, builtin_abs)));
    table.register(Rc::new(SimpleFn::new("pow", 2, builtin_pow)));
    table.register(Rc::new(SimpleFn::new("trunc", 2, builtin_trunc)));
}
