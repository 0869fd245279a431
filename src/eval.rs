// ABOUTME: Postfix expression evaluator over a value stack

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::env::Env;
use crate::error::ScriptError;
use crate::interp::Interp;
use crate::num::Num;
use crate::token::{Kind, StepMark, Token};
use crate::value::{ArrayRef, Slot, Value};

/// Walk a postfix token vector against an environment and produce the single
/// resulting value. Short-circuit gates put the walk into skip mode until the
/// operator sharing their correlation id is reached; every skipped token,
/// side effects included, is simply discarded.
pub(crate) fn eval_postfix(
    interp: &mut Interp,
    postfix: &[Token],
    env: &mut Env,
) -> Result<Value, ScriptError> {
    let mut stack: Vec<Value> = Vec::new();
    let mut skip_until: Option<u32> = None;

    for token in postfix {
        if let Some(id) = skip_until {
            if token.kind == Kind::Op && token.gate_id == Some(id) {
                skip_until = None;
            }
            continue;
        }
        match token.kind {
            Kind::Tag | Kind::Comma => {}
            Kind::Literal => stack.push(Value::Num(Num::parse(&token.text)?)),
            Kind::StrLit => stack.push(Value::Str(token.text.clone())),
            Kind::Variable => push_variable(interp, token, &mut stack, env)?,
            Kind::ArrayHead => push_array_slot(token, &mut stack, env)?,
            Kind::FuncHead => {
                let result = interp.call_function(&token.text, &mut stack)?;
                stack.push(result);
            }
            Kind::Gate => {
                let top = pop(&mut stack)?.deref();
                let skips = matches!(
                    (token.text.as_str(), &top),
                    ("&&", Value::Bool(false)) | ("||", Value::Bool(true))
                );
                stack.push(top);
                if skips {
                    skip_until = Some(token.gate_id.ok_or_else(|| {
                        ScriptError::internal("short-circuit gate without an id")
                    })?);
                }
            }
            Kind::Op => apply_op(token, postfix, &mut stack, env)?,
        }
    }

    match stack.pop() {
        Some(value) if stack.is_empty() => Ok(value.deref()),
        _ => Err(ScriptError::internal("expression stack imbalance")),
    }
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, ScriptError> {
    stack
        .pop()
        .ok_or_else(|| ScriptError::internal("value stack underflow"))
}

fn step_symbol(mark: StepMark) -> &'static str {
    if mark.delta() > 0 {
        "++"
    } else {
        "--"
    }
}

/// Push a variable's value. A missing binding reads as null. A fused
/// increment/decrement applies its delta before the read (pre) or after
/// pushing the old value (post), writing the stepped value back either way.
fn push_variable(
    interp: &Interp,
    token: &Token,
    stack: &mut Vec<Value>,
    env: &mut Env,
) -> Result<(), ScriptError> {
    let name = token.text.as_str();

    if let Some(mark) = token.step {
        let current = env.get(name).unwrap_or(Value::Null);
        let Value::Num(n) = current else {
            return Err(ScriptError::type_error(format!(
                "'{}' needs a numeric variable, got {}",
                step_symbol(mark),
                current.type_name()
            )));
        };
        let stepped = n.add(&Num::from(mark.delta()))?;
        if mark.is_pre() {
            env.set(name, Value::Num(stepped.clone()));
            stack.push(Value::Num(stepped));
        } else {
            stack.push(Value::Num(n));
            env.set(name, Value::Num(stepped));
        }
        return Ok(());
    }

    let value = match name {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => match env.get(name) {
            Some(value) => value,
            None if interp.knows_function(name) => Value::Func(name.to_string()),
            None => Value::Null,
        },
    };
    stack.push(value);
    Ok(())
}

/// Pop the index and push a write-through reference to that array element,
/// creating the array binding on first touch.
fn push_array_slot(token: &Token, stack: &mut Vec<Value>, env: &mut Env) -> Result<(), ScriptError> {
    let index_value = pop(stack)?.deref();
    let Value::Num(index_num) = &index_value else {
        return Err(ScriptError::mismatch(format!(
            "array index must be an integer, got {}",
            index_value.type_name()
        )));
    };
    if !index_num.is_int() {
        return Err(ScriptError::mismatch("array index must be an integer"));
    }
    let index = index_num
        .to_i64()
        .ok_or_else(|| ScriptError::math("array index out of range"))?;

    let name = token.text.as_str();
    let handle: ArrayRef = match env.get(name) {
        Some(Value::Array(handle)) => handle,
        Some(other) => {
            return Err(ScriptError::type_error(format!(
                "'{name}' is not an array, got {}",
                other.type_name()
            )));
        }
        None => {
            let handle: ArrayRef = Rc::new(RefCell::new(BTreeMap::new()));
            env.set(name, Value::Array(handle.clone()));
            handle
        }
    };

    let slot = Slot {
        array: handle,
        index,
    };
    match token.step {
        Some(mark) => {
            let current = slot.get();
            let Value::Num(n) = current else {
                return Err(ScriptError::type_error(format!(
                    "'{}' needs a numeric element, got {}",
                    step_symbol(mark),
                    current.type_name()
                )));
            };
            let stepped = n.add(&Num::from(mark.delta()))?;
            if mark.is_pre() {
                slot.set(Value::Num(stepped.clone()));
                stack.push(Value::Num(stepped));
            } else {
                stack.push(Value::Num(n));
                slot.set(Value::Num(stepped));
            }
        }
        None => stack.push(Value::Slot(slot)),
    }
    Ok(())
}

fn apply_op(
    token: &Token,
    postfix: &[Token],
    stack: &mut Vec<Value>,
    env: &mut Env,
) -> Result<(), ScriptError> {
    let op = token.text.as_str();
    match op {
        "=" | "+=" | "-=" | "*=" | "/=" | "%=" => assign(op, postfix, stack, env),
        "!" | "~" => {
            let operand = pop(stack)?.deref();
            let value = match operand {
                Value::Bool(b) => Value::Bool(!b),
                Value::Num(n) => Value::Num(n.bit_not()?),
                other => {
                    return Err(ScriptError::type_error(format!(
                        "'{op}' cannot negate {}",
                        other.type_name()
                    )));
                }
            };
            stack.push(value);
            Ok(())
        }
        "++" | "--" => Err(ScriptError::syntax(format!(
            "'{op}' without a variable or array element"
        ))),
        _ => {
            let rhs = pop(stack)?.deref();
            let lhs = pop(stack)?.deref();
            stack.push(binary(op, lhs, rhs)?);
            Ok(())
        }
    }
}

/// Write the computed value through the assignment target: a retained array
/// slot, or the scalar variable named right after the leading tag token. The
/// assigned value is also the expression's value.
fn assign(
    op: &str,
    postfix: &[Token],
    stack: &mut Vec<Value>,
    env: &mut Env,
) -> Result<(), ScriptError> {
    let rhs = pop(stack)?.deref();
    let lhs = pop(stack)?;
    let compute = |current: Value| -> Result<Value, ScriptError> {
        if op == "=" {
            Ok(rhs.clone())
        } else {
            binary(&op[..1], current, rhs.clone())
        }
    };
    match lhs {
        Value::Slot(slot) => {
            let value = compute(slot.get())?;
            slot.set(value.clone());
            stack.push(value);
        }
        current => {
            let target = postfix
                .get(1)
                .filter(|t| t.kind == Kind::Variable)
                .ok_or_else(|| {
                    ScriptError::syntax("left side of assignment is not assignable")
                })?;
            let value = compute(current)?;
            env.set(target.text.clone(), value.clone());
            stack.push(value);
        }
    }
    Ok(())
}

/// Binary operator semantics shared by plain and compound-assignment forms.
pub(crate) fn binary(op: &str, lhs: Value, rhs: Value) -> Result<Value, ScriptError> {
    match op {
        "+" if matches!(lhs, Value::Str(_)) || matches!(rhs, Value::Str(_)) => {
            Ok(Value::Str(format!("{}{}", lhs.text(), rhs.text())))
        }
        "+" | "-" | "*" | "/" | "%" | "<<" | ">>" | ">>>" => {
            let (a, b) = numeric_pair(op, &lhs, &rhs)?;
            let result = match op {
                "+" => a.add(b)?,
                "-" => a.sub(b)?,
                "*" => a.mul(b)?,
                "/" => a.div(b)?,
                "%" => a.rem(b)?,
                "<<" => a.shl(b)?,
                // the dialect's unsigned right shift behaves like the signed one
                _ => a.shr(b)?,
            };
            Ok(Value::Num(result))
        }
        "&" | "|" | "^" | "&&" | "||" => logical(op, &lhs, &rhs),
        "==" | "!=" => {
            let equal = equality(op, &lhs, &rhs)?;
            Ok(Value::Bool(if op == "==" { equal } else { !equal }))
        }
        "<" | "<=" | ">" | ">=" => ordering(op, &lhs, &rhs),
        _ => Err(ScriptError::syntax(format!("unknown operator '{op}'"))),
    }
}

fn numeric_pair<'a>(
    op: &str,
    lhs: &'a Value,
    rhs: &'a Value,
) -> Result<(&'a Num, &'a Num), ScriptError> {
    match (lhs, rhs) {
        (Value::Num(a), Value::Num(b)) => Ok((a, b)),
        _ => Err(ScriptError::type_error(format!(
            "'{op}' cannot combine {} and {}",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

/// `&`, `|`, `^` act logically on two booleans and bitwise on two integers.
/// `&&`/`||` share the rules; evaluation elision is the gate's job alone.
fn logical(op: &str, lhs: &Value, rhs: &Value) -> Result<Value, ScriptError> {
    match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => {
            let result = match op {
                "&" | "&&" => *a && *b,
                "|" | "||" => *a || *b,
                _ => a != b,
            };
            Ok(Value::Bool(result))
        }
        (Value::Num(a), Value::Num(b)) => {
            let result = match op {
                "&" | "&&" => a.bit_and(b)?,
                "|" | "||" => a.bit_or(b)?,
                _ => a.bit_xor(b)?,
            };
            Ok(Value::Num(result))
        }
        _ => Err(ScriptError::type_error(format!(
            "'{op}' needs two booleans or two integers, got {} and {}",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn equality(op: &str, lhs: &Value, rhs: &Value) -> Result<bool, ScriptError> {
    match (lhs, rhs) {
        (Value::Num(a), Value::Num(b)) => Ok(a == b),
        (Value::Str(a), Value::Str(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, _) | (_, Value::Null) => Ok(false),
        _ => Err(ScriptError::type_error(format!(
            "'{op}' cannot compare {} and {}",
            lhs.type_name(),
            rhs.type_name()
        ))),
    }
}

fn ordering(op: &str, lhs: &Value, rhs: &Value) -> Result<Value, ScriptError> {
    let order = match (lhs, rhs) {
        (Value::Num(a), Value::Num(b)) => a.cmp(b),
        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        _ => {
            return Err(ScriptError::type_error(format!(
                "'{op}' cannot order {} and {}",
                lhs.type_name(),
                rhs.type_name()
            )));
        }
    };
    let result = match op {
        "<" => order == Ordering::Less,
        "<=" => order != Ordering::Greater,
        ">" => order == Ordering::Greater,
        _ => order != Ordering::Less,
    };
    Ok(Value::Bool(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_in(expr: &str, env: &mut Env) -> Result<Value, ScriptError> {
        Interp::new().eval(expr, env)
    }

    fn eval_one(expr: &str) -> Value {
        eval_in(expr, &mut Env::new()).unwrap()
    }

    fn num(text: &str) -> Value {
        Value::Num(Num::parse(text).unwrap())
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(eval_one("(2 + 2) * (1 + 1)"), num("8"));
        assert_eq!(eval_one("2 + 2 * 3"), num("8"));
        assert_eq!(eval_one("(1 ^ (1 | 2)) & 3"), num("2"));
        assert_eq!(eval_one("8 - 4 - 2"), num("2"));
    }

    #[test]
    fn test_scale_invariant_equality() {
        assert_eq!(eval_one("2.000 == 2.0"), Value::Bool(true));
        assert_eq!(eval_one("2.000 == 2"), Value::Bool(true));
        assert_eq!(eval_one("2 != 2.00"), Value::Bool(false));
    }

    #[test]
    fn test_string_concatenation_coerces_numbers() {
        assert_eq!(eval_one("'X' + 10"), Value::Str("X10".to_string()));
        assert_eq!(eval_one("10 + 'X'"), Value::Str("10X".to_string()));
        assert_eq!(eval_one("'a' + 'b'"), Value::Str("ab".to_string()));
        assert_eq!(eval_one("'is ' + true"), Value::Str("is true".to_string()));
    }

    #[test]
    fn test_string_ordering_is_lexicographic() {
        assert_eq!(eval_one("'abc' < 'abd'"), Value::Bool(true));
        assert_eq!(eval_one("'b' >= 'a'"), Value::Bool(true));
    }

    #[test]
    fn test_null_comparisons() {
        assert_eq!(eval_one("missing == null"), Value::Bool(true));
        assert_eq!(eval_one("1 == null"), Value::Bool(false));
        assert_eq!(eval_one("1 != null"), Value::Bool(true));
        assert!(matches!(
            eval_in("missing < 1", &mut Env::new()),
            Err(ScriptError::Type(_))
        ));
    }

    #[test]
    fn test_mixed_type_ordering_fails() {
        assert!(matches!(
            eval_in("'1' < 2", &mut Env::new()),
            Err(ScriptError::Type(_))
        ));
    }

    #[test]
    fn test_assignment_writes_and_yields_value() {
        let mut env = Env::new();
        assert_eq!(eval_in("x = 41 + 1", &mut env).unwrap(), num("42"));
        assert_eq!(env.get("x"), Some(num("42")));
        assert_eq!(eval_in("x += 8", &mut env).unwrap(), num("50"));
        assert_eq!(env.get("x"), Some(num("50")));
        assert_eq!(eval_in("x /= 5", &mut env).unwrap(), num("10"));
        assert_eq!(env.get("x"), Some(num("10")));
    }

    #[test]
    fn test_assignment_to_literal_fails() {
        assert!(matches!(
            eval_in("5 = 3", &mut Env::new()),
            Err(ScriptError::Syntax(_))
        ));
    }

    #[test]
    fn test_compound_assignment_on_unbound_fails() {
        assert!(matches!(
            eval_in("ghost += 1", &mut Env::new()),
            Err(ScriptError::Type(_))
        ));
    }

    #[test]
    fn test_pre_and_post_step() {
        let mut env = Env::new();
        eval_in("ii = 5", &mut env).unwrap();
        eval_in("jj = 3", &mut env).unwrap();
        assert_eq!(eval_in("ii-- + jj--", &mut env).unwrap(), num("8"));
        assert_eq!(env.get("ii"), Some(num("4")));
        assert_eq!(env.get("jj"), Some(num("2")));

        assert_eq!(eval_in("++ii + ++jj", &mut env).unwrap(), num("8"));
        assert_eq!(env.get("ii"), Some(num("5")));
        assert_eq!(env.get("jj"), Some(num("3")));
    }

    #[test]
    fn test_pre_step_applies_before_second_read() {
        let mut env = Env::new();
        eval_in("ii = 5", &mut env).unwrap();
        assert_eq!(eval_in("--ii + ii", &mut env).unwrap(), num("8"));
        assert_eq!(env.get("ii"), Some(num("4")));
    }

    #[test]
    fn test_short_circuit_and_skips_side_effects() {
        let mut env = Env::new();
        eval_in("ii = 5", &mut env).unwrap();
        assert_eq!(eval_in("ii == 5 && ++ii == 6", &mut env).unwrap(), Value::Bool(true));
        assert_eq!(env.get("ii"), Some(num("6")));

        // Left side is now false, so the increment must not run
        assert_eq!(eval_in("ii == 5 && ++ii == 6", &mut env).unwrap(), Value::Bool(false));
        assert_eq!(env.get("ii"), Some(num("6")));
    }

    #[test]
    fn test_short_circuit_or() {
        let mut env = Env::new();
        eval_in("ii = 1", &mut env).unwrap();
        assert_eq!(eval_in("ii == 1 || ++ii == 2", &mut env).unwrap(), Value::Bool(true));
        assert_eq!(env.get("ii"), Some(num("1")));
        assert_eq!(eval_in("ii == 0 || ++ii == 2", &mut env).unwrap(), Value::Bool(true));
        assert_eq!(env.get("ii"), Some(num("2")));
    }

    #[test]
    fn test_chained_short_circuit() {
        let mut env = Env::new();
        eval_in("a = 1", &mut env).unwrap();
        assert_eq!(
            eval_in("a == 1 && a < 5 && a > 0", &mut env).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            eval_in("a == 2 && a < 5 && a > 0", &mut env).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_logical_ops_on_booleans_and_integers() {
        assert_eq!(eval_one("true & false"), Value::Bool(false));
        assert_eq!(eval_one("true | false"), Value::Bool(true));
        assert_eq!(eval_one("true ^ true"), Value::Bool(false));
        assert_eq!(eval_one("6 & 3"), num("2"));
        assert_eq!(eval_one("!true"), Value::Bool(false));
        assert_eq!(eval_one("!0"), num("-1"));
    }

    #[test]
    fn test_array_reads_and_writes() {
        let mut env = Env::new();
        assert_eq!(eval_in("a[5]", &mut env).unwrap(), Value::Null);
        eval_in("a[5] = 7", &mut env).unwrap();
        assert_eq!(eval_in("a[5]", &mut env).unwrap(), num("7"));
        assert_eq!(eval_in("a[5] += 1", &mut env).unwrap(), num("8"));
        assert_eq!(eval_in("a[5]++", &mut env).unwrap(), num("8"));
        assert_eq!(eval_in("a[5]", &mut env).unwrap(), num("9"));
        assert_eq!(eval_in("a[2 + 3]", &mut env).unwrap(), num("9"));
    }

    #[test]
    fn test_array_compound_on_empty_slot_fails() {
        let mut env = Env::new();
        assert!(matches!(
            eval_in("b[1] += 1", &mut env),
            Err(ScriptError::Type(_))
        ));
    }

    #[test]
    fn test_array_index_must_be_integer() {
        let mut env = Env::new();
        assert!(matches!(
            eval_in("a[1.5]", &mut env),
            Err(ScriptError::TypeMismatch(_))
        ));
        assert!(matches!(
            eval_in("a['x']", &mut env),
            Err(ScriptError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_unknown_function_is_a_name_error() {
        assert!(matches!(
            eval_in("nosuch(1)", &mut Env::new()),
            Err(ScriptError::Name(_))
        ));
    }

    #[test]
    fn test_builtin_call_from_expression() {
        assert_eq!(eval_one("max(2, 3) + min(1, 0)"), num("3"));
        assert_eq!(eval_one("MAX(2, 3)"), num("3"));
    }

    #[test]
    fn test_missing_variable_reads_as_null() {
        assert_eq!(eval_one("nothing == null"), Value::Bool(true));
    }

    #[test]
    fn test_shift_expressions() {
        assert_eq!(eval_one("1 << 4"), num("16"));
        assert_eq!(eval_one("-5 >> 1"), num("-2"));
        assert_eq!(eval_one("-5 >>> 1"), num("-2"));
    }

    #[test]
    fn test_stack_imbalance_is_internal() {
        assert!(matches!(
            eval_in("1 2", &mut Env::new()),
            Err(ScriptError::Internal(_))
        ));
    }

    #[test]
    fn test_errors_name_the_expression() {
        let err = eval_in("1 % 2.0", &mut Env::new()).unwrap_err();
        assert!(err.to_string().contains("1 % 2.0"), "got: {err}");
    }
}
