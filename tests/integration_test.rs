// ABOUTME: End-to-end tests driving whole scripts through the public API

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use stepscript::{
    BreakObserver, Env, FnTable, Interp, Num, ScriptError, SimpleFn, Stopped, Value,
};

/// Writer that appends into a shared buffer, so tests can read what a script
/// printed after the interpreter is done with the sink.
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capturing_interp() -> (Interp, Rc<RefCell<Vec<u8>>>) {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let mut interp = Interp::new();
    interp.set_output(Box::new(SharedBuffer(Rc::clone(&buffer))));
    (interp, buffer)
}

fn printed(buffer: &Rc<RefCell<Vec<u8>>>) -> String {
    String::from_utf8(buffer.borrow().clone()).expect("script output was not UTF-8")
}

fn num(text: &str) -> Value {
    Value::Num(Num::parse(text).unwrap())
}

#[test]
fn test_while_loop_reaches_three_and_observer_revisits_lines() {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let finals = Rc::new(RefCell::new(None));
    let observer = {
        let lines = Rc::clone(&lines);
        let finals = Rc::clone(&finals);
        move |line: usize, env: &Env| -> Result<(), Stopped> {
            lines.borrow_mut().push(line);
            if line == 0 {
                *finals.borrow_mut() = env.get("ii");
            }
            Ok(())
        }
    };

    let mut interp = Interp::new();
    interp.set_observer(Box::new(observer));
    interp
        .run("ii = 0\nwhile (ii < 3)\n  ii = ii + 1\n")
        .unwrap();

    assert_eq!(finals.borrow().clone(), Some(num("3")));
    // The while line and its body are revisited once per iteration
    assert_eq!(*lines.borrow(), vec![1, 2, 3, 2, 3, 2, 3, 2, 0]);
}

#[test]
fn test_for_loop_prints_zero_through_nine() {
    let (mut interp, buffer) = capturing_interp();
    interp
        .run("for (ii = 0; ii < 10; ii++)\n  println(ii)\n")
        .unwrap();
    assert_eq!(printed(&buffer), "0\n1\n2\n3\n4\n5\n6\n7\n8\n9\n");
}

#[test]
fn test_user_function_result_is_printed() {
    let (mut interp, buffer) = capturing_interp();
    interp
        .run("function sum(a, b)\n  return a + b\nprintln(sum(2, 3))\n")
        .unwrap();
    assert_eq!(printed(&buffer), "5\n");
}

#[test]
fn test_arbitrary_precision_sum_of_three_cubes() {
    let script = "\
a = 569936821221962380720
b = -569936821113563493509
c = -472715493453327032
return a*a*a + b*b*b + c*c*c
";
    let mut interp = Interp::new();
    assert_eq!(interp.run(script).unwrap(), num("3"));
}

#[test]
fn test_breakpoint_cancels_with_no_later_observer_calls() {
    let script = "\
a = 1
b = 2
c = 3
d = 4
e = 5
f = 6
g = 7
h = 8
i = 9
j = 10
";
    let lines = Rc::new(RefCell::new(Vec::new()));
    let observer = {
        let lines = Rc::clone(&lines);
        move |line: usize, _env: &Env| -> Result<(), Stopped> {
            lines.borrow_mut().push(line);
            if line == 2 {
                return Err(Stopped);
            }
            Ok(())
        }
    };

    let mut interp = Interp::new();
    interp.set_observer(Box::new(observer));
    assert_eq!(interp.run(script), Err(ScriptError::Stopped));
    assert_eq!(*lines.borrow(), vec![1, 2]);
}

#[test]
fn test_break_observer_reports_the_hit_line() {
    let mut observer = BreakObserver::new([3]);
    let env = Env::new();
    use stepscript::LineObserver;
    assert!(observer.on_line(1, &env).is_ok());
    assert!(observer.on_line(3, &env).is_err());
    assert_eq!(observer.hit, Some(3));
}

#[test]
fn test_mixed_type_builtins() {
    let mut interp = Interp::new();
    assert_eq!(interp.run("return trunc(1.0/3, 2)\n").unwrap(), num("0.33"));

    let one = interp.run("return trunc(1.22, 0)\n").unwrap();
    assert_eq!(one, num("1"));
    assert!(matches!(one, Value::Num(Num::Int(_))));

    let dec_nine = interp.run("return pow(3.0, 2)\n").unwrap();
    assert_eq!(dec_nine, num("9.0"));
    assert!(matches!(dec_nine, Value::Num(Num::Dec(_))));

    let int_nine = interp.run("return pow(3, 2)\n").unwrap();
    assert_eq!(int_nine, num("9"));
    assert!(matches!(int_nine, Value::Num(Num::Int(_))));
}

#[test]
fn test_radix_round_trip() {
    let mut interp = Interp::new();
    assert_eq!(
        interp.run("return radix(255, 16)\n").unwrap(),
        Value::Str("FF".to_string())
    );
}

#[test]
fn test_string_concatenation_in_scripts() {
    let (mut interp, buffer) = capturing_interp();
    interp
        .run("println('X' + 10)\nprintln(10 + 'X')\nprintln('a' + 'b' + 'c')\n")
        .unwrap();
    assert_eq!(printed(&buffer), "X10\n10X\nabc\n");
}

#[test]
fn test_host_supplied_function() {
    let script = "return double(21)\n";
    fn double(args: &[Value]) -> Result<Value, ScriptError> {
        match &args[0] {
            Value::Num(n) => Ok(Value::Num(n.add(n)?)),
            other => Err(ScriptError::type_error(format!(
                "double: expected a number, got {}",
                other.type_name()
            ))),
        }
    }

    let result = stepscript::run(
        script,
        vec![Rc::new(SimpleFn::new("double", 1, double))],
        Box::new(stepscript::NoopObserver),
    )
    .unwrap();
    assert_eq!(result, num("42"));
}

#[test]
fn test_arrays_built_in_loops() {
    let script = "\
squares[0] = 0
for (ii = 0; ii < 5; ii++)
  squares[ii] = ii * ii
total = 0
for (ii = 0; ii < 5; ii++)
  total += squares[ii]
return total
";
    let mut interp = Interp::new();
    assert_eq!(interp.run(script).unwrap(), num("30"));
}

#[test]
fn test_sparse_array_reads_are_null() {
    let script = "\
a[1000000] = 1
r = ''
if a[5] == null
  r = 'sparse'
else
  r = 'dense'
return r
";
    let mut interp = Interp::new();
    assert_eq!(interp.run(script).unwrap(), Value::Str("sparse".to_string()));
}

#[test]
fn test_if_elif_else_selection() {
    let template = "\
x = VALUE
r = ''
if x < 0
  r = 'negative'
elif x == 0
  r = 'zero'
else
  r = 'positive'
return r
";
    let mut interp = Interp::new();
    for (value, expected) in [("-5", "negative"), ("0", "zero"), ("3", "positive")] {
        let script = template.replace("VALUE", value);
        assert_eq!(
            interp.run(&script).unwrap(),
            Value::Str(expected.to_string()),
            "for x = {value}"
        );
    }
}

#[test]
fn test_short_circuit_keeps_side_effects_conditional() {
    let script = "\
ii = 5
touched = ii == 5 && ++ii == 6
untouched = ii == 5 && ++ii == 7
return ii
";
    let mut interp = Interp::new();
    assert_eq!(interp.run(script).unwrap(), num("6"));
}

#[test]
fn test_recursive_function_with_millis_available() {
    // fact(20) overflows 64-bit arithmetic; the result must still be exact
    let script = "\
function fact(n)
  if n < 2
    return 1
  return n * fact(n - 1)
started = millis()
return fact(21)
";
    let mut interp = Interp::new();
    assert_eq!(
        interp.run(script).unwrap(),
        num("51090942171709440000")
    );
}

#[test]
fn test_errors_surface_with_expression_text() {
    let mut interp = Interp::new();
    let err = interp.run("x = 1 % 2.5\n").unwrap_err();
    assert!(matches!(err, ScriptError::TypeMismatch(_)));
    assert!(err.to_string().contains("1 % 2.5"), "got: {err}");
}

#[test]
fn test_non_boolean_condition_is_a_type_error() {
    let mut interp = Interp::new();
    assert!(matches!(
        interp.run("while 1\n  x = 2\n"),
        Err(ScriptError::Type(_))
    ));
}

#[test]
fn test_unknown_function_is_a_name_error() {
    let mut interp = Interp::new();
    assert!(matches!(
        interp.run("x = mystery(1)\n"),
        Err(ScriptError::Name(_))
    ));
}

#[test]
fn test_function_table_is_reset_between_runs() {
    let mut interp = Interp::new();
    interp
        .run("function once(a)\n  return a\nx = once(1)\n")
        .unwrap();
    assert!(matches!(
        interp.run("x = once(1)\n"),
        Err(ScriptError::Name(_))
    ));
}

#[test]
fn test_comments_and_quote_styles() {
    let (mut interp, buffer) = capturing_interp();
    let script = "\
// greeting demo
name = \"world\"   // double quotes read like single quotes
println('hello ' + name)
";
    interp.run(script).unwrap();
    assert_eq!(printed(&buffer), "hello world\n");
}

#[test]
fn test_fn_table_registration_is_visible_to_scripts() {
    let mut table = FnTable::new();
    fn forty_two(_args: &[Value]) -> Result<Value, ScriptError> {
        Ok(Value::Num(Num::from(42)))
    }
    table.register(Rc::new(SimpleFn::new("answer", 0, forty_two)));
    let answer = table.get("ANSWER").unwrap();
    assert_eq!(answer.call(&[]).unwrap(), num("42"));
}
