//! Console output built-ins: print, println
//!
//! Both write through a shared sink instead of straight to stdout, so a host
//! can capture script output for an output pane or a test buffer. Strings
//! render bare; other values use their display form. Both return null.

use crate::error::ScriptError;
use crate::host::{FnTable, HostFn};
use crate::value::Value;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Shared writer the console built-ins print through. Replacing the boxed
/// writer redirects every already-registered console function.
pub type OutputSink = Rc<RefCell<Box<dyn Write>>>;

struct Print {
    out: OutputSink,
    newline: bool,
}

impl HostFn for Print {
    fn name(&self) -> &str {
        if self.newline {
            "println"
        } else {
            "print"
        }
    }

    fn arity(&self) -> usize {
        1
    }

    fn call(&self, args: &[Value]) -> Result<Value, ScriptError> {
        let text = args.first().map(Value::text).unwrap_or_default();
        let mut out = self.out.borrow_mut();
        let written = if self.newline {
            writeln!(out, "{text}")
        } else {
            write!(out, "{text}")
        };
        written.map_err(|e| ScriptError::internal(format!("console write failed: {e}")))?;
        // Keep interactive hosts current even mid-run
        let _ = out.flush();
        Ok(Value::Null)
    }
}

/// Register print and println against the given sink.
pub fn register(table: &mut FnTable, out: &OutputSink) {
    table.register(Rc::new(Print {
        out: out.clone(),
        newline: false,
    }));
    table.register(Rc::new(Print {
        out: out.clone(),
        newline: true,
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::num::Num;

    fn capture() -> (FnTable, Rc<RefCell<Vec<u8>>>) {
        let buffer = Rc::new(RefCell::new(Vec::new()));
        let sink: OutputSink = Rc::new(RefCell::new(
            Box::new(SharedBuffer(Rc::clone(&buffer))) as Box<dyn Write>
        ));
        let mut table = FnTable::new();
        register(&mut table, &sink);
        (table, buffer)
    }

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

    #[test]
    fn test_println_appends_newline() {
        let (table, buffer) = capture();
        let println = table.get("println").unwrap();
        println.call(&[Value::Num(Num::from(5))]).unwrap();
        assert_eq!(String::from_utf8(buffer.borrow().clone()).unwrap(), "5\n");
    }

    #[test]
    fn test_print_renders_strings_bare() {
        let (table, buffer) = capture();
        let print = table.get("print").unwrap();
        print.call(&[Value::Str("hi".to_string())]).unwrap();
        print.call(&[Value::Bool(true)]).unwrap();
        assert_eq!(
            String::from_utf8(buffer.borrow().clone()).unwrap(),
            "hitrue"
        );
    }
}
