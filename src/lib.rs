// ABOUTME: Library module exposing the interpreter components

pub mod block;
pub mod builtins;
pub mod config;
pub mod env;
pub mod error;
pub mod eval;
pub mod host;
pub mod interp;
pub mod json;
pub mod lexer;
pub mod num;
pub mod observer;
pub mod parser;
pub mod token;
pub mod value;

pub use env::Env;
pub use error::ScriptError;
pub use host::{FnTable, HostFn, SimpleFn};
pub use interp::Interp;
pub use num::Num;
pub use observer::{BreakObserver, LineObserver, NoopObserver, Stopped};
pub use value::Value;

use std::rc::Rc;

/// Run a script with extra host-supplied functions and a line observer. The
/// result is the value of a top-level `return` (null otherwise);
/// `ScriptError::Stopped` reports cooperative cancellation by the observer.
pub fn run(
    script: &str,
    host_fns: Vec<Rc<dyn HostFn>>,
    observer: Box<dyn LineObserver>,
) -> Result<Value, ScriptError> {
    let mut interp = Interp::new();
    for func in host_fns {
        interp.register(func);
    }
    interp.set_observer(observer);
    interp.run(script)
}
