// ABOUTME: Per-line observation hooks for stepping, breakpoints, and cancellation

use crate::env::Env;
use crate::error::ScriptError;
use std::collections::HashSet;

/// Cooperative-cancellation signal returned by an observer to end the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped;

impl From<Stopped> for ScriptError {
    fn from(_: Stopped) -> Self {
        ScriptError::Stopped
    }
}

/// Called before every executed statement with the line number and the
/// current variable bindings, and once more with line 0 when the run ends.
/// This is the host's suspension point: it may sleep, refresh a UI, or
/// return `Stopped` to cancel execution.
pub trait LineObserver {
    fn on_line(&mut self, line: usize, env: &Env) -> Result<(), Stopped>;
}

/// Observer that ignores every line.
pub struct NoopObserver;

impl LineObserver for NoopObserver {
    fn on_line(&mut self, _line: usize, _env: &Env) -> Result<(), Stopped> {
        Ok(())
    }
}

impl<F> LineObserver for F
where
    F: FnMut(usize, &Env) -> Result<(), Stopped>,
{
    fn on_line(&mut self, line: usize, env: &Env) -> Result<(), Stopped> {
        self(line, env)
    }
}

/// Stops execution the first time a breakpoint line is reached, recording
/// which line was hit.
pub struct BreakObserver {
    breaks: HashSet<usize>,
    pub hit: Option<usize>,
}

impl BreakObserver {
    pub fn new(lines: impl IntoIterator<Item = usize>) -> Self {
        BreakObserver {
            breaks: lines.into_iter().collect(),
            hit: None,
        }
    }
}

impl LineObserver for BreakObserver {
    fn on_line(&mut self, line: usize, _env: &Env) -> Result<(), Stopped> {
        if line > 0 && self.breaks.contains(&line) {
            self.hit = Some(line);
            return Err(Stopped);
        }
        Ok(())
    }
}
