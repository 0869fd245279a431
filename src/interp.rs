// ABOUTME: Statement interpreter: walks the indentation tree and drives expression evaluation

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use crate::block::{self, Node};
use crate::builtins;
use crate::builtins::console::OutputSink;
use crate::env::Env;
use crate::error::ScriptError;
use crate::eval;
use crate::host::{FnTable, HostFn};
use crate::lexer;
use crate::observer::{LineObserver, NoopObserver};
use crate::parser;
use crate::token::Token;
use crate::value::Value;
use std::cell::RefCell;

/// Pause taken after every observer callback so a spinning script cannot
/// starve the host's control thread.
const OBSERVER_PAUSE: Duration = Duration::from_micros(100);

/// How a statement walk ended.
pub(crate) enum Flow {
    Normal,
    Return(Value),
}

#[derive(Clone)]
struct UserFn {
    params: Rc<Vec<String>>,
    body: Rc<Vec<Node>>,
}

/// The interpreter: host functions, user functions declared during the run,
/// the line observer, and a per-source-line postfix cache.
pub struct Interp {
    host_fns: FnTable,
    user_fns: HashMap<String, UserFn>,
    observer: Box<dyn LineObserver>,
    postfix_cache: HashMap<String, Rc<Vec<Token>>>,
    out: OutputSink,
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

impl Interp {
    /// Interpreter with the builtin functions registered, console output on
    /// stdout, and an observer that watches nothing.
    pub fn new() -> Self {
        let out: OutputSink = Rc::new(RefCell::new(Box::new(io::stdout()) as Box<dyn Write>));
        let mut host_fns = FnTable::new();
        builtins::register_builtins(&mut host_fns, &out);
        Interp {
            host_fns,
            user_fns: HashMap::new(),
            observer: Box::new(NoopObserver),
            postfix_cache: HashMap::new(),
            out,
        }
    }

    /// Replace the line observer used by subsequent runs.
    pub fn set_observer(&mut self, observer: Box<dyn LineObserver>) {
        self.observer = observer;
    }

    /// Register a host function, replacing any existing one with the same name.
    pub fn register(&mut self, func: Rc<dyn HostFn>) {
        self.host_fns.register(func);
    }

    /// Redirect console output (`print`/`println`) to the given writer.
    pub fn set_output(&mut self, writer: Box<dyn Write>) {
        *self.out.borrow_mut() = writer;
    }

    /// Run a script to completion. The result is the value of a top-level
    /// `return`, or null. The observer sees every executed line and a final
    /// call with line 0; returning `Stopped` from it surfaces here as
    /// `ScriptError::Stopped` with all prior variable mutations retained.
    pub fn run(&mut self, script: &str) -> Result<Value, ScriptError> {
        let tree = block::parse_tree(script);
        self.user_fns.clear();
        let mut env = Env::new();
        let flow = self.walk(&tree, &mut env)?;
        self.observe(0, &env)?;
        Ok(match flow {
            Flow::Return(value) => value,
            Flow::Normal => Value::Null,
        })
    }

    /// Evaluate one expression against an environment. Postfix vectors are
    /// cached per distinct source text, so loop bodies parse once.
    pub fn eval(&mut self, src: &str, env: &mut Env) -> Result<Value, ScriptError> {
        let src = src.trim();
        if src.is_empty() {
            return Err(ScriptError::syntax("empty expression"));
        }
        let postfix = match self.postfix_cache.get(src) {
            Some(cached) => Rc::clone(cached),
            None => {
                let tokens = lexer::tokenize(src).map_err(|e| e.in_expr(src))?;
                let postfix = Rc::new(parser::to_postfix(tokens).map_err(|e| e.in_expr(src))?);
                self.postfix_cache.insert(src.to_string(), Rc::clone(&postfix));
                postfix
            }
        };
        eval::eval_postfix(self, &postfix, env).map_err(|e| e.in_expr(src))
    }

    fn eval_bool(&mut self, src: &str, env: &mut Env) -> Result<bool, ScriptError> {
        match self.eval(src, env)? {
            Value::Bool(b) => Ok(b),
            other => Err(ScriptError::type_error(format!(
                "condition must be a boolean, got {}",
                other.type_name()
            ))
            .in_expr(src.trim())),
        }
    }

    fn observe(&mut self, line: usize, env: &Env) -> Result<(), ScriptError> {
        self.observer.on_line(line, env)?;
        thread::sleep(OBSERVER_PAUSE);
        Ok(())
    }

    /// Whether a function of this name exists, user-defined or host.
    pub(crate) fn knows_function(&self, name: &str) -> bool {
        self.user_fns.contains_key(&name.to_ascii_lowercase()) || self.host_fns.contains(name)
    }

    /// Resolve a function name case-insensitively (user functions shadow host
    /// ones) and invoke it, consuming its arguments from the value stack.
    pub(crate) fn call_function(
        &mut self,
        name: &str,
        stack: &mut Vec<Value>,
    ) -> Result<Value, ScriptError> {
        if let Some(func) = self.user_fns.get(&name.to_ascii_lowercase()).cloned() {
            let mut frame = Env::new();
            for param in func.params.iter().rev() {
                let value = stack.pop().ok_or_else(|| {
                    ScriptError::internal(format!("missing argument for '{name}'"))
                })?;
                frame.set(param.clone(), value.deref());
            }
            return Ok(match self.walk(&func.body, &mut frame)? {
                Flow::Return(value) => value,
                Flow::Normal => Value::Null,
            });
        }
        if let Some(func) = self.host_fns.get(name) {
            let mut args = Vec::with_capacity(func.arity());
            for _ in 0..func.arity() {
                let value = stack.pop().ok_or_else(|| {
                    ScriptError::internal(format!("missing argument for '{name}'"))
                })?;
                args.push(value.deref());
            }
            args.reverse();
            return func.call(&args);
        }
        Err(ScriptError::Name(name.to_string()))
    }

    fn walk(&mut self, nodes: &[Node], env: &mut Env) -> Result<Flow, ScriptError> {
        let mut i = 0;
        while i < nodes.len() {
            match &nodes[i] {
                Node::Block(children) => {
                    // free-standing indentation runs in the current environment
                    if let Flow::Return(value) = self.walk(children, env)? {
                        return Ok(Flow::Return(value));
                    }
                    i += 1;
                }
                Node::Line { number, text } => {
                    self.observe(*number, env)?;
                    let (keyword, rest) = split_keyword(text);
                    let (next, flow) = match keyword {
                        "if" => self.run_if(nodes, i, rest, env)?,
                        "elif" => {
                            return Err(ScriptError::syntax("'elif' without a matching 'if'"));
                        }
                        "else" => {
                            return Err(ScriptError::syntax("'else' without a matching 'if'"));
                        }
                        "while" => self.run_while(nodes, i, *number, rest, env)?,
                        "for" => self.run_for(nodes, i, *number, rest, env)?,
                        "function" => self.run_declaration(nodes, i, rest)?,
                        "return" => {
                            let value = if rest.is_empty() {
                                Value::Null
                            } else {
                                self.eval(rest, env)?
                            };
                            (i + 1, Flow::Return(value))
                        }
                        "end" => (i + 1, Flow::Normal),
                        _ => {
                            self.eval(text, env)?;
                            (i + 1, Flow::Normal)
                        }
                    };
                    if let Flow::Return(value) = flow {
                        return Ok(Flow::Return(value));
                    }
                    i = next;
                }
            }
        }
        Ok(Flow::Normal)
    }

    /// Run a block body on a copy of the environment, then fold writes to
    /// names that exist outside back into the enclosing environment.
    fn run_block(&mut self, children: &[Node], env: &mut Env) -> Result<Flow, ScriptError> {
        let mut inner = env.child();
        let flow = self.walk(children, &mut inner)?;
        env.absorb(inner);
        Ok(flow)
    }

    fn run_if(
        &mut self,
        nodes: &[Node],
        i: usize,
        cond: &str,
        env: &mut Env,
    ) -> Result<(usize, Flow), ScriptError> {
        let Some(Node::Block(children)) = nodes.get(i + 1) else {
            return Err(ScriptError::syntax("'if' without an indented block"));
        };
        let mut taken = self.eval_bool(cond, env)?;
        if taken {
            if let Flow::Return(value) = self.run_block(children, env)? {
                return Ok((i, Flow::Return(value)));
            }
        }

        // Consume the elif/else chain that follows as siblings
        let mut idx = i + 2;
        while idx < nodes.len() {
            let Node::Line { number, text } = &nodes[idx] else {
                break;
            };
            let (keyword, rest) = split_keyword(text);
            match keyword {
                "elif" => {
                    let Some(Node::Block(children)) = nodes.get(idx + 1) else {
                        return Err(ScriptError::syntax("'elif' without an indented block"));
                    };
                    if !taken {
                        self.observe(*number, env)?;
                        if self.eval_bool(rest, env)? {
                            taken = true;
                            if let Flow::Return(value) = self.run_block(children, env)? {
                                return Ok((idx, Flow::Return(value)));
                            }
                        }
                    }
                    idx += 2;
                }
                "else" => {
                    let Some(Node::Block(children)) = nodes.get(idx + 1) else {
                        return Err(ScriptError::syntax("'else' without an indented block"));
                    };
                    if !taken {
                        self.observe(*number, env)?;
                        if let Flow::Return(value) = self.run_block(children, env)? {
                            return Ok((idx, Flow::Return(value)));
                        }
                    }
                    idx += 2;
                    break;
                }
                _ => break,
            }
        }
        Ok((idx, Flow::Normal))
    }

    fn run_while(
        &mut self,
        nodes: &[Node],
        i: usize,
        line: usize,
        cond: &str,
        env: &mut Env,
    ) -> Result<(usize, Flow), ScriptError> {
        let Some(Node::Block(children)) = nodes.get(i + 1) else {
            return Err(ScriptError::syntax("'while' without an indented block"));
        };
        let mut first = true;
        loop {
            if !first {
                self.observe(line, env)?;
            }
            first = false;
            let mut inner = env.child();
            let run_body = self.eval_bool(cond, &mut inner)?;
            if !run_body {
                env.absorb(inner);
                return Ok((i + 2, Flow::Normal));
            }
            let flow = self.walk(children, &mut inner)?;
            env.absorb(inner);
            if let Flow::Return(value) = flow {
                return Ok((i, Flow::Return(value)));
            }
        }
    }

    fn run_for(
        &mut self,
        nodes: &[Node],
        i: usize,
        line: usize,
        header: &str,
        env: &mut Env,
    ) -> Result<(usize, Flow), ScriptError> {
        let Some(Node::Block(children)) = nodes.get(i + 1) else {
            return Err(ScriptError::syntax("'for' without an indented block"));
        };
        // The parenthesis wrapping is optional
        let header = header.trim();
        let header = header
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(header);
        let parts: Vec<&str> = header.split(';').map(str::trim).collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(ScriptError::syntax("'for' needs 'init; test; step'"));
        }
        let (init, cond, step) = (parts[0], parts[1], parts[2]);

        self.eval(init, env)?;
        let mut first = true;
        loop {
            if !first {
                self.observe(line, env)?;
            }
            first = false;
            let mut inner = env.child();
            if !self.eval_bool(cond, &mut inner)? {
                env.absorb(inner);
                return Ok((i + 2, Flow::Normal));
            }
            let flow = self.walk(children, &mut inner)?;
            if let Flow::Return(value) = flow {
                env.absorb(inner);
                return Ok((i, Flow::Return(value)));
            }
            self.eval(step, &mut inner)?;
            env.absorb(inner);
        }
    }

    fn run_declaration(
        &mut self,
        nodes: &[Node],
        i: usize,
        decl: &str,
    ) -> Result<(usize, Flow), ScriptError> {
        let open = decl
            .find('(')
            .ok_or_else(|| ScriptError::syntax("function declaration needs '(params)'"))?;
        let close = decl
            .rfind(')')
            .filter(|&c| c > open && decl[c + 1..].trim().is_empty())
            .ok_or_else(|| ScriptError::syntax("function declaration needs '(params)'"))?;

        let name = decl[..open].trim();
        if !is_identifier(name) {
            return Err(ScriptError::syntax(format!("bad function name '{name}'")));
        }
        let inner = decl[open + 1..close].trim();
        let params: Vec<String> = if inner.is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(|p| p.trim().to_string()).collect()
        };
        for param in &params {
            if !is_identifier(param) {
                return Err(ScriptError::syntax(format!(
                    "bad parameter '{param}' in function '{name}'"
                )));
            }
        }
        let Some(Node::Block(children)) = nodes.get(i + 1) else {
            return Err(ScriptError::syntax(format!("function '{name}' has no body")));
        };
        self.user_fns.insert(
            name.to_ascii_lowercase(),
            UserFn {
                params: Rc::new(params),
                body: Rc::new(children.clone()),
            },
        );
        Ok((i + 2, Flow::Normal))
    }
}

/// Split off a control keyword when the line starts with one. Keywords are
/// only recognised as the first token, so `iffy = 1` stays an expression.
fn split_keyword(text: &str) -> (&str, &str) {
    let end = text
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(text.len());
    let next = text[end..].chars().next();
    if matches!(next, Some(c) if c == '.' || c == '_' || c == ':' || c.is_alphanumeric()) {
        return ("", text);
    }
    let word = &text[..end];
    match word {
        "if" | "elif" | "else" | "while" | "for" | "function" | "return" | "end" => {
            (word, text[end..].trim())
        }
        _ => ("", text),
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '.' || c == '_' || c == ':')
}
