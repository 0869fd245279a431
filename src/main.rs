// ABOUTME: Command-line runner and interactive REPL for the interpreter

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;

use stepscript::config;
use stepscript::json::env_to_json;
use stepscript::{Env, Interp, ScriptError, Stopped, Value};

/// Stepwise-debuggable scripting language with arbitrary-precision arithmetic
#[derive(Parser, Debug)]
#[command(name = "stepscript")]
#[command(version = config::VERSION)]
#[command(about = "A stepwise-debuggable scripting language with arbitrary-precision arithmetic")]
struct CliArgs {
    /// Script file to execute (omit to start the REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Echo each executed line number to stderr
    #[arg(long)]
    trace: bool,

    /// Stop when execution reaches LINE (can be repeated)
    #[arg(long = "break", value_name = "LINE", action = clap::ArgAction::Append)]
    breakpoints: Vec<usize>,

    /// Print the final variables as JSON after the run
    #[arg(long)]
    vars: bool,
}

#[derive(Default)]
struct RunState {
    hit: Option<usize>,
    finals: Option<serde_json::Value>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    match &args.script {
        Some(path) => run_file(path, &args),
        None => repl(),
    }
}

/// Execute a script file under the CLI's observer: tracing, breakpoints, and
/// a final variable snapshot for `--vars`.
fn run_file(path: &PathBuf, args: &CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read script file {}: {}", path.display(), e))?;

    let state = Rc::new(RefCell::new(RunState::default()));
    let breaks: HashSet<usize> = args.breakpoints.iter().copied().collect();
    let trace = args.trace;
    let observer = {
        let state = Rc::clone(&state);
        move |line: usize, env: &Env| -> Result<(), Stopped> {
            if trace && line > 0 {
                eprintln!("[line {line}]");
            }
            if line == 0 {
                state.borrow_mut().finals = Some(env_to_json(env));
            } else if breaks.contains(&line) {
                state.borrow_mut().hit = Some(line);
                return Err(Stopped);
            }
            Ok(())
        }
    };

    let mut interp = Interp::new();
    interp.set_observer(Box::new(observer));
    match interp.run(&source) {
        Ok(_) => {
            if args.vars {
                if let Some(finals) = state.borrow().finals.as_ref() {
                    println!("{}", serde_json::to_string_pretty(finals)?);
                }
            }
            Ok(())
        }
        Err(ScriptError::Stopped) => {
            match state.borrow().hit {
                Some(line) => println!("stopped at line {line}"),
                None => println!("stopped"),
            }
            Ok(())
        }
        Err(e) => Err(e.to_string().into()),
    }
}

/// Interactive expression loop with history and a persistent environment.
fn repl() -> Result<(), Box<dyn std::error::Error>> {
    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<(), DefaultHistory> =
        Editor::with_config(rl_config).map_err(|e| format!("failed to initialize REPL: {e}"))?;

    let history_file = ".stepscript_history";
    let _ = rl.load_history(history_file);

    println!("{}", config::WELCOME_MESSAGE);
    println!("{}", config::WELCOME_SUBTITLE);
    println!("{}", config::WELCOME_FOOTER);

    let mut interp = Interp::new();
    let mut env = Env::new();

    loop {
        match rl.readline("script> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line {
                    "quit" | "exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    "vars" => {
                        println!("{}", serde_json::to_string_pretty(&env_to_json(&env))?);
                        continue;
                    }
                    _ => {}
                }
                match interp.eval(line, &mut env) {
                    Ok(Value::Null) => {}
                    Ok(value) => println!("=> {value}"),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}
