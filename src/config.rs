// ABOUTME: Version and interactive-mode text constants

pub const VERSION: &str = "1.0.0";
pub const WELCOME_MESSAGE: &str = "stepscript v1.0";
pub const WELCOME_SUBTITLE: &str =
    "An arbitrary-precision scripting language with step debugging hooks";
pub const WELCOME_FOOTER: &str =
    "Type an expression to evaluate it, 'vars' to list variables, 'quit' to exit.";
