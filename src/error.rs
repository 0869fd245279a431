// ABOUTME: Error types surfaced by expression parsing and script execution

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// Malformed source: unbalanced grouping, unknown operator, bad statement shape
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Operand kinds a well-typed program would never combine
    #[error("type error: {0}")]
    Type(String),

    /// Integer-only operation applied to a decimal or non-numeric operand
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Call to a function that is neither user-defined nor host-provided
    #[error("unknown function: {0}")]
    Name(String),

    /// Arithmetic failure such as division by zero or an out-of-range exponent
    #[error("math error: {0}")]
    Math(String),

    /// Evaluator bookkeeping went wrong (value stack imbalance)
    #[error("internal error: {0}")]
    Internal(String),

    /// Cooperative cancellation raised by the line observer
    #[error("execution stopped")]
    Stopped,
}

impl ScriptError {
    pub fn syntax(message: impl Into<String>) -> Self {
        ScriptError::Syntax(message.into())
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        ScriptError::Type(message.into())
    }

    pub fn mismatch(message: impl Into<String>) -> Self {
        ScriptError::TypeMismatch(message.into())
    }

    pub fn math(message: impl Into<String>) -> Self {
        ScriptError::Math(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ScriptError::Internal(message.into())
    }

    /// Attach the source expression text so diagnostics name the offending
    /// expression. `Stopped` carries no message and passes through untouched.
    pub fn in_expr(self, expr: &str) -> Self {
        let tag = |m: String| format!("{m} in '{expr}'");
        match self {
            ScriptError::Syntax(m) => ScriptError::Syntax(tag(m)),
            ScriptError::Type(m) => ScriptError::Type(tag(m)),
            ScriptError::TypeMismatch(m) => ScriptError::TypeMismatch(tag(m)),
            ScriptError::Name(m) => ScriptError::Name(tag(m)),
            ScriptError::Math(m) => ScriptError::Math(tag(m)),
            ScriptError::Internal(m) => ScriptError::Internal(tag(m)),
            ScriptError::Stopped => ScriptError::Stopped,
        }
    }

    /// True for the cooperative-cancel signal, which hosts present as a
    /// non-failure outcome rather than an error.
    pub fn is_stopped(&self) -> bool {
        matches!(self, ScriptError::Stopped)
    }
}
