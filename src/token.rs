// ABOUTME: Token types shared by the expression tokenizer and the postfix converter

use std::fmt;

/// What a token stands for in the expression stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Leading token carrying the original expression text for diagnostics
    Tag,
    Variable,
    /// Numeric literal, parsed at evaluation time
    Literal,
    StrLit,
    Op,
    /// Short-circuit sentinel paired with a `&&`/`||` operator by correlation id
    Gate,
    /// Identifier directly followed by `(`
    FuncHead,
    /// Identifier directly followed by `[`
    ArrayHead,
    Comma,
}

/// Increment/decrement fused onto a variable or array-head token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMark {
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl StepMark {
    pub fn pre(op: &str) -> StepMark {
        if op == "++" {
            StepMark::PreInc
        } else {
            StepMark::PreDec
        }
    }

    pub fn post(op: &str) -> StepMark {
        if op == "++" {
            StepMark::PostInc
        } else {
            StepMark::PostDec
        }
    }

    pub fn delta(self) -> i64 {
        match self {
            StepMark::PreInc | StepMark::PostInc => 1,
            StepMark::PreDec | StepMark::PostDec => -1,
        }
    }

    /// True when the delta applies before the value is read.
    pub fn is_pre(self) -> bool {
        matches!(self, StepMark::PreInc | StepMark::PreDec)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: Kind,
    pub text: String,
    pub prec: u8,
    pub gate_id: Option<u32>,
    pub step: Option<StepMark>,
}

/// Precedence of the short-circuit gate sentinels.
pub const GATE_PREC: u8 = 2;
/// Precedence of function-call and array-index application.
pub const APPLY_PREC: u8 = 10;

/// Binding strength of an operator, low to high. All binary operators are
/// left-associative. Returns `None` for unknown operator text.
pub fn precedence(op: &str) -> Option<u8> {
    Some(match op {
        "=" | "+=" | "-=" | "*=" | "/=" | "%=" => 0,
        "|" | "||" | "&" | "&&" | "^" => 1,
        "==" | "!=" => 3,
        "<" | "<=" | ">" | ">=" => 4,
        "<<" | ">>" | ">>>" => 5,
        "+" | "-" => 6,
        "*" | "/" | "%" => 7,
        "!" | "~" | "++" | "--" => 8,
        "(" | ")" | "[" | "]" => 9,
        _ => return None,
    })
}

impl Token {
    fn new(kind: Kind, text: impl Into<String>, prec: u8) -> Token {
        Token {
            kind,
            text: text.into(),
            prec,
            gate_id: None,
            step: None,
        }
    }

    pub fn tag(text: impl Into<String>) -> Token {
        Token::new(Kind::Tag, text, 0)
    }

    pub fn variable(name: impl Into<String>) -> Token {
        Token::new(Kind::Variable, name, 0)
    }

    pub fn literal(text: impl Into<String>) -> Token {
        Token::new(Kind::Literal, text, 0)
    }

    pub fn str_lit(text: impl Into<String>) -> Token {
        Token::new(Kind::StrLit, text, 0)
    }

    pub fn op(text: impl Into<String>, prec: u8) -> Token {
        Token::new(Kind::Op, text, prec)
    }

    pub fn gate(text: impl Into<String>, id: u32) -> Token {
        let mut token = Token::new(Kind::Gate, text, GATE_PREC);
        token.gate_id = Some(id);
        token
    }

    pub fn func_head(name: impl Into<String>) -> Token {
        Token::new(Kind::FuncHead, name, APPLY_PREC)
    }

    pub fn array_head(name: impl Into<String>) -> Token {
        Token::new(Kind::ArrayHead, name, APPLY_PREC)
    }

    pub fn comma() -> Token {
        Token::new(Kind::Comma, ",", 0)
    }

    pub fn is_op(&self, text: &str) -> bool {
        self.kind == Kind::Op && self.text == text
    }

    /// Tokens an increment/decrement can fuse onto.
    pub fn is_lvalue(&self) -> bool {
        matches!(self.kind, Kind::Variable | Kind::ArrayHead)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
