// ABOUTME: Shunting-yard conversion from infix tokens to a postfix vector

use crate::error::ScriptError;
use crate::token::{Kind, StepMark, Token};

/// Convert an infix token stream to postfix order. Operators pop while the
/// stack holds strictly stronger-binding operators; grouping openers fence
/// the popping; a function or array head beneath a closed group moves to the
/// output, realising the call or index.
pub fn to_postfix(tokens: Vec<Token>) -> Result<Vec<Token>, ScriptError> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();

    for token in tokens {
        match token.kind {
            Kind::Tag | Kind::Literal | Kind::StrLit | Kind::Variable => out.push(token),
            Kind::FuncHead | Kind::ArrayHead => stack.push(token),
            Kind::Gate => {
                pop_stronger(&mut stack, &mut out, token.prec);
                stack.push(token);
            }
            Kind::Comma => {
                loop {
                    match stack.last() {
                        Some(top) if is_opener(top) => break,
                        Some(_) => {
                            if let Some(top) = stack.pop() {
                                out.push(top);
                            }
                        }
                        None => return Err(ScriptError::syntax("',' outside of a call")),
                    }
                }
            }
            Kind::Op => match token.text.as_str() {
                "(" | "[" => stack.push(token),
                ")" => {
                    close_group(&mut stack, &mut out, "(", ")")?;
                    if stack.last().is_some_and(|top| top.kind == Kind::FuncHead) {
                        if let Some(head) = stack.pop() {
                            out.push(head);
                        }
                    }
                }
                "]" => {
                    close_group(&mut stack, &mut out, "[", "]")?;
                    match stack.last() {
                        Some(top) if top.kind == Kind::ArrayHead => {
                            if let Some(head) = stack.pop() {
                                out.push(head);
                            }
                        }
                        _ => return Err(ScriptError::syntax("'[' without an array name")),
                    }
                }
                _ => {
                    pop_stronger(&mut stack, &mut out, token.prec);
                    stack.push(token);
                }
            },
        }
    }

    while let Some(top) = stack.pop() {
        if is_opener(&top) {
            return Err(ScriptError::syntax(format!("unbalanced '{}'", top.text)));
        }
        if matches!(top.kind, Kind::FuncHead | Kind::ArrayHead) {
            return Err(ScriptError::syntax(format!("unclosed call to '{}'", top.text)));
        }
        out.push(top);
    }

    Ok(fuse_postfix(out))
}

fn is_opener(token: &Token) -> bool {
    token.is_op("(") || token.is_op("[")
}

/// Pop operators that bind strictly more tightly than `prec` to the output.
fn pop_stronger(stack: &mut Vec<Token>, out: &mut Vec<Token>, prec: u8) {
    while let Some(top) = stack.last() {
        let poppable = matches!(top.kind, Kind::Op | Kind::Gate) && !is_opener(top);
        if poppable && top.prec > prec {
            if let Some(top) = stack.pop() {
                out.push(top);
            }
        } else {
            break;
        }
    }
}

/// Pop to the output until the matching opener, which is discarded.
fn close_group(
    stack: &mut Vec<Token>,
    out: &mut Vec<Token>,
    opener: &str,
    closer: &str,
) -> Result<(), ScriptError> {
    loop {
        match stack.pop() {
            Some(top) if top.is_op(opener) => return Ok(()),
            Some(top) => {
                if matches!(top.kind, Kind::FuncHead | Kind::ArrayHead) || is_opener(&top) {
                    return Err(ScriptError::syntax(format!("unbalanced '{closer}'")));
                }
                out.push(top);
            }
            None => return Err(ScriptError::syntax(format!("unbalanced '{closer}'"))),
        }
    }
}

/// Attach `++`/`--` directly following a variable or array head in the
/// output to that token as a post-step marker.
fn fuse_postfix(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        let fuses = token.kind == Kind::Op
            && (token.text == "++" || token.text == "--")
            && out
                .last()
                .is_some_and(|prev| prev.is_lvalue() && prev.step.is_none());
        if fuses {
            if let Some(prev) = out.last_mut() {
                prev.step = Some(StepMark::post(&token.text));
            }
            continue;
        }
        out.push(token);
    }
    out
}
