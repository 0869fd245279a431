// ABOUTME: Script preprocessor: comment stripping and indentation folding

/// One entry in the folded script tree: either a source line or the indented
/// block belonging to the line before it.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Line { number: usize, text: String },
    Block(Vec<Node>),
}

/// Fold a script into a tree of lines grouped by indentation. Line numbers
/// are 1-based and track the original source even across blank and
/// comment-only lines. Double quotes are normalised to single quotes and
/// `//` comments are dropped before folding.
///
/// Dedents to a level that never appeared are tolerated: the line attaches
/// at the nearest enclosing level instead of failing.
pub fn parse_tree(script: &str) -> Vec<Node> {
    struct Frame {
        indent: usize,
        nodes: Vec<Node>,
    }

    let mut stack = vec![Frame {
        indent: 0,
        nodes: Vec::new(),
    }];

    for (index, raw) in script.lines().enumerate() {
        let quoted = raw.replace('"', "'");
        let cleaned = strip_comment(&quoted);
        let text = cleaned.trim();
        if text.is_empty() {
            continue;
        }
        let indent = cleaned.len() - cleaned.trim_start().len();

        if let Some(top) = stack.last() {
            if indent > top.indent {
                stack.push(Frame {
                    indent,
                    nodes: Vec::new(),
                });
            } else {
                while stack.len() > 1 && stack.last().is_some_and(|f| indent < f.indent) {
                    if let Some(done) = stack.pop() {
                        if let Some(parent) = stack.last_mut() {
                            parent.nodes.push(Node::Block(done.nodes));
                        }
                    }
                }
            }
        }
        if let Some(top) = stack.last_mut() {
            top.nodes.push(Node::Line {
                number: index + 1,
                text: text.to_string(),
            });
        }
    }

    while stack.len() > 1 {
        if let Some(done) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.nodes.push(Node::Block(done.nodes));
            }
        }
    }
    stack.pop().map(|f| f.nodes).unwrap_or_default()
}

/// Drop `//` to end of line, ignoring slashes inside string literals.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            _ => {}
        }
        i += 1;
    }
    line
}
