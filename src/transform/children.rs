use crate::ast::{Expr, Node};
use crate::html::{self, EscapeMode};

/// Runtime escaping primitive called by generated code
pub const ESCAPE_FUNCTION: &str = "htmlspecialchars";

/// Flatten a children argument into the sequence of children.
///
/// An array literal contributes its items in order, any other expression
/// contributes itself. Items that are themselves array literals are spliced
/// in one more level; deeper arrays are left as they are.
pub fn expand(children: Option<Node>) -> Vec<Node> {
    let top = match children {
        Some(Node { expr: Expr::Array(items), .. }) => items.into_iter().map(|item| item.value).collect(),
        Some(child) => vec![child],
        None => Vec::new(),
    };

    let mut out = Vec::with_capacity(top.len());
    for child in top {
        match child {
            Node { expr: Expr::Array(items), .. } => out.extend(items.into_iter().map(|item| item.value)),
            child => out.push(child),
        }
    }
    out
}

/// Escape `node` for `mode` unless it is already safe.
///
/// Literal text is escaped at compile time; anything else is wrapped in a
/// runtime escape call. Either way the result is marked safe.
pub fn make_safe(mut node: Node, mode: EscapeMode) -> Node {
    if node.marks.safe {
        return node;
    }

    if let Expr::Str(text) = &mut node.expr {
        *text = html::escape(text, mode);
        node.marks.safe = true;
        return node;
    }

    Node::func_call(ESCAPE_FUNCTION, vec![node, Node::new(Expr::Int(mode.flags()))])
}
