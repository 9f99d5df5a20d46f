use crate::ast::{Expr, Node};
use crate::error::CompileError;

/// Combine `items` into one right-associated `.` chain, folding literal runs.
///
/// A literal followed by a literal merges into one; a literal followed by a
/// chain that starts with a literal absorbs that literal. The resulting tree
/// never holds two adjacent literal operands.
pub fn concat_all(items: Vec<Node>) -> Result<Node, CompileError> {
    let mut items = items.into_iter();
    let first = items.next().ok_or(CompileError::EmptyConcatenation)?;
    Ok(chain(first, &mut items))
}

fn chain(left: Node, rest: &mut impl Iterator<Item = Node>) -> Node {
    match rest.next() {
        None => left,
        Some(next) => {
            let right = chain(next, rest);
            join(left, right)
        }
    }
}

fn join(left: Node, right: Node) -> Node {
    let (mut text, mut marks) = match left.expr {
        Expr::Str(text) => (text, left.marks),
        expr => return concat(Node { expr, marks: left.marks }, right),
    };

    let right = match right.expr {
        Expr::Str(more) => {
            text.push_str(&more);
            marks.safe |= right.marks.safe;
            return Node { expr: Expr::Str(text), marks };
        }
        Expr::Concat(inner_left, inner_right) if inner_left.is_string() => {
            let Node { expr, marks: inner_marks } = *inner_left;
            if let Expr::Str(more) = expr {
                text.push_str(&more);
            }
            marks.safe |= inner_marks.safe;
            *inner_right
        }
        expr => Node { expr, marks: right.marks },
    };

    concat(Node { expr: Expr::Str(text), marks }, right)
}

fn concat(left: Node, right: Node) -> Node {
    Node::safe(Expr::Concat(Box::new(left), Box::new(right)))
}
