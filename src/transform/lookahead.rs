use log::trace;

use super::Visitor;
use crate::ast::{Expr, Node};

/// Stamps the forward-looking marks the rewrite rules consult:
/// `unpacked` on method calls spread into an array, and `doctype` on
/// `render` calls whose only argument is an `html` element.
pub struct LookaheadPlugin;

impl Visitor for LookaheadPlugin {
    fn enter(&mut self, node: &mut Node, _metadata: &mut super::TransformMetadata) -> bool {
        let mut doctype = false;
        match &mut node.expr {
            Expr::Array(items) => {
                for item in items.iter_mut().filter(|item| item.spread) {
                    if let Some(call) = item.value.as_call().filter(|call| call.receiver.is_some()) {
                        trace!("`{}()` is unpacked into an array", call.name);
                        item.value.marks.unpacked = true;
                    }
                }
            }
            Expr::Call(call) if call.receiver.is_some() && call.name == "render" => {
                if let [only] = call.args.as_slice() {
                    doctype = !only.spread && only.value.is_method_call("html");
                }
            }
            _ => {}
        }
        if doctype {
            trace!("`render()` of `html()` gets a doctype");
            node.marks.doctype = true;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Argument, ArrayItem, Call};
    use crate::transform::TransformMetadata;

    fn method(name: &str, args: Vec<Node>) -> Node {
        Node::new(Expr::Call(Call {
            receiver: Some(Box::new(Node::variable("x"))),
            name: name.to_string(),
            args: args.into_iter().map(Argument::positional).collect(),
            span: None,
        }))
    }

    fn enter(node: &mut Node) {
        LookaheadPlugin.enter(node, &mut TransformMetadata::new());
    }

    #[test]
    fn test_render_of_html_gets_doctype() {
        let mut node = method("render", vec![method("html", vec![])]);
        enter(&mut node);
        assert!(node.marks.doctype);
    }

    #[test]
    fn test_render_of_other_element_has_no_doctype() {
        let mut node = method("render", vec![method("div", vec![])]);
        enter(&mut node);
        assert!(!node.marks.doctype);

        let mut node = method("render", vec![method("html", vec![]), method("p", vec![])]);
        enter(&mut node);
        assert!(!node.marks.doctype);
    }

    #[test]
    fn test_spread_method_call_is_unpacked() {
        let mut node = Node::new(Expr::Array(vec![
            ArrayItem { key: None, value: method("with", vec![]), spread: true },
            ArrayItem { key: None, value: method("with", vec![]), spread: false },
            ArrayItem { key: None, value: Node::variable("items"), spread: true },
        ]));
        enter(&mut node);

        let Expr::Array(items) = &node.expr else { unreachable!() };
        assert!(items[0].value.marks.unpacked);
        assert!(!items[1].value.marks.unpacked);
        assert!(!items[2].value.marks.unpacked);
    }
}
