use log::{debug, trace};

use super::attributes::{JOIN_FUNCTION, dynamic_attributes, static_attribute};
use super::children::{expand, make_safe};
use super::concat::concat_all;
use super::{Directive, TransformMetadata, Visitor};
use crate::Options;
use crate::ast::{Call, Expr, Marks, Node};
use crate::error::CompileError;
use crate::html::{self, DOCTYPE, EscapeMode};

/// Rewrites every call on the builder variable into plain PHP expressions.
///
/// Runs on exit, so nested builder calls have already been replaced by the
/// time their enclosing call is rewritten.
pub struct RewritePlugin {
    variable: String,
    void_elements: Vec<String>,
}

impl RewritePlugin {
    pub fn new(options: &Options) -> Self {
        Self {
            variable: options.variable.clone(),
            void_elements: options.void_elements.clone(),
        }
    }

    fn rewrite(&self, call: Call, marks: Marks, metadata: &mut TransformMetadata) -> Result<Node, CompileError> {
        let directive = Directive::classify(&call.name);
        debug!("rewriting `{}` as {:?}", call.name, directive);
        metadata.rewrites += 1;

        match directive {
            Directive::Render => {
                let mut items = Vec::with_capacity(call.args.len() + 1);
                if marks.doctype {
                    metadata.doctype = true;
                    items.push(Node::safe_string(DOCTYPE));
                }
                items.extend(Self::argument_values(call)?);
                concat_all(items)
            }
            Directive::Out => {
                if !marks.statement {
                    return Err(CompileError::OutNotStatement { span: call.span });
                }
                let output = concat_all(Self::argument_values(call)?)?;
                Ok(Node::safe(Expr::Echo(Box::new(output))))
            }
            Directive::Raw => {
                let Call { name, args, span, .. } = call;
                let mut value = args
                    .into_iter()
                    .next()
                    .map(|arg| arg.value)
                    .ok_or(CompileError::MissingArgument { directive: name, span })?;
                value.marks.safe = true;
                Ok(value)
            }
            Directive::If | Directive::Foreach => Ok(Self::join_fragments(call, marks)),
            Directive::With if marks.unpacked => Ok(Self::join_fragments(call, marks)),
            Directive::With => Ok(Node {
                expr: Expr::Call(call),
                marks: Marks { safe: true, ..marks },
            }),
            Directive::Element => self.element(call),
        }
    }

    /// Values of all arguments, in order
    fn argument_values(call: Call) -> Result<Vec<Node>, CompileError> {
        if call.args.iter().any(|arg| arg.spread) {
            return Err(CompileError::UnsupportedSpreadArguments { method: call.name, span: call.span });
        }
        Ok(call.args.into_iter().map(|arg| arg.value).collect())
    }

    /// `implode('', <call>)`: collapse a runtime list of fragments into one string
    fn join_fragments(call: Call, marks: Marks) -> Node {
        Node::func_call(JOIN_FUNCTION, vec![Node::string(""), Node { expr: Expr::Call(call), marks }])
    }

    fn element(&self, call: Call) -> Result<Node, CompileError> {
        let Call { name, args, span, .. } = call;

        let mut attributes = Vec::new();
        let mut children = None;
        for arg in args {
            if arg.spread {
                return Err(CompileError::UnsupportedSpreadArguments { method: name, span });
            }
            match arg.name.as_deref() {
                Some("attributes") => {
                    attributes.push(Node::safe_string(" "));
                    attributes.push(dynamic_attributes(arg.value)?);
                }
                Some("c") => children = Some(arg.value),
                Some(attr) if !arg.value.marks.safe => attributes.extend(static_attribute(attr, arg.value)),
                // Already-safe values are dropped
                Some(attr) => trace!("dropping already-safe attribute `{}` on `{}`", attr, name),
                None => return Err(CompileError::PositionalElementArgument { element: name, span }),
            }
        }

        if html::is_void_element(&name, &self.void_elements) {
            let tag = name.to_ascii_lowercase();
            let mut items = vec![Node::safe_string(format!("<{}", tag))];
            items.extend(attributes);
            items.push(Node::safe_string(">"));
            return concat_all(items);
        }

        let mut items = vec![Node::safe_string(format!("<{}", name))];
        items.extend(attributes);
        items.push(Node::safe_string(">"));
        items.extend(expand(children).into_iter().map(|child| make_safe(child, EscapeMode::Content)));
        items.push(Node::safe_string(format!("</{}>", name)));
        concat_all(items)
    }
}

impl Visitor for RewritePlugin {
    fn exit(&mut self, node: &mut Node, metadata: &mut TransformMetadata) -> Result<(), CompileError> {
        let is_builder_call = node.as_call().is_some_and(|call| call.is_on_variable(&self.variable));
        if !is_builder_call {
            return Ok(());
        }

        match std::mem::take(node) {
            Node { expr: Expr::Call(call), marks } => *node = self.rewrite(call, marks, metadata)?,
            other => *node = other,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Argument, ArrayItem, Ast, Host, Piece};
    use crate::transform::standard_plugins;

    fn method(name: &str, args: Vec<Argument>) -> Node {
        Node::new(Expr::Call(Call {
            receiver: Some(Box::new(Node::variable("x"))),
            name: name.to_string(),
            args,
            span: None,
        }))
    }

    fn named(name: &str, value: Node) -> Argument {
        Argument { name: Some(name.to_string()), value, spread: false }
    }

    fn pos(value: Node) -> Argument {
        Argument::positional(value)
    }

    fn array(values: Vec<Node>) -> Node {
        Node::new(Expr::Array(
            values.into_iter().map(|value| ArrayItem { key: None, value, spread: false }).collect(),
        ))
    }

    fn run(node: Node) -> Result<Node, CompileError> {
        let mut ast = Ast::new(Node::new(Expr::Host(Host {
            pieces: vec![Piece::Node(node)],
            atomic: false,
            loose: true,
        })));
        standard_plugins(&Options::default()).transform(&mut ast)?;
        let Expr::Host(mut host) = ast.root.expr else { unreachable!() };
        match host.pieces.pop() {
            Some(Piece::Node(node)) => Ok(node),
            other => panic!("unexpected piece {:?}", other),
        }
    }

    fn text(node: &Node) -> &str {
        match &node.expr {
            Expr::Str(text) => text,
            other => panic!("expected literal, got {:?}", other),
        }
    }

    #[test]
    fn test_static_element_folds_to_one_literal() {
        let node = run(method("h1", vec![named("id", Node::string("title")), named("c", Node::string("Hello & bye"))])).unwrap();
        assert_eq!(text(&node), "<h1 id=\"title\">Hello &amp; bye</h1>");
        assert!(node.marks.safe);
    }

    #[test]
    fn test_void_element_ignores_children() {
        let node = run(method("META", vec![named("id", Node::string("x")), named("c", Node::string("ignored"))])).unwrap();
        assert_eq!(text(&node), "<meta id=\"x\">");
    }

    #[test]
    fn test_children_array_is_flattened_and_escaped() {
        let node = run(method("p", vec![named("c", array(vec![Node::string("a<"), method("br", vec![]), Node::string("b")]))])).unwrap();
        assert_eq!(text(&node), "<p>a&lt;<br>b</p>");
    }

    #[test]
    fn test_already_safe_attribute_is_dropped() {
        let raw = method("raw", vec![pos(Node::variable("url"))]);
        let node = run(method("a", vec![named("href", raw), named("c", Node::string("go"))])).unwrap();
        assert_eq!(text(&node), "<a>go</a>");
    }

    #[test]
    fn test_raw_is_never_escaped() {
        let raw = method("raw", vec![pos(Node::variable("html"))]);
        let node = run(method("div", vec![named("c", raw)])).unwrap();
        let Expr::Concat(open, rest) = &node.expr else { panic!("expected concat") };
        assert_eq!(text(open), "<div>");
        let Expr::Concat(value, close) = &rest.expr else { panic!("expected concat") };
        assert_eq!(value.expr, Expr::Variable("html".to_string()));
        assert_eq!(text(close), "</div>");
    }

    #[test]
    fn test_raw_without_argument() {
        let err = run(method("raw", vec![])).unwrap_err();
        assert!(matches!(err, CompileError::MissingArgument { ref directive, .. } if directive == "raw"));
    }

    #[test]
    fn test_if_is_joined() {
        let node = run(method("if", vec![pos(Node::variable("cond")), pos(Node::string("yes"))])).unwrap();
        let join = node.as_call().expect("implode call");
        assert_eq!(join.name, "implode");
        assert_eq!(join.args[0].value.expr, Expr::Str(String::new()));
        assert!(join.args[1].value.is_method_call("if"));
        assert!(node.marks.safe);
    }

    #[test]
    fn test_with_passes_through_as_safe() {
        let node = run(method("with", vec![pos(Node::variable("user"))])).unwrap();
        assert!(node.is_method_call("with"));
        assert!(node.marks.safe);
    }

    #[test]
    fn test_unpacked_with_is_joined() {
        let children = Node::new(Expr::Array(vec![ArrayItem {
            key: None,
            value: method("with", vec![pos(Node::variable("user"))]),
            spread: true,
        }]));
        let node = run(method("ul", vec![named("c", children)])).unwrap();
        let Expr::Concat(_, rest) = &node.expr else { panic!("expected concat") };
        let Expr::Concat(joined, _) = &rest.expr else { panic!("expected concat") };
        assert_eq!(joined.as_call().map(|c| c.name.as_str()), Some("implode"));
    }

    #[test]
    fn test_out_echoes() {
        let mut out = method("out", vec![pos(method("br", vec![]))]);
        out.marks.statement = true;
        let node = run(out).unwrap();
        let Expr::Echo(inner) = &node.expr else { panic!("expected echo") };
        assert_eq!(text(inner), "<br>");
    }

    #[test]
    fn test_out_outside_statement_is_rejected() {
        let err = run(method("out", vec![pos(method("br", vec![]))])).unwrap_err();
        assert!(matches!(err, CompileError::OutNotStatement { .. }));
    }

    #[test]
    fn test_render_without_arguments_is_empty_concatenation() {
        assert_eq!(run(method("render", vec![])), Err(CompileError::EmptyConcatenation));
    }

    #[test]
    fn test_spread_argument_is_rejected() {
        let spread = Argument { name: None, value: Node::variable("args"), spread: true };
        let err = run(method("div", vec![spread])).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedSpreadArguments { ref method, .. } if method == "div"));
    }

    #[test]
    fn test_positional_element_argument_is_rejected() {
        let err = run(method("div", vec![pos(Node::string("text"))])).unwrap_err();
        assert!(matches!(err, CompileError::PositionalElementArgument { .. }));
    }

    #[test]
    fn test_other_receivers_are_untouched() {
        let call = Node::new(Expr::Call(Call {
            receiver: Some(Box::new(Node::variable("y"))),
            name: "div".to_string(),
            args: vec![],
            span: None,
        }));
        assert_eq!(run(call.clone()).unwrap(), call);
    }
}
