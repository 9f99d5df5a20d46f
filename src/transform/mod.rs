mod attributes;
mod children;
mod concat;
mod directive;
mod helper_detect;
mod lookahead;
mod metadata;
mod rewrite;

pub use attributes::dynamic_attributes;
pub use children::{expand, make_safe};
pub use concat::concat_all;
pub use directive::Directive;
pub use helper_detect::HelperDetectionPlugin;
pub use lookahead::LookaheadPlugin;
pub use metadata::TransformMetadata;
pub use rewrite::RewritePlugin;

use crate::Options;
use crate::ast::{Ast, Expr, Node, Piece};
use crate::error::CompileError;

/// Visitor trait for AST transformations
pub trait Visitor {
    /// Called before visiting children. Return `false` to skip children.
    fn enter(&mut self, _node: &mut Node, _metadata: &mut TransformMetadata) -> bool {
        true
    }

    /// Called after visiting children. May replace `node` in place.
    fn exit(&mut self, _node: &mut Node, _metadata: &mut TransformMetadata) -> Result<(), CompileError> {
        Ok(())
    }
}

/// Transformer that applies a series of plugins to an AST, one full pass each
pub struct Transformer {
    plugins: Vec<Box<dyn Visitor>>,
    pub metadata: TransformMetadata,
}

impl Transformer {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
            metadata: TransformMetadata::new(),
        }
    }

    pub fn add<V: Visitor + 'static>(mut self, visitor: V) -> Self {
        self.plugins.push(Box::new(visitor));
        self
    }

    pub fn transform(&mut self, ast: &mut Ast) -> Result<&TransformMetadata, CompileError> {
        for plugin in &mut self.plugins {
            Self::visit_node(&mut ast.root, plugin.as_mut(), &mut self.metadata)?;
        }

        Ok(&self.metadata)
    }

    fn visit_node(node: &mut Node, visitor: &mut dyn Visitor, metadata: &mut TransformMetadata) -> Result<(), CompileError> {
        if visitor.enter(node, metadata) {
            match &mut node.expr {
                Expr::Call(call) => {
                    if let Some(receiver) = &mut call.receiver {
                        Self::visit_node(receiver, visitor, metadata)?;
                    }
                    for arg in &mut call.args {
                        Self::visit_node(&mut arg.value, visitor, metadata)?;
                    }
                }
                Expr::Array(items) => {
                    for item in items {
                        if let Some(key) = &mut item.key {
                            Self::visit_node(key, visitor, metadata)?;
                        }
                        Self::visit_node(&mut item.value, visitor, metadata)?;
                    }
                }
                Expr::Concat(left, right) => {
                    Self::visit_node(left, visitor, metadata)?;
                    Self::visit_node(right, visitor, metadata)?;
                }
                Expr::Echo(inner) => Self::visit_node(inner, visitor, metadata)?,
                Expr::Lambda(lambda) => Self::visit_node(&mut lambda.body, visitor, metadata)?,
                Expr::Host(host) => {
                    for piece in &mut host.pieces {
                        if let Piece::Node(child) = piece {
                            Self::visit_node(child, visitor, metadata)?;
                        }
                    }
                }
                // Leaf nodes
                Expr::Str(_) | Expr::Int(_) | Expr::Variable(_) => {}
            }
        }
        visitor.exit(node, metadata)
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a transformer with the standard plugins
pub fn standard_plugins(options: &Options) -> Transformer {
    Transformer::new()
        .add(LookaheadPlugin)
        .add(RewritePlugin::new(options))
        .add(HelperDetectionPlugin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Argument, Call, Host};

    /// Records the order in which builder calls are left
    struct ExitOrder(Vec<String>);

    impl Visitor for ExitOrder {
        fn exit(&mut self, node: &mut Node, _metadata: &mut TransformMetadata) -> Result<(), CompileError> {
            if let Some(call) = node.as_call() {
                self.0.push(call.name.clone());
            }
            Ok(())
        }
    }

    fn method(name: &str, args: Vec<Node>) -> Node {
        Node::new(Expr::Call(Call {
            receiver: Some(Box::new(Node::variable("x"))),
            name: name.to_string(),
            args: args.into_iter().map(Argument::positional).collect(),
            span: None,
        }))
    }

    #[test]
    fn test_children_are_left_before_parents() {
        let tree = method("div", vec![method("h1", vec![method("span", vec![])]), method("p", vec![])]);
        let mut ast = Ast::new(Node::new(Expr::Host(Host {
            pieces: vec![Piece::Node(tree)],
            atomic: false,
            loose: true,
        })));

        let mut order = ExitOrder(Vec::new());
        Transformer::visit_node(&mut ast.root, &mut order, &mut TransformMetadata::new()).unwrap();
        assert_eq!(order.0, vec!["span", "h1", "p", "div"]);
    }
}
