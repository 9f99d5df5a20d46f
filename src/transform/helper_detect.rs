use super::Visitor;
use super::attributes::{JOIN_FUNCTION, KEYS_FUNCTION, MAP_FUNCTION};
use super::children::ESCAPE_FUNCTION;
use crate::ast::{Expr, Node};

/// Detects which runtime helpers the generated code calls.
/// Only calls synthesized by the rewrite rules count; they carry no source span.
pub struct HelperDetectionPlugin;

impl Visitor for HelperDetectionPlugin {
    fn enter(&mut self, node: &mut Node, metadata: &mut super::TransformMetadata) -> bool {
        if let Expr::Call(call) = &node.expr {
            let helper = [ESCAPE_FUNCTION, JOIN_FUNCTION, MAP_FUNCTION, KEYS_FUNCTION].contains(&call.name.as_str());
            if helper && call.receiver.is_none() && call.span.is_none() {
                metadata.helpers_used.insert(call.name.clone());
            }
        }
        true
    }
}
