//! Attribute text for element calls.
//!
//! Named arguments become literal ` name="value"` runs at compile time. The
//! `attributes:` argument holds a mapping whose contents are only known at
//! run time, so it is serialized by generated code:
//!
//! ```php
//! implode(' ', array_map(
//!     static fn(string $value, string $key) => htmlspecialchars($key, 51).'="'.htmlspecialchars($value, 50).'"',
//!     [...$attrs],
//!     array_keys([...$attrs]),
//! ))
//! ```

use super::children::make_safe;
use super::concat::concat_all;
use crate::ast::{ArrayItem, Expr, Lambda, Node};
use crate::error::CompileError;
use crate::html::EscapeMode;

pub const JOIN_FUNCTION: &str = "implode";
pub const MAP_FUNCTION: &str = "array_map";
pub const KEYS_FUNCTION: &str = "array_keys";

/// ` name="value"` for a named argument, escaped in attribute-value context
pub fn static_attribute(name: &str, value: Node) -> Vec<Node> {
    vec![
        Node::safe_string(format!(" {}=\"", name)),
        make_safe(value, EscapeMode::AttributeValue),
        Node::safe_string("\""),
    ]
}

/// Runtime serialization of an `attributes:` mapping, joined with single spaces
pub fn dynamic_attributes(value: Node) -> Result<Node, CompileError> {
    let fragment = Node::safe(Expr::Lambda(Lambda {
        is_static: true,
        params: vec!["string $value".to_string(), "string $key".to_string()],
        body: Box::new(concat_all(vec![
            make_safe(Node::variable("key"), EscapeMode::AttributeKey),
            Node::safe_string("=\""),
            make_safe(Node::variable("value"), EscapeMode::AttributeValue),
            Node::safe_string("\""),
        ])?),
    }));

    let keys = Node::func_call(KEYS_FUNCTION, vec![spread_into_array(value.clone())]);
    let values = match value.expr {
        Expr::Array(_) => value,
        _ => spread_into_array(value),
    };

    Ok(Node::func_call(
        JOIN_FUNCTION,
        vec![Node::string(" "), Node::func_call(MAP_FUNCTION, vec![fragment, values, keys])],
    ))
}

/// `[...value]`: iterable regardless of the mapping's runtime shape
fn spread_into_array(value: Node) -> Node {
    Node::safe(Expr::Array(vec![ArrayItem { key: None, value, spread: true }]))
}
