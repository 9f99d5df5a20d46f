//! Lowers a tree-sitter-php syntax tree into the compiler AST.
//!
//! The program becomes one `Host` node. A subtree is lowered into structured
//! nodes only when it contains a call on the builder variable; inside such a
//! call every argument is lowered, falling back to `Host` for constructs the
//! rewrite rules never need to look into.

use std::ops::Range;

use tree_sitter::{Node as TsNode, Tree};

use super::positions::{Span, position_at};
use crate::ast::{Argument, ArrayItem, Ast, Call, Expr, Host, Lambda, Node, Piece};
use crate::error::{ErrorKind, ParseError};

/// Node kinds that bind tighter than `.` and `->`
const ATOMIC_KINDS: &[&str] = &[
    "parenthesized_expression",
    "variable_name",
    "dynamic_variable_name",
    "name",
    "qualified_name",
    "string",
    "encapsed_string",
    "heredoc",
    "nowdoc",
    "integer",
    "float",
    "boolean",
    "null",
    "array_creation_expression",
    "subscript_expression",
    "member_access_expression",
    "nullsafe_member_access_expression",
    "scoped_property_access_expression",
    "class_constant_access_expression",
    "member_call_expression",
    "nullsafe_member_call_expression",
    "scoped_call_expression",
    "function_call_expression",
];

/// Node kinds whose operand slots accept a `.` chain without parentheses
const LOOSE_KINDS: &[&str] = &[
    "program",
    "expression_statement",
    "return_statement",
    "echo_statement",
    "print_intrinsic",
    "assignment_expression",
    "augmented_assignment_expression",
    "reference_assignment_expression",
    "parenthesized_expression",
    "conditional_expression",
    "match_expression",
    "match_block",
    "match_conditional_expression",
    "match_default_expression",
    "match_condition_list",
    "arguments",
    "argument",
    "array_creation_expression",
    "array_element_initializer",
    "sequence_expression",
    "yield_expression",
    "throw_expression",
    "compound_statement",
    "colon_block",
    "if_statement",
    "else_clause",
    "else_if_clause",
    "foreach_statement",
    "for_statement",
    "while_statement",
    "do_statement",
    "switch_statement",
    "switch_block",
    "case_statement",
    "default_statement",
    "function_definition",
    "method_declaration",
    "anonymous_function",
    "anonymous_function_use_clause",
    "arrow_function",
    "formal_parameters",
    "simple_parameter",
    "property_promotion_parameter",
    "class_declaration",
    "declaration_list",
    "property_declaration",
    "property_element",
    "const_declaration",
    "const_element",
    "static_variable_declaration",
    "global_declaration",
    "try_statement",
    "catch_clause",
    "finally_clause",
    "namespace_definition",
    "enum_declaration",
    "enum_declaration_list",
    "enum_case",
];

/// String forms whose `{...}` parts are parsed as expressions
const INTERPOLATED_KINDS: &[&str] = &["encapsed_string", "heredoc", "shell_command_expression"];

/// Binary operators that bind tighter than `.`
const TIGHT_OPERATORS: &[&str] = &["*", "/", "%", "+", "-", "<<", ">>", "**", "instanceof"];

pub struct TreeBuilder<'a> {
    source: &'a str,
    variable: &'a str,
    /// Byte ranges of every call on the builder variable, sorted by start
    builder_calls: Vec<Range<usize>>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(source: &'a str, variable: &'a str) -> Self {
        Self {
            source,
            variable,
            builder_calls: Vec::new(),
        }
    }

    pub fn build(mut self, tree: &Tree) -> Result<Ast, ParseError> {
        let root = tree.root_node();
        if root.has_error() {
            return Err(self.syntax_error(root));
        }

        let mut calls = Vec::new();
        self.collect_builder_calls(root, &mut calls);
        calls.sort_by_key(|range| range.start);
        self.builder_calls = calls;

        if let Some(err) = self.interpolated_call(root) {
            return Err(err);
        }

        let mut cursor = root.walk();
        let children: Vec<TsNode> = root.children(&mut cursor).collect();
        let has_content = children.iter().any(|c| c.is_named() && c.kind() != "php_tag");
        if !has_content {
            return Ok(Ast::new(Node::new(Expr::Host(Host::default()))));
        }

        let mut pieces = Vec::new();
        let body_start = match children.first() {
            Some(first) if first.kind() == "php_tag" => {
                let rest = &self.source[first.end_byte()..];
                first.end_byte() + (rest.len() - rest.trim_start().len())
            }
            // Leading inline HTML: close the open marker the printer emits
            _ => {
                pieces.push(Piece::Text("?>".to_string()));
                0
            }
        };

        let host = self.host(root, body_start);
        pieces.extend(host.pieces);
        if root.end_byte() < self.source.len() {
            pieces.push(Piece::Text(self.source[root.end_byte()..].to_string()));
        }
        merge_text(&mut pieces);
        Ok(Ast::new(Node::new(Expr::Host(Host { pieces, atomic: false, loose: true }))))
    }

    fn text(&self, node: TsNode) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn collect_builder_calls(&self, node: TsNode, calls: &mut Vec<Range<usize>>) {
        if node.kind() == "member_call_expression" {
            let on_builder = node
                .child_by_field_name("object")
                .is_some_and(|object| object.kind() == "variable_name" && self.text(object) == format!("${}", self.variable));
            if on_builder {
                calls.push(node.byte_range());
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_builder_calls(child, calls);
        }
    }

    fn contains_builder_call(&self, node: TsNode) -> bool {
        let range = node.byte_range();
        let first = self.builder_calls.partition_point(|call| call.start < range.start);
        self.builder_calls[first..]
            .iter()
            .take_while(|call| call.start < range.end)
            .any(|call| call.end <= range.end)
    }

    /// Builder calls inside string interpolation cannot be replaced by an
    /// expression in place, so they are rejected
    fn interpolated_call(&self, node: TsNode) -> Option<ParseError> {
        if INTERPOLATED_KINDS.contains(&node.kind()) {
            let range = node.byte_range();
            let call = self
                .builder_calls
                .iter()
                .find(|call| call.start >= range.start && call.end <= range.end)?;
            let span = Span {
                start: position_at(self.source, call.start),
                end: position_at(self.source, call.end),
            };
            return Some(
                ParseError::new(ErrorKind::Unsupported, "PHPX call inside string interpolation", span)
                    .with_help("Concatenate instead, e.g. 'Hello '.$x->b(c: $name)"),
            );
        }
        let mut cursor = node.walk();
        let children: Vec<TsNode> = node.children(&mut cursor).collect();
        children.into_iter().find_map(|child| self.interpolated_call(child))
    }

    fn syntax_error(&self, root: TsNode) -> ParseError {
        let bad = find_error(root).unwrap_or(root);
        let span = Span::of(&bad);
        if bad.is_missing() {
            ParseError::new(ErrorKind::MissingToken, format!("Missing `{}`", bad.kind()), span)
        } else {
            let snippet: String = self.text(bad).lines().next().unwrap_or("").chars().take(32).collect();
            ParseError::new(ErrorKind::InvalidSyntax, format!("Unexpected `{}`", snippet.trim()), span)
                .with_help("The input must be valid PHP before PHPX calls can be compiled")
        }
    }

    /// Source text of `node` from `from`, with builder-bearing children lowered
    fn host(&self, node: TsNode, from: usize) -> Host {
        let mut pieces = Vec::new();
        let mut pos = from;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.end_byte() <= pos || !self.contains_builder_call(child) {
                continue;
            }
            pieces.push(Piece::Text(self.source[pos..child.start_byte()].to_string()));
            let mut lowered = self.expression(child);
            lowered.marks.statement = node.kind() == "expression_statement" && child.is_named();
            pieces.push(Piece::Node(lowered));
            pos = child.end_byte();
        }
        pieces.push(Piece::Text(self.source[pos..node.end_byte()].to_string()));
        merge_text(&mut pieces);

        Host {
            pieces,
            atomic: ATOMIC_KINDS.contains(&node.kind()),
            loose: self.is_loose(node),
        }
    }

    fn is_loose(&self, node: TsNode) -> bool {
        match node.kind() {
            "binary_expression" => node
                .child_by_field_name("operator")
                .is_some_and(|op| !TIGHT_OPERATORS.contains(&self.text(op).to_ascii_lowercase().as_str())),
            kind => LOOSE_KINDS.contains(&kind),
        }
    }

    /// Lower an expression, falling back to verbatim host code
    fn expression(&self, node: TsNode) -> Node {
        let expr = match node.kind() {
            "string" => decode_single_quoted(self.text(node)).map(Expr::Str),
            "encapsed_string" => self.double_quoted(node),
            "integer" => parse_integer(self.text(node)).map(Expr::Int),
            "variable_name" => Some(Expr::Variable(self.text(node).trim_start_matches('$').to_string())),
            "member_call_expression" => self.method_call(node),
            "function_call_expression" => self.function_call(node),
            "array_creation_expression" => self.array(node),
            "binary_expression" => self.concat(node),
            "arrow_function" => self.arrow_function(node),
            _ => None,
        };
        Node::new(expr.unwrap_or_else(|| Expr::Host(self.host(node, node.start_byte()))))
    }

    fn double_quoted(&self, node: TsNode) -> Option<Expr> {
        let mut cursor = node.walk();
        let plain = node
            .named_children(&mut cursor)
            .all(|c| matches!(c.kind(), "string_content" | "string_value" | "escape_sequence"));
        if !plain {
            return None;
        }
        decode_double_quoted(self.text(node)).map(Expr::Str)
    }

    fn method_call(&self, node: TsNode) -> Option<Expr> {
        let object = node.child_by_field_name("object")?;
        let name = node.child_by_field_name("name")?;
        if name.is_named() && name.kind() != "name" {
            return None;
        }
        let arguments = node.child_by_field_name("arguments")?;

        Some(Expr::Call(Call {
            receiver: Some(Box::new(self.expression(object))),
            name: self.text(name).to_string(),
            args: self.arguments(arguments),
            span: Some(Span::of(&node)),
        }))
    }

    fn function_call(&self, node: TsNode) -> Option<Expr> {
        let function = node.child_by_field_name("function")?;
        if !matches!(function.kind(), "name" | "qualified_name") {
            return None;
        }
        let arguments = node.child_by_field_name("arguments")?;

        Some(Expr::Call(Call {
            receiver: None,
            name: self.text(function).to_string(),
            args: self.arguments(arguments),
            span: Some(Span::of(&node)),
        }))
    }

    fn arguments(&self, node: TsNode) -> Vec<Argument> {
        let mut args = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "argument" => args.push(self.argument(child)),
                // First-class callable syntax `f(...)`
                "variadic_placeholder" | "..." => args.push(Argument {
                    name: None,
                    value: Node::new(Expr::Host(Host::text("", true))),
                    spread: true,
                }),
                "comment" | "(" | ")" | "," => {}
                _ if child.is_named() => args.push(Argument::positional(self.expression(child))),
                _ => {}
            }
        }
        args
    }

    fn argument(&self, node: TsNode) -> Argument {
        let name = argument_name(node);
        let mut cursor = node.walk();
        let value = node
            .named_children(&mut cursor)
            .filter(|c| Some(c.id()) != name.map(|n| n.id()))
            .filter(|c| !matches!(c.kind(), "comment" | "reference_modifier"))
            .last();
        let name = name.map(|n| self.text(n).to_string());
        let mut cursor = node.walk();
        let spread_token = node.children(&mut cursor).any(|c| !c.is_named() && self.text(c) == "...");

        match value {
            Some(value) if value.kind() == "variadic_unpacking" => Argument {
                name,
                value: self.unpacked(value),
                spread: true,
            },
            Some(value) => Argument {
                name,
                value: self.expression(value),
                spread: spread_token,
            },
            None => Argument {
                name,
                value: Node::new(Expr::Host(Host::text("", true))),
                spread: false,
            },
        }
    }

    /// Inner expression of `...expr`
    fn unpacked(&self, node: TsNode) -> Node {
        let mut cursor = node.walk();
        let inner = node.named_children(&mut cursor).find(|c| c.kind() != "comment");
        match inner {
            Some(inner) => self.expression(inner),
            None => Node::new(Expr::Host(Host::text("", true))),
        }
    }

    fn array(&self, node: TsNode) -> Option<Expr> {
        let mut items = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "comment" => {}
                "array_element_initializer" => items.push(self.array_item(child)?),
                _ => return None,
            }
        }
        Some(Expr::Array(items))
    }

    fn array_item(&self, node: TsNode) -> Option<ArrayItem> {
        let mut cursor = node.walk();
        let parts: Vec<TsNode> = node.named_children(&mut cursor).filter(|c| c.kind() != "comment").collect();
        match parts.as_slice() {
            [value] if value.kind() == "variadic_unpacking" => Some(ArrayItem {
                key: None,
                value: self.unpacked(*value),
                spread: true,
            }),
            [value] if value.kind() != "by_ref" => Some(ArrayItem {
                key: None,
                value: self.expression(*value),
                spread: false,
            }),
            [key, value] if value.kind() != "by_ref" => Some(ArrayItem {
                key: Some(self.expression(*key)),
                value: self.expression(*value),
                spread: false,
            }),
            _ => None,
        }
    }

    fn concat(&self, node: TsNode) -> Option<Expr> {
        let operator = node
            .child_by_field_name("operator")
            .map(|op| self.text(op))
            .or_else(|| {
                let mut cursor = node.walk();
                let op = node.children(&mut cursor).find(|c| !c.is_named()).map(|c| self.text(c));
                op
            })?;
        if operator != "." {
            return None;
        }
        let left = node.child_by_field_name("left")?;
        let right = node.child_by_field_name("right")?;
        Some(Expr::Concat(Box::new(self.expression(left)), Box::new(self.expression(right))))
    }

    fn arrow_function(&self, node: TsNode) -> Option<Expr> {
        if node.child_by_field_name("return_type").is_some() || node.child_by_field_name("reference_modifier").is_some() {
            return None;
        }
        let parameters = node.child_by_field_name("parameters")?;
        let body = node.child_by_field_name("body")?;

        let mut is_static = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match self.text(child) {
                "fn" => break,
                "static" => is_static = true,
                // attributes, `&`
                _ => return None,
            }
        }

        let mut cursor = parameters.walk();
        let params = parameters
            .named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .map(|c| self.text(c).to_string())
            .collect();

        Some(Expr::Lambda(Lambda {
            is_static,
            params,
            body: Box::new(self.expression(body)),
        }))
    }
}

fn find_error(node: TsNode) -> Option<TsNode> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            return find_error(child);
        }
    }
    None
}

/// `name` in `name: value`
fn argument_name(node: TsNode) -> Option<TsNode> {
    if let Some(name) = node.child_by_field_name("name") {
        return Some(name);
    }
    let first = node.named_child(0)?;
    let colon = first.next_sibling()?;
    (first.kind() == "name" && colon.kind() == ":").then_some(first)
}

/// Merge adjacent text pieces and drop empty ones
fn merge_text(pieces: &mut Vec<Piece>) {
    let mut merged: Vec<Piece> = Vec::with_capacity(pieces.len());
    for piece in pieces.drain(..) {
        match (merged.last_mut(), piece) {
            (_, Piece::Text(text)) if text.is_empty() => {}
            (Some(Piece::Text(prev)), Piece::Text(text)) => prev.push_str(&text),
            (_, piece) => merged.push(piece),
        }
    }
    *pieces = merged;
}

fn parse_integer(text: &str) -> Option<i64> {
    let digits = text.replace('_', "");
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// Value of a `'...'` literal
fn decode_single_quoted(text: &str) -> Option<String> {
    let text = text.strip_prefix(['b', 'B']).unwrap_or(text);
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        match (ch, chars.peek()) {
            ('\\', Some(&next @ ('\\' | '\''))) => {
                out.push(next);
                chars.next();
            }
            _ => out.push(ch),
        }
    }
    Some(out)
}

/// Value of a `"..."` literal without interpolation.
///
/// Returns `None` for escapes producing bytes that are not valid UTF-8 on their own.
fn decode_double_quoted(text: &str) -> Option<String> {
    let text = text.strip_prefix(['b', 'B']).unwrap_or(text);
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;

    let chars: Vec<char> = inner.chars().collect();
    let mut out = String::with_capacity(inner.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' || i + 1 == chars.len() {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        let next = chars[i + 1];
        i += 2;
        match next {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'v' => out.push('\x0b'),
            'e' => out.push('\x1b'),
            'f' => out.push('\x0c'),
            '\\' => out.push('\\'),
            '$' => out.push('$'),
            '"' => out.push('"'),
            '0'..='7' => {
                let start = i - 1;
                while i < chars.len() && i - start < 3 && chars[i].is_digit(8) {
                    i += 1;
                }
                let code: String = chars[start..i].iter().collect();
                out.push(ascii_byte(u32::from_str_radix(&code, 8).ok()?)?);
            }
            'x' if i < chars.len() && chars[i].is_ascii_hexdigit() => {
                let start = i;
                while i < chars.len() && i - start < 2 && chars[i].is_ascii_hexdigit() {
                    i += 1;
                }
                let code: String = chars[start..i].iter().collect();
                out.push(ascii_byte(u32::from_str_radix(&code, 16).ok()?)?);
            }
            'u' if chars.get(i) == Some(&'{') => {
                let close = chars[i..].iter().position(|&c| c == '}')? + i;
                let code: String = chars[i + 1..close].iter().collect();
                out.push(char::from_u32(u32::from_str_radix(&code, 16).ok()?)?);
                i = close + 1;
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Some(out)
}

fn ascii_byte(code: u32) -> Option<char> {
    (code < 0x80).then(|| char::from_u32(code)).flatten()
}
