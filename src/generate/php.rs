use super::{OPEN_TAG, Printer};
use crate::ast::*;

/// Prints the rewritten tree as PHP source.
///
/// Host text is emitted byte-for-byte; only rewritten nodes are printed from
/// structure. Concatenation chains print without spaces or parentheses.
pub struct PhpPrinter;

impl PhpPrinter {
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, node: &Node, out: &mut String) {
        match &node.expr {
            Expr::Str(value) => out.push_str(&quote_string(value)),
            Expr::Int(value) => out.push_str(&value.to_string()),
            Expr::Variable(name) => {
                out.push('$');
                out.push_str(name);
            }
            Expr::Call(call) => {
                if let Some(receiver) = &call.receiver {
                    self.emit_wrapped(receiver, true, out);
                    out.push_str("->");
                }
                out.push_str(&call.name);
                out.push('(');
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if let Some(name) = &arg.name {
                        out.push_str(name);
                        out.push_str(": ");
                    }
                    if arg.spread {
                        out.push_str("...");
                    }
                    self.emit(&arg.value, out);
                }
                out.push(')');
            }
            Expr::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if let Some(key) = &item.key {
                        self.emit(key, out);
                        out.push_str(" => ");
                    }
                    if item.spread {
                        out.push_str("...");
                    }
                    self.emit(&item.value, out);
                }
                out.push(']');
            }
            Expr::Concat(left, right) => {
                self.emit_wrapped(left, false, out);
                out.push('.');
                self.emit_wrapped(right, false, out);
            }
            Expr::Echo(inner) => {
                out.push_str("echo ");
                self.emit(inner, out);
            }
            Expr::Lambda(lambda) => {
                if lambda.is_static {
                    out.push_str("static ");
                }
                out.push_str("fn(");
                out.push_str(&lambda.params.join(", "));
                out.push_str(") => ");
                self.emit(&lambda.body, out);
            }
            Expr::Host(host) => {
                for piece in &host.pieces {
                    match piece {
                        Piece::Text(text) => out.push_str(text),
                        Piece::Node(child) if host.loose => self.emit(child, out),
                        Piece::Node(child) => self.emit_wrapped(child, true, out),
                    }
                }
            }
        }
    }

    /// Emit `node` as an operand. Operands of `.` accept other `.` chains
    /// as-is; `tight` positions (receivers, operands of `+` and friends) do not.
    fn emit_wrapped(&self, node: &Node, tight: bool, out: &mut String) {
        let wrap = match &node.expr {
            Expr::Echo(_) | Expr::Lambda(_) => true,
            Expr::Concat(..) => tight,
            Expr::Host(host) => !host.atomic,
            _ => false,
        };
        if wrap {
            out.push('(');
            self.emit(node, out);
            out.push(')');
        } else {
            self.emit(node, out);
        }
    }
}

impl Default for PhpPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer for PhpPrinter {
    fn print(&self, ast: &Ast) -> String {
        let mut out = String::from(OPEN_TAG);
        self.emit(&ast.root, &mut out);
        out
    }
}

/// PHP literal for `value`: single-quoted unless it holds control characters
pub fn quote_string(value: &str) -> String {
    if !value.chars().any(char::is_control) {
        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for ch in value.chars() {
            if matches!(ch, '\\' | '\'') {
                out.push('\\');
            }
            out.push(ch);
        }
        out.push('\'');
        return out;
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            '\x1b' => out.push_str("\\e"),
            '\x0c' => out.push_str("\\f"),
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            '"' => out.push_str("\\\""),
            c if c.is_control() && (c as u32) < 0x80 => out.push_str(&format!("\\x{:02X}", c as u32)),
            c if c.is_control() => out.push_str(&format!("\\u{{{:X}}}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn print(node: Node) -> String {
        let mut out = String::new();
        PhpPrinter::new().emit(&node, &mut out);
        out
    }

    fn concat(left: Node, right: Node) -> Node {
        Node::safe(Expr::Concat(Box::new(left), Box::new(right)))
    }

    #[test]
    fn test_quote_single() {
        assert_eq!(quote_string("<a href=\"x\">"), "'<a href=\"x\">'");
        assert_eq!(quote_string("it's \\ ok"), "'it\\'s \\\\ ok'");
    }

    #[test]
    fn test_quote_double_for_control_characters() {
        assert_eq!(quote_string("<!DOCTYPE html>\n"), "\"<!DOCTYPE html>\\n\"");
        assert_eq!(quote_string("$a\t\"b\"\x01"), "\"\\$a\\t\\\"b\\\"\\x01\"");
        assert_eq!(quote_string("\u{85}"), "\"\\u{85}\"");
    }

    #[test]
    fn test_concat_chain_without_parentheses() {
        let inner = concat(Node::string("<a>"), concat(Node::variable("x"), Node::string("</a>")));
        let outer = concat(concat(inner, Node::string("</p>")), Node::string("</div>"));
        assert_eq!(print(outer), "'<a>'.$x.'</a>'.'</p>'.'</div>'");
    }

    #[test]
    fn test_escape_call() {
        let call = Node::func_call("htmlspecialchars", vec![Node::variable("github"), Node::new(Expr::Int(50))]);
        assert_eq!(print(call), "htmlspecialchars($github, 50)");
    }

    #[test]
    fn test_method_call_with_named_and_spread_arguments() {
        let call = Node::new(Expr::Call(Call {
            receiver: Some(Box::new(Node::variable("x"))),
            name: "if".to_string(),
            args: vec![
                Argument::positional(Node::variable("cond")),
                Argument { name: Some("c".to_string()), value: Node::string("a"), spread: false },
                Argument { name: None, value: Node::variable("rest"), spread: true },
            ],
            span: None,
        }));
        assert_eq!(print(call), "$x->if($cond, c: 'a', ...$rest)");
    }

    #[test]
    fn test_lambda_and_array() {
        let lambda = Node::new(Expr::Lambda(Lambda {
            is_static: true,
            params: vec!["string $value".to_string(), "string $key".to_string()],
            body: Box::new(concat(Node::variable("key"), Node::variable("value"))),
        }));
        assert_eq!(print(lambda), "static fn(string $value, string $key) => $key.$value");

        let array = Node::new(Expr::Array(vec![
            ArrayItem { key: Some(Node::string("id")), value: Node::new(Expr::Int(1)), spread: false },
            ArrayItem { key: None, value: Node::variable("more"), spread: true },
        ]));
        assert_eq!(print(array), "['id' => 1, ...$more]");
    }

    #[test]
    fn test_non_atomic_host_operand_is_parenthesized() {
        let ternary = Node::new(Expr::Host(Host { pieces: vec![Piece::Text("$a ? 'b' : 'c'".to_string())], atomic: false, loose: true }));
        assert_eq!(print(concat(Node::string("<p>"), ternary)), "'<p>'.($a ? 'b' : 'c')");
    }

    #[test]
    fn test_tight_host_slot_parenthesizes_chain() {
        let host = Node::new(Expr::Host(Host {
            pieces: vec![Piece::Text("$n + ".to_string()), Piece::Node(concat(Node::string("a"), Node::variable("b")))],
            atomic: false,
            loose: false,
        }));
        assert_eq!(print(host), "$n + ('a'.$b)");
    }

    #[test]
    fn test_concat_receiver_is_parenthesized() {
        let call = Node::new(Expr::Call(Call {
            receiver: Some(Box::new(concat(Node::string("a"), Node::variable("b")))),
            name: "trim".to_string(),
            args: vec![],
            span: None,
        }));
        assert_eq!(print(call), "('a'.$b)->trim()");
    }

    #[test]
    fn test_echo_statement() {
        let host = Node::new(Expr::Host(Host {
            pieces: vec![Piece::Node(Node::safe(Expr::Echo(Box::new(Node::string("<br>"))))), Piece::Text(";".to_string())],
            atomic: false,
            loose: true,
        }));
        assert_eq!(print(host), "echo '<br>';");
    }
}
