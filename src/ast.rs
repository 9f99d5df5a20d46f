// Re-export Span so the rest of the codebase uses a single type
pub use crate::parser::positions::{Position, Span};

/// Syntax tree for one compile invocation.
///
/// The root is always a `Host` node covering the whole program; builder calls
/// anywhere inside it are spliced out as child nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub root: Node,
}

impl Ast {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.root.expr, Expr::Host(host) if host.pieces.is_empty())
    }
}

/// Ephemeral per-node annotations, scoped to one compile call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Marks {
    /// Content is already escaped (or verbatim-safe) and must never be escaped again
    pub safe: bool,
    /// The node was spread into an array, so it yields a list at run time
    pub unpacked: bool,
    /// A `render` call whose only argument is an `html` element
    pub doctype: bool,
    /// The whole expression of an expression statement
    pub statement: bool,
}

/// AST node: an expression plus its annotations
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Node {
    pub expr: Expr,
    pub marks: Marks,
}

impl Node {
    pub fn new(expr: Expr) -> Self {
        Self { expr, marks: Marks::default() }
    }

    /// A node that is already safe to emit as-is
    pub fn safe(expr: Expr) -> Self {
        Self { expr, marks: Marks { safe: true, ..Marks::default() } }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(Expr::Str(value.into()))
    }

    pub fn safe_string(value: impl Into<String>) -> Self {
        Self::safe(Expr::Str(value.into()))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(Expr::Variable(name.into()))
    }

    /// A plain function call `name(args...)` with positional arguments
    pub fn func_call(name: impl Into<String>, args: Vec<Node>) -> Self {
        Self::safe(Expr::Call(Call {
            receiver: None,
            name: name.into(),
            args: args.into_iter().map(Argument::positional).collect(),
            span: None,
        }))
    }

    pub fn is_string(&self) -> bool {
        matches!(self.expr, Expr::Str(_))
    }

    pub fn as_call(&self) -> Option<&Call> {
        match &self.expr {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Method call (has a receiver) with the given name
    pub fn is_method_call(&self, name: &str) -> bool {
        self.as_call().is_some_and(|call| call.receiver.is_some() && call.name == name)
    }
}

/// Expression variants
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String literal (decoded value)
    Str(String),
    Int(i64),
    /// Variable reference, without the `$`
    Variable(String),
    Call(Call),
    Array(Vec<ArrayItem>),
    Concat(Box<Node>, Box<Node>),
    /// `echo` of an expression
    Echo(Box<Node>),
    Lambda(Lambda),
    /// Host code kept verbatim
    Host(Host),
}

impl Default for Expr {
    fn default() -> Self {
        Expr::Host(Host::default())
    }
}

/// Function or method call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub receiver: Option<Box<Node>>,
    pub name: String,
    pub args: Vec<Argument>,
    pub span: Option<Span>,
}

impl Call {
    /// Receiver is the plain variable `$name`
    pub fn is_on_variable(&self, name: &str) -> bool {
        matches!(self.receiver.as_deref(), Some(Node { expr: Expr::Variable(v), .. }) if v == name)
    }
}

/// Call argument: `value`, `name: value` or `...value`
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Node,
    pub spread: bool,
}

impl Argument {
    pub fn positional(value: Node) -> Self {
        Self { name: None, value, spread: false }
    }
}

/// Array element: `value`, `key => value` or `...value`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayItem {
    pub key: Option<Node>,
    pub value: Node,
    pub spread: bool,
}

/// Arrow function `fn(params) => body`
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub is_static: bool,
    /// Parameter declarations as written, e.g. `string $value`
    pub params: Vec<String>,
    pub body: Box<Node>,
}

/// Verbatim host code with DSL-bearing sub-expressions spliced out
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Host {
    pub pieces: Vec<Piece>,
    /// Can stand as an operand or receiver without parentheses
    pub atomic: bool,
    /// Spliced nodes sit where any expression binding looser than `.` is accepted
    pub loose: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Text(String),
    Node(Node),
}

impl Host {
    pub fn text(text: impl Into<String>, atomic: bool) -> Self {
        Self { pieces: vec![Piece::Text(text.into())], atomic, loose: true }
    }
}
