use crate::ast::Span;
use std::fmt;

/// Kind of parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Grammar was rejected by the parser library itself
    Setup,
    /// Source contains tokens the grammar could not place
    InvalidSyntax,
    /// Source ends before a construct is complete
    MissingToken,
    /// Valid PHP that cannot hold a PHPX call at that position
    Unsupported,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Setup => "Parser setup failed",
            ErrorKind::InvalidSyntax => "Invalid syntax",
            ErrorKind::MissingToken => "Missing token",
            ErrorKind::Unsupported => "Unsupported construct",
        }
    }
}

/// Error during parsing
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
    pub help: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            help: None,
        }
    }

    /// Add help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render the error with source context
    pub fn render(&self, source: &str, filename: &str) -> String {
        render_snippet(source, filename, &self.message, Some(self.span), self.help.as_deref(), false)
    }

    /// Render the error with ANSI color codes
    pub fn render_color(&self, source: &str, filename: &str) -> String {
        render_snippet(source, filename, &self.message, Some(self.span), self.help.as_deref(), true)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}:{}",
            self.kind.as_str(),
            self.message,
            self.span.start.line + 1,
            self.span.start.col + 1
        )
    }
}

impl std::error::Error for ParseError {}

/// Error during compilation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("Failed parsing file: {0}")]
    Parse(#[from] ParseError),

    /// `$x->div(...$args)` or `$x->div(...)`: arguments are only known at run time
    #[error("Spread arguments are not supported in `{method}()`")]
    UnsupportedSpreadArguments { method: String, span: Option<Span> },

    /// Concatenation over zero items; a dispatcher defect, never user input
    #[error("Cannot concatenate an empty list of expressions")]
    EmptyConcatenation,

    #[error("`{directive}()` requires an argument")]
    MissingArgument { directive: String, span: Option<Span> },

    /// Element calls take named arguments only
    #[error("Positional argument passed to element `{element}()`")]
    PositionalElementArgument { element: String, span: Option<Span> },

    /// `out()` compiles to an `echo` statement
    #[error("`out()` must be used as a statement")]
    OutNotStatement { span: Option<Span> },
}

impl CompileError {
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Parse(err) => Some(err.span),
            CompileError::UnsupportedSpreadArguments { span, .. }
            | CompileError::MissingArgument { span, .. }
            | CompileError::PositionalElementArgument { span, .. }
            | CompileError::OutNotStatement { span } => *span,
            CompileError::EmptyConcatenation => None,
        }
    }

    fn help(&self) -> Option<&str> {
        match self {
            CompileError::Parse(err) => err.help.as_deref(),
            CompileError::UnsupportedSpreadArguments { .. } => {
                Some("Pass attributes as named arguments, or collect them with attributes: [...]")
            }
            CompileError::MissingArgument { .. } => Some("Wrap the expression to emit, e.g. $x->raw($html)"),
            CompileError::PositionalElementArgument { .. } => {
                Some("Name every argument: attributes as name: value, content as c: [...]")
            }
            CompileError::OutNotStatement { .. } => Some("Use render() where a value is needed, e.g. $html = $x->render(...)"),
            CompileError::EmptyConcatenation => None,
        }
    }

    /// Render the error with source context (no color)
    pub fn render(&self, source: &str, filename: &str) -> String {
        match self {
            CompileError::Parse(err) => err.render(source, filename),
            other => render_snippet(source, filename, &other.to_string(), other.span(), other.help(), false),
        }
    }

    /// Render the error with ANSI color codes
    pub fn render_color(&self, source: &str, filename: &str) -> String {
        match self {
            CompileError::Parse(err) => err.render_color(source, filename),
            other => render_snippet(source, filename, &other.to_string(), other.span(), other.help(), true),
        }
    }
}

fn render_snippet(
    source: &str,
    filename: &str,
    message: &str,
    span: Option<Span>,
    help: Option<&str>,
    color: bool,
) -> String {
    // Visual hierarchy: red for errors only, dim for structural chrome
    let red = if color { "\x1b[1;31m" } else { "" };
    let dim = if color { "\x1b[2m" } else { "" };
    let cyan = if color { "\x1b[1;38;5;73m" } else { "" };
    let reset = if color { "\x1b[0m" } else { "" };

    let mut output = String::new();
    output.push('\n');

    match span {
        Some(span) => output.push_str(&format!(
            " {}file:{} {}:{}:{}\n",
            dim,
            reset,
            filename,
            span.start.line + 1,
            span.start.col + 1
        )),
        None => output.push_str(&format!(" {}file:{} {}\n", dim, reset, filename)),
    }

    output.push_str(&format!("{}error:{} {}\n", red, reset, message));

    let excerpt = span.and_then(|span| source.lines().nth(span.start.line).map(|line| (span, line)));
    if let Some((span, source_line)) = excerpt {
        let err_line = span.start.line + 1;
        let width = format!("{}", err_line).len().max(2);
        output.push_str(&format!("{}{:>width$} |{}\n", dim, "", reset, width = width));
        output.push_str(&format!("{}{:>width$} |{} {}\n", dim, err_line, reset, source_line, width = width));

        let underline_start = span.start.col;
        let underline_len = if span.end.line == span.start.line {
            span.end.col.saturating_sub(span.start.col).max(1)
        } else {
            source_line.len().saturating_sub(underline_start).max(1)
        };
        output.push_str(&format!(
            "{}{:>width$} |{} {}{}{}{}\n",
            dim,
            "",
            reset,
            " ".repeat(underline_start),
            red,
            "^".repeat(underline_len),
            reset,
            width = width
        ));
    }

    if let Some(help) = help {
        output.push('\n');
        for (i, help_line) in help.lines().enumerate() {
            if i == 0 {
                output.push_str(&format!(" {}help:{} {}\n", cyan, reset, help_line));
            } else {
                output.push_str(&format!("       {}\n", help_line));
            }
        }
    }

    output.push('\n');
    output
}
