pub mod positions;
mod tree_builder;

pub use positions::{Position, Span};
use tree_builder::TreeBuilder;

use crate::ast::Ast;
use crate::error::{ErrorKind, ParseError};

/// Parser trait - converts source code to AST
pub trait Parser {
    fn parse(&self, source: &str) -> Result<Ast, ParseError>;
}

/// PHP parser backed by tree-sitter-php.
///
/// Only sub-expressions that contain a call on `variable` are lowered into
/// structured nodes; everything else is carried as verbatim text.
pub struct PhpParser {
    variable: String,
}

impl PhpParser {
    pub fn new(variable: impl Into<String>) -> Self {
        Self { variable: variable.into() }
    }
}

impl Default for PhpParser {
    fn default() -> Self {
        Self::new("x")
    }
}

impl Parser for PhpParser {
    fn parse(&self, source: &str) -> Result<Ast, ParseError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_php::LANGUAGE_PHP.into())
            .map_err(|err| ParseError::new(ErrorKind::Setup, err.to_string(), Span::default()))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseError::new(ErrorKind::Setup, "Parser returned no tree", Span::default()))?;

        TreeBuilder::new(source, &self.variable).build(&tree)
    }
}
