mod php;

pub use php::{PhpPrinter, quote_string};

use crate::ast::Ast;

/// Standard PHP open marker prefixed to every compiled file
pub const OPEN_TAG: &str = "<?php\n";

/// Printer trait - converts AST back to source text
pub trait Printer {
    fn print(&self, ast: &Ast) -> String;
}
