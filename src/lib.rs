pub mod ast;
pub mod error;
pub mod generate;
pub mod html;
pub mod parser;
pub mod transform;

use log::debug;
use serde::{Deserialize, Serialize};

pub use error::{CompileError, ErrorKind, ParseError};
pub use generate::{PhpPrinter, Printer};
pub use parser::{Parser, PhpParser};
pub use transform::TransformMetadata;

/// Configuration for compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Builder variable whose method calls form the template DSL, without `$` (default: "x")
    pub variable: String,
    /// Elements rendered without children or a closing tag
    pub void_elements: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            variable: "x".to_string(),
            void_elements: html::VOID_ELEMENTS.iter().map(|tag| tag.to_string()).collect(),
        }
    }
}

impl Options {
    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = variable.into();
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompileResult {
    pub code: String,
    pub metadata: TransformMetadata,
}

/// Compiles PHPX builder calls into plain PHP string expressions.
///
/// Holds no state between calls; one `Compiler` can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: Options,
}

impl Compiler {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn compile(&self, source: &str) -> Result<CompileResult, CompileError> {
        let mut ast = PhpParser::new(self.options.variable.as_str()).parse(source)?;
        if ast.is_empty() {
            debug!("nothing to compile");
            return Ok(CompileResult { code: String::new(), metadata: TransformMetadata::new() });
        }

        let mut transformer = transform::standard_plugins(&self.options);
        transformer.transform(&mut ast)?;
        let metadata = transformer.metadata;

        let code = PhpPrinter::new().print(&ast);
        debug!(
            "compiled {} builder calls, helpers: {:?}",
            metadata.rewrites, metadata.helpers_used
        );
        Ok(CompileResult { code, metadata })
    }
}

/// Compile `source` with `$variable` as the builder variable
pub fn compile(source: &str, variable: &str) -> Result<String, CompileError> {
    compile_with(source, &Options::default().with_variable(variable))
}

pub fn compile_with(source: &str, options: &Options) -> Result<String, CompileError> {
    Compiler::new(options.clone()).compile(source).map(|result| result.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple() {
        let code = compile("<?php\necho $x->render($x->p(c: 'Hi'));\n", "x").unwrap();
        assert_eq!(code, "<?php\necho '<p>Hi</p>';\n");
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(compile("", "x").unwrap(), "");
        assert_eq!(compile("<?php\n", "x").unwrap(), "");
    }

    #[test]
    fn test_comment_only_file_is_kept() {
        let code = compile("<?php\n/*\n * License: MIT\n */\n", "x").unwrap();
        assert_eq!(code, "<?php\n/*\n * License: MIT\n */\n");
    }

    #[test]
    fn test_custom_variable() {
        let code = compile("<?php\nreturn $h->render($h->br());\n", "h").unwrap();
        assert_eq!(code, "<?php\nreturn '<br>';\n");

        // `$x` is just another variable when the builder is `$h`
        let code = compile("<?php\nreturn $x->br();\n", "h").unwrap();
        assert_eq!(code, "<?php\nreturn $x->br();\n");
    }

    #[test]
    fn test_metadata_counts_rewrites_and_helpers() {
        let result = Compiler::default()
            .compile("<?php\nreturn $x->render($x->a(href: $url, c: 'go'));\n")
            .unwrap();
        assert_eq!(result.metadata.rewrites, 2);
        assert!(result.metadata.uses_escape());
        assert!(!result.metadata.uses_implode());
        assert!(!result.metadata.doctype);
    }

    #[test]
    fn test_options_from_json_fill_defaults() {
        let options: Options = serde_json::from_str(r#"{"variable": "b"}"#).unwrap();
        assert_eq!(options.variable, "b");
        assert_eq!(options.void_elements, Options::default().void_elements);
    }

    #[test]
    fn test_custom_void_elements() {
        let options = Options { void_elements: vec!["slot".to_string()], ..Options::default() };
        let code = compile_with("<?php\nreturn $x->slot(name: 'a');\n", &options).unwrap();
        assert_eq!(code, "<?php\nreturn '<slot name=\"a\">';\n");
        let code = compile_with("<?php\nreturn $x->br();\n", &options).unwrap();
        assert_eq!(code, "<?php\nreturn '<br></br>';\n");
    }

    #[test]
    fn test_compiler_is_shared_across_threads() {
        let compiler = Compiler::default();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let compiler = &compiler;
                    scope.spawn(move || compiler.compile(&format!("<?php\nreturn $x->p(c: '{}');\n", i)))
                })
                .collect();
            for (i, handle) in handles.into_iter().enumerate() {
                let result = handle.join().unwrap().unwrap();
                assert_eq!(result.code, format!("<?php\nreturn '<p>{}</p>';\n", i));
            }
        });
    }
}
